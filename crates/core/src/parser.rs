//! Recursive-descent parser over the lexer's token stream.
//!
//! Fail-fast: the first error aborts the parse, no recovery is attempted.
//! The grammar registry is consulted during parsing so an unknown command
//! name is rejected here, never silently accepted.

use crate::ast::{Chain, InputRef, Invocation, Item, ModifierValue, Script};
use crate::error::DirectiveError;
use crate::grammar::Registry;
use crate::lexer::{lex, Spanned, Token};
use std::collections::BTreeMap;

/// Lex and parse a directive script against a registry.
pub fn parse(src: &str, registry: &Registry) -> Result<Script, DirectiveError> {
    let tokens = lex(src)?;
    Parser::new(&tokens, registry).parse_script()
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    registry: &'a Registry,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned], registry: &'a Registry) -> Self {
        Parser {
            tokens,
            pos: 0,
            registry,
        }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn advance(&mut self) -> &Spanned {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn err(&self, msg: impl Into<String>) -> DirectiveError {
        DirectiveError::parse(self.cur().line, self.cur().column, msg)
    }

    fn expect_colon(&mut self) -> Result<(), DirectiveError> {
        if self.peek() == &Token::Colon {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected ':', got {:?}", self.peek())))
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek() == &Token::Newline {
            self.advance();
        }
    }

    fn parse_script(&mut self) -> Result<Script, DirectiveError> {
        let mut items = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek().clone() {
                Token::Eof => break,
                Token::Command(name) if name == "CHAIN" => {
                    items.push(Item::Chain(self.parse_chain()?));
                }
                Token::Command(_) => {
                    items.push(Item::Invocation(self.parse_invocation(false, true)?));
                }
                Token::Indent => {
                    return Err(self.err("unexpected indentation outside a chain"));
                }
                other => {
                    return Err(self.err(format!("expected a command, got {:?}", other)));
                }
            }
        }
        Ok(Script { items })
    }

    /// `CHAIN:` NEWLINE INDENT invocation+ DEDENT
    fn parse_chain(&mut self) -> Result<Chain, DirectiveError> {
        let header = self.advance();
        let (line, column) = (header.line, header.column);
        self.expect_colon()?;
        if self.peek() != &Token::Newline {
            return Err(self.err("CHAIN takes no input or modifiers; its block starts on the next line"));
        }
        self.advance();
        if self.peek() != &Token::Indent {
            return Err(DirectiveError::parse(
                line,
                column,
                "chain has no steps: expected an indented block after 'CHAIN:'",
            ));
        }
        self.advance();

        let mut steps: Vec<Invocation> = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek().clone() {
                Token::Dedent => {
                    self.advance();
                    break;
                }
                Token::Eof => break,
                Token::Command(name) if name == "CHAIN" => {
                    return Err(self.err("chains do not nest"));
                }
                Token::Command(_) => {
                    let first = steps.is_empty();
                    steps.push(self.parse_invocation(true, first)?);
                }
                Token::Indent => {
                    return Err(self.err("inconsistent indentation inside chain block"));
                }
                other => {
                    return Err(self.err(format!("expected a chain step, got {:?}", other)));
                }
            }
        }
        if steps.is_empty() {
            return Err(DirectiveError::parse(line, column, "chain has no steps"));
        }
        Ok(Chain { steps, line })
    }

    /// COMMAND ':' input modifier* NEWLINE
    fn parse_invocation(
        &mut self,
        in_chain: bool,
        is_first: bool,
    ) -> Result<Invocation, DirectiveError> {
        let header = self.advance().clone();
        let (line, column) = (header.line, header.column);
        let command = match header.token {
            Token::Command(name) => name,
            _ => return Err(DirectiveError::parse(line, column, "expected a command")),
        };
        let schema = self.registry.get(&command).ok_or_else(|| {
            DirectiveError::parse(line, column, format!("unknown command '{}'", command))
        })?;
        let requires_input = schema.requires_input;
        self.expect_colon()?;

        let input = self.parse_input(&command, requires_input, in_chain, is_first)?;

        let mut modifiers: BTreeMap<String, ModifierValue> = BTreeMap::new();
        while let Token::ModifierKey(key) = self.peek().clone() {
            let key_tok = self.advance().clone();
            let raw = match self.peek().clone() {
                Token::ModifierValue(v) => {
                    self.advance();
                    v
                }
                other => {
                    return Err(self.err(format!("expected modifier value, got {:?}", other)));
                }
            };
            let value = ModifierValue::classify(&raw, key_tok.line, key_tok.column)?;
            // Normalized-lowercase keys; last occurrence wins on duplicates
            modifiers.insert(key.to_lowercase(), value);
        }

        match self.peek() {
            Token::Newline => {
                self.advance();
            }
            Token::Eof | Token::Dedent => {}
            other => {
                return Err(self.err(format!("unexpected token after invocation: {:?}", other)));
            }
        }

        Ok(Invocation {
            slot: self.registry.slot_label(&command),
            command,
            input,
            modifiers,
            line,
            column,
        })
    }

    fn parse_input(
        &mut self,
        command: &str,
        requires_input: bool,
        in_chain: bool,
        is_first: bool,
    ) -> Result<InputRef, DirectiveError> {
        match self.peek().clone() {
            Token::Quoted(_) | Token::Block(_) => {
                // Consecutive string literals join into one literal input
                let mut parts: Vec<String> = Vec::new();
                loop {
                    match self.peek().clone() {
                        Token::Quoted(s) | Token::Block(s) => {
                            self.advance();
                            parts.push(s);
                        }
                        _ => break,
                    }
                }
                Ok(InputRef::Literal(parts.join("\n")))
            }
            Token::BareWord(_) => {
                let (line, column) = (self.cur().line, self.cur().column);
                let mut words: Vec<String> = Vec::new();
                while let Token::BareWord(w) = self.peek().clone() {
                    self.advance();
                    words.push(w);
                }
                let phrase = words.join(" ");
                if !in_chain {
                    return Err(DirectiveError::parse(
                        line,
                        column,
                        format!(
                            "bare reference '{}' is only allowed inside a chain",
                            phrase
                        ),
                    ));
                }
                if is_first {
                    return Err(DirectiveError::parse(
                        line,
                        column,
                        format!(
                            "the first step of a chain cannot reference a prior result ('{}')",
                            phrase
                        ),
                    ));
                }
                Ok(InputRef::Binding(phrase))
            }
            _ => {
                if requires_input {
                    Err(self.err(format!("command '{}' requires an input", command)))
                } else {
                    Ok(InputRef::Literal(String::new()))
                }
            }
        }
    }
}
