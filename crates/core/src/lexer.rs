use crate::error::DirectiveError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Uppercase command identifier immediately followed by `:`
    Command(String),
    Colon,
    /// Double-quoted single-line string (content without quotes, escapes resolved)
    Quoted(String),
    /// Triple-double-quoted block string (verbatim content, newlines preserved)
    Block(String),
    /// `--key` of a modifier (without the dashes)
    ModifierKey(String),
    /// Raw modifier value text after `=` (classification happens in the AST)
    ModifierValue(String),
    /// Unquoted word; consecutive bare words form a binding phrase
    BareWord(String),
    Indent,
    Dedent,
    Newline,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
    pub column: u32,
}

/// Tokenize a directive script.
///
/// Indentation is measured in leading whitespace characters and tracked as a
/// stack; growth emits `Indent`, shrink emits one `Dedent` per popped level.
/// Blank lines and `#` comments do not affect indentation.
pub fn lex(src: &str) -> Result<Vec<Spanned>, DirectiveError> {
    let mut lx = Lexer {
        chars: src.chars().collect(),
        pos: 0,
        line: 1,
        col: 1,
        tokens: Vec::new(),
        indents: vec![0],
    };
    lx.run()?;
    Ok(lx.tokens)
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
    tokens: Vec<Spanned>,
    indents: Vec<usize>,
}

impl Lexer {
    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> char {
        let c = self.chars[self.pos];
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        c
    }

    fn push(&mut self, token: Token, line: u32, column: u32) {
        self.tokens.push(Spanned {
            token,
            line,
            column,
        });
    }

    fn err(&self, message: impl Into<String>) -> DirectiveError {
        DirectiveError::lex(self.line, self.col, message)
    }

    fn run(&mut self) -> Result<(), DirectiveError> {
        while !self.at_end() {
            let width = self.measure_indent()?;

            // Blank line or comment-only line: no tokens, no indent change
            match self.peek() {
                None => break,
                Some('\n') => {
                    self.bump();
                    continue;
                }
                Some('#') => {
                    self.skip_comment();
                    continue;
                }
                _ => {}
            }

            self.apply_indent(width)?;
            self.lex_line()?;
        }

        let line = self.line;
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(Token::Dedent, line, 1);
        }
        self.push(Token::Eof, line, self.col);
        Ok(())
    }

    /// Consume the leading whitespace run of a line and return its width.
    /// A run mixing tabs and spaces is a lex error.
    fn measure_indent(&mut self) -> Result<usize, DirectiveError> {
        let start_line = self.line;
        let mut width = 0usize;
        let mut saw_space = false;
        let mut saw_tab = false;
        while let Some(c) = self.peek() {
            match c {
                ' ' => saw_space = true,
                '\t' => saw_tab = true,
                _ => break,
            }
            self.bump();
            width += 1;
        }
        if saw_space && saw_tab {
            return Err(DirectiveError::lex(
                start_line,
                1,
                "indentation mixes tabs and spaces",
            ));
        }
        Ok(width)
    }

    fn apply_indent(&mut self, width: usize) -> Result<(), DirectiveError> {
        let current = *self.indents.last().unwrap_or(&0);
        if width > current {
            self.indents.push(width);
            self.push(Token::Indent, self.line, 1);
            return Ok(());
        }
        while width < *self.indents.last().unwrap_or(&0) {
            self.indents.pop();
            self.push(Token::Dedent, self.line, 1);
        }
        if width != *self.indents.last().unwrap_or(&0) {
            return Err(DirectiveError::lex(
                self.line,
                1,
                "dedent does not match any enclosing indentation level",
            ));
        }
        Ok(())
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn lex_line(&mut self) -> Result<(), DirectiveError> {
        loop {
            match self.peek() {
                None => {
                    self.push(Token::Newline, self.line, self.col);
                    return Ok(());
                }
                Some('\n') => {
                    let (line, col) = (self.line, self.col);
                    self.bump();
                    self.push(Token::Newline, line, col);
                    return Ok(());
                }
                Some(' ') | Some('\t') => {
                    self.bump();
                }
                Some('#') => {
                    self.skip_comment();
                }
                Some('"') => {
                    self.lex_string()?;
                }
                Some('-') if self.peek_at(1) == Some('-') => {
                    self.lex_modifier()?;
                }
                Some(c) if c.is_alphanumeric() || c == '_' => {
                    self.lex_word();
                }
                Some(c) => {
                    return Err(self.err(format!("unexpected character '{}'", c)));
                }
            }
        }
    }

    /// A quoted string, or a triple-quoted block if the next three
    /// characters are `"""`.
    fn lex_string(&mut self) -> Result<(), DirectiveError> {
        let (tok_line, tok_col) = (self.line, self.col);
        let (content, is_block) = self.scan_string()?;
        let token = if is_block {
            Token::Block(content)
        } else {
            Token::Quoted(content)
        };
        self.push(token, tok_line, tok_col);
        Ok(())
    }

    /// Consume a string literal starting at the current `"`. Returns the
    /// content and whether it was a triple-quoted block.
    fn scan_string(&mut self) -> Result<(String, bool), DirectiveError> {
        let (tok_line, tok_col) = (self.line, self.col);
        if self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"') {
            self.bump();
            self.bump();
            self.bump();
            let mut s = String::new();
            loop {
                if self.at_end() {
                    return Err(DirectiveError::lex(
                        tok_line,
                        tok_col,
                        "unterminated block string",
                    ));
                }
                if self.peek() == Some('"')
                    && self.peek_at(1) == Some('"')
                    && self.peek_at(2) == Some('"')
                {
                    self.bump();
                    self.bump();
                    self.bump();
                    break;
                }
                s.push(self.bump());
            }
            return Ok((s, true));
        }

        self.bump(); // opening quote
        let mut s = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(DirectiveError::lex(
                        tok_line,
                        tok_col,
                        "unterminated string literal",
                    ));
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.peek() {
                        None => {
                            return Err(DirectiveError::lex(
                                tok_line,
                                tok_col,
                                "unterminated escape in string",
                            ));
                        }
                        Some('"') => {
                            s.push('"');
                            self.bump();
                        }
                        Some('\\') => {
                            s.push('\\');
                            self.bump();
                        }
                        Some('n') => {
                            s.push('\n');
                            self.bump();
                        }
                        Some('t') => {
                            s.push('\t');
                            self.bump();
                        }
                        Some(other) => {
                            s.push('\\');
                            s.push(other);
                            self.bump();
                        }
                    }
                }
                Some(_) => {
                    s.push(self.bump());
                }
            }
        }
        Ok((s, false))
    }

    fn lex_modifier(&mut self) -> Result<(), DirectiveError> {
        let (tok_line, tok_col) = (self.line, self.col);
        self.bump();
        self.bump();
        let mut key = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                key.push(self.bump());
            } else {
                break;
            }
        }
        if key.is_empty() {
            return Err(self.err("expected modifier key after '--'"));
        }
        if self.peek() != Some('=') {
            return Err(self.err(format!("expected '=' after modifier key '{}'", key)));
        }
        self.bump();
        self.push(Token::ModifierKey(key), tok_line, tok_col);

        let (val_line, val_col) = (self.line, self.col);
        if self.peek() == Some('"') {
            let (content, _) = self.scan_string()?;
            self.push(Token::ModifierValue(content), val_line, val_col);
            return Ok(());
        }
        let mut value = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                break;
            }
            value.push(self.bump());
        }
        if value.is_empty() {
            return Err(self.err("empty modifier value"));
        }
        self.push(Token::ModifierValue(value), val_line, val_col);
        Ok(())
    }

    fn lex_word(&mut self) {
        let (tok_line, tok_col) = (self.line, self.col);
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(self.bump());
            } else {
                break;
            }
        }
        // A command header is an uppercase identifier immediately followed by ':'
        let is_command = word
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
            && word.starts_with(|c: char| c.is_ascii_uppercase())
            && self.peek() == Some(':');
        if is_command {
            self.push(Token::Command(word), tok_line, tok_col);
            let (cl, cc) = (self.line, self.col);
            self.bump();
            self.push(Token::Colon, cl, cc);
        } else {
            self.push(Token::BareWord(word), tok_line, tok_col);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        lex(src).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn simple_invocation() {
        let toks = kinds("ANALYZE: \"great product\" --focus=sentiment\n");
        assert_eq!(
            toks,
            vec![
                Token::Command("ANALYZE".into()),
                Token::Colon,
                Token::Quoted("great product".into()),
                Token::ModifierKey("focus".into()),
                Token::ModifierValue("sentiment".into()),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn chain_block_emits_indent_and_dedent() {
        let toks = kinds("CHAIN:\n  SEARCH: \"x\"\n  ANALYZE: search results\n");
        assert_eq!(
            toks,
            vec![
                Token::Command("CHAIN".into()),
                Token::Colon,
                Token::Newline,
                Token::Indent,
                Token::Command("SEARCH".into()),
                Token::Colon,
                Token::Quoted("x".into()),
                Token::Newline,
                Token::Command("ANALYZE".into()),
                Token::Colon,
                Token::BareWord("search".into()),
                Token::BareWord("results".into()),
                Token::Newline,
                Token::Dedent,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn block_string_preserves_newlines_verbatim() {
        let toks = kinds("SUMMARIZE: \"\"\"line one\nline \\two\"\"\"\n");
        assert_eq!(toks[2], Token::Block("line one\nline \\two".into()));
    }

    #[test]
    fn escapes_in_quoted_string() {
        let toks = kinds("ANALYZE: \"say \\\"hi\\\"\\n\"\n");
        assert_eq!(toks[2], Token::Quoted("say \"hi\"\n".into()));
    }

    #[test]
    fn mixed_tabs_and_spaces_is_lex_error() {
        let err = lex("CHAIN:\n \tSEARCH: \"x\"\n").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Lex);
        assert!(err.message.contains("tabs and spaces"));
    }

    #[test]
    fn unterminated_string_is_lex_error() {
        let err = lex("ANALYZE: \"oops\n").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Lex);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn unterminated_block_string_is_lex_error() {
        let err = lex("ANALYZE: \"\"\"never closed\n").unwrap_err();
        assert!(err.message.contains("unterminated block string"));
    }

    #[test]
    fn blank_lines_do_not_change_indentation() {
        let toks = kinds("CHAIN:\n  SEARCH: \"x\"\n\n  SUMMARIZE: search results\n");
        let dedents = toks.iter().filter(|t| **t == Token::Dedent).count();
        let indents = toks.iter().filter(|t| **t == Token::Indent).count();
        assert_eq!(indents, 1);
        assert_eq!(dedents, 1);
    }

    #[test]
    fn inconsistent_dedent_is_lex_error() {
        let err = lex("CHAIN:\n    SEARCH: \"x\"\n  ANALYZE: search results\n").unwrap_err();
        assert!(err.message.contains("dedent"));
    }

    #[test]
    fn quoted_modifier_value() {
        let toks = kinds("REFINE: \"draft\" --goal=\"more punch\"\n");
        assert_eq!(toks[4], Token::ModifierValue("more punch".into()));
    }

    #[test]
    fn missing_equals_after_modifier_key() {
        let err = lex("ANALYZE: \"x\" --focus sentiment\n").unwrap_err();
        assert!(err.message.contains("expected '='"));
    }

    #[test]
    fn positions_are_one_based() {
        let toks = lex("ANALYZE: \"x\"\n").unwrap();
        assert_eq!(toks[0].line, 1);
        assert_eq!(toks[0].column, 1);
        assert_eq!(toks[2].column, 10);
    }
}
