//! dictum-core: directive language core library.
//!
//! Turns directive script text into a validated AST: lexing, grammar
//! registry lookup, parsing, and static modifier validation. Execution
//! lives in `dictum-eval`; this crate never invokes a handler.
//!
//! # Public API
//!
//! - [`parse()`] -- lex and parse a script against a registry
//! - [`check()`] -- parse plus static validation (the fail-closed gate)
//! - [`Registry`] -- command schemas as data
//! - [`DirectiveError`] -- the single diagnostic type
//! - AST types: [`Script`], [`Item`], [`Chain`], [`Invocation`],
//!   [`InputRef`], [`ModifierValue`]

pub mod ast;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod validate;

pub use ast::{Chain, InputRef, Invocation, Item, ModifierValue, Script};
pub use error::{DirectiveError, ErrorKind};
pub use grammar::{CommandSchema, Registry, ValueDomain};
pub use parser::parse;
pub use validate::{validate_invocation, validate_script};

/// Parse and statically validate a script. A script that fails any check
/// here must not be executed.
pub fn check(src: &str, registry: &Registry) -> Result<Script, DirectiveError> {
    let script = parse(src, registry)?;
    validate_script(&script, registry)?;
    Ok(script)
}
