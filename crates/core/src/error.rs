use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a directive diagnostic. Determines the process exit
/// code a host CLI selects for the failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Lex,
    Parse,
    Validation,
    Binding,
    Execution,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Lex => "lex",
            ErrorKind::Parse => "parse",
            ErrorKind::Validation => "validation",
            ErrorKind::Binding => "binding",
            ErrorKind::Execution => "execution",
        };
        write!(f, "{}", s)
    }
}

/// A directive diagnostic with source position.
///
/// Lex, parse, and validation errors are detected statically and abort the
/// whole script before execution. Binding and execution errors surface
/// while a chain is running and abort only that chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirectiveError {
    pub kind: ErrorKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
    /// Command involved, when the error is attributable to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Modifier key involved, for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl DirectiveError {
    pub fn new(kind: ErrorKind, line: u32, column: u32, message: impl Into<String>) -> Self {
        DirectiveError {
            kind,
            message: message.into(),
            line,
            column,
            command: None,
            key: None,
        }
    }

    pub fn lex(line: u32, column: u32, message: impl Into<String>) -> Self {
        DirectiveError::new(ErrorKind::Lex, line, column, message)
    }

    pub fn parse(line: u32, column: u32, message: impl Into<String>) -> Self {
        DirectiveError::new(ErrorKind::Parse, line, column, message)
    }

    pub fn validation(
        line: u32,
        column: u32,
        command: &str,
        key: &str,
        message: impl Into<String>,
    ) -> Self {
        let mut e = DirectiveError::new(ErrorKind::Validation, line, column, message);
        e.command = Some(command.to_owned());
        e.key = Some(key.to_owned());
        e
    }

    pub fn binding(line: u32, column: u32, message: impl Into<String>) -> Self {
        DirectiveError::new(ErrorKind::Binding, line, column, message)
    }

    pub fn execution(line: u32, column: u32, command: &str, message: impl Into<String>) -> Self {
        let mut e = DirectiveError::new(ErrorKind::Execution, line, column, message);
        e.command = Some(command.to_owned());
        e
    }

    /// Process exit code by kind: 0 success, 1 lex/parse, 2 validation,
    /// 3 unresolved binding, 4 handler/execution failure.
    pub fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::Lex | ErrorKind::Parse => 1,
            ErrorKind::Validation => 2,
            ErrorKind::Binding => 3,
            ErrorKind::Execution => 4,
        }
    }

    /// Serialize to the diagnostic record format `{kind, message, line, column}`.
    /// All fields are present (null for missing), not skip_serializing_if.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "kind":    self.kind.to_string(),
            "message": self.message,
            "line":    self.line,
            "column":  self.column,
            "command": self.command,
            "key":     self.key,
        })
    }
}

impl fmt::Display for DirectiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error[{}] {}:{}: {}",
            self.kind, self.line, self.column, self.message
        )
    }
}

impl std::error::Error for DirectiveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_kind() {
        assert_eq!(DirectiveError::lex(1, 1, "x").exit_code(), 1);
        assert_eq!(DirectiveError::parse(1, 1, "x").exit_code(), 1);
        assert_eq!(
            DirectiveError::validation(1, 1, "ANALYZE", "focus", "x").exit_code(),
            2
        );
        assert_eq!(DirectiveError::binding(1, 1, "x").exit_code(), 3);
        assert_eq!(DirectiveError::execution(1, 1, "SEARCH", "x").exit_code(), 4);
    }

    #[test]
    fn display_carries_position() {
        let e = DirectiveError::parse(3, 7, "expected ':'");
        assert_eq!(e.to_string(), "error[parse] 3:7: expected ':'");
    }

    #[test]
    fn json_value_has_all_fields() {
        let e = DirectiveError::lex(2, 5, "unterminated string literal");
        let v = e.to_json_value();
        assert_eq!(v["kind"], "lex");
        assert_eq!(v["line"], 2);
        assert_eq!(v["column"], 5);
        assert!(v["command"].is_null());
    }
}
