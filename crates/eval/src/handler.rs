//! The handler collaborator: the external backend that performs a
//! command's actual semantic work given resolved arguments.
//!
//! The executor resolves *what* to invoke and *with what arguments*, then
//! delegates here. Two implementations ship with the crate:
//! [`ScriptedHandler`] (canned responses, for tests and dry runs) and
//! [`EchoHandler`] (deterministic synthesized output, the CLI default).

use async_trait::async_trait;
use dictum_core::ModifierValue;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A failure signalled by the handler backend. Surfaced verbatim by the
/// executor as an execution error.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerError {
    pub command: String,
    pub message: String,
}

impl HandlerError {
    pub fn new(command: &str, message: impl Into<String>) -> Self {
        HandlerError {
            command: command.to_owned(),
            message: message.into(),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler failed for {}: {}", self.command, self.message)
    }
}

impl std::error::Error for HandlerError {}

/// Performs one command's semantic work.
///
/// Constructed once per run and handed to the executor; there is no
/// process-wide backend singleton. Implementations must tolerate
/// concurrent invocation if the host dispatches independent top-level
/// items concurrently.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Invoke the backend for one command with its resolved input and
    /// validated modifiers.
    async fn invoke(
        &self,
        command: &str,
        input: &Value,
        modifiers: &BTreeMap<String, ModifierValue>,
    ) -> Result<Value, HandlerError>;

    /// Returns this handler's identifier (e.g. "echo", "scripted").
    fn handler_id(&self) -> &str;
}

/// Canned command -> response map. Unknown commands fail.
#[derive(Debug, Default)]
pub struct ScriptedHandler {
    responses: BTreeMap<String, Value>,
}

impl ScriptedHandler {
    pub fn new(responses: BTreeMap<String, Value>) -> Self {
        ScriptedHandler { responses }
    }

    pub fn with_response(mut self, command: &str, response: Value) -> Self {
        self.responses.insert(command.to_owned(), response);
        self
    }
}

#[async_trait]
impl CommandHandler for ScriptedHandler {
    async fn invoke(
        &self,
        command: &str,
        _input: &Value,
        _modifiers: &BTreeMap<String, ModifierValue>,
    ) -> Result<Value, HandlerError> {
        self.responses
            .get(command)
            .cloned()
            .ok_or_else(|| HandlerError::new(command, "no scripted response for command"))
    }

    fn handler_id(&self) -> &str {
        "scripted"
    }
}

/// Synthesizes a deterministic description of each invocation, so scripts
/// can run end to end without a model backend attached.
#[derive(Debug, Default)]
pub struct EchoHandler;

#[async_trait]
impl CommandHandler for EchoHandler {
    async fn invoke(
        &self,
        command: &str,
        input: &Value,
        modifiers: &BTreeMap<String, ModifierValue>,
    ) -> Result<Value, HandlerError> {
        let input_text = match input {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let mut rendered = format!("{}({})", command.to_lowercase(), input_text);
        if !modifiers.is_empty() {
            let keys: Vec<String> = modifiers
                .iter()
                .map(|(k, v)| format!("{}={}", k, render_modifier(v)))
                .collect();
            rendered.push_str(&format!(" [{}]", keys.join(" ")));
        }
        Ok(Value::String(rendered))
    }

    fn handler_id(&self) -> &str {
        "echo"
    }
}

fn render_modifier(value: &ModifierValue) -> String {
    match value {
        ModifierValue::Scalar(s) => s.clone(),
        ModifierValue::List(items) => items.join(","),
        ModifierValue::WeightedList(pairs) => pairs
            .iter()
            .map(|(k, w)| format!("{}:{}", k, w))
            .collect::<Vec<_>>()
            .join(","),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn scripted_handler_returns_canned_response() {
        let handler = ScriptedHandler::default().with_response("SEARCH", json!("R1"));
        let out = handler
            .invoke("SEARCH", &json!("query"), &BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(out, json!("R1"));
    }

    #[tokio::test]
    async fn scripted_handler_fails_for_unknown_command() {
        let handler = ScriptedHandler::default();
        let err = handler
            .invoke("ANALYZE", &json!("x"), &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(err.message.contains("no scripted response"));
        assert_eq!(err.command, "ANALYZE");
    }

    #[tokio::test]
    async fn echo_handler_is_deterministic() {
        let handler = EchoHandler;
        let mut modifiers = BTreeMap::new();
        modifiers.insert("focus".to_string(), ModifierValue::Scalar("sentiment".into()));
        let a = handler
            .invoke("ANALYZE", &json!("text"), &modifiers)
            .await
            .unwrap();
        let b = handler
            .invoke("ANALYZE", &json!("text"), &modifiers)
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a, json!("analyze(text) [focus=sentiment]"));
    }
}
