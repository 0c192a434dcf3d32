//! Static validation of parsed invocations against the grammar registry.
//!
//! Runs after parsing and before any execution. A script with any
//! validation error runs nothing (fail-closed). Validation is a pure
//! check: running it twice on the same script yields the same result.

use crate::ast::{Invocation, Item, Script};
use crate::error::DirectiveError;
use crate::grammar::Registry;

/// Validate every invocation in the script, top-level and chain steps alike.
/// Returns the first violation found, in textual order.
pub fn validate_script(script: &Script, registry: &Registry) -> Result<(), DirectiveError> {
    for item in &script.items {
        match item {
            Item::Invocation(inv) => validate_invocation(inv, registry)?,
            Item::Chain(chain) => {
                for step in &chain.steps {
                    validate_invocation(step, registry)?;
                }
            }
        }
    }
    Ok(())
}

/// Check one invocation's modifiers: every key must exist in the command's
/// schema and every value must conform to its declared domain.
pub fn validate_invocation(inv: &Invocation, registry: &Registry) -> Result<(), DirectiveError> {
    let schema = registry.get(&inv.command).ok_or_else(|| {
        // The parser rejects unknown commands; this guards hand-built ASTs
        DirectiveError::validation(
            inv.line,
            inv.column,
            &inv.command,
            "",
            format!("unknown command '{}'", inv.command),
        )
    })?;

    for (key, value) in &inv.modifiers {
        let domain = schema.modifiers.get(key).ok_or_else(|| {
            let known: Vec<&str> = schema.modifiers.keys().map(|k| k.as_str()).collect();
            DirectiveError::validation(
                inv.line,
                inv.column,
                &inv.command,
                key,
                format!(
                    "unknown modifier '--{}' for {} (known: {})",
                    key,
                    inv.command,
                    if known.is_empty() {
                        "none".to_string()
                    } else {
                        known.join(", ")
                    }
                ),
            )
        })?;
        domain.check(value).map_err(|msg| {
            DirectiveError::validation(
                inv.line,
                inv.column,
                &inv.command,
                key,
                format!("invalid value for '--{}': {}", key, msg),
            )
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parser::parse;

    fn check(src: &str) -> Result<(), DirectiveError> {
        let registry = Registry::standard();
        let script = parse(src, &registry)?;
        validate_script(&script, &registry)
    }

    #[test]
    fn valid_invocation_passes() {
        check("ANALYZE: \"x\" --focus=sentiment --depth=3\n").unwrap();
    }

    #[test]
    fn enum_value_outside_domain_names_key_and_domain() {
        let err = check("ANALYZE: \"x\" --focus=unknown_focus_value\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.command.as_deref(), Some("ANALYZE"));
        assert_eq!(err.key.as_deref(), Some("focus"));
        assert!(err.message.contains("one of {"));
    }

    #[test]
    fn unknown_modifier_key_is_validation_error() {
        let err = check("ANALYZE: \"x\" --speed=fast\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("unknown modifier '--speed'"));
        assert!(err.message.contains("focus"));
    }

    #[test]
    fn numeric_range_out_of_bounds() {
        let err = check("ANALYZE: \"x\" --depth=9\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("outside [1, 5]"));
    }

    #[test]
    fn weighted_list_with_undeclared_key() {
        let err = check("COMPARE: \"a\" \"b\" --weight=speed:0.5\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.key.as_deref(), Some("weight"));
    }

    #[test]
    fn weight_sum_is_not_validated() {
        check("COMPARE: \"a\" \"b\" --weight=price:0.9,support:0.9\n").unwrap();
    }

    #[test]
    fn chain_steps_are_validated() {
        let err = check("CHAIN:\n  SEARCH: \"x\" --scope=intranet\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.command.as_deref(), Some("SEARCH"));
    }

    #[test]
    fn validation_is_idempotent() {
        let registry = Registry::standard();
        let script = parse("ANALYZE: \"x\" --focus=sentiment\n", &registry).unwrap();
        let before = script.clone();
        validate_script(&script, &registry).unwrap();
        validate_script(&script, &registry).unwrap();
        assert_eq!(script, before);
    }
}
