//! AST produced by the parser. Plain data, immutable once built.
//! All nodes carry the line/column of their opening token.

use crate::error::DirectiveError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A modifier value after classification.
///
/// Classification is purely syntactic: a value containing `key:weight`
/// pairs separated by commas is a `WeightedList`; a value containing
/// commas without `:` is a `List`; anything else is a `Scalar`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierValue {
    Scalar(String),
    List(Vec<String>),
    /// Ordered `(key, weight)` pairs. Weights need not sum to 1.
    WeightedList(Vec<(String, f64)>),
}

impl ModifierValue {
    /// Classify a raw modifier value string.
    pub fn classify(raw: &str, line: u32, column: u32) -> Result<ModifierValue, DirectiveError> {
        if raw.contains(':') {
            let mut pairs = Vec::new();
            for piece in raw.split(',') {
                let piece = piece.trim();
                let (key, weight) = piece.split_once(':').ok_or_else(|| {
                    DirectiveError::parse(
                        line,
                        column,
                        format!("expected 'key:weight' in weighted list, got '{}'", piece),
                    )
                })?;
                let key = key.trim();
                if key.is_empty() {
                    return Err(DirectiveError::parse(
                        line,
                        column,
                        "empty key in weighted list",
                    ));
                }
                let weight: f64 = weight.trim().parse().map_err(|_| {
                    DirectiveError::parse(
                        line,
                        column,
                        format!("invalid weight '{}' for key '{}'", weight.trim(), key),
                    )
                })?;
                pairs.push((key.to_owned(), weight));
            }
            return Ok(ModifierValue::WeightedList(pairs));
        }
        if raw.contains(',') {
            let mut items = Vec::new();
            for piece in raw.split(',') {
                let piece = piece.trim();
                if piece.is_empty() {
                    return Err(DirectiveError::parse(line, column, "empty list element"));
                }
                items.push(piece.to_owned());
            }
            return Ok(ModifierValue::List(items));
        }
        Ok(ModifierValue::Scalar(raw.to_owned()))
    }
}

/// The primary input of an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputRef {
    /// From a quoted or block string.
    Literal(String),
    /// A bare-reference phrase, resolved against prior chain results.
    Binding(String),
}

/// One command invocation: name, input, validated modifier map.
/// Modifier keys are normalized to lowercase; last occurrence wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub command: String,
    pub input: InputRef,
    pub modifiers: BTreeMap<String, ModifierValue>,
    /// Name under which this step's result is stored for later binding.
    pub slot: String,
    pub line: u32,
    pub column: u32,
}

/// An ordered, strictly sequential group of invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub steps: Vec<Invocation>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    Invocation(Invocation),
    Chain(Chain),
}

/// A parsed script: top-level invocations and chains in textual order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub items: Vec<Item>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_value() {
        let v = ModifierValue::classify("sentiment", 1, 1).unwrap();
        assert_eq!(v, ModifierValue::Scalar("sentiment".into()));
    }

    #[test]
    fn list_value_preserves_order() {
        let v = ModifierValue::classify("a,b,c", 1, 1).unwrap();
        assert_eq!(
            v,
            ModifierValue::List(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn weighted_list_value() {
        let v = ModifierValue::classify("price:0.5,support:0.2", 1, 1).unwrap();
        assert_eq!(
            v,
            ModifierValue::WeightedList(vec![("price".into(), 0.5), ("support".into(), 0.2)])
        );
    }

    #[test]
    fn weights_need_not_sum_to_one() {
        let v = ModifierValue::classify("x:0.9,y:0.9", 1, 1).unwrap();
        assert!(matches!(v, ModifierValue::WeightedList(_)));
    }

    #[test]
    fn invalid_weight_is_parse_error() {
        let err = ModifierValue::classify("price:cheap", 1, 1).unwrap_err();
        assert!(err.message.contains("invalid weight"));
    }

    #[test]
    fn mixed_pairs_and_bare_items_is_parse_error() {
        let err = ModifierValue::classify("price:0.5,support", 1, 1).unwrap_err();
        assert!(err.message.contains("key:weight"));
    }

    #[test]
    fn empty_list_element_is_parse_error() {
        assert!(ModifierValue::classify("a,,b", 1, 1).is_err());
    }
}
