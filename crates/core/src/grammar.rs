//! Grammar registry: command name -> schema, built from one data table.
//!
//! Adding a command is a configuration change: extend the table (or call
//! [`Registry::insert`]) -- the lexer, parser, and validator never branch
//! on individual command names.

use crate::ast::ModifierValue;
use std::collections::BTreeMap;
use std::fmt;

/// The value domain a modifier's value must conform to.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueDomain {
    FreeText,
    Enum(Vec<String>),
    /// Inclusive numeric bounds.
    NumericRange { min: f64, max: f64 },
    ListOf(Box<ValueDomain>),
    /// Weighted list whose keys must come from the given set.
    /// Weights are unconstrained and never required to sum to 1.
    WeightedListOf(Vec<String>),
}

impl fmt::Display for ValueDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueDomain::FreeText => write!(f, "free text"),
            ValueDomain::Enum(values) => write!(f, "one of {{{}}}", values.join(", ")),
            ValueDomain::NumericRange { min, max } => {
                write!(f, "a number in [{}, {}]", min, max)
            }
            ValueDomain::ListOf(inner) => write!(f, "a list of {}", inner),
            ValueDomain::WeightedListOf(keys) => {
                write!(f, "a weighted list over {{{}}}", keys.join(", "))
            }
        }
    }
}

impl ValueDomain {
    /// Check a classified modifier value against this domain.
    /// Returns a human-readable mismatch description on failure.
    pub fn check(&self, value: &ModifierValue) -> Result<(), String> {
        match (self, value) {
            (ValueDomain::FreeText, ModifierValue::Scalar(_)) => Ok(()),
            (ValueDomain::Enum(values), ModifierValue::Scalar(s)) => {
                if values.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not {}", s, self))
                }
            }
            (ValueDomain::NumericRange { min, max }, ModifierValue::Scalar(s)) => {
                let n: f64 = s
                    .parse()
                    .map_err(|_| format!("'{}' is not a number ({})", s, self))?;
                if n >= *min && n <= *max {
                    Ok(())
                } else {
                    Err(format!("{} is outside [{}, {}]", n, min, max))
                }
            }
            // A single scalar is a one-element list
            (ValueDomain::ListOf(inner), ModifierValue::Scalar(s)) => {
                inner.check(&ModifierValue::Scalar(s.clone()))
            }
            (ValueDomain::ListOf(inner), ModifierValue::List(items)) => {
                for item in items {
                    inner.check(&ModifierValue::Scalar(item.clone()))?;
                }
                Ok(())
            }
            (ValueDomain::WeightedListOf(keys), ModifierValue::WeightedList(pairs)) => {
                for (key, _) in pairs {
                    if !keys.iter().any(|k| k == key) {
                        return Err(format!("'{}' is not {}", key, self));
                    }
                }
                Ok(())
            }
            (_, _) => Err(format!("expected {}", self)),
        }
    }
}

/// Schema for one command: whether it takes a primary input, the modifier
/// keys it recognizes, and the slot label its chain results are stored under.
#[derive(Debug, Clone)]
pub struct CommandSchema {
    pub requires_input: bool,
    pub modifiers: BTreeMap<String, ValueDomain>,
    /// Custom slot label; `None` falls back to `<lowercase name> results`.
    pub slot_label: Option<String>,
}

/// Static table of known commands. Read-only after construction.
#[derive(Debug, Clone)]
pub struct Registry {
    commands: BTreeMap<String, CommandSchema>,
}

impl Registry {
    /// Exact, case-sensitive lookup.
    pub fn get(&self, command: &str) -> Option<&CommandSchema> {
        self.commands.get(command)
    }

    pub fn contains(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    /// The slot label a chain step of this command produces.
    pub fn slot_label(&self, command: &str) -> String {
        self.commands
            .get(command)
            .and_then(|schema| schema.slot_label.clone())
            .unwrap_or_else(|| format!("{} results", command.to_lowercase()))
    }

    /// Register an additional command. Configuration surface for hosts.
    pub fn insert(&mut self, name: impl Into<String>, schema: CommandSchema) {
        self.commands.insert(name.into(), schema);
    }

    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(|s| s.as_str())
    }

    /// The standard registry: twenty seeded commands.
    pub fn standard() -> Registry {
        use ValueDomain::FreeText;

        fn enum_of(values: &[&str]) -> ValueDomain {
            ValueDomain::Enum(values.iter().map(|s| s.to_string()).collect())
        }
        fn weighted_over(keys: &[&str]) -> ValueDomain {
            ValueDomain::WeightedListOf(keys.iter().map(|s| s.to_string()).collect())
        }
        fn range(min: f64, max: f64) -> ValueDomain {
            ValueDomain::NumericRange { min, max }
        }
        fn list_of(inner: ValueDomain) -> ValueDomain {
            ValueDomain::ListOf(Box::new(inner))
        }

        type Def = (
            &'static str,
            bool,
            Option<&'static str>,
            Vec<(&'static str, ValueDomain)>,
        );

        let defs: Vec<Def> = vec![
            (
                "ANALYZE",
                true,
                Some("analysis"),
                vec![
                    (
                        "focus",
                        enum_of(&[
                            "sentiment",
                            "thematic",
                            "statistical",
                            "linguistic",
                            "structural",
                        ]),
                    ),
                    ("output", enum_of(&["summary", "detailed", "bullet"])),
                    ("depth", range(1.0, 5.0)),
                ],
            ),
            (
                "COMPARE",
                true,
                Some("comparison"),
                vec![
                    (
                        "weight",
                        weighted_over(&[
                            "price",
                            "services",
                            "support",
                            "features",
                            "performance",
                            "usability",
                            "security",
                        ]),
                    ),
                    ("criteria", list_of(FreeText)),
                    ("format", enum_of(&["table", "prose"])),
                ],
            ),
            (
                "SUMMARIZE",
                true,
                Some("summary"),
                vec![
                    ("length", enum_of(&["brief", "standard", "extended"])),
                    ("ratio", range(0.0, 1.0)),
                    ("style", enum_of(&["bullet", "prose", "outline"])),
                ],
            ),
            (
                "EVALUATE",
                true,
                Some("evaluation"),
                vec![
                    ("criteria", list_of(FreeText)),
                    ("scale", range(1.0, 100.0)),
                    ("rubric", FreeText),
                ],
            ),
            (
                "REFINE",
                true,
                Some("refinement"),
                vec![
                    (
                        "tone",
                        enum_of(&["formal", "casual", "technical", "persuasive"]),
                    ),
                    ("iterations", range(1.0, 10.0)),
                    ("goal", FreeText),
                ],
            ),
            // CHAIN's "input" is its indented block, not a value
            ("CHAIN", false, None, vec![]),
            (
                "GENERATE",
                true,
                Some("generation"),
                vec![
                    ("type", enum_of(&["text", "outline", "code", "plan"])),
                    ("count", range(1.0, 20.0)),
                    ("style", FreeText),
                ],
            ),
            (
                "EXPAND",
                true,
                Some("expansion"),
                vec![
                    ("detail", enum_of(&["examples", "context", "implications"])),
                    ("factor", range(1.0, 10.0)),
                ],
            ),
            (
                "TRANSLATE",
                true,
                Some("translation"),
                vec![
                    ("to", FreeText),
                    ("register", enum_of(&["formal", "informal", "technical"])),
                    ("preserve", list_of(FreeText)),
                ],
            ),
            (
                "SIMPLIFY",
                true,
                Some("simplification"),
                vec![
                    ("audience", enum_of(&["child", "general", "expert"])),
                    ("level", range(1.0, 5.0)),
                ],
            ),
            (
                "STRUCTURE",
                true,
                Some("structure"),
                vec![
                    ("schema", enum_of(&["json", "yaml", "table", "tree"])),
                    ("fields", list_of(FreeText)),
                ],
            ),
            (
                "FORMAT",
                true,
                Some("formatted text"),
                vec![
                    ("as", enum_of(&["markdown", "html", "plain", "latex"])),
                    ("width", range(20.0, 200.0)),
                ],
            ),
            (
                "OPTIMIZE",
                true,
                Some("optimization"),
                vec![
                    ("for", enum_of(&["clarity", "brevity", "impact", "seo"])),
                    ("constraints", list_of(FreeText)),
                ],
            ),
            (
                "CONNECT",
                true,
                Some("connections"),
                vec![
                    (
                        "relation",
                        enum_of(&["causal", "thematic", "temporal", "contrastive"]),
                    ),
                    ("strength", range(0.0, 1.0)),
                ],
            ),
            (
                "VISUALIZE",
                true,
                Some("visualization"),
                vec![
                    (
                        "kind",
                        enum_of(&["graph", "flowchart", "timeline", "mindmap"]),
                    ),
                    ("detail", range(1.0, 5.0)),
                ],
            ),
            (
                "VALIDATE",
                true,
                Some("validation"),
                vec![
                    ("against", FreeText),
                    ("strictness", enum_of(&["lenient", "standard", "strict"])),
                ],
            ),
            (
                "DEBUG",
                true,
                Some("debug report"),
                vec![
                    ("focus", enum_of(&["logic", "syntax", "performance", "style"])),
                    ("verbosity", range(1.0, 5.0)),
                ],
            ),
            (
                "EXPLAIN",
                true,
                Some("explanation"),
                vec![
                    (
                        "level",
                        enum_of(&["beginner", "intermediate", "advanced"]),
                    ),
                    ("format", enum_of(&["steps", "prose", "analogy"])),
                ],
            ),
            (
                "SEARCH",
                true,
                Some("search results"),
                vec![
                    ("scope", enum_of(&["web", "documents", "code", "all"])),
                    ("limit", range(1.0, 100.0)),
                    ("recency", FreeText),
                ],
            ),
            (
                "DESIGN",
                true,
                Some("design"),
                vec![
                    ("medium", enum_of(&["api", "schema", "document", "system"])),
                    ("constraints", list_of(FreeText)),
                ],
            ),
        ];

        let mut commands = BTreeMap::new();
        for (name, requires_input, slot_label, modifiers) in defs {
            commands.insert(
                name.to_owned(),
                CommandSchema {
                    requires_input,
                    modifiers: modifiers
                        .into_iter()
                        .map(|(k, d)| (k.to_owned(), d))
                        .collect(),
                    slot_label: slot_label.map(str::to_owned),
                },
            );
        }
        Registry { commands }
    }
}
