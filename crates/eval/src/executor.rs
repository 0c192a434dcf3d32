//! Executor: walks a parsed script, resolves bindings, and dispatches
//! each invocation to the handler collaborator.
//!
//! Chain execution is a state machine walk: `Pending -> Running(i) ->
//! {Completed | Aborted}`. Steps run strictly in sequence -- each step's
//! input may depend on every prior step's output, so there is no internal
//! concurrency. The chain's ResultTable is exclusively owned here and
//! discarded when the chain finishes.
//!
//! Static errors (lex/parse/validation) abort the whole run before any
//! handler call (fail-closed). Binding and handler errors abort only the
//! running chain; prior completed top-level items keep their results and
//! the report carries the chain's partial results plus the first fatal
//! runtime error.

use crate::binding::ResultTable;
use crate::handler::CommandHandler;
use dictum_core::{
    validate_script, Chain, DirectiveError, InputRef, Invocation, Item, Registry, Script,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ──────────────────────────────────────────────
// Cancellation
// ──────────────────────────────────────────────

/// Externally supplied cancellation signal, checked between chain steps.
/// Cancelling transitions a running chain to `Aborted`.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        CancellationFlag::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ──────────────────────────────────────────────
// Report types
// ──────────────────────────────────────────────

/// Chain execution states.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainState {
    Pending,
    Running(usize),
    Completed,
    Aborted { failed_step: usize },
}

/// Record of one executed chain step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub slot: String,
    pub command: String,
    pub value: Value,
}

/// Result of one chain: executed step records (the partial result table
/// on abort) and the final step's value when completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainOutcome {
    pub state: ChainState,
    pub steps: Vec<StepRecord>,
    pub result: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Invocation { command: String, value: Value },
    Chain(ChainOutcome),
}

/// Full execution report: per-item outcomes in textual order plus the
/// first fatal runtime error, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptReport {
    pub outcomes: Vec<ItemOutcome>,
    pub error: Option<DirectiveError>,
}

impl ScriptReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

// ──────────────────────────────────────────────
// Executor
// ──────────────────────────────────────────────

/// Walks the parsed tree and dispatches to one handler collaborator,
/// constructed once per run.
pub struct Executor<'a> {
    registry: &'a Registry,
    handler: Box<dyn CommandHandler>,
    cancel: CancellationFlag,
}

impl<'a> Executor<'a> {
    pub fn new(registry: &'a Registry, handler: Box<dyn CommandHandler>) -> Self {
        Executor {
            registry,
            handler,
            cancel: CancellationFlag::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute top-level items in textual order.
    ///
    /// Returns `Err` only for static errors, before any handler call.
    /// Runtime failures surface inside the returned report; execution
    /// stops at the first fatal one.
    pub async fn run(&self, script: &Script) -> Result<ScriptReport, DirectiveError> {
        validate_script(script, self.registry)?;

        let mut outcomes = Vec::new();
        let mut error = None;
        for item in &script.items {
            match item {
                Item::Invocation(inv) => match self.dispatch_top_level(inv).await {
                    Ok(value) => outcomes.push(ItemOutcome::Invocation {
                        command: inv.command.clone(),
                        value,
                    }),
                    Err(e) => {
                        error = Some(e);
                        break;
                    }
                },
                Item::Chain(chain) => {
                    let (outcome, chain_error) = self.run_chain(chain).await;
                    outcomes.push(ItemOutcome::Chain(outcome));
                    if chain_error.is_some() {
                        error = chain_error;
                        break;
                    }
                }
            }
        }
        Ok(ScriptReport { outcomes, error })
    }

    async fn dispatch_top_level(&self, inv: &Invocation) -> Result<Value, DirectiveError> {
        let input = match &inv.input {
            InputRef::Literal(s) => Value::String(s.clone()),
            // The parser rejects bindings outside chains; guard hand-built ASTs
            InputRef::Binding(phrase) => {
                return Err(DirectiveError::binding(
                    inv.line,
                    inv.column,
                    format!("reference '{}' outside a chain cannot resolve", phrase),
                ));
            }
        };
        self.handler
            .invoke(&inv.command, &input, &inv.modifiers)
            .await
            .map_err(|e| DirectiveError::execution(inv.line, inv.column, &inv.command, e.message))
    }

    async fn run_chain(&self, chain: &Chain) -> (ChainOutcome, Option<DirectiveError>) {
        let mut table = ResultTable::new();
        let mut steps: Vec<StepRecord> = Vec::new();

        for (i, step) in chain.steps.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return (
                    ChainOutcome {
                        state: ChainState::Aborted { failed_step: i },
                        steps,
                        result: None,
                    },
                    Some(DirectiveError::execution(
                        step.line,
                        step.column,
                        &step.command,
                        "chain cancelled",
                    )),
                );
            }

            // Binding search space is exactly the slots of steps 0..i-1
            let input = match &step.input {
                InputRef::Literal(s) => Value::String(s.clone()),
                InputRef::Binding(phrase) => match table.resolve(phrase) {
                    Ok(value) => value.clone(),
                    Err(binding_err) => {
                        return (
                            ChainOutcome {
                                state: ChainState::Aborted { failed_step: i },
                                steps,
                                result: None,
                            },
                            Some(DirectiveError::binding(
                                step.line,
                                step.column,
                                binding_err.to_string(),
                            )),
                        );
                    }
                },
            };

            match self
                .handler
                .invoke(&step.command, &input, &step.modifiers)
                .await
            {
                Ok(value) => {
                    table.insert(step.slot.clone(), value.clone());
                    steps.push(StepRecord {
                        slot: step.slot.clone(),
                        command: step.command.clone(),
                        value,
                    });
                }
                Err(handler_err) => {
                    return (
                        ChainOutcome {
                            state: ChainState::Aborted { failed_step: i },
                            steps,
                            result: None,
                        },
                        Some(DirectiveError::execution(
                            step.line,
                            step.column,
                            &step.command,
                            handler_err.message,
                        )),
                    );
                }
            }
        }

        let result = steps.last().map(|record| record.value.clone());
        (
            ChainOutcome {
                state: ChainState::Completed,
                steps,
                result,
            },
            None,
        )
    }
}
