//! dictum-eval: directive executor.
//!
//! Consumes a validated AST from `dictum-core`, resolves chain bindings,
//! and dispatches each invocation to a [`CommandHandler`] collaborator.
//! The handler performs the semantic work; this crate only decides what
//! to invoke, with what arguments, and in what order.

pub mod binding;
pub mod executor;
pub mod handler;

pub use binding::{BindingError, ResultTable};
pub use executor::{
    CancellationFlag, ChainOutcome, ChainState, Executor, ItemOutcome, ScriptReport, StepRecord,
};
pub use handler::{CommandHandler, EchoHandler, HandlerError, ScriptedHandler};

use dictum_core::{DirectiveError, Registry};

/// Check and execute a script in one call.
///
/// Static errors return `Err` before any handler invocation; runtime
/// failures surface inside the returned [`ScriptReport`].
pub async fn execute(
    src: &str,
    registry: &Registry,
    handler: Box<dyn CommandHandler>,
) -> Result<ScriptReport, DirectiveError> {
    let script = dictum_core::check(src, registry)?;
    Executor::new(registry, handler).run(&script).await
}
