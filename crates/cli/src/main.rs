//! `dictum` -- directive language CLI.
//!
//! Thin I/O wrapper around dictum-core and dictum-eval: loads a script
//! file, runs the requested pipeline stage, renders diagnostics, and
//! selects the process exit code by diagnostic kind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use dictum_core::{DirectiveError, Registry};
use dictum_eval::{
    ChainState, CommandHandler, EchoHandler, Executor, ItemOutcome, ScriptReport, ScriptedHandler,
};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Dictum directive language toolchain.
#[derive(Parser)]
#[command(name = "dictum", version, about = "Dictum directive language toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lex and parse a script, printing the AST as JSON
    Parse {
        /// Path to the directive script
        file: PathBuf,
    },

    /// Statically check a script (parse plus modifier validation)
    Check {
        /// Path to the directive script
        file: PathBuf,
    },

    /// Execute a script against a handler backend
    Run {
        /// Path to the directive script
        file: PathBuf,
        /// JSON file mapping command names to canned responses;
        /// without it the deterministic echo backend is used
        #[arg(long)]
        canned: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Parse { file } => {
            let src = read_script(&file);
            let registry = Registry::standard();
            match dictum_core::parse(&src, &registry) {
                Ok(script) => match serde_json::to_string_pretty(&script) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("failed to serialize AST: {}", e);
                        process::exit(1);
                    }
                },
                Err(err) => fail(&err, cli.output),
            }
        }

        Commands::Check { file } => {
            let src = read_script(&file);
            let registry = Registry::standard();
            match dictum_core::check(&src, &registry) {
                Ok(script) => {
                    if cli.output == OutputFormat::Text {
                        let items = script.items.len();
                        println!("ok: {} top-level item{}", items, plural(items));
                    } else {
                        println!("{}", serde_json::json!({"status": "ok"}));
                    }
                }
                Err(err) => fail(&err, cli.output),
            }
        }

        Commands::Run { file, canned } => {
            let src = read_script(&file);
            let registry = Registry::standard();
            let handler = build_handler(canned.as_deref());
            let script = match dictum_core::check(&src, &registry) {
                Ok(script) => script,
                Err(err) => fail(&err, cli.output),
            };
            let executor = Executor::new(&registry, handler);
            match executor.run(&script).await {
                Ok(report) => {
                    render_report(&report, cli.output);
                    if let Some(err) = &report.error {
                        fail(err, cli.output);
                    }
                }
                Err(err) => fail(&err, cli.output),
            }
        }
    }
}

fn read_script(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(src) => src,
        Err(e) => {
            eprintln!("cannot read {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn build_handler(canned: Option<&Path>) -> Box<dyn CommandHandler> {
    match canned {
        None => Box::new(EchoHandler),
        Some(path) => {
            let text = match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    eprintln!("cannot read {}: {}", path.display(), e);
                    process::exit(1);
                }
            };
            let responses: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&text)
            {
                Ok(map) => map,
                Err(e) => {
                    eprintln!("invalid canned-responses file {}: {}", path.display(), e);
                    process::exit(1);
                }
            };
            Box::new(ScriptedHandler::new(responses))
        }
    }
}

fn render_report(report: &ScriptReport, output: OutputFormat) {
    if output == OutputFormat::Json {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("failed to serialize report: {}", e),
        }
        return;
    }
    for outcome in &report.outcomes {
        match outcome {
            ItemOutcome::Invocation { command, value } => {
                println!("{} -> {}", command, render_value(value));
            }
            ItemOutcome::Chain(chain) => {
                println!("chain:");
                for step in &chain.steps {
                    println!("  {} -> {}", step.slot, render_value(&step.value));
                }
                if let ChainState::Aborted { failed_step } = &chain.state {
                    println!("  aborted at step {}", failed_step + 1);
                }
            }
        }
    }
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Render a diagnostic and exit with the kind's code.
fn fail(err: &DirectiveError, output: OutputFormat) -> ! {
    match output {
        OutputFormat::Text => eprintln!("{}", err),
        OutputFormat::Json => eprintln!("{}", err.to_json_value()),
    }
    process::exit(err.exit_code());
}
