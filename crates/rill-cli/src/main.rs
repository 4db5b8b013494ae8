mod args;
mod repl;

use anyhow::Context;
use args::RillArgs;
use clap::Parser;
use rill::{Engine, SourceMap};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = RillArgs::parse();
    setup_stderr_logging(cli.verbose);

    let result = match &cli.script {
        Some(script) => run_file(&cli, script),
        None => repl::run(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Install a stderr `tracing` subscriber honouring `RUST_LOG`.
fn setup_stderr_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Compile and run a script file, exposing the remaining command-line
/// arguments through `cmd_args()`.
fn run_file(cli: &RillArgs, script: &Path) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(script)
        .with_context(|| format!("cannot read script file '{}'", script.display()))?;

    let mut engine = Engine::new();
    engine.set_script_args(cli.args.clone());

    let name = script.display().to_string();
    let ast = engine
        .compile_with_source_map(&source, SourceMap::for_file(name.as_str()))
        .map_err(|err| anyhow::anyhow!("{err}"))?;

    tracing::debug!(script = %name, "running script");

    engine
        .run_ast(&ast)
        .map_err(|err| anyhow::anyhow!("{err}"))?;

    Ok(())
}
