use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments of the `rill` interpreter.
#[derive(Debug, Parser)]
#[command(name = "rill")]
#[command(version, about = "Interpreter for the Rill scripting language")]
pub struct RillArgs {
    /// Enable a verbose logging format.
    #[arg(long)]
    pub verbose: bool,
    /// Script file to run; omit to start the REPL.
    pub script: Option<PathBuf>,
    /// Arguments exposed to the script through cmd_args().
    #[arg(trailing_var_arg = true)]
    pub args: Vec<String>,
}
