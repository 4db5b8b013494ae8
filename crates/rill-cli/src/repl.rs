//! The read-eval-print loop.

use rill::Engine;
use std::io::{self, BufRead, Write};

/// Run the REPL against a persistent engine and global scope until `exit`
/// or end of input.
pub fn run() -> anyhow::Result<()> {
    println!("Rill REPL");
    println!("Type 'exit' to quit");
    println!();

    let engine = Engine::new();
    let scope = engine.new_global_scope();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!(">>> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line == "exit" {
            break;
        }

        if let Err(err) = engine.run_with_scope(&scope, line) {
            eprintln!("Error: {}", err);
        }
    }

    Ok(())
}
