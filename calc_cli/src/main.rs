//! # Tally CLI Application
//!
//! Line-oriented front end for the calc_core engine. Reads keys and
//! commands from stdin and prints the display after every line.
//!
//! ```text
//! calc_cli [CONFIG.json]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `calc_cli=info,calc_core=warn`).

mod repl;

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use calc_core::calculator::Calculator;
use calc_core::config::{load_config, CalculatorConfig};
use calc_core::logger::{LoggerConfig, MemoryLogger};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repl::{parse_line, App, Outcome};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calc_cli=info,calc_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match load_config(Path::new(&path)) {
            Ok(config) => {
                tracing::info!(path = %path, "Loaded config");
                config
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => CalculatorConfig::default(),
    };

    let logger = Arc::new(MemoryLogger::new(LoggerConfig::default()));
    let calc = Calculator::new(config, logger.clone());
    let user_id = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "calc_cli".to_string());
    let mut app = App::new(calc, logger, user_id);

    println!("Tally - four-function calculator");
    println!("================================");
    println!("Type `help` for commands, `quit` to exit.");
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("[{}] > ", app.calc.display());
        if io::stdout().flush().is_err() {
            break;
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                tracing::error!(error = %e, "Failed to read input");
                break;
            }
            None => break,
        };

        if !run_line(&mut app, &line) {
            break;
        }
    }

    tracing::info!(entries = app.calc.get_history().len(), "Exiting");
}

/// Execute one input line. Returns false once the user asks to quit.
fn run_line(app: &mut App, line: &str) -> bool {
    let commands = match parse_line(line) {
        Ok(commands) => commands,
        Err(e) => {
            eprintln!("Error: {}", e);
            return true;
        }
    };

    for command in commands {
        match app.execute(command) {
            Ok(Outcome::Continue(Some(output))) => println!("{}", output),
            Ok(Outcome::Continue(None)) => {}
            Ok(Outcome::Quit) => return false,
            Err(e) => {
                eprintln!("Error: {}", e);
                if let Ok(json) = serde_json::to_string_pretty(&e) {
                    tracing::debug!(error = %json, "Command failed");
                }
                if e.is_recoverable() {
                    eprintln!("(try again once the other process releases the file)");
                }
            }
        }
    }
    true
}
