//! # calc_core - Calculator Engine
//!
//! `calc_core` is the computational heart of Tally, a four-function
//! calculator. It owns the key-by-key state machine and everything it leans
//! on: rounding, currency display, bounded history, an injectable leveled
//! logger, and session files. All data types are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Left to right**: no operator precedence, like a pocket calculator
//! - **Errors as data**: arithmetic failures show on the display, never panic
//! - **No globals**: the logger is passed in, every engine is independent
//! - **JSON-First**: state snapshots, history, logs, and sessions serialize
//!
//! ## Quick Start
//!
//! ```rust
//! use calc_core::calculator::{Calculator, Operator};
//!
//! let mut calc = Calculator::default();
//! calc.input_digit("2");
//! calc.perform_operation(Operator::Add);
//! calc.input_digit("3");
//! calc.perform_operation(Operator::Multiply);
//! calc.input_digit("4");
//! calc.perform_operation(Operator::Evaluate);
//!
//! assert_eq!(calc.get_display(), "20");
//! ```
//!
//! ## Modules
//!
//! - [`calculator`] - The engine, its operators and state snapshot
//! - [`config`] - Engine limits and partial updates
//! - [`history`] - Bounded, most-recent-first history
//! - [`numeric`] - Rounding, clamping, display conversions
//! - [`currency`] - en-US currency formatting
//! - [`logger`] - Leveled logger trait and ring-buffer implementation
//! - [`session`] / [`file_io`] - Session files with atomic saves and locking
//! - [`errors`] - Structured error types

pub mod calculator;
pub mod config;
pub mod currency;
pub mod errors;
pub mod file_io;
pub mod history;
pub mod logger;
pub mod numeric;
pub mod session;

// Re-export commonly used types at crate root for convenience
pub use calculator::{Calculator, CalculatorApi, CalculatorState, Operator};
pub use config::{CalculatorConfig, ConfigUpdate};
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_session, save_session, FileLock};
pub use history::HistoryEntry;
pub use logger::{CalcLogger, LogLevel, LoggerConfig, MemoryLogger, NullLogger};
pub use session::Session;
