//! Engine state snapshot.

use serde::{Deserialize, Serialize};

use super::operator::Operator;
use crate::history::HistoryEntry;

/// Display shown after a division by exactly zero
pub const ERROR_DIVIDE_BY_ZERO: &str = "Error: Division by zero";

/// Display shown when the display text is not a finite number
pub const ERROR_INVALID_NUMBER: &str = "Error: Invalid number";

/// Placeholder display of a fresh or cleared engine
pub const INITIAL_DISPLAY: &str = "0";

/// Copy of the engine state returned by
/// [`Calculator::get_state`](super::Calculator::get_state).
///
/// Mutating a snapshot has no effect on the engine it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorState {
    /// Text currently shown
    pub display: String,

    /// Left operand of the pending operation; `None` until one is entered
    pub previous_value: Option<f64>,

    /// Operator waiting for its right operand
    pub operation: Option<Operator>,

    /// Next digit starts a new operand instead of appending
    pub waiting_for_operand: bool,

    /// Completed operations, most recent first
    pub history: Vec<HistoryEntry>,
}

impl Default for CalculatorState {
    fn default() -> Self {
        CalculatorState {
            display: INITIAL_DISPLAY.to_string(),
            previous_value: None,
            operation: None,
            waiting_for_operand: false,
            history: Vec::new(),
        }
    }
}

pub(crate) fn is_error_display(display: &str) -> bool {
    display.starts_with("Error")
}
