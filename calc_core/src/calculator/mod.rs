//! # Calculator Engine
//!
//! A four-function calculator driven one key at a time. The engine owns its
//! display text, the left operand, the pending operator, and a bounded
//! history of completed operations.
//!
//! ## Evaluation Order
//!
//! Operators apply strictly left to right with no precedence, the way a
//! pocket calculator behaves: `2 + 3 * 4 =` shows `20`, not `14`.
//!
//! ## Errors Are Data
//!
//! No operation returns an error or panics. Division by zero and an
//! unparsable display write an error marker into the display and leave the
//! rest of the state usable; the next digit, `.`, or [`Calculator::clear`]
//! resumes normal input.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculator::{Calculator, Operator};
//!
//! let mut calc = Calculator::default();
//! calc.input_digit("5");
//! calc.perform_operation(Operator::Add);
//! calc.input_digit("3");
//! calc.perform_operation(Operator::Evaluate);
//!
//! assert_eq!(calc.get_display(), "8");
//! assert_eq!(calc.get_history()[0].expression, "5 + 3");
//! assert_eq!(calc.get_display_as_currency("USD"), "$8.00");
//! ```

pub mod operator;
pub mod state;

use std::fmt;
use std::sync::Arc;

use serde_json::json;

use crate::config::{CalculatorConfig, ConfigUpdate};
use crate::currency::format_currency;
use crate::errors::CalcError;
use crate::history::{History, HistoryEntry};
use crate::logger::{CalcLogger, LogLevel, NullLogger};
use crate::numeric::{format_number, parse_display, round_and_clamp};

pub use operator::Operator;
pub use state::{CalculatorState, ERROR_DIVIDE_BY_ZERO, ERROR_INVALID_NUMBER, INITIAL_DISPLAY};

use state::is_error_display;

/// The capability set a UI binding drives.
///
/// Front ends program against this trait rather than the concrete engine,
/// so each binding adapts independently.
pub trait CalculatorApi {
    fn input_digit(&mut self, digit: &str);
    fn input_dot(&mut self);
    fn backspace(&mut self);
    fn clear(&mut self);
    fn perform_operation(&mut self, op: Operator);
    fn get_display(&self) -> String;
    fn get_history(&self) -> Vec<HistoryEntry>;
}

/// Calculator engine. Each instance is fully independent.
pub struct Calculator {
    config: CalculatorConfig,
    display: String,
    previous_value: Option<f64>,
    operation: Option<Operator>,
    waiting_for_operand: bool,
    history: History,
    logger: Arc<dyn CalcLogger>,
}

impl Calculator {
    /// Create an engine that reports to `logger`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use calc_core::calculator::Calculator;
    /// use calc_core::config::CalculatorConfig;
    /// use calc_core::logger::{LoggerConfig, MemoryLogger};
    ///
    /// let logger = Arc::new(MemoryLogger::new(LoggerConfig::default()));
    /// let calc = Calculator::new(CalculatorConfig::default(), logger.clone());
    /// assert_eq!(calc.get_display(), "0");
    /// ```
    pub fn new(config: CalculatorConfig, logger: Arc<dyn CalcLogger>) -> Self {
        let calc = Calculator {
            config,
            display: INITIAL_DISPLAY.to_string(),
            previous_value: None,
            operation: None,
            waiting_for_operand: false,
            history: History::new(),
            logger,
        };
        calc.log(
            LogLevel::Info,
            "Calculator initialized",
            Some(json!({ "config": &calc.config })),
        );
        calc
    }

    /// Create an engine that logs nothing.
    pub fn with_config(config: CalculatorConfig) -> Self {
        Calculator::new(config, Arc::new(NullLogger))
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Enter one decimal digit given as a one-character string.
    ///
    /// Anything other than a single `0`-`9` is ignored.
    pub fn input_digit(&mut self, digit: &str) {
        let mut chars = digit.chars();
        match (chars.next(), chars.next()) {
            (Some(key), None) => self.input_digit_char(key),
            _ => self.log(LogLevel::Debug, "Ignored digit input", Some(json!({ "input": digit }))),
        }
    }

    /// Enter one decimal digit.
    pub fn input_digit_char(&mut self, digit: char) {
        if !digit.is_ascii_digit() {
            self.log(
                LogLevel::Debug,
                "Ignored digit input",
                Some(json!({ "input": digit.to_string() })),
            );
            return;
        }

        if self.waiting_for_operand || self.is_error() || self.display == INITIAL_DISPLAY {
            self.display = digit.to_string();
            self.waiting_for_operand = false;
        } else {
            self.display.push(digit);
        }
        self.truncate_display();

        self.log(
            LogLevel::Debug,
            "Digit input",
            Some(json!({ "digit": digit.to_string(), "display": &self.display })),
        );
    }

    /// Enter a decimal point. Repeated presses are no-ops.
    pub fn input_dot(&mut self) {
        if self.waiting_for_operand || self.is_error() {
            self.display = "0.".to_string();
            self.waiting_for_operand = false;
        } else if !self.display.contains('.') {
            self.display.push('.');
            self.truncate_display();
        } else {
            return;
        }

        self.log(LogLevel::Debug, "Decimal point input", Some(json!({ "display": &self.display })));
    }

    /// Delete the last character of the display.
    pub fn backspace(&mut self) {
        if self.is_error() || self.display.chars().count() <= 1 {
            self.display = INITIAL_DISPLAY.to_string();
        } else {
            self.display.pop();
            if self.display == "-" {
                self.display = INITIAL_DISPLAY.to_string();
            }
        }

        self.log(LogLevel::Debug, "Backspace", Some(json!({ "display": &self.display })));
    }

    /// Reset display, operand, and pending operator. History is kept.
    pub fn clear(&mut self) {
        self.display = INITIAL_DISPLAY.to_string();
        self.previous_value = None;
        self.operation = None;
        self.waiting_for_operand = false;

        self.log(LogLevel::Info, "Calculator cleared", None);
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Press an operator key.
    ///
    /// The display becomes the right operand. With no left operand yet it is
    /// adopted as the left operand; otherwise the pending operation runs and
    /// its result becomes the new left operand. Either way `op` becomes the
    /// pending operator, `Evaluate` included.
    pub fn perform_operation(&mut self, op: Operator) {
        let Some(input_value) = parse_display(&self.display) else {
            let error = CalcError::calculation_failed(
                op.symbol(),
                format!("Display '{}' is not a finite number", self.display),
            );
            self.fail(ERROR_INVALID_NUMBER, &error);
            return;
        };

        match (self.previous_value, self.operation) {
            (Some(left), Some(pending)) if pending.is_binary() => {
                let result = match pending.apply(left, input_value) {
                    Ok(raw) => round_and_clamp(raw, self.config.decimal_places),
                    Err(error) => {
                        let marker = if pending == Operator::Divide {
                            ERROR_DIVIDE_BY_ZERO
                        } else {
                            ERROR_INVALID_NUMBER
                        };
                        self.fail(marker, &error);
                        return;
                    }
                };

                let expression = format!("{} {} {}", format_number(left), pending.symbol(), format_number(input_value));
                self.display = format_number(result);
                self.previous_value = Some(result);

                self.log(
                    LogLevel::Debug,
                    "Operation performed",
                    Some(json!({ "expression": &expression, "result": result })),
                );

                if self.config.enable_history {
                    self.history.push(HistoryEntry::new(expression, result));
                }
            }
            _ => {
                // No left operand yet, or the last key was `=`: start a new chain
                self.previous_value = Some(input_value);
            }
        }

        self.waiting_for_operand = true;
        self.operation = Some(op);
    }

    /// Press an operator key given as text. Unknown keys are ignored.
    pub fn perform_operation_str(&mut self, op: &str) {
        match op.parse::<Operator>() {
            Ok(op) => self.perform_operation(op),
            Err(error) => self.log(
                LogLevel::Warn,
                "Ignored unknown operator",
                Some(json!({ "input": op, "error": error.to_string() })),
            ),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Current display text
    pub fn get_display(&self) -> String {
        self.display.clone()
    }

    /// Borrowed display text
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Display formatted as a currency amount in `currency_code`.
    ///
    /// When the display is not a finite number (an error marker, for
    /// instance) or the code is malformed, the raw display is returned.
    pub fn get_display_as_currency(&self, currency_code: &str) -> String {
        let Some(value) = parse_display(&self.display) else {
            return self.display.clone();
        };

        match format_currency(value, currency_code) {
            Ok(formatted) => formatted,
            Err(error) => {
                self.log(
                    LogLevel::Warn,
                    "Currency formatting failed",
                    Some(json!({ "code": currency_code, "error": error.to_string() })),
                );
                self.display.clone()
            }
        }
    }

    /// Copy of the history, most recent first
    pub fn get_history(&self) -> Vec<HistoryEntry> {
        self.history.entries()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.log(LogLevel::Info, "History cleared", None);
    }

    /// Snapshot copy of the engine state
    pub fn get_state(&self) -> CalculatorState {
        CalculatorState {
            display: self.display.clone(),
            previous_value: self.previous_value,
            operation: self.operation,
            waiting_for_operand: self.waiting_for_operand,
            history: self.history.entries(),
        }
    }

    pub fn is_error(&self) -> bool {
        is_error_display(&self.display)
    }

    // ========================================================================
    // Configuration and Logging
    // ========================================================================

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Merge `update` into the live config.
    ///
    /// New limits apply from the next operation on; the current display and
    /// history are not re-validated.
    pub fn update_config(&mut self, update: ConfigUpdate) {
        if update.is_empty() {
            return;
        }
        self.config.apply(&update);
        self.log(LogLevel::Info, "Config updated", Some(json!({ "config": &self.config })));
    }

    /// Log entries recorded by the injected logger, as JSON
    pub fn export_logs(&self) -> String {
        self.logger.export_logs()
    }

    pub(crate) fn replace_history(&mut self, history: History) {
        self.history = history;
    }

    fn log(&self, level: LogLevel, message: &str, data: Option<serde_json::Value>) {
        if self.config.enable_logging {
            self.logger.log(level, message, data);
        }
    }

    fn fail(&mut self, marker: &str, error: &CalcError) {
        self.display = marker.to_string();
        self.log(
            LogLevel::Error,
            &error.to_string(),
            Some(json!({ "code": error.error_code(), "display": marker })),
        );
    }

    fn truncate_display(&mut self) {
        let limit = self.config.display_limit();
        if self.display.len() > limit {
            self.display.truncate(limit);
        }
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Calculator::with_config(CalculatorConfig::default())
    }
}

impl fmt::Debug for Calculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Calculator")
            .field("config", &self.config)
            .field("display", &self.display)
            .field("previous_value", &self.previous_value)
            .field("operation", &self.operation)
            .field("waiting_for_operand", &self.waiting_for_operand)
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl CalculatorApi for Calculator {
    fn input_digit(&mut self, digit: &str) {
        Calculator::input_digit(self, digit);
    }

    fn input_dot(&mut self) {
        Calculator::input_dot(self);
    }

    fn backspace(&mut self) {
        Calculator::backspace(self);
    }

    fn clear(&mut self) {
        Calculator::clear(self);
    }

    fn perform_operation(&mut self, op: Operator) {
        Calculator::perform_operation(self, op);
    }

    fn get_display(&self) -> String {
        Calculator::get_display(self)
    }

    fn get_history(&self) -> Vec<HistoryEntry> {
        Calculator::get_history(self)
    }
}
