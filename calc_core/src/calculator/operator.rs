//! Operator keys.
//!
//! `Evaluate` (`=`) is an operator like the others: it forces the pending
//! operation to run, then stays in the pending slot until the next operator
//! replaces it. Having no pending operation at all is `Option::None`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// An operator key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "=")]
    Evaluate,
}

impl Operator {
    /// All operator keys, in keypad order
    pub const ALL: [Operator; 5] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
        Operator::Evaluate,
    ];

    /// Symbol used in history expressions
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Evaluate => "=",
        }
    }

    /// True for the four arithmetic operators
    pub fn is_binary(self) -> bool {
        !matches!(self, Operator::Evaluate)
    }

    /// Apply the operator to `left` and `right`, unrounded.
    ///
    /// `Evaluate` yields `right`. Division by exactly zero is an error.
    pub fn apply(self, left: f64, right: f64) -> CalcResult<f64> {
        let result = match self {
            Operator::Add => left + right,
            Operator::Subtract => left - right,
            Operator::Multiply => left * right,
            Operator::Divide => {
                if right == 0.0 {
                    return Err(CalcError::calculation_failed(
                        format!("{} / {}", left, right),
                        "Division by zero",
                    ));
                }
                left / right
            }
            Operator::Evaluate => right,
        };

        if result.is_nan() {
            return Err(CalcError::calculation_failed(
                format!("{} {} {}", left, self.symbol(), right),
                "Result is not a number",
            ));
        }
        Ok(result)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl TryFrom<char> for Operator {
    type Error = CalcError;

    fn try_from(key: char) -> CalcResult<Self> {
        match key {
            '+' => Ok(Operator::Add),
            '-' | '−' => Ok(Operator::Subtract),
            '*' | 'x' | 'X' | '×' => Ok(Operator::Multiply),
            '/' | '÷' => Ok(Operator::Divide),
            '=' => Ok(Operator::Evaluate),
            other => Err(CalcError::invalid_input("operator", other.to_string(), "Expected one of + - * / =")),
        }
    }
}

impl FromStr for Operator {
    type Err = CalcError;

    fn from_str(s: &str) -> CalcResult<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(key), None) => Operator::try_from(key),
            _ => Err(CalcError::invalid_input("operator", s, "Expected one of + - * / =")),
        }
    }
}
