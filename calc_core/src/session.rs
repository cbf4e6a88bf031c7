//! # Session Data Structures
//!
//! A `Session` captures what is worth keeping between runs: the engine
//! config and its history. Sessions serialize to `.calc` files as
//! human-readable JSON (see [`file_io`](crate::file_io) for atomic saves).
//!
//! ## Structure
//!
//! ```text
//! Session
//! ├── meta: SessionMetadata (version, id, timestamps)
//! ├── config: CalculatorConfig
//! └── history: Vec<HistoryEntry> (most recent first)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculator::{Calculator, Operator};
//!
//! let mut calc = Calculator::default();
//! calc.input_digit("7");
//! calc.perform_operation(Operator::Multiply);
//! calc.input_digit("6");
//! calc.perform_operation(Operator::Evaluate);
//!
//! let session = calc.to_session();
//! let json = serde_json::to_string_pretty(&session).unwrap();
//!
//! let mut restored = Calculator::default();
//! restored.restore_session(serde_json::from_str(&json).unwrap());
//! assert_eq!(restored.get_history()[0].expression, "7 * 6");
//! assert_eq!(restored.get_display(), "0");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculator::Calculator;
use crate::config::CalculatorConfig;
use crate::history::{History, HistoryEntry};

/// Current schema version for .calc files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root session container, serialized to `.calc` files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub meta: SessionMetadata,

    pub config: CalculatorConfig,

    /// Most recent first
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Session {
    /// Create an empty session with the given config.
    pub fn new(config: CalculatorConfig) -> Self {
        let now = Utc::now();
        Session {
            meta: SessionMetadata {
                version: SCHEMA_VERSION.to_string(),
                id: Uuid::new_v4(),
                created: now,
                modified: now,
            },
            config,
            history: Vec::new(),
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new(CalculatorConfig::default())
    }
}

/// Session metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    pub id: Uuid,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

impl Calculator {
    /// Capture config and history as a new session.
    pub fn to_session(&self) -> Session {
        let mut session = Session::new(self.config().clone());
        session.history = self.get_history();
        session
    }

    /// Write config and history into an existing session, keeping its id
    /// and creation time.
    pub fn update_session(&self, session: &mut Session) {
        session.config = self.config().clone();
        session.history = self.get_history();
        session.touch();
    }

    /// Replace config and history with those of `session`.
    ///
    /// Display, operand, and pending operator are reset as by
    /// [`Calculator::clear`]. History beyond the limit is dropped.
    pub fn restore_session(&mut self, session: Session) {
        let Session { config, history, .. } = session;
        self.update_config(config.into());
        self.replace_history(History::from_entries(history));
        self.clear();
    }
}
