//! # Telemetry interface
//!
//! Telemetry is a flat key/value board shown on the driver station. Publishing is fire and
//! forget, the last value written to a key wins.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A telemetry sink.
///
/// Implementations must be internally thread safe, every task publishes to the same sink.
pub trait TelemetrySink: Send + Sync {
    fn put_number(&self, key: &str, value: f64);

    fn put_bool(&self, key: &str, value: bool);

    fn put_string(&self, key: &str, value: &str);
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// A single telemetry value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TmValue {
    Number(f64),
    Bool(bool),
    String(String),
}
