//! # Preferences interface
//!
//! Preferences are runtime switches stored on the robot which the drive team can change without
//! a rebuild. A missing or mistyped preference is never an error: the caller's default is used
//! and a warning logged.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A read-only source of preferences.
pub trait PreferencesSource: Send + Sync {
    fn get_bool(&self, key: &str, default: bool) -> bool;

    fn get_string(&self, key: &str, default: &str) -> String;
}

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Preferences held in a map, usually deserialised from the `prefs.toml` parameter file.
///
/// Values can be updated at runtime with [`MapPreferences::set`].
#[derive(Debug, Default, Deserialize)]
#[serde(from = "HashMap<String, PrefValue>")]
pub struct MapPreferences {
    values: RwLock<HashMap<String, PrefValue>>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// A single preference value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    String(String),
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl MapPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace a preference.
    pub fn set<K: Into<String>>(&self, key: K, value: PrefValue) {
        match self.values.write() {
            Ok(mut v) => {
                v.insert(key.into(), value);
            }
            Err(_) => warn!("Preferences lock poisoned, cannot set value"),
        }
    }

    fn lookup(&self, key: &str) -> Option<PrefValue> {
        match self.values.read() {
            Ok(v) => v.get(key).cloned(),
            Err(_) => None,
        }
    }
}

impl From<HashMap<String, PrefValue>> for MapPreferences {
    fn from(values: HashMap<String, PrefValue>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }
}

impl PreferencesSource for MapPreferences {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.lookup(key) {
            Some(PrefValue::Bool(b)) => b,
            Some(v) => {
                warn!(
                    "Preference {} is not a boolean (found {:?}), using default {}",
                    key, v, default
                );
                default
            }
            None => {
                warn!("Preference {} not found, using default {}", key, default);
                default
            }
        }
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.lookup(key) {
            Some(PrefValue::String(s)) => s,
            Some(v) => {
                warn!(
                    "Preference {} is not a string (found {:?}), using default {}",
                    key, v, default
                );
                default.into()
            }
            None => {
                warn!("Preference {} not found, using default {}", key, default);
                default.into()
            }
        }
    }
}
