//! Process-wide preference store.
//!
//! # Responsibilities
//! - Hold flat `name → value` preferences for the lifetime of the process
//! - Fall back to a caller-supplied default when a name is unset
//! - Accept bulk updates from configuration (startup and reload)
//!
//! # Design Decisions
//! - Values are untyped (`serde_json::Value`); typed helpers cover the common reads
//! - Backed by `DashMap`, so writes after startup are safe; last write wins
//! - No persistence, no change notification

use dashmap::DashMap;
use serde_json::Value;

/// Executable used to compile Sass sources.
pub const CSS_SASS_PATH: &str = "css.sass_path";
/// Sass `--style` argument (`expanded` or `compressed`).
pub const CSS_OUTPUT_STYLE: &str = "css.output_style";
/// Executable used to compile CoffeeScript sources.
pub const JS_COFFEE_PATH: &str = "js.coffee_path";
/// Compile CoffeeScript without the top-level function safety wrapper.
pub const JS_BARE: &str = "js.bare";

/// Flat key/value preference store shared across the process.
#[derive(Debug, Default)]
pub struct Preferences {
    values: DashMap<String, Value>,
}

impl Preferences {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given preferences.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let prefs = Self::new();
        prefs.extend(entries);
        prefs
    }

    /// Set a preference, replacing any previous value.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Get a preference, or `default` if it was never set.
    pub fn get(&self, name: &str, default: impl Into<Value>) -> Value {
        match self.values.get(name) {
            Some(entry) => entry.value().clone(),
            None => default.into(),
        }
    }

    /// Get a preference rendered as a string.
    ///
    /// Non-string values are rendered with their JSON representation.
    pub fn get_str(&self, name: &str, default: &str) -> String {
        match self.get(name, default) {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    /// Get a boolean preference. Strings `"true"`/`"1"` count as true.
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        match self.get(name, default) {
            Value::Bool(b) => b,
            Value::String(s) => matches!(s.as_str(), "true" | "1"),
            Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
            _ => default,
        }
    }

    /// Upsert every entry.
    pub fn extend<I, K>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (name, value) in entries {
            self.set(name, value);
        }
    }

    /// Number of preferences currently set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
