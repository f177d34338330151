//! Match variable store.
//!
//! A flat string-keyed map of string-encoded values. The engine writes
//! event context (`movedCard`, `phase`, ...) through the internal
//! setter; rule commands go through [`VariableStore::set`], which
//! rejects the system-reserved names.

use rustc_hash::FxHashMap;
use tracing::warn;

/// Names written only by the engine itself.
pub const RESERVED_NAMES: &[&str] = &[
    "phase",
    "subphase",
    "turnNumber",
    "matchNumber",
    "usedCard",
    "usedZone",
    "movedCard",
    "oldZone",
    "newZone",
    "message",
    "actionName",
    "variable",
    "value",
    "additionalInfo",
    "rule",
    "ruleName",
];

/// Check whether a variable name is system-reserved.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// String-keyed variable map shared by conditions, getters, and
/// commands.
#[derive(Clone, Debug, Default)]
pub struct VariableStore {
    values: FxHashMap<String, String>,
}

impl VariableStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a variable is currently defined.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Read a variable's raw string value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Read a variable as a number, if it parses.
    #[must_use]
    pub fn get_num(&self, name: &str) -> Option<f64> {
        self.get(name)?.trim().parse().ok()
    }

    /// Write a variable, rejecting system-reserved names.
    ///
    /// Returns false (and leaves the store unchanged) on a reserved
    /// name.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        if is_reserved(name) {
            warn!(variable = name, "rejected write to reserved variable");
            return false;
        }
        self.values.insert(name.to_string(), value.into());
        true
    }

    /// Engine-internal write; bypasses the reserved-name check.
    pub(crate) fn set_system(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Iterate all defined variables.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get() {
        let mut vars = VariableStore::new();
        assert!(!vars.has("score"));
        assert!(vars.set("score", "10"));
        assert_eq!(vars.get("score"), Some("10"));
        assert_eq!(vars.get_num("score"), Some(10.0));
    }

    #[test]
    fn test_reserved_rejected() {
        let mut vars = VariableStore::new();
        vars.set_system("turnNumber", "3");
        assert!(!vars.set("turnNumber", "99"));
        assert_eq!(vars.get("turnNumber"), Some("3"));
    }

    #[test]
    fn test_system_write_allowed() {
        let mut vars = VariableStore::new();
        vars.set_system("phase", "Draw");
        assert_eq!(vars.get("phase"), Some("Draw"));
    }

    #[test]
    fn test_get_num_non_numeric() {
        let mut vars = VariableStore::new();
        vars.set("note", "hello");
        assert_eq!(vars.get_num("note"), None);
    }
}
