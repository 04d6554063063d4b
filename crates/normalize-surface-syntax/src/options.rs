//! Translation options.
//!
//! Options are a flat, ordered map of named values. Keys a generator does
//! not understand are ignored, and a value of the wrong kind reads as the
//! key's default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Recognised option keys.
pub mod keys {
    pub const PREFER_ASYNC_AWAIT: &str = "preferAsyncAwait";
    pub const USE_COROUTINES: &str = "useCoroutines";
    pub const USE_CHANNELS: &str = "useChannels";
    pub const CONVERT_EXCEPTIONS_TO_RESULTS: &str = "convertExceptionsToResults";
    pub const USE_OPTIONALS: &str = "useOptionals";
    pub const OPTIMIZE_PERFORMANCE: &str = "optimizePerformance";
    pub const EXPLICIT_MEMORY_MANAGEMENT: &str = "explicitMemoryManagement";
    pub const USE_BORROWING: &str = "useBorrowing";
    pub const USE_GC_IDIOMS: &str = "useGcIdioms";
    pub const GENERATE_COMMENTS: &str = "generateComments";
    pub const INCLUDE_TYPE_ANNOTATIONS: &str = "includeTypeAnnotations";
    pub const INDENT_SIZE: &str = "indentSize";
    /// Set by the engine when no translation path is known; erases
    /// collection element types.
    pub const SEMANTIC_FALLBACK: &str = "semanticFallback";
}

/// A single option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        OptionValue::Float(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Str(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Str(v)
    }
}

/// Named translation options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationOptions {
    values: BTreeMap<String, OptionValue>,
}

impl TranslationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<OptionValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Boolean value of `key`, or `default` when missing or not a bool.
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(OptionValue::Bool(b)) => *b,
            _ => default,
        }
    }

    /// Boolean value of `key`, false when missing.
    pub fn flag(&self, key: &str) -> bool {
        self.bool_or(key, false)
    }

    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(OptionValue::Int(n)) => *n,
            _ => default,
        }
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(OptionValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Overlay `other` onto `self`; values in `other` win.
    pub fn merge(&mut self, other: &TranslationOptions) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    pub fn merged(mut self, other: &TranslationOptions) -> Self {
        self.merge(other);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // Typed accessors for keys with documented defaults

    pub fn generate_comments(&self) -> bool {
        self.bool_or(keys::GENERATE_COMMENTS, true)
    }

    pub fn include_type_annotations(&self) -> bool {
        self.bool_or(keys::INCLUDE_TYPE_ANNOTATIONS, true)
    }

    pub fn optimize_performance(&self) -> bool {
        self.flag(keys::OPTIMIZE_PERFORMANCE)
    }

    pub fn semantic_fallback(&self) -> bool {
        self.flag(keys::SEMANTIC_FALLBACK)
    }

    /// Spaces per indentation level, clamped to 1..=16.
    pub fn indent_size(&self) -> usize {
        self.int_or(keys::INDENT_SIZE, 4).clamp(1, 16) as usize
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for TranslationOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_missing_keys() {
        let opts = TranslationOptions::new();
        assert!(opts.generate_comments());
        assert!(opts.include_type_annotations());
        assert!(!opts.optimize_performance());
        assert_eq!(opts.indent_size(), 4);
    }

    #[test]
    fn test_wrong_type_falls_back_to_default() {
        let opts = TranslationOptions::new()
            .with(keys::OPTIMIZE_PERFORMANCE, "yes")
            .with(keys::INDENT_SIZE, true);
        assert!(!opts.optimize_performance());
        assert_eq!(opts.indent_size(), 4);
    }

    #[test]
    fn test_merge_other_wins() {
        let mut base = TranslationOptions::new()
            .with(keys::PREFER_ASYNC_AWAIT, true)
            .with(keys::INDENT_SIZE, 2i64);
        base.merge(&TranslationOptions::new().with(keys::PREFER_ASYNC_AWAIT, false));
        assert!(!base.flag(keys::PREFER_ASYNC_AWAIT));
        assert_eq!(base.indent_size(), 2);
    }

    #[test]
    fn test_unknown_keys_are_kept_but_harmless() {
        let opts: TranslationOptions = [("somethingElse", true)].into_iter().collect();
        assert!(opts.contains("somethingElse"));
        assert!(!opts.optimize_performance());
    }

    #[test]
    fn test_deserializes_from_json_object() {
        let opts: TranslationOptions =
            serde_json::from_str(r#"{"optimizePerformance": true, "indentSize": 2}"#).unwrap();
        assert!(opts.optimize_performance());
        assert_eq!(opts.indent_size(), 2);
    }
}
