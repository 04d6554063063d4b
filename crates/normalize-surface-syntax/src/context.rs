//! Per-translation semantic context.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Higher-level construct recognised in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticPattern {
    #[serde(rename = "singleton_pattern")]
    Singleton,
    #[serde(rename = "factory_pattern")]
    Factory,
    #[serde(rename = "observer_pattern")]
    Observer,
    #[serde(rename = "async_pattern")]
    Async,
    ErrorHandling,
    DataClass,
}

impl SemanticPattern {
    pub const ALL: [SemanticPattern; 6] = [
        SemanticPattern::Singleton,
        SemanticPattern::Factory,
        SemanticPattern::Observer,
        SemanticPattern::Async,
        SemanticPattern::ErrorHandling,
        SemanticPattern::DataClass,
    ];

    /// Stable pattern name.
    pub const fn name(self) -> &'static str {
        match self {
            SemanticPattern::Singleton => "singleton_pattern",
            SemanticPattern::Factory => "factory_pattern",
            SemanticPattern::Observer => "observer_pattern",
            SemanticPattern::Async => "async_pattern",
            SemanticPattern::ErrorHandling => "error_handling",
            SemanticPattern::DataClass => "data_class",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for SemanticPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Detected patterns plus the source/target compatibility score.
///
/// Built fresh for every translation and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticContext {
    pub patterns: BTreeSet<SemanticPattern>,
    /// Feature compatibility in `0.0..=1.0`.
    pub compatibility: f64,
}

impl SemanticContext {
    pub fn new() -> Self {
        Self {
            patterns: BTreeSet::new(),
            compatibility: 1.0,
        }
    }

    pub fn add(&mut self, pattern: SemanticPattern) {
        self.patterns.insert(pattern);
    }

    pub fn has(&self, pattern: SemanticPattern) -> bool {
        self.patterns.contains(&pattern)
    }

    pub fn with_compatibility(mut self, score: f64) -> Self {
        self.compatibility = score.clamp(0.0, 1.0);
        self
    }
}

impl Default for SemanticContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip() {
        for p in SemanticPattern::ALL {
            assert_eq!(SemanticPattern::from_name(p.name()), Some(p));
        }
        assert_eq!(SemanticPattern::from_name("visitor_pattern"), None);
    }

    #[test]
    fn test_serde_uses_stable_names() {
        let json = serde_json::to_string(&SemanticPattern::Singleton).unwrap();
        assert_eq!(json, "\"singleton_pattern\"");
        let json = serde_json::to_string(&SemanticPattern::DataClass).unwrap();
        assert_eq!(json, "\"data_class\"");
    }

    #[test]
    fn test_compatibility_is_clamped() {
        assert_eq!(SemanticContext::new().with_compatibility(1.7).compatibility, 1.0);
        assert_eq!(SemanticContext::new().with_compatibility(-0.2).compatibility, 0.0);
    }
}
