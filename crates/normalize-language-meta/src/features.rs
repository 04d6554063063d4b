//! Language features - the semantic profile of each language.
//!
//! A profile records how a language structures programs, manages memory,
//! runs concurrent work, reports errors and checks types. Translation
//! decisions (which options to enable, how to emit a throwing function,
//! whether parameters are borrowed) are driven by comparing profiles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Dominant programming paradigm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Paradigm {
    ObjectOriented,
    Functional,
    Procedural,
    MultiParadigm,
    PrototypeFunctional,
    ObjectFunctional,
    FunctionalImperative,
    ProceduralConcurrent,
}

/// How memory is reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryModel {
    GarbageCollected,
    /// Manual allocation with scope-bound destructors.
    ManualRaii,
    OwnershipBorrowing,
    AutomaticRefCounted,
}

/// Primary concurrency model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConcurrencyModel {
    Threads,
    AsyncAwait,
    Coroutines,
    CspChannels,
    EventLoop,
    AsyncFutures,
}

/// How failures are reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorHandling {
    Exceptions,
    ResultType,
    ErrorValue,
    OptionalOrResult,
}

/// Type discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeSystem {
    StaticStrong,
    DynamicDuck,
    DynamicWeak,
    Gradual,
    StaticNullSafe,
    StaticStructural,
}

impl TypeSystem {
    /// Whether declared types are erased at runtime and optional in source.
    pub const fn is_dynamic(self) -> bool {
        matches!(self, TypeSystem::DynamicDuck | TypeSystem::DynamicWeak)
    }
}

/// Immutable semantic profile of one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageFeatures {
    pub paradigm: Paradigm,
    pub memory_model: MemoryModel,
    pub concurrency_model: ConcurrencyModel,
    pub error_handling: ErrorHandling,
    pub type_system: TypeSystem,
    /// Named idioms the language is known for (e.g., "list_comprehensions").
    pub idioms: BTreeSet<String>,
}

impl LanguageFeatures {
    pub fn new(
        paradigm: Paradigm,
        memory_model: MemoryModel,
        concurrency_model: ConcurrencyModel,
        error_handling: ErrorHandling,
        type_system: TypeSystem,
    ) -> Self {
        Self {
            paradigm,
            memory_model,
            concurrency_model,
            error_handling,
            type_system,
            idioms: BTreeSet::new(),
        }
    }

    /// Add idiomatic features.
    pub fn with_idioms(mut self, idioms: &[&str]) -> Self {
        self.idioms.extend(idioms.iter().map(|s| s.to_string()));
        self
    }

    pub fn has_idiom(&self, idiom: &str) -> bool {
        self.idioms.contains(idiom)
    }

    /// Whether the language reports failures through return values
    /// instead of unwinding.
    pub const fn returns_errors(&self) -> bool {
        matches!(
            self.error_handling,
            ErrorHandling::ResultType | ErrorHandling::ErrorValue
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_idioms_deduplicates() {
        let features = LanguageFeatures::new(
            Paradigm::Procedural,
            MemoryModel::ManualRaii,
            ConcurrencyModel::Threads,
            ErrorHandling::ErrorValue,
            TypeSystem::StaticStrong,
        )
        .with_idioms(&["macros", "macros", "pointers"]);
        assert_eq!(features.idioms.len(), 2);
        assert!(features.has_idiom("pointers"));
        assert!(features.returns_errors());
    }

    #[test]
    fn test_dynamic_type_systems() {
        assert!(TypeSystem::DynamicDuck.is_dynamic());
        assert!(TypeSystem::DynamicWeak.is_dynamic());
        assert!(!TypeSystem::Gradual.is_dynamic());
    }
}
