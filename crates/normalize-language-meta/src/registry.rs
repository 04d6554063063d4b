//! Registry of language feature profiles.
//!
//! Built once, then shared read-only. There is no global instance: callers
//! construct a `LanguageRegistry` and pass it by reference.

use crate::Language;
use crate::features::{
    ConcurrencyModel, ErrorHandling, LanguageFeatures, MemoryModel, Paradigm, TypeSystem,
};
use std::collections::HashMap;

/// Feature profiles for every supported language.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    features: HashMap<Language, LanguageFeatures>,
}

impl LanguageRegistry {
    /// Registry populated with the built-in profiles.
    pub fn builtin() -> Self {
        let features = Language::ALL
            .iter()
            .map(|&lang| (lang, builtin_features(lang)))
            .collect::<HashMap<_, _>>();
        tracing::info!(languages = features.len(), "language registry initialized");
        Self { features }
    }

    /// Replace the profile of one language before the registry is shared.
    pub fn with_override(mut self, language: Language, features: LanguageFeatures) -> Self {
        self.features.insert(language, features);
        self
    }

    /// Feature profile for a language. Total over `Language`.
    pub fn features_of(&self, language: Language) -> &LanguageFeatures {
        // Every variant is inserted by `builtin()` and overrides only replace.
        &self.features[&language]
    }

    /// All languages with a profile.
    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        Language::ALL
            .into_iter()
            .filter(|lang| self.features.contains_key(lang))
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Built-in profile lookup. Exhaustive so a new `Language` variant cannot
/// be added without a profile.
fn builtin_features(language: Language) -> LanguageFeatures {
    use ConcurrencyModel as C;
    use ErrorHandling as E;
    use MemoryModel as M;
    use Paradigm as P;
    use TypeSystem as T;

    match language {
        // === Enterprise / JVM ===
        Language::Java => LanguageFeatures::new(
            P::ObjectOriented,
            M::GarbageCollected,
            C::Threads,
            E::Exceptions,
            T::StaticStrong,
        )
        .with_idioms(&["builder_pattern", "dependency_injection", "annotations"]),
        Language::Kotlin => LanguageFeatures::new(
            P::ObjectFunctional,
            M::GarbageCollected,
            C::Coroutines,
            E::Exceptions,
            T::StaticNullSafe,
        )
        .with_idioms(&[
            "extension_functions",
            "data_classes",
            "null_safety",
            "coroutines",
        ]),
        Language::Scala => LanguageFeatures::new(
            P::ObjectFunctional,
            M::GarbageCollected,
            C::AsyncFutures,
            E::OptionalOrResult,
            T::StaticStrong,
        )
        .with_idioms(&["pattern_matching", "case_classes", "implicits", "for_comprehensions"]),
        Language::CSharp => LanguageFeatures::new(
            P::ObjectOriented,
            M::GarbageCollected,
            C::AsyncAwait,
            E::Exceptions,
            T::StaticStrong,
        )
        .with_idioms(&["properties", "linq", "generics", "nullable_types"]),

        // === Scripting ===
        Language::Python => LanguageFeatures::new(
            P::MultiParadigm,
            M::GarbageCollected,
            C::AsyncAwait,
            E::Exceptions,
            T::DynamicDuck,
        )
        .with_idioms(&[
            "list_comprehensions",
            "decorators",
            "context_managers",
            "generators",
        ]),
        Language::Ruby => LanguageFeatures::new(
            P::ObjectOriented,
            M::GarbageCollected,
            C::Threads,
            E::Exceptions,
            T::DynamicDuck,
        )
        .with_idioms(&["blocks", "mixins", "metaprogramming"]),
        Language::Php => LanguageFeatures::new(
            P::MultiParadigm,
            M::GarbageCollected,
            C::Threads,
            E::Exceptions,
            T::Gradual,
        )
        .with_idioms(&["associative_arrays", "traits"]),

        // === Web ===
        Language::JavaScript => LanguageFeatures::new(
            P::PrototypeFunctional,
            M::GarbageCollected,
            C::EventLoop,
            E::Exceptions,
            T::DynamicWeak,
        )
        .with_idioms(&["closures", "promises", "destructuring", "arrow_functions"]),
        Language::TypeScript => LanguageFeatures::new(
            P::ObjectFunctional,
            M::GarbageCollected,
            C::EventLoop,
            E::Exceptions,
            T::Gradual,
        )
        .with_idioms(&["interfaces", "generics", "union_types", "decorators"]),
        Language::Dart => LanguageFeatures::new(
            P::ObjectOriented,
            M::GarbageCollected,
            C::AsyncAwait,
            E::Exceptions,
            T::StaticNullSafe,
        )
        .with_idioms(&["null_safety", "mixins", "futures"]),

        // === Systems ===
        Language::Rust => LanguageFeatures::new(
            P::FunctionalImperative,
            M::OwnershipBorrowing,
            C::AsyncFutures,
            E::ResultType,
            T::StaticStrong,
        )
        .with_idioms(&[
            "pattern_matching",
            "traits",
            "lifetimes",
            "zero_cost_abstractions",
        ]),
        Language::Go => LanguageFeatures::new(
            P::ProceduralConcurrent,
            M::GarbageCollected,
            C::CspChannels,
            E::ErrorValue,
            T::StaticStructural,
        )
        .with_idioms(&["interfaces", "goroutines", "channels", "defer"]),
        Language::Cpp => LanguageFeatures::new(
            P::MultiParadigm,
            M::ManualRaii,
            C::Threads,
            E::Exceptions,
            T::StaticStrong,
        )
        .with_idioms(&["raii", "smart_pointers", "templates", "move_semantics"]),
        Language::C => LanguageFeatures::new(
            P::Procedural,
            M::ManualRaii,
            C::Threads,
            E::ErrorValue,
            T::StaticStrong,
        )
        .with_idioms(&["pointers", "macros"]),

        // === Apple ===
        Language::Swift => LanguageFeatures::new(
            P::ObjectFunctional,
            M::AutomaticRefCounted,
            C::AsyncAwait,
            E::OptionalOrResult,
            T::StaticStrong,
        )
        .with_idioms(&["optionals", "protocols", "extensions", "closures"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_language_has_features() {
        let registry = LanguageRegistry::builtin();
        for lang in Language::ALL {
            // Must not panic
            let _ = registry.features_of(lang);
        }
        assert_eq!(registry.languages().count(), Language::ALL.len());
    }

    #[test]
    fn test_features_are_stable_across_calls() {
        let registry = LanguageRegistry::builtin();
        for lang in Language::ALL {
            assert_eq!(registry.features_of(lang), registry.features_of(lang));
            assert_eq!(
                registry.features_of(lang),
                LanguageRegistry::builtin().features_of(lang)
            );
        }
    }

    #[test]
    fn test_rust_profile() {
        let registry = LanguageRegistry::builtin();
        let rust = registry.features_of(Language::Rust);
        assert_eq!(rust.memory_model, MemoryModel::OwnershipBorrowing);
        assert_eq!(rust.error_handling, ErrorHandling::ResultType);
        assert!(rust.has_idiom("traits"));
    }

    #[test]
    fn test_override_replaces_profile() {
        let custom = LanguageFeatures::new(
            Paradigm::Functional,
            MemoryModel::GarbageCollected,
            ConcurrencyModel::Threads,
            ErrorHandling::ResultType,
            TypeSystem::StaticStrong,
        );
        let registry = LanguageRegistry::builtin().with_override(Language::Java, custom.clone());
        assert_eq!(registry.features_of(Language::Java), &custom);
        assert_ne!(
            registry.features_of(Language::Python).error_handling,
            ErrorHandling::ResultType
        );
    }
}
