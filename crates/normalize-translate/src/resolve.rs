//! Translation path resolution and compatibility scoring.
//!
//! A path is chosen in fixed priority order: a registered direct
//! translation, then a hop through the hub language, then a hop through
//! any language the source reaches directly, and finally a structural,
//! type-erased fallback. Resolution never fails.

use normalize_language_meta::{Language, LanguageFeatures, LanguageRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// How a translation reaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    Direct,
    ViaIntermediate,
    /// No known route: emit structurally with erased element types.
    SemanticFallback,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Direct => "DIRECT",
            Strategy::ViaIntermediate => "VIA_INTERMEDIATE",
            Strategy::SemanticFallback => "SEMANTIC_FALLBACK",
        })
    }
}

/// Result of resolving (source, target).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationPath {
    pub source: Language,
    pub target: Language,
    pub strategy: Strategy,
    /// Languages traversed between source and target, in order.
    pub intermediates: Vec<Language>,
    /// Product of the compatibility scores of every hop.
    pub compatibility: f64,
}

impl TranslationPath {
    /// Every language the tree is lowered into, ending with the target.
    pub fn hops(&self) -> impl Iterator<Item = Language> + '_ {
        self.intermediates
            .iter()
            .copied()
            .chain(std::iter::once(self.target))
    }
}

impl fmt::Display for TranslationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        for hop in self.hops() {
            write!(f, " -> {hop}")?;
        }
        write!(f, " ({})", self.strategy)
    }
}

/// Multipliers applied when two feature profiles differ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatibilityWeights {
    pub paradigm: f64,
    pub memory: f64,
    pub errors: f64,
}

impl Default for CompatibilityWeights {
    fn default() -> Self {
        Self {
            paradigm: 0.8,
            memory: 0.7,
            errors: 0.9,
        }
    }
}

impl CompatibilityWeights {
    /// Score in `0.0..=1.0`; 1.0 when paradigm, memory model and error
    /// handling all match.
    pub fn score(&self, source: &LanguageFeatures, target: &LanguageFeatures) -> f64 {
        let mut score = 1.0;
        if source.paradigm != target.paradigm {
            score *= self.paradigm;
        }
        if source.memory_model != target.memory_model {
            score *= self.memory;
        }
        if source.error_handling != target.error_handling {
            score *= self.errors;
        }
        score.clamp(0.0, 1.0)
    }
}

/// Registered direct translations plus the resolution policy.
#[derive(Debug, Clone)]
pub struct TranslationMatrix {
    direct: BTreeMap<Language, BTreeSet<Language>>,
    hub: Language,
    weights: CompatibilityWeights,
}

impl Default for TranslationMatrix {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TranslationMatrix {
    /// Matrix with no registrations.
    pub fn new(hub: Language, weights: CompatibilityWeights) -> Self {
        Self {
            direct: BTreeMap::new(),
            hub,
            weights,
        }
    }

    /// The built-in registrations, with Java as hub.
    pub fn builtin() -> Self {
        use Language::*;

        let mut matrix = Self::new(Java, CompatibilityWeights::default());

        for target in [Java, JavaScript, TypeScript, Go, Rust] {
            matrix.register_bidirectional(Python, target);
        }
        matrix.register_direct(Python, Cpp);
        matrix.register_direct(Python, CSharp);

        matrix.register_bidirectional(JavaScript, TypeScript);
        matrix.register_bidirectional(JavaScript, Java);
        for target in [Python, Go, Rust] {
            matrix.register_direct(JavaScript, target);
        }

        matrix.register_bidirectional(Java, Kotlin);
        matrix.register_bidirectional(Java, Scala);
        for target in [Python, CSharp, Go, TypeScript] {
            matrix.register_direct(Java, target);
        }

        matrix.register_bidirectional(Cpp, Rust);
        for target in [Go, Java, Python, CSharp] {
            matrix.register_direct(Cpp, target);
        }

        for target in [Java, TypeScript, Python, Go, Cpp] {
            matrix.register_direct(CSharp, target);
        }
        for target in [Rust, Java, Python, TypeScript] {
            matrix.register_direct(Go, target);
        }
        for target in [Go, Java, Python, TypeScript] {
            matrix.register_direct(Rust, target);
        }

        // Mobile
        matrix.register_bidirectional(Swift, Kotlin);
        matrix.register_direct(Swift, Java);
        matrix.register_direct(Kotlin, Java);
        matrix.register_direct(JavaScript, Dart);
        matrix.register_direct(TypeScript, Dart);

        for target in [Kotlin, Rust, Go] {
            matrix.register_direct(Scala, target);
        }

        // Scripting
        matrix.register_bidirectional(Python, Ruby);
        matrix.register_bidirectional(Python, Php);

        // Systems
        for target in [Rust, Go, Java] {
            matrix.register_direct(C, target);
        }
        matrix
    }

    pub fn with_hub(mut self, hub: Language) -> Self {
        self.hub = hub;
        self
    }

    pub fn with_weights(mut self, weights: CompatibilityWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn hub(&self) -> Language {
        self.hub
    }

    pub fn weights(&self) -> &CompatibilityWeights {
        &self.weights
    }

    pub fn register_direct(&mut self, source: Language, target: Language) {
        if source != target {
            self.direct.entry(source).or_default().insert(target);
        }
    }

    /// Register `source -> target` and `target -> source`.
    pub fn register_bidirectional(&mut self, source: Language, target: Language) {
        self.register_direct(source, target);
        self.register_direct(target, source);
    }

    pub fn has_direct(&self, source: Language, target: Language) -> bool {
        self.direct.get(&source).is_some_and(|t| t.contains(&target))
    }

    /// Directly registered targets of `source`, in `Language` order.
    pub fn direct_targets(&self, source: Language) -> impl Iterator<Item = Language> + '_ {
        self.direct.get(&source).into_iter().flatten().copied()
    }

    /// Feature compatibility of two languages.
    pub fn compatibility(&self, languages: &LanguageRegistry, source: Language, target: Language) -> f64 {
        self.weights
            .score(languages.features_of(source), languages.features_of(target))
    }

    /// Choose how to get from `source` to `target`.
    pub fn resolve(&self, languages: &LanguageRegistry, source: Language, target: Language) -> TranslationPath {
        let score = |a, b| self.compatibility(languages, a, b);
        let path = |strategy, intermediates: Vec<Language>| {
            let mut compatibility = 1.0;
            let mut from = source;
            for hop in intermediates.iter().copied().chain(std::iter::once(target)) {
                compatibility *= score(from, hop);
                from = hop;
            }
            TranslationPath {
                source,
                target,
                strategy,
                intermediates,
                compatibility,
            }
        };

        if source == target || self.has_direct(source, target) {
            return path(Strategy::Direct, Vec::new());
        }

        let hub = self.hub;
        if hub != source && hub != target && self.has_direct(source, hub) && self.has_direct(hub, target) {
            return path(Strategy::ViaIntermediate, vec![hub]);
        }

        // Highest product wins; ties go to the first in `Language` order
        let mut best: Option<(Language, f64)> = None;
        for candidate in self.direct_targets(source) {
            if !self.has_direct(candidate, target) {
                continue;
            }
            let product = score(source, candidate) * score(candidate, target);
            if best.is_none_or(|(_, current)| product > current) {
                best = Some((candidate, product));
            }
        }
        match best {
            Some((intermediate, _)) => path(Strategy::ViaIntermediate, vec![intermediate]),
            None => path(Strategy::SemanticFallback, Vec::new()),
        }
    }

    /// Direct targets plus everything reachable in one hop.
    pub fn supported_targets(&self, source: Language) -> BTreeSet<Language> {
        let mut supported: BTreeSet<Language> = self.direct_targets(source).collect();
        for direct in self.direct_targets(source) {
            supported.extend(self.direct_targets(direct));
        }
        supported.remove(&source);
        supported
    }

    /// Targets suited to `use_case` that `source` can reach, most
    /// compatible first.
    ///
    /// Known use cases: `web`, `mobile`, `systems`, `enterprise`, and
    /// `ml`/`ai`/`data`; anything else gets general-purpose suggestions.
    pub fn recommended_targets(
        &self,
        languages: &LanguageRegistry,
        source: Language,
        use_case: &str,
    ) -> Vec<Language> {
        use Language::*;

        let candidates: &[Language] = match use_case.to_ascii_lowercase().as_str() {
            "web" => &[JavaScript, TypeScript, Python, Java],
            "mobile" => &[Kotlin, Swift, Dart, JavaScript],
            "systems" => &[Rust, Go, Cpp, C],
            "enterprise" => &[Java, CSharp, Python, TypeScript],
            "ml" | "ai" | "data" => &[Python, Java, Scala],
            _ => &[Python, Java, JavaScript, Go],
        };
        let supported = self.supported_targets(source);
        let mut ranked: Vec<(Language, f64)> = candidates
            .iter()
            .copied()
            .filter(|t| supported.contains(t))
            .map(|t| (t, self.compatibility(languages, source, t)))
            .collect();
        // Stable: equal scores keep the use-case order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.into_iter().map(|(t, _)| t).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use normalize_language_meta::{ConcurrencyModel, ErrorHandling, MemoryModel, Paradigm, TypeSystem};

    fn languages() -> LanguageRegistry {
        LanguageRegistry::builtin()
    }

    #[test]
    fn test_direct_has_priority() {
        let matrix = TranslationMatrix::builtin();
        let path = matrix.resolve(&languages(), Language::Python, Language::Rust);
        assert_eq!(path.strategy, Strategy::Direct);
        assert!(path.intermediates.is_empty());
    }

    #[test]
    fn test_via_hub() {
        // Swift reaches Java directly, and Java reaches Python
        let matrix = TranslationMatrix::builtin();
        let path = matrix.resolve(&languages(), Language::Swift, Language::Python);
        assert_eq!(path.strategy, Strategy::ViaIntermediate);
        assert_eq!(path.intermediates, [Language::Java]);
        assert_eq!(path.to_string(), "Swift -> Java -> Python (VIA_INTERMEDIATE)");
    }

    #[test]
    fn test_via_best_scoring_intermediate() {
        let mut matrix = TranslationMatrix::new(Language::Dart, CompatibilityWeights::default());
        matrix.register_direct(Language::Java, Language::Kotlin);
        matrix.register_direct(Language::Java, Language::Go);
        matrix.register_direct(Language::Kotlin, Language::Rust);
        matrix.register_direct(Language::Go, Language::Rust);

        let registry = languages();
        let via = |l| {
            matrix.compatibility(&registry, Language::Java, l)
                * matrix.compatibility(&registry, l, Language::Rust)
        };
        let expected = if via(Language::Kotlin) > via(Language::Go) {
            Language::Kotlin
        } else {
            Language::Go
        };
        let path = matrix.resolve(&registry, Language::Java, Language::Rust);
        assert_eq!(path.strategy, Strategy::ViaIntermediate);
        assert_eq!(path.intermediates, [expected]);
    }

    #[test]
    fn test_semantic_fallback() {
        let matrix = TranslationMatrix::builtin();
        let path = matrix.resolve(&languages(), Language::Dart, Language::Ruby);
        assert_eq!(path.strategy, Strategy::SemanticFallback);
        assert!(path.intermediates.is_empty());
    }

    #[test]
    fn test_resolution_is_total() {
        let matrix = TranslationMatrix::builtin();
        let registry = languages();
        for source in Language::ALL {
            for target in Language::ALL {
                let path = matrix.resolve(&registry, source, target);
                if matrix.has_direct(source, target) {
                    assert_eq!(path.strategy, Strategy::Direct, "{source} -> {target}");
                }
                assert!((0.0..=1.0).contains(&path.compatibility));
            }
        }
    }

    #[test]
    fn test_compatibility_formula() {
        let weights = CompatibilityWeights::default();
        let gc = LanguageFeatures::new(
            Paradigm::ObjectOriented,
            MemoryModel::GarbageCollected,
            ConcurrencyModel::Threads,
            ErrorHandling::Exceptions,
            TypeSystem::StaticStrong,
        );
        let mut owned = gc.clone();
        owned.memory_model = MemoryModel::OwnershipBorrowing;
        assert_eq!(weights.score(&gc, &gc), 1.0);
        assert!((weights.score(&gc, &owned) - 0.7).abs() < 1e-9);
        owned.paradigm = Paradigm::MultiParadigm;
        owned.error_handling = ErrorHandling::ResultType;
        assert!((weights.score(&gc, &owned) - 0.8 * 0.7 * 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_supported_and_recommended() {
        let matrix = TranslationMatrix::builtin();
        let supported = matrix.supported_targets(Language::Go);
        assert!(supported.contains(&Language::Rust));
        // Go -> Java -> Kotlin
        assert!(supported.contains(&Language::Kotlin));
        assert!(!supported.contains(&Language::Go));

        let recommended = matrix.recommended_targets(&languages(), Language::Python, "systems");
        assert!(recommended.contains(&Language::Rust));
        assert!(recommended.iter().all(|t| matrix.supported_targets(Language::Python).contains(t)));
        let registry = languages();
        let scores: Vec<f64> = recommended
            .iter()
            .map(|&t| matrix.compatibility(&registry, Language::Python, t))
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }
}
