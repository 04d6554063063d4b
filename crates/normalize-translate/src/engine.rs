//! Translation orchestration.
//!
//! One call runs: fingerprint and cache lookup, path resolution, pattern
//! detection, option layering, lowering through every hop, idiom and
//! pattern rewrites, then a single render.

use crate::config::TranslateConfig;
use crate::error::TranslateError;
use crate::patterns::PatternDetector;
use crate::resolve::{Strategy, TranslationMatrix, TranslationPath};
use crate::rules::{LanguagePair, RuleTable};
use normalize_ca_cache::{CacheStats, Fingerprint, MemoCache, MemoryCache, NoCache};
use normalize_language_meta::{
    ConcurrencyModel, ErrorHandling, Language, LanguageFeatures, LanguageRegistry, MemoryModel,
};
use normalize_surface_syntax::{
    Degradation, Generator, GeneratorRegistry, Program, SemanticContext, SemanticPattern,
    TranslationOptions, keys, lower,
};
use serde::Serialize;
use std::collections::BTreeSet;

/// Everything a translation produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    pub text: String,
    pub path: TranslationPath,
    pub patterns: BTreeSet<SemanticPattern>,
    pub compatibility: f64,
    /// Empty when served from cache; only text is memoized.
    pub degradations: Vec<Degradation>,
    pub cached: bool,
}

impl Translation {
    /// `stem` with the target's conventional extension.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.path.target.extension())
    }
}

#[derive(Serialize)]
struct MemoKey<'a> {
    program: &'a Program,
    target: Language,
    options: &'a TranslationOptions,
}

/// Option flags implied by a target's feature profile.
pub fn feature_options(features: &LanguageFeatures) -> TranslationOptions {
    let mut options = TranslationOptions::new();
    match features.memory_model {
        MemoryModel::OwnershipBorrowing => {
            options.set(keys::EXPLICIT_MEMORY_MANAGEMENT, true);
            options.set(keys::USE_BORROWING, true);
        }
        MemoryModel::GarbageCollected => {
            options.set(keys::EXPLICIT_MEMORY_MANAGEMENT, false);
            options.set(keys::USE_GC_IDIOMS, true);
        }
        MemoryModel::ManualRaii => options.set(keys::EXPLICIT_MEMORY_MANAGEMENT, true),
        MemoryModel::AutomaticRefCounted => {}
    }
    match features.concurrency_model {
        ConcurrencyModel::AsyncAwait | ConcurrencyModel::AsyncFutures => {
            options.set(keys::PREFER_ASYNC_AWAIT, true);
        }
        ConcurrencyModel::Coroutines => options.set(keys::USE_COROUTINES, true),
        ConcurrencyModel::CspChannels => options.set(keys::USE_CHANNELS, true),
        ConcurrencyModel::Threads | ConcurrencyModel::EventLoop => {}
    }
    match features.error_handling {
        ErrorHandling::ResultType | ErrorHandling::ErrorValue => {
            options.set(keys::CONVERT_EXCEPTIONS_TO_RESULTS, true);
        }
        ErrorHandling::OptionalOrResult => options.set(keys::USE_OPTIONALS, true),
        ErrorHandling::Exceptions => {}
    }
    options
}

/// Translation engine.
///
/// Holds the read-only tables and the shared memo cache; safe to share
/// between threads. Every call builds its own context and generator.
pub struct Engine {
    languages: LanguageRegistry,
    rules: RuleTable,
    matrix: TranslationMatrix,
    generators: GeneratorRegistry,
    detector: PatternDetector,
    cache: Box<dyn MemoCache>,
    config: TranslateConfig,
}

impl Engine {
    pub fn new(
        languages: LanguageRegistry,
        rules: RuleTable,
        matrix: TranslationMatrix,
        generators: GeneratorRegistry,
        cache: Box<dyn MemoCache>,
        config: TranslateConfig,
    ) -> Self {
        tracing::info!(
            targets = generators.languages().count(),
            hub = %matrix.hub(),
            rule_pairs = rules.pair_count(),
            "translation engine ready"
        );
        Self {
            languages,
            rules,
            matrix,
            generators,
            detector: PatternDetector::builtin(),
            cache,
            config,
        }
    }

    /// Built-in tables, generators and default configuration.
    pub fn builtin() -> Self {
        Self::from_config(TranslateConfig::default())
    }

    /// Built-in tables and generators tuned by `config`.
    pub fn from_config(config: TranslateConfig) -> Self {
        let matrix = TranslationMatrix::builtin()
            .with_hub(config.resolver.hub)
            .with_weights(config.resolver.weights);
        let cache: Box<dyn MemoCache> = if config.cache.enabled {
            Box::new(MemoryCache::new(config.cache.max_entries))
        } else {
            Box::new(NoCache)
        };
        Self::new(
            LanguageRegistry::builtin(),
            RuleTable::builtin(),
            matrix,
            GeneratorRegistry::with_builtins(),
            cache,
            config,
        )
    }

    pub fn languages(&self) -> &LanguageRegistry {
        &self.languages
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn matrix(&self) -> &TranslationMatrix {
        &self.matrix
    }

    pub fn config(&self) -> &TranslateConfig {
        &self.config
    }

    /// Languages a generator is registered for.
    pub fn targets(&self) -> impl Iterator<Item = Language> + '_ {
        self.generators.languages()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn resolve(&self, source: Language, target: Language) -> TranslationPath {
        self.matrix.resolve(&self.languages, source, target)
    }

    /// Patterns present in `program`. Independent of target and options.
    pub fn analyze(&self, program: &Program) -> SemanticContext {
        self.detector.analyze(program)
    }

    /// Translate `program` to `target` and return the text.
    pub fn translate(
        &self,
        program: &Program,
        target: Language,
        options: &TranslationOptions,
    ) -> Result<String, TranslateError> {
        self.translate_detailed(program, target, options)
            .map(|t| t.text)
    }

    /// Translate, consulting and filling the memo cache.
    pub fn translate_detailed(
        &self,
        program: &Program,
        target: Language,
        options: &TranslationOptions,
    ) -> Result<Translation, TranslateError> {
        let generator = self.generator(target)?;
        let key = MemoKey {
            program,
            target,
            options,
        };
        let fingerprint = match Fingerprint::of(&key) {
            Ok(fingerprint) => Some(fingerprint),
            Err(e) => {
                tracing::warn!(error = %e, "translation not cacheable");
                None
            }
        };
        if let Some(fingerprint) = &fingerprint
            && let Some(text) = self.cache.get(fingerprint)
        {
            let path = self.resolve(program.source, target);
            tracing::debug!(%fingerprint, %path, "translation served from cache");
            return Ok(Translation {
                text,
                compatibility: path.compatibility,
                path,
                patterns: self.analyze(program).patterns,
                degradations: Vec::new(),
                cached: true,
            });
        }
        let translation = self.run(generator.as_ref(), program, target, options);
        if let Some(fingerprint) = fingerprint {
            self.cache.put(fingerprint, translation.text.clone());
        }
        Ok(translation)
    }

    /// Translate without reading or writing the cache.
    pub fn translate_uncached(
        &self,
        program: &Program,
        target: Language,
        options: &TranslationOptions,
    ) -> Result<Translation, TranslateError> {
        let generator = self.generator(target)?;
        Ok(self.run(generator.as_ref(), program, target, options))
    }

    fn generator(&self, target: Language) -> Result<Box<dyn Generator>, TranslateError> {
        self.generators
            .generator_for(target)
            .ok_or(TranslateError::NoGeneratorAvailable { target })
    }

    /// Caller options layered over generator, feature and config defaults.
    fn effective_options(
        &self,
        generator: &dyn Generator,
        path: &TranslationPath,
        options: &TranslationOptions,
    ) -> TranslationOptions {
        let mut effective = generator.default_options();
        effective.merge(&feature_options(self.languages.features_of(path.target)));
        effective.merge(&self.config.options);
        effective.merge(options);
        if path.strategy == Strategy::SemanticFallback {
            effective.set(keys::SEMANTIC_FALLBACK, true);
        }
        effective
    }

    /// Lower into an intermediate language. Hops need no generator.
    fn lower_into(&self, language: Language, program: &Program) -> Program {
        lower::lower_through(program, language, self.languages.features_of(language))
    }

    fn run(
        &self,
        generator: &dyn Generator,
        program: &Program,
        target: Language,
        options: &TranslationOptions,
    ) -> Translation {
        let source = program.source;
        let path = self.resolve(source, target);
        tracing::debug!(%path, compatibility = path.compatibility, "translation path");

        let context = self
            .analyze(program)
            .with_compatibility(path.compatibility);
        let options = self.effective_options(generator, &path, options);

        let mut hop_tree = None;
        for &hop in &path.intermediates {
            let lowered = self.lower_into(hop, hop_tree.as_ref().unwrap_or(program));
            tracing::debug!(%hop, "lowered through intermediate");
            hop_tree = Some(lowered);
        }
        let target_features = self.languages.features_of(target);
        let mut tree = generator.lower(hop_tree.as_ref().unwrap_or(program), target_features);

        let pair = LanguagePair::new(source, target);
        for idiom in &self.languages.features_of(source).idioms {
            match self.rules.rule_for(pair, idiom) {
                Some(mapped) => {
                    let applied = generator.apply_idiom(&mut tree, mapped);
                    tracing::debug!(%idiom, %mapped, applied, "idiom rule");
                }
                None => tracing::debug!(%idiom, %pair, "no idiom rule, passed through"),
            }
        }
        if context.compatibility >= self.config.idioms.threshold {
            for idiom in &target_features.idioms {
                if generator.apply_idiom(&mut tree, idiom) {
                    tracing::debug!(%idiom, "native idiom applied");
                }
            }
        }

        let mut degradations = Vec::new();
        for &pattern in &context.patterns {
            if !generator.adapt_pattern(&mut tree, pattern) {
                tracing::warn!(%pattern, %target, "pattern adaptation skipped");
                degradations.push(Degradation::PatternAdaptationSkipped { pattern, target });
            }
        }

        let rendered = generator.render(&tree, &context, &options);
        for degradation in &rendered.degradations {
            tracing::warn!(%degradation, "translation degraded");
        }
        degradations.extend(rendered.degradations);

        Translation {
            text: rendered.text,
            compatibility: path.compatibility,
            path,
            patterns: context.patterns,
            degradations,
            cached: false,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("generators", &self.generators)
            .field("hub", &self.matrix.hub())
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use normalize_surface_syntax::{Decl, Expr, Function, Param, Stmt, TypeRef};

    fn identity() -> Program {
        let func = Function::new(
            "id",
            vec![Param::new("x", TypeRef::INT)],
            TypeRef::INT,
            vec![Stmt::return_stmt(Some(Expr::ident("x")))],
        );
        Program::new(Language::Java, vec![Decl::Function(func)])
    }

    #[test]
    fn test_feature_options() {
        let languages = LanguageRegistry::builtin();
        let rust = feature_options(languages.features_of(Language::Rust));
        assert!(rust.flag(keys::EXPLICIT_MEMORY_MANAGEMENT));
        assert!(rust.flag(keys::USE_BORROWING));
        assert!(rust.flag(keys::CONVERT_EXCEPTIONS_TO_RESULTS));
        let go = feature_options(languages.features_of(Language::Go));
        assert!(go.flag(keys::USE_CHANNELS));
        assert!(!go.flag(keys::EXPLICIT_MEMORY_MANAGEMENT));
    }

    #[test]
    fn test_missing_generator_is_fatal() {
        let engine = Engine::builtin();
        let err = engine
            .translate(&identity(), Language::Kotlin, &TranslationOptions::new())
            .unwrap_err();
        assert_eq!(err, TranslateError::NoGeneratorAvailable { target: Language::Kotlin });
        assert_eq!(err.to_string(), "no generator available for Kotlin");
    }

    #[test]
    fn test_cache_hit_on_second_call() {
        let engine = Engine::builtin();
        let options = TranslationOptions::new();
        let first = engine
            .translate_detailed(&identity(), Language::Python, &options)
            .unwrap();
        let second = engine
            .translate_detailed(&identity(), Language::Python, &options)
            .unwrap();
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.text, second.text);
        assert_eq!(engine.cache_stats().hits, 1);
        assert_eq!(second.file_name("id"), "id.py");
    }

    #[test]
    fn test_options_change_the_key() {
        let engine = Engine::builtin();
        let plain = engine
            .translate_detailed(&identity(), Language::Python, &TranslationOptions::new())
            .unwrap();
        let quiet = TranslationOptions::new().with(keys::GENERATE_COMMENTS, false);
        let other = engine
            .translate_detailed(&identity(), Language::Python, &quiet)
            .unwrap();
        assert!(!other.cached);
        assert_ne!(plain.text, other.text);
    }

    #[test]
    fn test_disabled_cache_never_hits() {
        let mut config = TranslateConfig::default();
        config.cache.enabled = false;
        let engine = Engine::from_config(config);
        let options = TranslationOptions::new();
        engine.translate(&identity(), Language::Go, &options).unwrap();
        let again = engine
            .translate_detailed(&identity(), Language::Go, &options)
            .unwrap();
        assert!(!again.cached);
    }
}
