//! Registry of generator factories.
//!
//! Each target registers one factory. There is no global registry: build a
//! `GeneratorRegistry` once and hand it to whoever orchestrates translation.

use crate::traits::Generator;
use normalize_language_meta::Language;
use std::collections::BTreeMap;

/// Builds a fresh generator instance.
pub type GeneratorFactory = Box<dyn Fn() -> Box<dyn Generator> + Send + Sync>;

/// One generator factory per target language.
#[derive(Default)]
pub struct GeneratorRegistry {
    factories: BTreeMap<Language, GeneratorFactory>,
}

impl GeneratorRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every generator enabled by cargo features.
    pub fn with_builtins() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "write-rust")]
        {
            registry.register(Language::Rust, || Box::new(crate::output::RustGenerator));
        }
        #[cfg(feature = "write-go")]
        {
            registry.register(Language::Go, || Box::new(crate::output::GoGenerator));
        }
        #[cfg(feature = "write-python")]
        {
            registry.register(Language::Python, || Box::new(crate::output::PythonGenerator));
        }
        #[cfg(feature = "write-typescript")]
        {
            registry.register(Language::TypeScript, || {
                Box::new(crate::output::TypeScriptGenerator)
            });
        }
        #[cfg(feature = "write-java")]
        {
            registry.register(Language::Java, || Box::new(crate::output::JavaGenerator));
        }
        #[cfg(feature = "write-javascript")]
        {
            registry.register(Language::JavaScript, || {
                Box::new(crate::output::JavaScriptGenerator)
            });
        }
        #[cfg(feature = "write-cpp")]
        {
            registry.register(Language::Cpp, || Box::new(crate::output::CppGenerator));
        }
        tracing::debug!(generators = registry.factories.len(), "generator registry built");
        registry
    }

    /// Register (or replace) the factory for `language`.
    pub fn register<F>(&mut self, language: Language, factory: F)
    where
        F: Fn() -> Box<dyn Generator> + Send + Sync + 'static,
    {
        self.factories.insert(language, Box::new(factory));
    }

    /// Fresh generator for `language`, if one is registered.
    pub fn generator_for(&self, language: Language) -> Option<Box<dyn Generator>> {
        self.factories.get(&language).map(|factory| factory())
    }

    pub fn has(&self, language: Language) -> bool {
        self.factories.contains_key(&language)
    }

    /// Registered targets in `Language` order.
    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.factories.keys().copied()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("languages", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry_has_nothing() {
        let registry = GeneratorRegistry::new();
        assert!(registry.generator_for(Language::Rust).is_none());
        assert_eq!(registry.languages().count(), 0);
    }

    #[test]
    #[cfg(feature = "write-rust")]
    fn test_rust_generator_lookup() {
        let registry = GeneratorRegistry::with_builtins();
        let generator = registry.generator_for(Language::Rust).expect("rust generator");
        assert_eq!(generator.language(), Language::Rust);
        assert_eq!(generator.extension(), "rs");
    }

    #[test]
    #[cfg(all(
        feature = "write-rust",
        feature = "write-go",
        feature = "write-python",
        feature = "write-typescript",
        feature = "write-java",
        feature = "write-javascript",
        feature = "write-cpp"
    ))]
    fn test_builtins_cover_seven_targets() {
        let registry = GeneratorRegistry::with_builtins();
        let langs: Vec<_> = registry.languages().collect();
        assert_eq!(
            langs,
            [
                Language::Java,
                Language::Python,
                Language::Rust,
                Language::Go,
                Language::JavaScript,
                Language::TypeScript,
                Language::Cpp
            ]
        );
        assert!(!registry.has(Language::Kotlin));
        let cpp = registry.generator_for(Language::Cpp).expect("c++ generator");
        assert_eq!(cpp.extension(), "cpp");
    }

    #[test]
    #[cfg(feature = "write-python")]
    fn test_register_replaces_factory() {
        let mut registry = GeneratorRegistry::new();
        registry.register(Language::Kotlin, || Box::new(crate::output::PythonGenerator));
        let generator = registry.generator_for(Language::Kotlin).expect("registered");
        assert_eq!(generator.language(), Language::Python);
    }
}
