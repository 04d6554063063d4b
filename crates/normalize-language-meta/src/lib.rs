//! Language metadata for normalize.
//!
//! This crate provides the semantic profile of each programming language
//! the translator understands: paradigm, memory model, concurrency model,
//! error-handling style, type system and idiomatic features.
//!
//! ```
//! use normalize_language_meta::{Language, LanguageRegistry, MemoryModel};
//!
//! let registry = LanguageRegistry::builtin();
//! let rust = registry.features_of(Language::Rust);
//! assert_eq!(rust.memory_model, MemoryModel::OwnershipBorrowing);
//!
//! let lang: Language = "py".parse().unwrap();
//! assert_eq!(lang, Language::Python);
//! ```

mod features;
mod language;
mod registry;

pub use features::{
    ConcurrencyModel, ErrorHandling, LanguageFeatures, MemoryModel, Paradigm, TypeSystem,
};
pub use language::{Language, UnknownLanguage};
pub use registry::LanguageRegistry;
