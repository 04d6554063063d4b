//! Translation between programming languages.
//!
//! `normalize-translate` ties the language feature registry, the per-pair
//! idiom rules and the path resolver to the generators in
//! `normalize-surface-syntax`. An [`Engine`] takes a language-neutral
//! [`Program`](normalize_surface_syntax::Program) plus a target language and
//! returns source text, memoizing results by content fingerprint.
//!
//! # Example
//!
//! ```
//! use normalize_language_meta::Language;
//! use normalize_surface_syntax::{Decl, Expr, Function, Program, Stmt, TranslationOptions, TypeRef};
//! use normalize_translate::{Engine, Strategy};
//!
//! let answer = Function::new("answer", vec![], TypeRef::INT, vec![
//!     Stmt::return_stmt(Some(Expr::int(42))),
//! ]);
//! let program = Program::new(Language::Python, vec![Decl::Function(answer)]);
//!
//! let engine = Engine::builtin();
//! assert_eq!(engine.resolve(Language::Python, Language::Rust).strategy, Strategy::Direct);
//!
//! let rust = engine.translate(&program, Language::Rust, &TranslationOptions::new()).unwrap();
//! assert!(rust.contains("fn answer() -> i32"));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod patterns;
pub mod resolve;
pub mod rules;

pub use config::{CacheConfig, IdiomConfig, ResolverConfig, TranslateConfig};
pub use engine::{Engine, Translation, feature_options};
pub use error::TranslateError;
pub use patterns::PatternDetector;
pub use resolve::{CompatibilityWeights, Strategy, TranslationMatrix, TranslationPath};
pub use rules::{LanguagePair, RuleTable};
