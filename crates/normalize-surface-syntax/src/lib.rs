//! Language-neutral program tree and per-target code generators.
//!
//! `normalize-surface-syntax` holds the IR that translation works on and
//! one generator per target language. Generators render a `Program`
//! deterministically; idioms and semantic patterns are applied as tree
//! rewrites before the single render.
//!
//! # Architecture
//!
//! ```text
//!  Program ──lower(L1)──> Program ──lower(L2)──> ... ──render(T)──> text
//!     │                                              ▲
//!     └── idiom / pattern rewrites (apply_idiom, adapt_pattern)
//! ```
//!
//! # Example
//!
//! ```
//! use normalize_language_meta::Language;
//! use normalize_surface_syntax::{
//!     Decl, Expr, Function, GeneratorRegistry, Program, SemanticContext, Stmt, TypeRef,
//! };
//!
//! let answer = Function::new("answer", vec![], TypeRef::INT, vec![
//!     Stmt::return_stmt(Some(Expr::int(42))),
//! ]);
//! let program = Program::new(Language::Java, vec![Decl::Function(answer)]);
//!
//! let registry = GeneratorRegistry::with_builtins();
//! let python = registry.generator_for(Language::Python).unwrap();
//! let text = python.emit(&program, &SemanticContext::new(), &python.default_options());
//! assert!(text.contains("def answer() -> int:"));
//! ```

pub mod context;
pub mod ir;
pub mod lower;
pub mod options;
pub mod output;
pub mod registry;
pub mod shape;
pub mod traits;
pub mod walk;

pub(crate) mod emitter;

// Re-exports: IR types
pub use ir::{
    BinaryOp, ClassDecl, ClassKind, Decl, Expr, Field, Function, Hint, Literal, Param, Primitive,
    Program, Span, Stmt, StructureEq, TypeRef, UnaryOp, VarDecl, Visibility,
};

// Re-exports: contract
pub use context::{SemanticContext, SemanticPattern};
pub use options::{OptionValue, TranslationOptions, keys};
pub use traits::{Degradation, Generator, Rendered};

// Re-exports: registry
pub use registry::{GeneratorFactory, GeneratorRegistry};

// Re-exports: built-in generators
#[cfg(feature = "write-cpp")]
pub use output::CppGenerator;
#[cfg(feature = "write-go")]
pub use output::GoGenerator;
#[cfg(feature = "write-java")]
pub use output::JavaGenerator;
#[cfg(feature = "write-javascript")]
pub use output::JavaScriptGenerator;
#[cfg(feature = "write-python")]
pub use output::PythonGenerator;
#[cfg(feature = "write-rust")]
pub use output::RustGenerator;
#[cfg(feature = "write-typescript")]
pub use output::TypeScriptGenerator;
