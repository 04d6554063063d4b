//! The per-target generator contract.

use crate::context::{SemanticContext, SemanticPattern};
use crate::ir::{Program, TypeRef};
use crate::lower;
use crate::options::TranslationOptions;
use normalize_language_meta::{Language, LanguageFeatures};
use serde::Serialize;

/// A place where output quality was reduced instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    #[error("unresolved type `{descriptor}` emitted as `{substitute}`")]
    UnresolvedType {
        descriptor: String,
        substitute: String,
    },

    #[error("pattern `{pattern}` has no adaptation for {target}")]
    PatternAdaptationSkipped {
        pattern: SemanticPattern,
        target: Language,
    },
}

/// Output of a single render.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub degradations: Vec<Degradation>,
}

/// Emits the IR as source code in one target language.
///
/// Implementations hold no mutable state: every `render` builds its own
/// emission context, so one instance can serve concurrent calls.
pub trait Generator: Send + Sync {
    /// Target language.
    fn language(&self) -> Language;

    /// File extension for output (e.g., "rs").
    fn extension(&self) -> &'static str {
        self.language().extension()
    }

    /// Target-specific option defaults.
    fn default_options(&self) -> TranslationOptions;

    /// Map a type descriptor to its spelling in the target.
    ///
    /// Total: user-defined names pass through, unresolved descriptors map
    /// to the target's universal type.
    fn map_type(&self, ty: &TypeRef) -> String;

    /// Render a program. Deterministic and does not modify `program`.
    fn render(
        &self,
        program: &Program,
        context: &SemanticContext,
        options: &TranslationOptions,
    ) -> Rendered;

    /// Render and discard degradations.
    fn emit(
        &self,
        program: &Program,
        context: &SemanticContext,
        options: &TranslationOptions,
    ) -> String {
        self.render(program, context, options).text
    }

    /// Structurally lower `program` into this language's model before it
    /// renders; `features` is this language's profile.
    fn lower(&self, program: &Program, features: &LanguageFeatures) -> Program {
        lower::lower_for(program, self.language(), features)
    }

    /// Rewrite the tree toward a named idiom. Returns whether anything was
    /// done; unknown idioms are no-ops.
    fn apply_idiom(&self, _program: &mut Program, _idiom: &str) -> bool {
        false
    }

    /// Adapt a detected pattern. Returns false when this target has no
    /// adaptation for it.
    fn adapt_pattern(&self, _program: &mut Program, _pattern: SemanticPattern) -> bool {
        false
    }
}
