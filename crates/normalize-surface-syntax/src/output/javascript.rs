//! JavaScript generator.
//!
//! Rendering shares the TypeScript emitter with type annotations, access
//! modifiers and interfaces switched off. `map_type` names the runtime
//! value a type becomes, for reports.

use super::typescript::{Dialect, render_module};
use crate::context::{SemanticContext, SemanticPattern};
use crate::emitter::{TypeNotes, TypeSpelling};
use crate::ir::{Primitive, Program, TypeRef};
use crate::lower;
use crate::options::{TranslationOptions, keys};
use crate::traits::{Generator, Rendered};
use normalize_language_meta::Language;

/// Emits the IR as an ES module in plain JavaScript.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaScriptGenerator;

impl TypeSpelling for JavaScriptGenerator {
    const ANY: &'static str = "object";

    fn spell(&self, ty: &TypeRef, _erase: bool, notes: &mut TypeNotes) -> String {
        match ty {
            TypeRef::Void => "undefined",
            TypeRef::Inferred | TypeRef::Any => Self::ANY,
            TypeRef::Primitive { primitive } => match primitive {
                Primitive::Bool => "boolean",
                Primitive::Char | Primitive::String => "string",
                _ => "number",
            },
            TypeRef::List { .. } => "Array",
            TypeRef::Set { .. } => "Set",
            TypeRef::Map { .. } => "Map",
            TypeRef::Optional { inner } => return self.spell(inner, false, notes),
            TypeRef::Named { name, .. } => return name.clone(),
            TypeRef::Unresolved { descriptor } => {
                notes.unresolved.push(descriptor.clone());
                Self::ANY
            }
        }
        .to_string()
    }
}

impl Generator for JavaScriptGenerator {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn default_options(&self) -> TranslationOptions {
        TranslationOptions::new()
            .with(keys::PREFER_ASYNC_AWAIT, true)
            .with(keys::USE_GC_IDIOMS, true)
            .with(keys::INCLUDE_TYPE_ANNOTATIONS, false)
            .with(keys::INDENT_SIZE, 2_i64)
    }

    fn map_type(&self, ty: &TypeRef) -> String {
        self.spell_plain(ty)
    }

    fn render(
        &self,
        program: &Program,
        _context: &SemanticContext,
        options: &TranslationOptions,
    ) -> Rendered {
        render_module(program, options, Dialect::JavaScript)
    }

    fn apply_idiom(&self, program: &mut Program, idiom: &str) -> bool {
        match idiom {
            "arrow_functions" | "array_methods" => lower::loops_to_comprehensions(program) > 0,
            _ => false,
        }
    }

    fn adapt_pattern(&self, program: &mut Program, pattern: SemanticPattern) -> bool {
        match pattern {
            // Classes, static members and promises carry these unchanged
            SemanticPattern::Singleton
            | SemanticPattern::Factory
            | SemanticPattern::Async
            | SemanticPattern::ErrorHandling => true,
            SemanticPattern::DataClass => {
                lower::hint_data_classes(program);
                true
            }
            SemanticPattern::Observer => false,
        }
    }
}
