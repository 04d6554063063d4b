//! Semantic pattern detection.
//!
//! Each detector is an independent predicate over the whole tree. Several
//! may fire on one tree; none of them looks at translation options.

use normalize_surface_syntax::walk::{any_expr, any_stmt};
use normalize_surface_syntax::{Expr, Program, SemanticContext, SemanticPattern, Stmt, shape};

type Detector = fn(&Program) -> bool;

/// Runs a fixed battery of detectors.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    detectors: Vec<(SemanticPattern, Detector)>,
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PatternDetector {
    pub fn builtin() -> Self {
        Self {
            detectors: vec![
                (SemanticPattern::Singleton, detect_singleton),
                (SemanticPattern::Factory, detect_factory),
                (SemanticPattern::Observer, detect_observer),
                (SemanticPattern::Async, detect_async),
                (SemanticPattern::ErrorHandling, detect_error_handling),
                (SemanticPattern::DataClass, detect_data_class),
            ],
        }
    }

    /// Fresh context holding every pattern found in `program`.
    pub fn analyze(&self, program: &Program) -> SemanticContext {
        let mut context = SemanticContext::new();
        for (pattern, detect) in &self.detectors {
            if detect(program) {
                tracing::trace!(%pattern, "pattern detected");
                context.add(*pattern);
            }
        }
        context
    }
}

fn detect_singleton(program: &Program) -> bool {
    program.classes().any(|c| shape::singleton_accessor(c).is_some())
}

fn detect_factory(program: &Program) -> bool {
    program.classes().any(shape::is_factory)
}

fn detect_observer(program: &Program) -> bool {
    program.classes().any(shape::is_observer)
}

fn detect_async(program: &Program) -> bool {
    program
        .functions()
        .any(|f| f.is_async || any_expr(&f.body, |e| matches!(e, Expr::Await { .. })))
}

fn detect_error_handling(program: &Program) -> bool {
    program.functions().any(|f| {
        f.throws || any_stmt(&f.body, |s| matches!(s, Stmt::Throw { .. } | Stmt::TryCatch { .. }))
    })
}

fn detect_data_class(program: &Program) -> bool {
    program.classes().any(shape::is_data_class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use normalize_language_meta::Language;
    use normalize_surface_syntax::{ClassDecl, Decl, Field, Function, TypeRef};

    fn singleton() -> ClassDecl {
        ClassDecl::new("Config")
            .with_field(Field::new("instance", TypeRef::named("Config")).private().static_())
            .with_method(
                Function::new(
                    "getInstance",
                    vec![],
                    TypeRef::named("Config"),
                    vec![Stmt::return_stmt(Some(Expr::ident("instance")))],
                )
                .static_(),
            )
    }

    #[test]
    fn test_empty_program_has_no_patterns() {
        let program = Program::new(Language::Java, vec![]);
        assert!(PatternDetector::builtin().analyze(&program).patterns.is_empty());
    }

    #[test]
    fn test_singleton_detected() {
        let program = Program::new(Language::Java, vec![Decl::Class(singleton())]);
        let context = PatternDetector::builtin().analyze(&program);
        assert!(context.has(SemanticPattern::Singleton));
        assert!(!context.has(SemanticPattern::Async));
    }

    #[test]
    fn test_async_and_errors_fire_together() {
        let func = Function::new(
            "load",
            vec![],
            TypeRef::STRING,
            vec![Stmt::try_catch(
                vec![Stmt::return_stmt(Some(Expr::await_(Expr::call(
                    Expr::ident("fetch"),
                    vec![],
                ))))],
                Some("e"),
                Some(vec![Stmt::return_stmt(Some(Expr::string("")))]),
                None,
            )],
        );
        let program = Program::new(Language::TypeScript, vec![Decl::Function(func)]);
        let context = PatternDetector::builtin().analyze(&program);
        assert!(context.has(SemanticPattern::Async));
        assert!(context.has(SemanticPattern::ErrorHandling));
    }

    #[test]
    fn test_data_class_detected() {
        let point = ClassDecl::new("Point")
            .with_field(Field::new("x", TypeRef::INT))
            .with_field(Field::new("y", TypeRef::INT));
        let program = Program::new(Language::Python, vec![Decl::Class(point)]);
        let context = PatternDetector::builtin().analyze(&program);
        assert_eq!(
            context.patterns.into_iter().collect::<Vec<_>>(),
            [SemanticPattern::DataClass]
        );
    }
}
