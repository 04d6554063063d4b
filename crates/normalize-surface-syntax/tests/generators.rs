//! Cross-target checks over every built-in generator.

use normalize_language_meta::Language;
use normalize_surface_syntax::{
    BinaryOp, ClassDecl, Decl, Degradation, Expr, Field, Function, GeneratorRegistry, Param,
    Program, SemanticContext, Stmt, TypeRef, keys,
};

fn sample() -> Program {
    let account = ClassDecl::new("Account")
        .with_field(Field::new("balance", TypeRef::INT).private())
        .with_method(Function::new(
            "deposit",
            vec![Param::new("amount", TypeRef::INT)],
            TypeRef::Void,
            vec![
                Stmt::if_stmt(
                    Expr::binary(Expr::ident("amount"), BinaryOp::Le, Expr::int(0)),
                    vec![Stmt::throw(Expr::new_object(
                        "IllegalArgumentException",
                        vec![Expr::string("amount must be positive")],
                    ))],
                    None,
                ),
                Stmt::expr(Expr::assign(
                    Expr::member(Expr::ident("this"), "balance"),
                    Expr::binary(
                        Expr::member(Expr::ident("this"), "balance"),
                        BinaryOp::Add,
                        Expr::ident("amount"),
                    ),
                )),
            ],
        ));
    let total = Function::new(
        "total",
        vec![Param::new("xs", TypeRef::list(TypeRef::INT))],
        TypeRef::INT,
        vec![
            Stmt::let_decl("sum", Some(Expr::int(0))),
            Stmt::for_each(
                "x",
                Expr::ident("xs"),
                vec![Stmt::expr(Expr::assign(
                    Expr::ident("sum"),
                    Expr::binary(Expr::ident("sum"), BinaryOp::Add, Expr::ident("x")),
                ))],
            ),
            Stmt::return_stmt(Some(Expr::ident("sum"))),
        ],
    );
    Program::new(
        Language::Java,
        vec![Decl::Class(account), Decl::Function(total)],
    )
}

#[test]
fn builtin_registry_covers_every_target() {
    let registry = GeneratorRegistry::with_builtins();
    let targets: Vec<_> = registry.languages().collect();
    assert_eq!(
        targets,
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
    assert!(registry.generator_for(Language::Ruby).is_none());
}

#[test]
fn render_is_deterministic_and_leaves_the_tree_alone() {
    let registry = GeneratorRegistry::with_builtins();
    let program = sample();
    let before = program.clone();
    for language in registry.languages() {
        let Some(generator) = registry.generator_for(language) else {
            panic!("{language} registered but not constructible");
        };
        let options = generator.default_options();
        let first = generator.render(&program, &SemanticContext::new(), &options);
        let second = generator.render(&program, &SemanticContext::new(), &options);
        assert_eq!(first, second, "{language} output differs between renders");
        assert!(
            first.text.starts_with(&format!("{} Translated from Java.", comment_prefix(language))),
            "{language}: {}",
            first.text
        );
        assert!(first.text.ends_with('\n'));
    }
    assert_eq!(program, before);
}

fn comment_prefix(language: Language) -> &'static str {
    match language {
        Language::Python => "#",
        _ => "//",
    }
}

#[test]
fn comments_can_be_disabled() {
    let registry = GeneratorRegistry::with_builtins();
    for language in registry.languages() {
        let Some(generator) = registry.generator_for(language) else {
            continue;
        };
        let options = generator
            .default_options()
            .with(keys::GENERATE_COMMENTS, false);
        let text = generator.emit(&sample(), &SemanticContext::new(), &options);
        assert!(!text.contains("Translated from"), "{language}: {text}");
    }
}

#[test]
fn map_type_is_total() {
    let registry = GeneratorRegistry::with_builtins();
    let expected = [
        (Language::Java, "Object"),
        (Language::Python, "Any"),
        (Language::Rust, "Box<dyn std::any::Any>"),
        (Language::Go, "interface{}"),
        (Language::JavaScript, "object"),
        (Language::TypeScript, "any"),
        (Language::Cpp, "std::any"),
    ];
    for (language, universal) in expected {
        let Some(generator) = registry.generator_for(language) else {
            panic!("{language} missing");
        };
        assert_eq!(generator.map_type(&TypeRef::parse("Map<int")), universal);
        assert_eq!(generator.map_type(&TypeRef::named("Invoice")), "Invoice");
    }
}

#[test]
fn unresolved_types_degrade_with_a_marker() {
    let func = Function::new(
        "keep",
        vec![Param::new("v", TypeRef::parse("Map<int"))],
        TypeRef::Void,
        vec![],
    );
    let program = Program::new(Language::Java, vec![Decl::Function(func)]);
    let registry = GeneratorRegistry::with_builtins();
    let Some(python) = registry.generator_for(Language::Python) else {
        panic!("python missing");
    };
    let rendered = python.render(&program, &SemanticContext::new(), &python.default_options());
    assert!(rendered.text.contains("# TODO: unresolved type `Map<int`"));
    assert_eq!(
        rendered.degradations,
        [Degradation::UnresolvedType {
            descriptor: "Map<int".to_string(),
            substitute: "Any".to_string(),
        }]
    );
}

#[test]
fn semantic_fallback_erases_element_types() {
    let func = Function::new(
        "first",
        vec![Param::new("xs", TypeRef::list(TypeRef::INT))],
        TypeRef::INT,
        vec![Stmt::return_stmt(Some(Expr::index(Expr::ident("xs"), Expr::int(0))))],
    );
    let program = Program::new(Language::Java, vec![Decl::Function(func)]);
    let registry = GeneratorRegistry::with_builtins();
    let Some(python) = registry.generator_for(Language::Python) else {
        panic!("python missing");
    };
    let options = python.default_options().with(keys::SEMANTIC_FALLBACK, true);
    let text = python.emit(&program, &SemanticContext::new(), &options);
    assert!(text.contains("def first(xs: list[Any]) -> int:"), "{text}");
}

#[test]
fn ir_json_shape() {
    let stmt = Stmt::return_stmt(Some(Expr::int(1)));
    insta::assert_json_snapshot!(stmt, @r#"
    {
      "stmt": "return",
      "value": {
        "expr": "literal",
        "value": {
          "kind": "int",
          "value": 1
        }
      }
    }
    "#);
}
