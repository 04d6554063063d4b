//! Python generator.
//!
//! Emits PEP 8 names and, when `includeTypeAnnotations` is set, PEP 484
//! annotations. Record classes become `@dataclass` declarations.

use crate::context::{SemanticContext, SemanticPattern};
use crate::emitter::{
    Emitter, TypeNotes, TypeSpelling, is_print, needs_parens, number, quote, snake_case, spell_in,
};
use crate::ir::{
    BinaryOp, ClassDecl, ClassKind, Decl, Expr, Field, Function, Hint, Literal, Primitive,
    Program, Stmt, TypeRef, UnaryOp, VarDecl,
};
use crate::lower;
use crate::options::{TranslationOptions, keys};
use crate::traits::{Generator, Rendered};
use normalize_language_meta::Language;
use std::collections::BTreeMap;

/// Emits the IR as a Python 3 module.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonGenerator;

impl TypeSpelling for PythonGenerator {
    const ANY: &'static str = "Any";

    fn spell(&self, ty: &TypeRef, erase: bool, notes: &mut TypeNotes) -> String {
        match ty {
            TypeRef::Void => "None".to_string(),
            TypeRef::Inferred | TypeRef::Any => {
                notes.imports.push("from typing import Any");
                Self::ANY.to_string()
            }
            TypeRef::Primitive { primitive } => match primitive {
                Primitive::Int | Primitive::Long | Primitive::Byte => "int",
                Primitive::Float | Primitive::Double => "float",
                Primitive::Bool => "bool",
                Primitive::Char | Primitive::String => "str",
            }
            .to_string(),
            TypeRef::List { element } => {
                format!("list[{}]", self.element(element, erase, notes))
            }
            TypeRef::Set { element } => format!("set[{}]", self.element(element, erase, notes)),
            TypeRef::Map { key, value } => {
                let key = self.element(key, erase, notes);
                format!("dict[{key}, {}]", self.element(value, erase, notes))
            }
            TypeRef::Optional { inner } => {
                notes.imports.push("from typing import Optional");
                format!("Optional[{}]", self.spell(inner, erase, notes))
            }
            TypeRef::Named { name, args } if args.is_empty() => name.clone(),
            TypeRef::Named { name, args } => {
                let args: Vec<_> = args.iter().map(|a| self.element(a, erase, notes)).collect();
                format!("{name}[{}]", args.join(", "))
            }
            TypeRef::Unresolved { descriptor } => {
                notes.unresolved.push(descriptor.clone());
                notes.imports.push("from typing import Any");
                Self::ANY.to_string()
            }
        }
    }
}

impl PythonGenerator {
    fn element(&self, ty: &TypeRef, erase: bool, notes: &mut TypeNotes) -> String {
        if erase {
            notes.imports.push("from typing import Any");
        }
        self.spell_element(ty, erase, notes)
    }
}

impl Generator for PythonGenerator {
    fn language(&self) -> Language {
        Language::Python
    }

    fn default_options(&self) -> TranslationOptions {
        TranslationOptions::new()
            .with(keys::USE_GC_IDIOMS, true)
            .with(keys::PREFER_ASYNC_AWAIT, true)
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
        let program = lower::qualified(program);
        let mut emitter = PythonEmitter::new(self, &program, options);
        emitter.program(&program);
        let comments = options.generate_comments();
        let source = program.source;
        emitter.e.finish(|imports| {
            let mut header = Vec::new();
            if comments {
                header.push(format!("# Translated from {source}."));
            }
            header.extend(imports.iter().cloned());
            header
        })
    }

    fn apply_idiom(&self, program: &mut Program, idiom: &str) -> bool {
        match idiom {
            "list_comprehensions" | "comprehensions" => lower::loops_to_comprehensions(program) > 0,
            "dataclasses_constructors" => lower::hint_data_classes(program),
            _ => false,
        }
    }

    fn adapt_pattern(&self, program: &mut Program, pattern: SemanticPattern) -> bool {
        match pattern {
            SemanticPattern::Singleton => lower::hint_singletons(program),
            SemanticPattern::DataClass => lower::hint_data_classes(program),
            SemanticPattern::Factory => lower::hoist_factories(program),
            SemanticPattern::ErrorHandling | SemanticPattern::Async => true,
            SemanticPattern::Observer => false,
        }
    }
}

/// Exception used for a raised value of an unknown class.
fn builtin_exception(class: &str) -> &'static str {
    if class.contains("Argument") || class.contains("Format") {
        "ValueError"
    } else if class.contains("IndexOutOfBounds") {
        "IndexError"
    } else if class.contains("NullPointer") {
        "TypeError"
    } else if class.contains("UnsupportedOperation") {
        "NotImplementedError"
    } else if class.contains("IllegalState") || class == "RuntimeException" {
        "RuntimeError"
    } else {
        "Exception"
    }
}

/// Value an uninitialised field of type `ty` starts with.
fn zero_value(ty: &TypeRef) -> &'static str {
    match ty {
        TypeRef::Primitive { primitive } => match primitive {
            Primitive::Int | Primitive::Long | Primitive::Byte => "0",
            Primitive::Float | Primitive::Double => "0.0",
            Primitive::Bool => "False",
            Primitive::Char | Primitive::String => "\"\"",
        },
        TypeRef::List { .. } => "[]",
        TypeRef::Map { .. } => "{}",
        TypeRef::Set { .. } => "set()",
        _ => "None",
    }
}

#[derive(Default)]
struct Scope {
    class: Option<String>,
    /// Methods of the enclosing class: name → is static.
    methods: BTreeMap<String, bool>,
}

struct PythonEmitter<'a> {
    e: Emitter,
    spelling: &'a PythonGenerator,
    erase: bool,
    annotate: bool,
    classes: BTreeMap<String, ClassKind>,
    scope: Scope,
}

impl<'a> PythonEmitter<'a> {
    fn new(spelling: &'a PythonGenerator, program: &Program, options: &'a TranslationOptions) -> Self {
        Self {
            e: Emitter::new(options, "#"),
            spelling,
            erase: options.semantic_fallback(),
            annotate: options.include_type_annotations(),
            classes: program.classes().map(|c| (c.name.clone(), c.kind)).collect(),
            scope: Scope::default(),
        }
    }

    fn ty(&mut self, ty: &TypeRef) -> String {
        spell_in(self.spelling, &mut self.e, ty, self.erase)
    }

    fn program(&mut self, program: &Program) {
        if self.annotate && !self.classes.is_empty() {
            self.e.import("from __future__ import annotations");
        }
        for decl in &program.body {
            match decl {
                Decl::Class(class) => {
                    self.e.blank();
                    self.class(class);
                    self.e.blank();
                }
                Decl::Function(func) => {
                    self.e.blank();
                    self.function(func, false);
                    self.e.blank();
                }
                Decl::Variable(var) => self.variable(var, true),
            }
        }
    }

    fn class(&mut self, class: &ClassDecl) {
        let data = class.has_hint(&Hint::DataClass);
        if data {
            self.e.import("from dataclasses import dataclass");
            self.e.line("@dataclass");
        }
        let mut bases: Vec<String> = class.extends.iter().cloned().collect();
        bases.extend(class.implements.iter().cloned());
        if class.kind == ClassKind::Interface {
            self.e.import("from typing import Protocol");
            bases.push("Protocol".to_string());
        }
        if bases.is_empty() {
            self.e.open(format!("class {}:", class.name));
        } else {
            self.e.open(format!("class {}({}):", class.name, bases.join(", ")));
        }
        self.scope = Scope {
            class: Some(class.name.clone()),
            methods: class
                .methods
                .iter()
                .map(|m| (m.name.clone(), m.is_static))
                .collect(),
        };
        let singleton = class.singleton_accessor().map(str::to_string);
        let mut wrote = false;

        for field in &class.fields {
            let own = matches!(&field.ty, TypeRef::Named { name, .. } if *name == class.name);
            if field.is_static && singleton.is_some() && own {
                continue;
            }
            if field.is_static || data {
                self.class_field(field);
                wrote = true;
            }
        }

        let ctor = class.methods.iter().find(|m| lower::is_constructor(m, class));
        let instance: Vec<&Field> = class.fields.iter().filter(|f| !f.is_static).collect();
        if !data && (ctor.is_some() || !instance.is_empty()) {
            if wrote {
                self.e.blank();
            }
            self.init(ctor, &instance);
            wrote = true;
        }

        for method in &class.methods {
            if lower::is_constructor(method, class) {
                continue;
            }
            if wrote {
                self.e.blank();
            }
            if singleton.as_deref() == Some(method.name.as_str()) {
                self.singleton_accessor(method, class);
            } else {
                self.function(method, true);
            }
            wrote = true;
        }
        if !wrote {
            self.e.line("pass");
        }
        self.e.dedent();
        self.scope = Scope::default();
    }

    fn class_field(&mut self, field: &Field) {
        let name = snake_case(&field.name);
        let value = match &field.init {
            Some(init) => Some(self.expr(init)),
            // Class attributes must exist before they are read
            None if field.is_static => Some(zero_value(&field.ty).to_string()),
            None => None,
        };
        let line = match (self.annotate, value) {
            (true, Some(value)) => format!("{name}: {} = {value}", self.ty(&field.ty)),
            (true, None) => format!("{name}: {}", self.ty(&field.ty)),
            (false, Some(value)) => format!("{name} = {value}"),
            (false, None) => format!("{name} = None"),
        };
        self.e.line(line);
    }

    fn init(&mut self, ctor: Option<&Function>, fields: &[&Field]) {
        let params = ctor.map(|c| self.params(&c.params, true)).unwrap_or_else(|| "self".to_string());
        let ret = if self.annotate { " -> None" } else { "" };
        self.e.open(format!("def __init__({params}){ret}:"));
        let assigned: Vec<&str> = ctor
            .map(|c| c.body.iter().filter_map(|s| lower::field_assignment(s).map(|(f, _)| f)).collect())
            .unwrap_or_default();
        for field in fields {
            if assigned.contains(&field.name.as_str()) {
                continue;
            }
            let value = match &field.init {
                Some(init) => self.expr(init),
                None => zero_value(&field.ty).to_string(),
            };
            let name = snake_case(&field.name);
            if self.annotate {
                let ty = self.ty(&field.ty);
                self.e.line(format!("self.{name}: {ty} = {value}"));
            } else {
                self.e.line(format!("self.{name} = {value}"));
            }
        }
        if let Some(ctor) = ctor {
            self.block(&ctor.body);
        } else if fields.is_empty() {
            self.e.line("pass");
        }
        self.e.dedent();
    }

    fn singleton_accessor(&mut self, method: &Function, class: &ClassDecl) {
        self.e.import("import functools");
        self.e.line("@staticmethod");
        self.e.line("@functools.cache");
        let ret = if self.annotate {
            format!(" -> {}", class.name)
        } else {
            String::new()
        };
        self.e.open(format!("def {}(){ret}:", snake_case(&method.name)));
        self.e.line(format!("return {}()", class.name));
        self.e.dedent();
    }

    fn params(&mut self, params: &[crate::ir::Param], receiver: bool) -> String {
        let mut out = Vec::with_capacity(params.len() + 1);
        if receiver {
            out.push("self".to_string());
        }
        for p in params {
            let name = snake_case(&p.name);
            if self.annotate && !matches!(p.ty, TypeRef::Inferred) {
                out.push(format!("{name}: {}", self.ty(&p.ty)));
            } else {
                out.push(name);
            }
        }
        out.join(", ")
    }

    fn function(&mut self, func: &Function, in_class: bool) {
        let receiver = in_class && !func.is_static;
        if in_class && func.is_static {
            self.e.line("@staticmethod");
        }
        let params = self.params(&func.params, receiver);
        let ret = if self.annotate && !matches!(func.return_type, TypeRef::Inferred) {
            format!(" -> {}", self.ty(&func.return_type))
        } else {
            String::new()
        };
        let asyncness = if func.is_async { "async " } else { "" };
        let name = snake_case(&func.name);
        self.e.open(format!("{asyncness}def {name}({params}){ret}:"));
        let interface = in_class
            && self
                .scope
                .class
                .as_ref()
                .is_some_and(|c| self.classes.get(c) == Some(&ClassKind::Interface));
        if func.body.is_empty() && interface {
            self.e.line("...");
        } else {
            self.block(&func.body);
        }
        self.e.dedent();
    }

    fn variable(&mut self, var: &VarDecl, module: bool) {
        let name = if module {
            snake_case(&var.name).to_uppercase()
        } else {
            snake_case(&var.name)
        };
        let value = var.init.as_ref().map(|init| self.expr(init));
        let typed = self.annotate && !matches!(var.ty, TypeRef::Inferred);
        let line = match (typed, value) {
            (true, Some(value)) => format!("{name}: {} = {value}", self.ty(&var.ty)),
            (true, None) => format!("{name}: {}", self.ty(&var.ty)),
            (false, Some(value)) => format!("{name} = {value}"),
            (false, None) => format!("{name} = None"),
        };
        self.e.line(line);
    }

    /// Indented suite; empty suites get `pass`.
    fn suite(&mut self, header: String, stmts: &[Stmt]) {
        self.e.open(header);
        self.block(stmts);
        self.e.dedent();
    }

    fn block(&mut self, stmts: &[Stmt]) {
        if stmts.is_empty() {
            self.e.line("pass");
        }
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr { expr } => {
                let text = self.expr(expr);
                self.e.line(text);
            }
            Stmt::Let(var) => self.variable(var, false),
            Stmt::Block { body } => {
                for stmt in body {
                    self.stmt(stmt);
                }
            }
            Stmt::If {
                test,
                consequent,
                alternate,
            } => self.if_chain("if", test, consequent, alternate.as_deref()),
            Stmt::While { test, body } => {
                let test = self.expr(test);
                self.suite(format!("while {test}:"), body);
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.stmt(init);
                }
                let test = test
                    .as_ref()
                    .map(|t| self.expr(t))
                    .unwrap_or_else(|| "True".to_string());
                self.e.open(format!("while {test}:"));
                for stmt in body {
                    self.stmt(stmt);
                }
                match update {
                    Some(update) => {
                        let update = self.expr(update);
                        self.e.line(update);
                    }
                    None if body.is_empty() => self.e.line("pass"),
                    None => {}
                }
                self.e.dedent();
            }
            Stmt::ForEach {
                variable,
                iterable,
                body,
            } => {
                let iterable = self.expr(iterable);
                self.suite(format!("for {} in {iterable}:", snake_case(variable)), body);
            }
            Stmt::Return { value: Some(value) } => {
                let value = self.expr(value);
                self.e.line(format!("return {value}"));
            }
            Stmt::Return { value: None } => self.e.line("return"),
            Stmt::Break => self.e.line("break"),
            Stmt::Continue => self.e.line("continue"),
            Stmt::Throw { value } => {
                let value = self.raised(value);
                self.e.line(format!("raise {value}"));
            }
            Stmt::TryCatch {
                body,
                catch_param,
                catch_body,
                finally_body,
            } => {
                self.suite("try:".to_string(), body);
                if let Some(catch_body) = catch_body {
                    let header = match catch_param {
                        Some(param) => format!("except Exception as {}:", snake_case(param)),
                        None => "except Exception:".to_string(),
                    };
                    self.suite(header, catch_body);
                }
                if let Some(finally_body) = finally_body {
                    self.suite("finally:".to_string(), finally_body);
                }
            }
        }
    }

    fn if_chain(&mut self, keyword: &str, test: &Expr, consequent: &[Stmt], alternate: Option<&[Stmt]>) {
        let test = self.expr(test);
        self.suite(format!("{keyword} {test}:"), consequent);
        match alternate {
            Some(
                [
                    Stmt::If {
                        test,
                        consequent,
                        alternate,
                    },
                ],
            ) => self.if_chain("elif", test, consequent, alternate.as_deref()),
            Some(alt) => self.suite("else:".to_string(), alt),
            None => {}
        }
    }

    fn raised(&mut self, value: &Expr) -> String {
        match value {
            Expr::New { class, args } if !self.classes.contains_key(class) => {
                let args: Vec<_> = args.iter().map(|a| self.expr(a)).collect();
                format!("{}({})", builtin_exception(class), args.join(", "))
            }
            Expr::Literal {
                value: Literal::String(s),
            } => format!("Exception({})", quote(s)),
            other => self.expr(other),
        }
    }

    fn operand(&mut self, expr: &Expr) -> String {
        let text = self.expr(expr);
        if needs_parens(expr) {
            format!("({text})")
        } else {
            text
        }
    }

    fn ident(&self, name: &str) -> String {
        match name {
            "this" => "self".to_string(),
            _ if self.classes.contains_key(name) => name.to_string(),
            _ if name.chars().all(|c| c.is_uppercase() || c == '_' || c.is_ascii_digit()) => {
                name.to_string()
            }
            _ if name.starts_with(|c: char| c.is_uppercase()) => name.to_string(),
            _ => snake_case(name),
        }
    }

    fn expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Literal { value } => match value {
                Literal::Null => "None".to_string(),
                Literal::Bool(true) => "True".to_string(),
                Literal::Bool(false) => "False".to_string(),
                Literal::String(s) => quote(s),
                lit => number(lit).unwrap_or_default(),
            },
            Expr::Ident { name } => self.ident(name),
            Expr::Binary { left, op, right } => self.binary(left, *op, right),
            Expr::Unary { op, operand } => {
                let operand = self.operand(operand);
                match op {
                    UnaryOp::Neg => format!("-{operand}"),
                    UnaryOp::Not => format!("not {operand}"),
                }
            }
            Expr::Call { callee, args } => self.call(callee, args),
            Expr::Member { object, field } => {
                if field == "length" {
                    let object = self.expr(object);
                    return format!("len({object})");
                }
                let object = self.operand(object);
                format!("{object}.{}", snake_case(field))
            }
            Expr::Index { object, index } => {
                let object = self.operand(object);
                let index = self.expr(index);
                format!("{object}[{index}]")
            }
            Expr::Assign { target, value } => {
                let target = self.expr(target);
                let value = self.expr(value);
                format!("{target} = {value}")
            }
            Expr::New { class, args } => {
                let rendered: Vec<_> = args.iter().map(|a| self.expr(a)).collect();
                if self.classes.contains_key(class) {
                    return format!("{class}({})", rendered.join(", "));
                }
                match TypeRef::parse(class) {
                    TypeRef::List { .. } => "[]".to_string(),
                    TypeRef::Map { .. } => "{}".to_string(),
                    TypeRef::Set { .. } => "set()".to_string(),
                    _ if class.ends_with("Exception") || class.ends_with("Error") => {
                        format!("{}({})", builtin_exception(class), rendered.join(", "))
                    }
                    _ => format!("{class}({})", rendered.join(", ")),
                }
            }
            Expr::Await { value } => {
                let value = self.operand(value);
                format!("await {value}")
            }
            Expr::Array { items } => {
                let items: Vec<_> = items.iter().map(|i| self.expr(i)).collect();
                format!("[{}]", items.join(", "))
            }
            Expr::Comprehension {
                element,
                variable,
                iterable,
                condition,
            } => {
                let element = self.expr(element);
                let iterable = self.expr(iterable);
                let variable = snake_case(variable);
                match condition {
                    Some(condition) => {
                        let condition = self.expr(condition);
                        format!("[{element} for {variable} in {iterable} if {condition}]")
                    }
                    None => format!("[{element} for {variable} in {iterable}]"),
                }
            }
        }
    }

    fn binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> String {
        if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            let other = match (left, right) {
                (other, Expr::Literal { value: Literal::Null })
                | (Expr::Literal { value: Literal::Null }, other) => Some(other),
                _ => None,
            };
            if let Some(other) = other {
                let other = self.operand(other);
                let test = if op == BinaryOp::Eq { "is" } else { "is not" };
                return format!("{other} {test} None");
            }
        }
        let token = match op {
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            other => crate::emitter::c_binary_op(other),
        };
        let left = self.operand(left);
        let right = self.operand(right);
        format!("{left} {token} {right}")
    }

    fn call(&mut self, callee: &Expr, args: &[Expr]) -> String {
        let rendered: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
        let args_text = rendered.join(", ");
        if is_print(callee) {
            return format!("print({args_text})");
        }
        match callee {
            Expr::Member { object, field } => {
                if matches!(field.as_str(), "size" | "length" | "len") && args.is_empty() {
                    let object = self.expr(object);
                    return format!("len({object})");
                }
                let method = match field.as_str() {
                    "add" | "push" => "append".to_string(),
                    other => snake_case(other),
                };
                let object = self.operand(object);
                format!("{object}.{method}({args_text})")
            }
            Expr::Ident { name } => match (self.scope.methods.get(name), &self.scope.class) {
                (Some(true), Some(class)) => {
                    format!("{class}.{}({args_text})", snake_case(name))
                }
                (Some(false), Some(_)) => format!("self.{}({args_text})", snake_case(name)),
                _ => format!("{}({args_text})", self.ident(name)),
            },
            other => {
                let callee = self.operand(other);
                format!("{callee}({args_text})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Param;

    fn render(program: &Program) -> String {
        let generator = PythonGenerator;
        generator.emit(program, &SemanticContext::new(), &generator.default_options())
    }

    #[test]
    fn test_map_type() {
        let generator = PythonGenerator;
        assert_eq!(
            generator.map_type(&TypeRef::list(TypeRef::optional(TypeRef::INT))),
            "list[Optional[int]]"
        );
        assert_eq!(
            generator.map_type(&TypeRef::map(TypeRef::STRING, TypeRef::DOUBLE)),
            "dict[str, float]"
        );
    }

    #[test]
    fn test_function_with_annotations_and_raise() {
        let func = Function::new(
            "checkAge",
            vec![Param::new("age", TypeRef::INT)],
            TypeRef::INT,
            vec![
                Stmt::if_stmt(
                    Expr::binary(Expr::ident("age"), BinaryOp::Lt, Expr::int(0)),
                    vec![Stmt::throw(Expr::new_object(
                        "IllegalArgumentException",
                        vec![Expr::string("negative age")],
                    ))],
                    None,
                ),
                Stmt::return_stmt(Some(Expr::ident("age"))),
            ],
        );
        let program = Program::new(Language::Java, vec![Decl::Function(func)]);
        assert_eq!(
            render(&program),
            "# Translated from Java.\n\ndef check_age(age: int) -> int:\n    if age < 0:\n        raise ValueError(\"negative age\")\n    return age\n"
        );
    }

    #[test]
    fn test_annotations_can_be_disabled() {
        let func = Function::new(
            "id",
            vec![Param::new("x", TypeRef::INT)],
            TypeRef::INT,
            vec![Stmt::return_stmt(Some(Expr::ident("x")))],
        );
        let program = Program::new(Language::Java, vec![Decl::Function(func)]);
        let options = TranslationOptions::new()
            .with(keys::INCLUDE_TYPE_ANNOTATIONS, false)
            .with(keys::GENERATE_COMMENTS, false);
        let out = PythonGenerator.emit(&program, &SemanticContext::new(), &options);
        assert_eq!(out, "def id(x):\n    return x\n");
    }

    #[test]
    fn test_c_style_for_becomes_while() {
        let func = Function::new(
            "count",
            vec![],
            TypeRef::Void,
            vec![Stmt::for_loop(
                Some(Stmt::let_decl("i", Some(Expr::int(0)))),
                Some(Expr::binary(Expr::ident("i"), BinaryOp::Lt, Expr::int(3))),
                Some(Expr::assign(
                    Expr::ident("i"),
                    Expr::binary(Expr::ident("i"), BinaryOp::Add, Expr::int(1)),
                )),
                vec![Stmt::expr(Expr::call(Expr::ident("print"), vec![Expr::ident("i")]))],
            )],
        );
        let program = Program::new(Language::Java, vec![Decl::Function(func)]);
        let out = render(&program);
        assert!(out.contains("    i = 0\n    while i < 3:\n        print(i)\n        i = i + 1\n"));
    }

    #[test]
    fn test_data_class() {
        let class = ClassDecl::new("Point")
            .with_field(Field::new("x", TypeRef::INT))
            .with_field(Field::new("y", TypeRef::INT).with_init(Expr::int(0)));
        let mut program = Program::new(Language::Java, vec![Decl::Class(class)]);
        assert!(PythonGenerator.adapt_pattern(&mut program, SemanticPattern::DataClass));
        let out = render(&program);
        assert!(out.contains("from dataclasses import dataclass"));
        assert!(out.contains("@dataclass\nclass Point:\n    x: int\n    y: int = 0\n"));
    }

    #[test]
    fn test_class_with_constructor() {
        let class = ClassDecl::new("Counter")
            .with_field(Field::new("count", TypeRef::INT).private())
            .with_method(Function::new(
                "Counter",
                vec![Param::new("start", TypeRef::INT)],
                TypeRef::Void,
                vec![Stmt::expr(Expr::assign(
                    Expr::member(Expr::ident("this"), "count"),
                    Expr::ident("start"),
                ))],
            ))
            .with_method(Function::new(
                "increment",
                vec![],
                TypeRef::Void,
                vec![Stmt::expr(Expr::assign(
                    Expr::member(Expr::ident("this"), "count"),
                    Expr::binary(
                        Expr::member(Expr::ident("this"), "count"),
                        BinaryOp::Add,
                        Expr::int(1),
                    ),
                ))],
            ));
        let program = Program::new(Language::Java, vec![Decl::Class(class)]);
        let out = render(&program);
        assert!(out.contains(
            "class Counter:\n    def __init__(self, start: int) -> None:\n        self.count = start\n\n    def increment(self) -> None:\n        self.count = self.count + 1\n"
        ));
    }

    #[test]
    fn test_uninitialised_fields_start_at_zero() {
        let class = ClassDecl::new("Inventory")
            .with_field(Field::new("count", TypeRef::INT).private())
            .with_field(Field::new("ratio", TypeRef::DOUBLE))
            .with_field(Field::new("label", TypeRef::STRING))
            .with_field(Field::new("items", TypeRef::list(TypeRef::STRING)))
            .with_field(Field::new("owner", TypeRef::optional(TypeRef::named("User"))));
        let program = Program::new(Language::Java, vec![Decl::Class(class)]);
        let out = render(&program);
        assert!(out.contains("        self.count: int = 0\n"), "{out}");
        assert!(out.contains("        self.ratio: float = 0.0\n"), "{out}");
        assert!(out.contains("        self.label: str = \"\"\n"), "{out}");
        assert!(out.contains("        self.items: list[str] = []\n"), "{out}");
        assert!(out.contains("        self.owner: Optional[User] = None\n"), "{out}");
    }

    #[test]
    fn test_bare_field_references_are_qualified() {
        let class = ClassDecl::new("Counter")
            .with_field(Field::new("count", TypeRef::INT).private())
            .with_field(Field::new("total", TypeRef::INT).private().static_())
            .with_method(Function::new(
                "get",
                vec![],
                TypeRef::INT,
                vec![
                    Stmt::expr(Expr::call(Expr::ident("log"), vec![Expr::ident("total")])),
                    Stmt::return_stmt(Some(Expr::ident("count"))),
                ],
            ));
        let program = Program::new(Language::Java, vec![Decl::Class(class)]);
        let out = render(&program);
        assert!(out.contains(
            "class Counter:\n    total: int = 0\n\n    def __init__(self) -> None:\n        self.count: int = 0\n\n    def get(self) -> int:\n        log(Counter.total)\n        return self.count\n"
        ), "{out}");
    }

    #[test]
    fn test_comprehension_idiom() {
        let func = Function::new(
            "positives",
            vec![Param::new("xs", TypeRef::list(TypeRef::INT))],
            TypeRef::list(TypeRef::INT),
            vec![
                Stmt::let_decl("out", Some(Expr::new_object("ArrayList", vec![]))),
                Stmt::for_each(
                    "x",
                    Expr::ident("xs"),
                    vec![Stmt::if_stmt(
                        Expr::binary(Expr::ident("x"), BinaryOp::Gt, Expr::int(0)),
                        vec![Stmt::expr(Expr::method_call(
                            Expr::ident("out"),
                            "add",
                            vec![Expr::ident("x")],
                        ))],
                        None,
                    )],
                ),
                Stmt::return_stmt(Some(Expr::ident("out"))),
            ],
        );
        let mut program = Program::new(Language::Java, vec![Decl::Function(func)]);
        assert!(PythonGenerator.apply_idiom(&mut program, "list_comprehensions"));
        let out = render(&program);
        assert!(out.contains("    out = [x for x in xs if x > 0]\n    return out\n"));
    }

    #[test]
    fn test_try_except_finally() {
        let func = Function::new(
            "run",
            vec![],
            TypeRef::Void,
            vec![Stmt::try_catch(
                vec![Stmt::expr(Expr::call(Expr::ident("work"), vec![]))],
                Some("e"),
                Some(vec![]),
                Some(vec![Stmt::expr(Expr::call(Expr::ident("cleanup"), vec![]))]),
            )],
        );
        let program = Program::new(Language::Java, vec![Decl::Function(func)]);
        let out = render(&program);
        assert!(out.contains(
            "    try:\n        work()\n    except Exception as e:\n        pass\n    finally:\n        cleanup()\n"
        ));
    }
}
