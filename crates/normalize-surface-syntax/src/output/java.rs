//! Java generator.
//!
//! Java has no free functions, so programs that still carry module-level
//! declarations are wrapped into a `Main` class before rendering. Local
//! types left open become `var`.

use crate::context::{SemanticContext, SemanticPattern};
use crate::emitter::{
    Emitter, TypeNotes, TypeSpelling, c_binary_op, is_print, mutated_names, needs_parens, number,
    quote, spell_in,
};
use crate::ir::{
    ClassDecl, ClassKind, Decl, Expr, Field, Function, Hint, Literal, Param, Primitive, Program,
    Stmt, TypeRef, UnaryOp, VarDecl, Visibility,
};
use crate::lower;
use crate::options::{TranslationOptions, keys};
use crate::traits::{Generator, Rendered};
use normalize_language_meta::Language;
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Emits the IR as a single Java compilation unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaGenerator;

impl JavaGenerator {
    /// Reference spelling for generic arguments (`int` -> `Integer`).
    fn boxed(&self, ty: &TypeRef, erase: bool, notes: &mut TypeNotes) -> String {
        if erase {
            return Self::ANY.to_string();
        }
        match ty {
            TypeRef::Primitive { primitive } => match primitive {
                Primitive::Int => "Integer",
                Primitive::Long => "Long",
                Primitive::Float => "Float",
                Primitive::Double => "Double",
                Primitive::Bool => "Boolean",
                Primitive::Char => "Character",
                Primitive::String => "String",
                Primitive::Byte => "Byte",
            }
            .to_string(),
            TypeRef::Void => "Void".to_string(),
            other => self.spell(other, erase, notes),
        }
    }
}

impl TypeSpelling for JavaGenerator {
    const ANY: &'static str = "Object";

    fn spell(&self, ty: &TypeRef, erase: bool, notes: &mut TypeNotes) -> String {
        match ty {
            TypeRef::Void => "void".to_string(),
            TypeRef::Inferred | TypeRef::Any => Self::ANY.to_string(),
            TypeRef::Primitive { primitive } => match primitive {
                Primitive::Int => "int",
                Primitive::Long => "long",
                Primitive::Float => "float",
                Primitive::Double => "double",
                Primitive::Bool => "boolean",
                Primitive::Char => "char",
                Primitive::String => "String",
                Primitive::Byte => "byte",
            }
            .to_string(),
            TypeRef::List { element } => {
                notes.imports.push("java.util.List");
                format!("List<{}>", self.boxed(element, erase, notes))
            }
            TypeRef::Set { element } => {
                notes.imports.push("java.util.Set");
                format!("Set<{}>", self.boxed(element, erase, notes))
            }
            TypeRef::Map { key, value } => {
                notes.imports.push("java.util.Map");
                let key = self.boxed(key, erase, notes);
                format!("Map<{key}, {}>", self.boxed(value, erase, notes))
            }
            // References are nullable already
            TypeRef::Optional { inner } => self.boxed(inner, erase, notes),
            TypeRef::Named { name, args } if args.is_empty() => name.clone(),
            TypeRef::Named { name, args } => {
                let args: Vec<_> = args.iter().map(|a| self.boxed(a, erase, notes)).collect();
                format!("{name}<{}>", args.join(", "))
            }
            TypeRef::Unresolved { descriptor } => {
                notes.unresolved.push(descriptor.clone());
                Self::ANY.to_string()
            }
        }
    }
}

impl Generator for JavaGenerator {
    fn language(&self) -> Language {
        Language::Java
    }

    fn default_options(&self) -> TranslationOptions {
        TranslationOptions::new()
            .with(keys::USE_GC_IDIOMS, true)
            .with(keys::USE_OPTIONALS, true)
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
        let program = if program
            .body
            .iter()
            .any(|d| !matches!(d, Decl::Class(_)))
        {
            let mut wrapped = program.clone();
            lower::wrap_free_functions(&mut wrapped);
            Cow::Owned(wrapped)
        } else {
            Cow::Borrowed(program)
        };
        let mut emitter = JavaEmitter::new(self, &program, options);
        emitter.program(&program);
        let comments = options.generate_comments();
        let source = program.source;
        emitter.e.finish(|imports| {
            let mut header = Vec::new();
            if comments {
                header.push(format!("// Translated from {source}."));
            }
            header.extend(imports.iter().map(|i| format!("import {i};")));
            header
        })
    }

    fn apply_idiom(&self, program: &mut Program, idiom: &str) -> bool {
        match idiom {
            "stream_operations" | "iterators_streams" => {
                lower::loops_to_comprehensions(program) > 0
            }
            "records" => lower::hint_data_classes(program),
            _ => false,
        }
    }

    fn adapt_pattern(&self, program: &mut Program, pattern: SemanticPattern) -> bool {
        match pattern {
            SemanticPattern::DataClass => {
                lower::hint_data_classes(program);
                true
            }
            // Classes, static accessors and listener interfaces are native
            SemanticPattern::Singleton
            | SemanticPattern::Factory
            | SemanticPattern::Observer
            | SemanticPattern::ErrorHandling
            | SemanticPattern::Async => true,
        }
    }
}

#[derive(Default)]
struct Scope {
    methods: BTreeSet<String>,
    mutated: BTreeSet<String>,
    is_async: bool,
}

struct JavaEmitter<'a> {
    e: Emitter,
    spelling: &'a JavaGenerator,
    erase: bool,
    classes: BTreeSet<String>,
    throwing: BTreeSet<String>,
    scope: Scope,
}

fn modifier(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "public ",
        Visibility::Private => "private ",
        Visibility::Protected => "protected ",
    }
}

/// Record-eligible: hinted, no setters and no field defaults.
fn is_record(class: &ClassDecl) -> bool {
    class.has_hint(&Hint::DataClass)
        && class.fields.iter().all(|f| f.init.is_none())
        && !class.methods.iter().any(|m| m.name.starts_with("set"))
}

impl<'a> JavaEmitter<'a> {
    fn new(spelling: &'a JavaGenerator, program: &Program, options: &'a TranslationOptions) -> Self {
        Self {
            e: Emitter::new(options, "//"),
            spelling,
            erase: options.semantic_fallback(),
            classes: program.classes().map(|c| c.name.clone()).collect(),
            throwing: lower::throwing_functions(program),
            scope: Scope::default(),
        }
    }

    fn ty(&mut self, ty: &TypeRef) -> String {
        spell_in(self.spelling, &mut self.e, ty, self.erase)
    }

    fn boxed(&mut self, ty: &TypeRef) -> String {
        let mut notes = TypeNotes::default();
        let text = self.spelling.boxed(ty, self.erase, &mut notes);
        for import in notes.imports {
            self.e.import(import);
        }
        for descriptor in notes.unresolved {
            self.e.unresolved(&descriptor, JavaGenerator::ANY);
        }
        text
    }

    fn program(&mut self, program: &Program) {
        // One public top-level type per compilation unit
        let mut public = true;
        for decl in &program.body {
            if let Decl::Class(class) = decl {
                let access = if public { "public " } else { "" };
                public = false;
                match class.kind {
                    ClassKind::Interface => self.interface(class, access),
                    _ if is_record(class) => self.record(class, access),
                    _ => self.class(class, access),
                }
                self.e.blank();
            }
        }
    }

    fn params(&mut self, params: &[Param]) -> String {
        let params: Vec<_> = params
            .iter()
            .map(|p| {
                let ty = self.ty(&p.ty);
                format!("{ty} {}", p.name)
            })
            .collect();
        params.join(", ")
    }

    fn return_type(&mut self, func: &Function) -> String {
        if func.is_async {
            self.e.import("java.util.concurrent.CompletableFuture");
            let inner = self.boxed(&func.return_type);
            format!("CompletableFuture<{inner}>")
        } else {
            self.ty(&func.return_type)
        }
    }

    fn throws_clause(&self, func: &Function) -> &'static str {
        if func.throws || self.throwing.contains(&func.name) {
            " throws Exception"
        } else {
            ""
        }
    }

    fn interface(&mut self, class: &ClassDecl, access: &str) {
        let extends = match &class.extends {
            Some(parent) => format!(" extends {parent}"),
            None => String::new(),
        };
        self.e.open(format!("{access}interface {}{extends} {{", class.name));
        for method in &class.methods {
            let ret = self.return_type(method);
            let params = self.params(&method.params);
            let throws = self.throws_clause(method);
            self.e.line(format!("{ret} {}({params}){throws};", method.name));
        }
        self.e.close("}");
    }

    fn record(&mut self, class: &ClassDecl, access: &str) {
        let components: Vec<_> = class
            .fields
            .iter()
            .map(|f| {
                let ty = self.ty(&f.ty);
                format!("{ty} {}", f.name)
            })
            .collect();
        let implements = self.implements(class);
        let header = format!("{access}record {}({}){implements}", class.name, components.join(", "));
        let methods: Vec<_> = class
            .methods
            .iter()
            .filter(|m| !lower::is_constructor(m, class))
            .collect();
        if methods.is_empty() {
            self.e.line(format!("{header} {{}}"));
            return;
        }
        self.e.open(format!("{header} {{"));
        self.scope.methods = class.methods.iter().map(|m| m.name.clone()).collect();
        for (i, method) in methods.into_iter().enumerate() {
            if i > 0 {
                self.e.blank();
            }
            self.function(method, class);
        }
        self.e.close("}");
    }

    fn implements(&self, class: &ClassDecl) -> String {
        if class.implements.is_empty() {
            String::new()
        } else {
            format!(" implements {}", class.implements.join(", "))
        }
    }

    fn class(&mut self, class: &ClassDecl, access: &str) {
        let mut header = format!("{access}class {}", class.name);
        if let Some(parent) = &class.extends {
            header.push_str(&format!(" extends {parent}"));
        }
        header.push_str(&self.implements(class));
        self.e.open(format!("{header} {{"));
        self.scope.methods = class.methods.iter().map(|m| m.name.clone()).collect();
        for field in &class.fields {
            self.field(field);
        }
        for (i, method) in class.methods.iter().enumerate() {
            if i > 0 || !class.fields.is_empty() {
                self.e.blank();
            }
            self.function(method, class);
        }
        self.e.close("}");
    }

    fn field(&mut self, field: &Field) {
        let statik = if field.is_static { "static " } else { "" };
        let ty = self.ty(&field.ty);
        let access = modifier(field.visibility);
        match &field.init {
            Some(init) => {
                let value = self.expr(init);
                self.e
                    .line(format!("{access}{statik}{ty} {} = {value};", field.name));
            }
            None => self.e.line(format!("{access}{statik}{ty} {};", field.name)),
        }
    }

    fn function(&mut self, func: &Function, class: &ClassDecl) {
        self.scope.mutated = mutated_names(&func.body);
        self.scope.is_async = func.is_async;
        let access = modifier(func.visibility);
        let throws = self.throws_clause(func);
        if lower::is_constructor(func, class) {
            let params = self.params(&func.params);
            self.e
                .open(format!("{access}{}({params}){throws} {{", class.name));
            self.block(&func.body);
            self.e.close("}");
            return;
        }
        let statik = if func.is_static { "static " } else { "" };
        let params = if func.is_static && func.name == "main" && func.params.is_empty() {
            "String[] args".to_string()
        } else {
            self.params(&func.params)
        };
        let ret = self.return_type(func);
        self.e.open(format!(
            "{access}{statik}{ret} {}({params}){throws} {{",
            func.name
        ));
        self.block(&func.body);
        let falls_through = !matches!(func.body.last(), Some(Stmt::Return { .. } | Stmt::Throw { .. }));
        if func.is_async && func.return_type.is_void() && falls_through {
            self.e.line("return CompletableFuture.completedFuture(null);");
        }
        self.e.close("}");
        self.scope.is_async = false;
    }

    fn block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn local(&mut self, var: &VarDecl) -> String {
        let reassigned = var.mutable && self.scope.mutated.contains(&var.name);
        let fixed = if !reassigned && var.init.is_some() {
            "final "
        } else {
            ""
        };
        let ty = match (&var.ty, &var.init) {
            (TypeRef::Inferred, Some(_)) => "var".to_string(),
            (ty, _) => self.ty(ty),
        };
        match &var.init {
            Some(init) => {
                let value = self.expr(init);
                format!("{fixed}{ty} {} = {value}", var.name)
            }
            None => format!("{ty} {}", var.name),
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr { expr } => {
                let text = self.expr(expr);
                self.e.line(format!("{text};"));
            }
            Stmt::Let(var) => {
                let text = self.local(var);
                self.e.line(format!("{text};"));
            }
            Stmt::Block { body } => {
                self.e.open("{");
                self.block(body);
                self.e.close("}");
            }
            Stmt::If {
                test,
                consequent,
                alternate,
            } => self.if_chain("if", test, consequent, alternate.as_deref()),
            Stmt::While { test, body } => {
                let test = self.expr(test);
                self.e.open(format!("while ({test}) {{"));
                self.block(body);
                self.e.close("}");
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                let init = match init.as_deref() {
                    Some(Stmt::Let(var)) => {
                        let mut var = var.clone();
                        var.mutable = true;
                        self.scope.mutated.insert(var.name.clone());
                        if matches!(var.ty, TypeRef::Inferred)
                            && let Some(init) = &var.init
                        {
                            var.ty = lower::infer_type(init);
                        }
                        self.local(&var)
                    }
                    Some(Stmt::Expr { expr }) => self.expr(expr),
                    _ => String::new(),
                };
                let test = test.as_ref().map(|t| self.expr(t)).unwrap_or_default();
                let update = update.as_ref().map(|u| self.update(u)).unwrap_or_default();
                self.e.open(format!("for ({init}; {test}; {update}) {{"));
                self.block(body);
                self.e.close("}");
            }
            Stmt::ForEach {
                variable,
                iterable,
                body,
            } => {
                let iterable = self.expr(iterable);
                self.e.open(format!("for (var {variable} : {iterable}) {{"));
                self.block(body);
                self.e.close("}");
            }
            Stmt::Return { value: Some(value) } => {
                let value = self.expr(value);
                if self.scope.is_async {
                    self.e
                        .line(format!("return CompletableFuture.completedFuture({value});"));
                } else {
                    self.e.line(format!("return {value};"));
                }
            }
            Stmt::Return { value: None } if self.scope.is_async => {
                self.e.line("return CompletableFuture.completedFuture(null);");
            }
            Stmt::Return { value: None } => self.e.line("return;"),
            Stmt::Break => self.e.line("break;"),
            Stmt::Continue => self.e.line("continue;"),
            Stmt::Throw { value } => {
                let value = match value {
                    Expr::Literal {
                        value: Literal::String(s),
                    } => format!("new RuntimeException({})", quote(s)),
                    Expr::New { class, args }
                        if !class.ends_with("Exception")
                            && !class.ends_with("Error")
                            && !self.classes.contains(class) =>
                    {
                        let args: Vec<_> = args.iter().map(|a| self.expr(a)).collect();
                        format!("new RuntimeException({})", args.join(", "))
                    }
                    other => self.expr(other),
                };
                self.e.line(format!("throw {value};"));
            }
            Stmt::TryCatch {
                body,
                catch_param,
                catch_body,
                finally_body,
            } => {
                self.e.open("try {");
                self.block(body);
                if let Some(catch_body) = catch_body {
                    let param = catch_param.as_deref().unwrap_or("ignored");
                    self.e.dedent();
                    self.e.open(format!("}} catch (Exception {param}) {{"));
                    self.block(catch_body);
                }
                if let Some(finally_body) = finally_body {
                    self.e.dedent();
                    self.e.open("} finally {");
                    self.block(finally_body);
                }
                self.e.close("}");
            }
        }
    }

    /// `i = i + 1` → `i++`.
    fn update(&mut self, update: &Expr) -> String {
        if let Expr::Assign { target, value } = update
            && let Expr::Ident { name } = target.as_ref()
            && let Expr::Binary { left, op, right } = value.as_ref()
            && matches!(left.as_ref(), Expr::Ident { name: l } if l == name)
            && matches!(right.as_ref(), Expr::Literal { value: Literal::Int(1) })
        {
            match op {
                crate::ir::BinaryOp::Add => return format!("{name}++"),
                crate::ir::BinaryOp::Sub => return format!("{name}--"),
                _ => {}
            }
        }
        self.expr(update)
    }

    fn if_chain(&mut self, keyword: &str, test: &Expr, consequent: &[Stmt], alternate: Option<&[Stmt]>) {
        let test = self.expr(test);
        self.e.open(format!("{keyword} ({test}) {{"));
        self.block(consequent);
        match alternate {
            Some(
                [
                    Stmt::If {
                        test,
                        consequent,
                        alternate,
                    },
                ],
            ) => {
                self.e.dedent();
                self.if_chain("} else if", test, consequent, alternate.as_deref());
            }
            Some(alt) => {
                self.e.dedent();
                self.e.open("} else {");
                self.block(alt);
                self.e.close("}");
            }
            None => self.e.close("}"),
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

    fn expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Literal { value } => match value {
                Literal::Null => "null".to_string(),
                Literal::Bool(b) => b.to_string(),
                Literal::String(s) => quote(s),
                Literal::Int(n) if i32::try_from(*n).is_err() => format!("{n}L"),
                lit => number(lit).unwrap_or_default(),
            },
            Expr::Ident { name } => name.clone(),
            Expr::Binary { left, op, right } => {
                let left = self.operand(left);
                let right = self.operand(right);
                format!("{left} {} {right}", c_binary_op(*op))
            }
            Expr::Unary { op, operand } => {
                let operand = self.operand(operand);
                match op {
                    UnaryOp::Neg => format!("-{operand}"),
                    UnaryOp::Not => format!("!{operand}"),
                }
            }
            Expr::Call { callee, args } => self.call(callee, args),
            Expr::Member { object, field } => {
                let object = self.operand(object);
                format!("{object}.{field}")
            }
            Expr::Index { object, index } => {
                let object = self.operand(object);
                let index = self.expr(index);
                format!("{object}.get({index})")
            }
            Expr::Assign { target, value } => {
                let value = self.expr(value);
                if let Expr::Index { object, index } = target.as_ref() {
                    let object = self.operand(object);
                    let index = self.expr(index);
                    return format!("{object}.set({index}, {value})");
                }
                let target = self.expr(target);
                format!("{target} = {value}")
            }
            Expr::New { class, args } => {
                let rendered: Vec<_> = args.iter().map(|a| self.expr(a)).collect();
                if self.classes.contains(class) {
                    return format!("new {class}({})", rendered.join(", "));
                }
                let collection = match TypeRef::parse(class) {
                    TypeRef::List { .. } => Some("ArrayList"),
                    TypeRef::Map { .. } => Some("HashMap"),
                    TypeRef::Set { .. } => Some("HashSet"),
                    _ => None,
                };
                match collection {
                    Some(name) => {
                        self.e.import(format!("java.util.{name}"));
                        format!("new {name}<>({})", rendered.join(", "))
                    }
                    None => format!("new {class}({})", rendered.join(", ")),
                }
            }
            Expr::Await { value } => {
                let value = self.operand(value);
                format!("{value}.join()")
            }
            Expr::Array { items } => {
                self.e.import("java.util.List");
                let items: Vec<_> = items.iter().map(|i| self.expr(i)).collect();
                format!("List.of({})", items.join(", "))
            }
            Expr::Comprehension {
                element,
                variable,
                iterable,
                condition,
            } => {
                let mut chain = format!("{}.stream()", self.operand(iterable));
                if let Some(condition) = condition {
                    let condition = self.expr(condition);
                    chain.push_str(&format!(".filter({variable} -> {condition})"));
                }
                let element = self.expr(element);
                if element != *variable {
                    chain.push_str(&format!(".map({variable} -> {element})"));
                }
                chain.push_str(".toList()");
                chain
            }
        }
    }

    fn call(&mut self, callee: &Expr, args: &[Expr]) -> String {
        let rendered: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
        if is_print(callee) {
            return format!("System.out.println({})", rendered.join(" + \" \" + "));
        }
        let args_text = rendered.join(", ");
        match callee {
            Expr::Member { object, field } => {
                let object_text = self.operand(object);
                match field.as_str() {
                    "size" | "length" | "len" if args.is_empty() => format!("{object_text}.size()"),
                    "push" | "append" => format!("{object_text}.add({args_text})"),
                    _ => format!("{object_text}.{field}({args_text})"),
                }
            }
            Expr::Ident { name } if name == "len" && rendered.len() == 1 => {
                format!("{}.size()", rendered.join(""))
            }
            Expr::Ident { name } if !self.scope.methods.contains(name) && self.classes.contains(name) => {
                format!("new {name}({args_text})")
            }
            Expr::Ident { name } => format!("{name}({args_text})"),
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
    use crate::ir::BinaryOp;

    fn render(program: &Program) -> String {
        let generator = JavaGenerator;
        generator.emit(program, &SemanticContext::new(), &generator.default_options())
    }

    #[test]
    fn test_map_type_boxes_generic_arguments() {
        let generator = JavaGenerator;
        assert_eq!(generator.map_type(&TypeRef::list(TypeRef::INT)), "List<Integer>");
        assert_eq!(
            generator.map_type(&TypeRef::map(TypeRef::STRING, TypeRef::DOUBLE)),
            "Map<String, Double>"
        );
        assert_eq!(generator.map_type(&TypeRef::optional(TypeRef::BOOL)), "Boolean");
        assert_eq!(generator.map_type(&TypeRef::parse("Map<int")), "Object");
    }

    #[test]
    fn test_free_functions_wrapped_in_main() {
        let func = Function::new(
            "square",
            vec![Param::new("n", TypeRef::INT)],
            TypeRef::INT,
            vec![Stmt::return_stmt(Some(Expr::binary(
                Expr::ident("n"),
                BinaryOp::Mul,
                Expr::ident("n"),
            )))],
        );
        let program = Program::new(Language::Python, vec![Decl::Function(func)]);
        assert_eq!(
            render(&program),
            "// Translated from Python.\n\npublic class Main {\n    public static int square(int n) {\n        return n * n;\n    }\n}\n"
        );
    }

    #[test]
    fn test_throwing_method_declares_throws() {
        let func = Function::new(
            "parse",
            vec![Param::new("s", TypeRef::STRING)],
            TypeRef::INT,
            vec![
                Stmt::if_stmt(
                    Expr::binary(Expr::ident("s"), BinaryOp::Eq, Expr::null()),
                    vec![Stmt::throw(Expr::string("empty"))],
                    None,
                ),
                Stmt::return_stmt(Some(Expr::int(1))),
            ],
        );
        let class = ClassDecl::new("Parser").with_method(func);
        let program = Program::new(Language::Python, vec![Decl::Class(class)]);
        let out = render(&program);
        assert!(out.contains("    public int parse(String s) throws Exception {\n"));
        assert!(out.contains("            throw new RuntimeException(\"empty\");\n"));
    }

    #[test]
    fn test_data_class_becomes_record() {
        let class = ClassDecl::new("Point")
            .with_field(Field::new("x", TypeRef::INT))
            .with_field(Field::new("y", TypeRef::INT));
        let mut program = Program::new(Language::Python, vec![Decl::Class(class)]);
        assert!(JavaGenerator.adapt_pattern(&mut program, SemanticPattern::DataClass));
        assert!(render(&program).contains("public record Point(int x, int y) {}\n"));
    }

    #[test]
    fn test_comprehension_renders_stream() {
        let func = Function::new(
            "doubled",
            vec![Param::new("xs", TypeRef::list(TypeRef::INT))],
            TypeRef::list(TypeRef::INT),
            vec![Stmt::return_stmt(Some(Expr::Comprehension {
                element: Box::new(Expr::binary(Expr::ident("x"), BinaryOp::Mul, Expr::int(2))),
                variable: "x".to_string(),
                iterable: Box::new(Expr::ident("xs")),
                condition: None,
            }))],
        );
        let program = Program::new(Language::Python, vec![Decl::Function(func)]);
        let out = render(&program);
        assert!(out.contains("import java.util.List;\n"));
        assert!(out.contains("return xs.stream().map(x -> x * 2).toList();"));
    }

    #[test]
    fn test_locals_and_counting_loop() {
        let func = Function::new(
            "sum",
            vec![Param::new("n", TypeRef::INT)],
            TypeRef::INT,
            vec![
                Stmt::let_decl("total", Some(Expr::int(0))),
                Stmt::for_loop(
                    Some(Stmt::let_decl("i", Some(Expr::int(0)))),
                    Some(Expr::binary(Expr::ident("i"), BinaryOp::Lt, Expr::ident("n"))),
                    Some(Expr::assign(
                        Expr::ident("i"),
                        Expr::binary(Expr::ident("i"), BinaryOp::Add, Expr::int(1)),
                    )),
                    vec![Stmt::expr(Expr::assign(
                        Expr::ident("total"),
                        Expr::binary(Expr::ident("total"), BinaryOp::Add, Expr::ident("i")),
                    ))],
                ),
                Stmt::return_stmt(Some(Expr::ident("total"))),
            ],
        );
        let program = Program::new(Language::Python, vec![Decl::Function(func)]);
        let out = render(&program);
        assert!(out.contains("        var total = 0;\n"));
        assert!(out.contains("        for (int i = 0; i < n; i++) {\n"));
    }
}
