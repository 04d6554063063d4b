//! TypeScript generator.
//!
//! The emitter also serves JavaScript: the `Dialect` decides whether types,
//! access modifiers and interfaces are written.

use crate::context::{SemanticContext, SemanticPattern};
use crate::emitter::{
    Emitter, TypeNotes, TypeSpelling, c_binary_op, is_print, mutated_names, needs_parens, number,
    quote, spell_in,
};
use crate::ir::{
    BinaryOp, ClassDecl, ClassKind, Decl, Expr, Field, Function, Literal, Param, Primitive,
    Program, Stmt, TypeRef, UnaryOp, VarDecl, Visibility,
};
use crate::lower;
use crate::options::{TranslationOptions, keys};
use crate::traits::{Generator, Rendered};
use normalize_language_meta::Language;
use std::collections::{BTreeMap, BTreeSet};

/// Emits the IR as an ES module in TypeScript.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptGenerator;

impl TypeSpelling for TypeScriptGenerator {
    const ANY: &'static str = "any";

    fn spell(&self, ty: &TypeRef, erase: bool, notes: &mut TypeNotes) -> String {
        match ty {
            TypeRef::Void => "void".to_string(),
            TypeRef::Inferred | TypeRef::Any => Self::ANY.to_string(),
            TypeRef::Primitive { primitive } => match primitive {
                Primitive::Bool => "boolean",
                Primitive::Char | Primitive::String => "string",
                _ => "number",
            }
            .to_string(),
            TypeRef::List { element } => {
                let element = self.spell_element(element, erase, notes);
                if element.contains(' ') {
                    format!("({element})[]")
                } else {
                    format!("{element}[]")
                }
            }
            TypeRef::Set { element } => format!("Set<{}>", self.spell_element(element, erase, notes)),
            TypeRef::Map { key, value } => {
                let key = self.spell_element(key, erase, notes);
                format!("Map<{key}, {}>", self.spell_element(value, erase, notes))
            }
            TypeRef::Optional { inner } => format!("{} | null", self.spell(inner, erase, notes)),
            TypeRef::Named { name, args } if args.is_empty() => name.clone(),
            TypeRef::Named { name, args } => {
                let args: Vec<_> = args
                    .iter()
                    .map(|a| self.spell_element(a, erase, notes))
                    .collect();
                format!("{name}<{}>", args.join(", "))
            }
            TypeRef::Unresolved { descriptor } => {
                notes.unresolved.push(descriptor.clone());
                Self::ANY.to_string()
            }
        }
    }
}

impl Generator for TypeScriptGenerator {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn default_options(&self) -> TranslationOptions {
        TranslationOptions::new()
            .with(keys::PREFER_ASYNC_AWAIT, true)
            .with(keys::USE_GC_IDIOMS, true)
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
        render_module(program, options, Dialect::TypeScript)
    }

    fn apply_idiom(&self, program: &mut Program, idiom: &str) -> bool {
        match idiom {
            "array_methods" => lower::loops_to_comprehensions(program) > 0,
            _ => false,
        }
    }

    fn adapt_pattern(&self, program: &mut Program, pattern: SemanticPattern) -> bool {
        match pattern {
            SemanticPattern::DataClass => {
                lower::hint_data_classes(program);
                true
            }
            // Classes, static members and promises carry these unchanged
            SemanticPattern::Singleton
            | SemanticPattern::Factory
            | SemanticPattern::Async
            | SemanticPattern::ErrorHandling => true,
            SemanticPattern::Observer => false,
        }
    }
}

/// Which flavour of ECMAScript to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(feature = "write-javascript"), allow(dead_code))]
pub(super) enum Dialect {
    TypeScript,
    JavaScript,
}

/// Render `program` as an ES module in `dialect`.
pub(super) fn render_module(program: &Program, options: &TranslationOptions, dialect: Dialect) -> Rendered {
    let program = lower::qualified(program);
    let mut emitter = TsEmitter::new(&TypeScriptGenerator, &program, options, dialect);
    emitter.program(&program);
    let comments = options.generate_comments();
    let source = program.source;
    emitter.e.finish(|_| {
        if comments {
            vec![format!("// Translated from {source}.")]
        } else {
            Vec::new()
        }
    })
}

/// Runtime starting value of an uninitialised JavaScript field.
fn zero_value(ty: &TypeRef) -> &'static str {
    match ty {
        TypeRef::Primitive { primitive } => match primitive {
            Primitive::Bool => "false",
            Primitive::Char | Primitive::String => "\"\"",
            _ => "0",
        },
        TypeRef::List { .. } => "[]",
        TypeRef::Map { .. } => "new Map()",
        TypeRef::Set { .. } => "new Set()",
        _ => "null",
    }
}

#[derive(Default)]
struct Scope {
    class: Option<String>,
    methods: BTreeMap<String, bool>,
    mutated: BTreeSet<String>,
}

struct TsEmitter<'a> {
    e: Emitter,
    spelling: &'a TypeScriptGenerator,
    dialect: Dialect,
    erase: bool,
    annotate: bool,
    classes: BTreeSet<String>,
    scope: Scope,
}

fn modifier(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "",
        Visibility::Private => "private ",
        Visibility::Protected => "protected ",
    }
}

impl<'a> TsEmitter<'a> {
    fn new(
        spelling: &'a TypeScriptGenerator,
        program: &Program,
        options: &TranslationOptions,
        dialect: Dialect,
    ) -> Self {
        Self {
            e: Emitter::new(options, "//"),
            spelling,
            dialect,
            erase: options.semantic_fallback(),
            annotate: dialect == Dialect::TypeScript && options.include_type_annotations(),
            classes: program.classes().map(|c| c.name.clone()).collect(),
            scope: Scope::default(),
        }
    }

    fn ty(&mut self, ty: &TypeRef) -> String {
        spell_in(self.spelling, &mut self.e, ty, self.erase)
    }

    fn typed(&self) -> bool {
        self.dialect == Dialect::TypeScript
    }

    /// Access modifier; JavaScript has none to write.
    fn access(&self, visibility: Visibility) -> &'static str {
        if self.typed() { modifier(visibility) } else { "" }
    }

    /// `: T` when annotating, else nothing.
    fn annotation(&mut self, ty: &TypeRef) -> String {
        if self.annotate && !matches!(ty, TypeRef::Inferred) {
            format!(": {}", self.ty(ty))
        } else {
            String::new()
        }
    }

    fn program(&mut self, program: &Program) {
        for decl in &program.body {
            match decl {
                Decl::Class(class) if class.kind == ClassKind::Interface && !self.typed() => {
                    self.e.comment(format!("interface {} has no runtime form", class.name));
                }
                Decl::Class(class) if class.kind == ClassKind::Interface => self.interface(class),
                Decl::Class(class) => self.class(class),
                Decl::Function(func) => self.function(func, None),
                Decl::Variable(var) => {
                    let annotation = self.annotation(&var.ty);
                    let value = match &var.init {
                        Some(init) => self.expr(init),
                        None => "undefined".to_string(),
                    };
                    self.e
                        .line(format!("export const {}{annotation} = {value};", var.name));
                }
            }
            self.e.blank();
        }
    }

    fn params(&mut self, params: &[Param]) -> String {
        let params: Vec<_> = params
            .iter()
            .map(|p| {
                let annotation = self.annotation(&p.ty);
                format!("{}{annotation}", p.name)
            })
            .collect();
        params.join(", ")
    }

    fn return_annotation(&mut self, func: &Function) -> String {
        if !self.annotate || matches!(func.return_type, TypeRef::Inferred) {
            return String::new();
        }
        let ty = self.ty(&func.return_type);
        if func.is_async {
            format!(": Promise<{ty}>")
        } else {
            format!(": {ty}")
        }
    }

    fn interface(&mut self, class: &ClassDecl) {
        let extends = match &class.extends {
            Some(parent) => format!(" extends {parent}"),
            None => String::new(),
        };
        self.e.open(format!("export interface {}{extends} {{", class.name));
        for field in &class.fields {
            let ty = self.ty(&field.ty);
            self.e.line(format!("{}: {ty};", field.name));
        }
        for method in &class.methods {
            let params = self.params(&method.params);
            let ret = self.return_annotation(method);
            self.e.line(format!("{}({params}){ret};", method.name));
        }
        self.e.close("}");
    }

    fn class(&mut self, class: &ClassDecl) {
        let mut header = format!("export class {}", class.name);
        if let Some(parent) = &class.extends {
            header.push_str(&format!(" extends {parent}"));
        }
        if !class.implements.is_empty() && self.typed() {
            header.push_str(&format!(" implements {}", class.implements.join(", ")));
        }
        self.e.open(format!("{header} {{"));
        let methods = class
            .methods
            .iter()
            .map(|m| (m.name.clone(), m.is_static))
            .collect();
        self.scope = Scope {
            class: Some(class.name.clone()),
            methods,
            mutated: BTreeSet::new(),
        };
        for field in &class.fields {
            self.field(field);
        }
        for (i, method) in class.methods.iter().enumerate() {
            if i > 0 || !class.fields.is_empty() {
                self.e.blank();
            }
            self.function(method, Some(class));
        }
        self.e.close("}");
        self.scope = Scope::default();
    }

    fn field(&mut self, field: &Field) {
        let modifiers = format!(
            "{}{}",
            self.access(field.visibility),
            if field.is_static { "static " } else { "" }
        );
        if !self.typed() {
            let value = match &field.init {
                Some(init) => self.expr(init),
                None => zero_value(&field.ty).to_string(),
            };
            self.e.line(format!("{modifiers}{} = {value};", field.name));
            return;
        }
        let ty = self.ty(&field.ty);
        match &field.init {
            Some(init) => {
                let value = self.expr(init);
                self.e.line(format!("{modifiers}{}: {ty} = {value};", field.name));
            }
            None if matches!(field.ty, TypeRef::Optional { .. })
                || (field.is_static
                    && matches!(&field.ty, TypeRef::Named { name, .. } if self.scope.class.as_ref() == Some(name))) =>
            {
                self.e.line(format!("{modifiers}{}: {ty} | null = null;", field.name));
            }
            None => self.e.line(format!("{modifiers}{}!: {ty};", field.name)),
        }
    }

    fn function(&mut self, func: &Function, class: Option<&ClassDecl>) {
        self.scope.mutated = mutated_names(&func.body);
        let params = self.params(&func.params);
        let asyncness = if func.is_async { "async " } else { "" };
        let is_ctor = class.is_some_and(|c| lower::is_constructor(func, c));
        let header = match class {
            Some(_) if is_ctor => format!("constructor({params})"),
            Some(_) => {
                let ret = self.return_annotation(func);
                let modifiers = format!(
                    "{}{}",
                    self.access(func.visibility),
                    if func.is_static { "static " } else { "" }
                );
                format!("{modifiers}{asyncness}{}({params}){ret}", func.name)
            }
            None => {
                let ret = self.return_annotation(func);
                format!("export {asyncness}function {}({params}){ret}", func.name)
            }
        };
        self.e.open(format!("{header} {{"));
        self.block(&func.body);
        self.e.close("}");
    }

    fn block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn let_decl(&mut self, var: &VarDecl) -> String {
        let reassigned = var.mutable && self.scope.mutated.contains(&var.name);
        let keyword = if reassigned || var.init.is_none() {
            "let"
        } else {
            "const"
        };
        let annotation = self.annotation(&var.ty);
        match &var.init {
            Some(init) => {
                let value = self.expr(init);
                format!("{keyword} {}{annotation} = {value}", var.name)
            }
            None => format!("{keyword} {}{annotation}", var.name),
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr { expr } => {
                let text = self.expr(expr);
                self.e.line(format!("{text};"));
            }
            Stmt::Let(var) => {
                let text = self.let_decl(var);
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
                        // The loop variable is updated by the clause itself
                        let mut var = var.clone();
                        var.mutable = true;
                        self.scope.mutated.insert(var.name.clone());
                        self.let_decl(&var)
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
                self.e.open(format!("for (const {variable} of {iterable}) {{"));
                self.block(body);
                self.e.close("}");
            }
            Stmt::Return { value: Some(value) } => {
                let value = self.expr(value);
                self.e.line(format!("return {value};"));
            }
            Stmt::Return { value: None } => self.e.line("return;"),
            Stmt::Break => self.e.line("break;"),
            Stmt::Continue => self.e.line("continue;"),
            Stmt::Throw { value } => {
                let value = self.thrown(value);
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
                    self.e.dedent();
                    match catch_param {
                        Some(param) => self.e.open(format!("}} catch ({param}) {{")),
                        None => self.e.open("} catch {"),
                    }
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
                BinaryOp::Add => return format!("{name}++"),
                BinaryOp::Sub => return format!("{name}--"),
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

    fn thrown(&mut self, value: &Expr) -> String {
        match value {
            Expr::New { class, args } if !self.classes.contains(class) => {
                let args: Vec<_> = args.iter().map(|a| self.expr(a)).collect();
                format!("new Error({})", args.join(", "))
            }
            Expr::Literal {
                value: Literal::String(s),
            } => format!("new Error({})", quote(s)),
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

    fn expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Literal { value } => match value {
                Literal::Null => "null".to_string(),
                Literal::Bool(b) => b.to_string(),
                Literal::String(s) => quote(s),
                // One numeric type: drop the `.0` of whole floats
                Literal::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{f}"),
                lit => number(lit).unwrap_or_default(),
            },
            Expr::Ident { name } => name.clone(),
            Expr::Binary { left, op, right } => {
                let token = match op {
                    BinaryOp::Eq => "===",
                    BinaryOp::Ne => "!==",
                    other => c_binary_op(*other),
                };
                let left = self.operand(left);
                let right = self.operand(right);
                format!("{left} {token} {right}")
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
                let field = if field == "size" { "length" } else { field.as_str() };
                format!("{object}.{field}")
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
                if self.classes.contains(class) {
                    return format!("new {class}({})", rendered.join(", "));
                }
                match TypeRef::parse(class) {
                    TypeRef::List { .. } => "[]".to_string(),
                    TypeRef::Map { .. } => "new Map()".to_string(),
                    TypeRef::Set { .. } => "new Set()".to_string(),
                    _ if class.ends_with("Exception") => {
                        format!("new Error({})", rendered.join(", "))
                    }
                    _ => format!("new {class}({})", rendered.join(", ")),
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
                let mut chain = self.operand(iterable);
                if let Some(condition) = condition {
                    let condition = self.expr(condition);
                    chain.push_str(&format!(".filter(({variable}) => {condition})"));
                }
                let element = self.expr(element);
                if element != *variable {
                    chain.push_str(&format!(".map(({variable}) => {element})"));
                } else if condition.is_none() {
                    chain.push_str(".slice()");
                }
                chain
            }
        }
    }

    fn call(&mut self, callee: &Expr, args: &[Expr]) -> String {
        let rendered: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
        let args_text = rendered.join(", ");
        if is_print(callee) {
            return format!("console.log({args_text})");
        }
        match callee {
            Expr::Member { object, field } => {
                let object_text = self.operand(object);
                match field.as_str() {
                    "size" | "length" | "len" if args.is_empty() => format!("{object_text}.length"),
                    "add" | "append" => format!("{object_text}.push({args_text})"),
                    _ => format!("{object_text}.{field}({args_text})"),
                }
            }
            Expr::Ident { name } => match (self.scope.methods.get(name), &self.scope.class) {
                (Some(true), Some(class)) => format!("{class}.{name}({args_text})"),
                (Some(false), Some(_)) => format!("this.{name}({args_text})"),
                _ => format!("{name}({args_text})"),
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

    fn render(program: &Program) -> String {
        let generator = TypeScriptGenerator;
        generator.emit(program, &SemanticContext::new(), &generator.default_options())
    }

    #[test]
    fn test_map_type() {
        let generator = TypeScriptGenerator;
        assert_eq!(
            generator.map_type(&TypeRef::list(TypeRef::optional(TypeRef::INT))),
            "(number | null)[]"
        );
        assert_eq!(
            generator.map_type(&TypeRef::map(TypeRef::STRING, TypeRef::named("User"))),
            "Map<string, User>"
        );
    }

    #[test]
    fn test_async_function_returns_promise() {
        let func = Function::new(
            "load",
            vec![Param::new("url", TypeRef::STRING)],
            TypeRef::STRING,
            vec![Stmt::return_stmt(Some(Expr::await_(Expr::call(
                Expr::ident("fetchText"),
                vec![Expr::ident("url")],
            ))))],
        )
        .async_();
        let program = Program::new(Language::Python, vec![Decl::Function(func)]);
        assert_eq!(
            render(&program),
            "// Translated from Python.\n\nexport async function load(url: string): Promise<string> {\n  return await fetchText(url);\n}\n"
        );
    }

    #[test]
    fn test_const_unless_reassigned() {
        let func = Function::new(
            "tally",
            vec![],
            TypeRef::INT,
            vec![
                Stmt::let_decl("step", Some(Expr::int(2))),
                Stmt::let_decl("total", Some(Expr::int(0))),
                Stmt::expr(Expr::assign(
                    Expr::ident("total"),
                    Expr::binary(Expr::ident("total"), BinaryOp::Add, Expr::ident("step")),
                )),
                Stmt::return_stmt(Some(Expr::ident("total"))),
            ],
        );
        let program = Program::new(Language::Python, vec![Decl::Function(func)]);
        let out = render(&program);
        assert!(out.contains("  const step = 2;\n  let total = 0;\n  total = total + step;\n"));
    }

    #[test]
    fn test_class_and_loops() {
        let class = ClassDecl::new("Bag")
            .with_field(Field::new("items", TypeRef::list(TypeRef::STRING)).private())
            .with_method(Function::new(
                "dump",
                vec![],
                TypeRef::Void,
                vec![Stmt::for_each(
                    "item",
                    Expr::member(Expr::ident("this"), "items"),
                    vec![Stmt::expr(Expr::call(
                        Expr::ident("print"),
                        vec![Expr::ident("item")],
                    ))],
                )],
            ));
        let program = Program::new(Language::Java, vec![Decl::Class(class)]);
        let out = render(&program);
        assert!(out.contains("export class Bag {\n  private items!: string[];\n\n  dump(): void {\n"));
        assert!(out.contains("    for (const item of this.items) {\n      console.log(item);\n    }"));
    }

    #[test]
    fn test_bare_field_references_are_qualified() {
        let class = ClassDecl::new("Counter")
            .with_field(Field::new("count", TypeRef::INT).private())
            .with_field(Field::new("total", TypeRef::INT).private().static_())
            .with_method(Function::new(
                "get",
                vec![Param::new("step", TypeRef::INT)],
                TypeRef::INT,
                vec![
                    Stmt::expr(Expr::call(Expr::ident("log"), vec![Expr::ident("total")])),
                    Stmt::return_stmt(Some(Expr::binary(
                        Expr::ident("count"),
                        BinaryOp::Add,
                        Expr::ident("step"),
                    ))),
                ],
            ));
        let program = Program::new(Language::Java, vec![Decl::Class(class)]);
        let out = render(&program);
        assert!(out.contains("  get(step: number): number {\n    log(Counter.total);\n    return this.count + step;\n  }"), "{out}");
    }

    #[test]
    fn test_throw_and_null_checks() {
        let func = Function::new(
            "need",
            vec![Param::new("v", TypeRef::optional(TypeRef::STRING))],
            TypeRef::STRING,
            vec![
                Stmt::if_stmt(
                    Expr::binary(Expr::ident("v"), BinaryOp::Eq, Expr::null()),
                    vec![Stmt::throw(Expr::new_object(
                        "IllegalStateException",
                        vec![Expr::string("missing")],
                    ))],
                    None,
                ),
                Stmt::return_stmt(Some(Expr::ident("v"))),
            ],
        );
        let program = Program::new(Language::Java, vec![Decl::Function(func)]);
        let out = render(&program);
        assert!(out.contains("export function need(v: string | null): string {"));
        assert!(out.contains("  if (v === null) {\n    throw new Error(\"missing\");\n  }"));
    }
}
