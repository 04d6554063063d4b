//! Go generator.
//!
//! Classes become structs with pointer-receiver methods, constructors become
//! `NewX` functions and static members move to package level. Raising
//! functions return a trailing `error`; calls to them check `err` and
//! return early.

use crate::context::{SemanticContext, SemanticPattern};
use crate::emitter::{
    Emitter, TypeNotes, TypeSpelling, c_binary_op, capitalize, is_print, needs_parens, number,
    quote, spell_in,
};
use crate::ir::{
    BinaryOp, ClassDecl, ClassKind, Decl, Expr, Function, Literal, Primitive, Program, Stmt,
    TypeRef, UnaryOp, VarDecl, Visibility,
};
use crate::lower::{self, MAIN_CLASS};
use crate::options::{TranslationOptions, keys};
use crate::traits::{Generator, Rendered};
use normalize_language_meta::Language;
use std::collections::{BTreeMap, BTreeSet};

/// Emits the IR as a Go `main` package.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoGenerator;

impl TypeSpelling for GoGenerator {
    const ANY: &'static str = "interface{}";

    fn spell(&self, ty: &TypeRef, erase: bool, notes: &mut TypeNotes) -> String {
        match ty {
            TypeRef::Void => String::new(),
            TypeRef::Inferred | TypeRef::Any => Self::ANY.to_string(),
            TypeRef::Primitive { primitive } => match primitive {
                Primitive::Int => "int",
                Primitive::Long => "int64",
                Primitive::Float => "float32",
                Primitive::Double => "float64",
                Primitive::Bool => "bool",
                Primitive::Char => "rune",
                Primitive::String => "string",
                Primitive::Byte => "byte",
            }
            .to_string(),
            TypeRef::List { element } => format!("[]{}", self.spell_element(element, erase, notes)),
            TypeRef::Set { element } => {
                format!("map[{}]bool", self.spell_element(element, erase, notes))
            }
            TypeRef::Map { key, value } => {
                let key = self.spell_element(key, erase, notes);
                format!("map[{key}]{}", self.spell_element(value, erase, notes))
            }
            TypeRef::Optional { inner } => format!("*{}", self.spell(inner, erase, notes)),
            TypeRef::Named { name, args } if args.is_empty() => name.clone(),
            TypeRef::Named { name, args } => {
                let args: Vec<_> = args
                    .iter()
                    .map(|a| self.spell_element(a, erase, notes))
                    .collect();
                format!("{name}[{}]", args.join(", "))
            }
            TypeRef::Unresolved { descriptor } => {
                notes.unresolved.push(descriptor.clone());
                Self::ANY.to_string()
            }
        }
    }
}

impl Generator for GoGenerator {
    fn language(&self) -> Language {
        Language::Go
    }

    fn default_options(&self) -> TranslationOptions {
        TranslationOptions::new()
            .with(keys::USE_CHANNELS, true)
            .with(keys::USE_GC_IDIOMS, true)
            .with(keys::CONVERT_EXCEPTIONS_TO_RESULTS, true)
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
        let mut emitter = GoEmitter::new(self, &program, options);
        emitter.program(&program);
        let comments = options.generate_comments();
        let source = program.source;
        emitter.e.finish(|imports| {
            let mut header = Vec::new();
            if comments {
                header.push(format!("// Translated from {source}."));
            }
            header.push("package main".to_string());
            match imports.len() {
                0 => {}
                1 => {
                    header.push(String::new());
                    header.extend(imports.iter().map(|i| format!("import \"{i}\"")));
                }
                _ => {
                    header.push(String::new());
                    header.push("import (".to_string());
                    header.extend(imports.iter().map(|i| format!("\t\"{i}\"")));
                    header.push(")".to_string());
                }
            }
            header
        })
    }

    fn apply_idiom(&self, program: &mut Program, idiom: &str) -> bool {
        match idiom {
            "error_values" => {
                let before: Vec<bool> = program.functions().map(|f| f.throws).collect();
                lower::mark_throws(program);
                program.functions().map(|f| f.throws).ne(before)
            }
            _ => false,
        }
    }

    fn adapt_pattern(&self, program: &mut Program, pattern: SemanticPattern) -> bool {
        match pattern {
            SemanticPattern::Singleton => lower::hint_singletons(program),
            SemanticPattern::Factory => lower::hoist_factories(program),
            SemanticPattern::Async => {
                lower::strip_async(program);
                true
            }
            // Structs are already plain records; errors are already values
            SemanticPattern::DataClass | SemanticPattern::ErrorHandling => true,
            SemanticPattern::Observer => false,
        }
    }
}

#[derive(Default)]
struct Scope {
    receiver: Option<String>,
    class: Option<String>,
    /// Zero values preceding `err` in an early return; `None` when the
    /// function does not return an error.
    err_prefix: Option<String>,
    /// Function returns a value besides the error.
    returns_value: bool,
    /// Declared return type, unless void.
    returns: Option<TypeRef>,
    /// Inside a protected closure whose `return`s are handed back to the
    /// enclosing function.
    capture: Option<Capture>,
    types: BTreeMap<String, TypeRef>,
}

/// How a `return` inside a protected closure reaches the function.
#[derive(Debug, Clone, Copy)]
struct Capture {
    /// Store the value in `result`.
    value: bool,
    /// Set `returned`; without it the function returns `result` right after.
    flag: bool,
}

struct GoEmitter<'a> {
    e: Emitter,
    spelling: &'a GoGenerator,
    erase: bool,
    structs: BTreeSet<String>,
    interfaces: BTreeSet<String>,
    throwing: BTreeSet<String>,
    /// Raising functions with no value besides the error.
    error_only: BTreeSet<String>,
    /// Free functions and module variables → Go names.
    globals: BTreeMap<String, String>,
    /// (class, static member) → package-level name.
    statics: BTreeMap<(String, String), String>,
    /// Instance fields and methods → Go names.
    members: BTreeMap<String, String>,
    scope: Scope,
}

fn exported(name: &str, visibility: Visibility) -> String {
    match visibility {
        Visibility::Public => capitalize(name),
        Visibility::Private | Visibility::Protected => {
            let mut chars = name.chars();
            match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

fn receiver_name(class: &str) -> String {
    class
        .chars()
        .next()
        .map(|c| c.to_lowercase().to_string())
        .unwrap_or_else(|| "r".to_string())
}

impl<'a> GoEmitter<'a> {
    fn new(spelling: &'a GoGenerator, program: &Program, options: &'a TranslationOptions) -> Self {
        let throwing = if options.bool_or(keys::CONVERT_EXCEPTIONS_TO_RESULTS, true) {
            lower::throwing_functions(program)
        } else {
            BTreeSet::new()
        };
        let error_only = program
            .functions()
            .filter(|f| throwing.contains(&f.name) && f.return_type.is_void())
            .map(|f| f.name.clone())
            .collect();
        let mut globals = BTreeMap::new();
        let mut statics = BTreeMap::new();
        let mut members = BTreeMap::new();
        let mut structs = BTreeSet::new();
        let mut interfaces = BTreeSet::new();
        for decl in &program.body {
            match decl {
                Decl::Function(f) => {
                    let name = if f.name == "main" {
                        f.name.clone()
                    } else {
                        exported(&f.name, f.visibility)
                    };
                    globals.insert(f.name.clone(), name);
                }
                Decl::Variable(v) => {
                    globals.insert(v.name.clone(), exported(&v.name, Visibility::Public));
                }
                Decl::Class(class) => {
                    if class.kind == ClassKind::Interface {
                        interfaces.insert(class.name.clone());
                    } else {
                        structs.insert(class.name.clone());
                    }
                    let prefix = if class.name == MAIN_CLASS {
                        String::new()
                    } else {
                        class.name.clone()
                    };
                    for f in class.fields.iter().filter(|f| f.is_static) {
                        let name = exported(&format!("{prefix}{}", capitalize(&f.name)), f.visibility);
                        statics.insert((class.name.clone(), f.name.clone()), name);
                    }
                    for m in class.methods.iter().filter(|m| m.is_static) {
                        let name = if prefix.is_empty() && m.name == "main" {
                            m.name.clone()
                        } else {
                            exported(&format!("{prefix}{}", capitalize(&m.name)), m.visibility)
                        };
                        statics.insert((class.name.clone(), m.name.clone()), name);
                    }
                    for f in class.fields.iter().filter(|f| !f.is_static) {
                        members
                            .entry(f.name.clone())
                            .or_insert_with(|| exported(&f.name, f.visibility));
                    }
                    for m in class.methods.iter().filter(|m| !m.is_static) {
                        members
                            .entry(m.name.clone())
                            .or_insert_with(|| exported(&m.name, m.visibility));
                    }
                }
            }
        }
        Self {
            e: Emitter::with_tabs(options, "//"),
            spelling,
            erase: options.semantic_fallback(),
            structs,
            interfaces,
            throwing,
            error_only,
            globals,
            statics,
            members,
            scope: Scope::default(),
        }
    }

    /// Declared structs travel by pointer.
    fn ty(&mut self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Named { name, args } if args.is_empty() && self.structs.contains(name) => {
                format!("*{name}")
            }
            _ => spell_in(self.spelling, &mut self.e, ty, self.erase),
        }
    }

    fn zero(&mut self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Primitive { primitive } => match primitive {
                Primitive::String => "\"\"".to_string(),
                Primitive::Bool => "false".to_string(),
                _ => "0".to_string(),
            },
            TypeRef::Named { name, args }
                if args.is_empty() && !self.structs.contains(name) && !self.interfaces.contains(name) =>
            {
                format!("{name}{{}}")
            }
            _ => "nil".to_string(),
        }
    }

    fn program(&mut self, program: &Program) {
        for decl in &program.body {
            match decl {
                Decl::Class(class) if class.kind == ClassKind::Interface => self.interface(class),
                Decl::Class(class) => self.class(class),
                Decl::Function(func) => {
                    let name = self
                        .globals
                        .get(&func.name)
                        .cloned()
                        .unwrap_or_else(|| func.name.clone());
                    self.function(func, &name, None);
                }
                Decl::Variable(var) => self.global(var),
            }
            self.e.blank();
        }
    }

    fn global(&mut self, var: &VarDecl) {
        let name = self
            .globals
            .get(&var.name)
            .cloned()
            .unwrap_or_else(|| var.name.clone());
        self.package_var(&name, &var.ty, var.init.as_ref());
    }

    fn package_var(&mut self, name: &str, ty: &TypeRef, init: Option<&Expr>) {
        match (init, ty) {
            (Some(init), TypeRef::Inferred) => {
                let value = self.expr(init);
                self.e.line(format!("var {name} = {value}"));
            }
            (Some(init), ty) => {
                let ty = self.ty(ty);
                let value = self.expr(init);
                self.e.line(format!("var {name} {ty} = {value}"));
            }
            (None, ty) => {
                let ty = self.ty(ty);
                self.e.line(format!("var {name} {ty}"));
            }
        }
    }

    fn interface(&mut self, class: &ClassDecl) {
        self.e.open(format!("type {} interface {{", class.name));
        if let Some(parent) = &class.extends {
            self.e.line(parent);
        }
        for method in &class.methods {
            let name = self
                .members
                .get(&method.name)
                .cloned()
                .unwrap_or_else(|| capitalize(&method.name));
            let signature = self.signature(method);
            self.e.line(format!("{name}{signature}"));
        }
        self.e.close("}");
    }

    fn class(&mut self, class: &ClassDecl) {
        let singleton = class.singleton_accessor().map(str::to_string);
        let instance: Vec<_> = class.fields.iter().filter(|f| !f.is_static).collect();
        if instance.is_empty() && class.extends.is_none() {
            self.e.line(format!("type {} struct{{}}", class.name));
        } else {
            self.e.open(format!("type {} struct {{", class.name));
            if let Some(parent) = &class.extends {
                self.e.line(parent);
            }
            for field in instance {
                let ty = self.ty(&field.ty);
                let name = exported(&field.name, field.visibility);
                self.e.line(format!("{name} {ty}"));
            }
            self.e.close("}");
        }

        let own_type = |ty: &TypeRef| matches!(ty, TypeRef::Named { name, .. } if *name == class.name);
        for field in class.fields.iter().filter(|f| f.is_static) {
            if singleton.is_some() && own_type(&field.ty) {
                continue;
            }
            let name = self.static_name(&class.name, &field.name);
            self.e.blank();
            self.package_var(&name, &field.ty, field.init.as_ref());
        }

        for method in &class.methods {
            self.e.blank();
            if lower::is_constructor(method, class) {
                self.constructor(method, class);
            } else if singleton.as_deref() == Some(method.name.as_str()) {
                self.singleton_accessor(method, class);
            } else if method.is_static {
                let name = self.static_name(&class.name, &method.name);
                self.function(method, &name, Some(class));
            } else {
                let name = self
                    .members
                    .get(&method.name)
                    .cloned()
                    .unwrap_or_else(|| method.name.clone());
                self.function(method, &name, Some(class));
            }
        }
    }

    fn static_name(&self, class: &str, member: &str) -> String {
        self.statics
            .get(&(class.to_string(), member.to_string()))
            .cloned()
            .unwrap_or_else(|| format!("{class}{}", capitalize(member)))
    }

    fn singleton_accessor(&mut self, method: &Function, class: &ClassDecl) {
        self.e.import("sync");
        let base = exported(&class.name, Visibility::Private);
        let instance = format!("{base}Instance");
        let once = format!("{base}Once");
        self.e.open("var (");
        self.e.line(format!("{instance} *{}", class.name));
        self.e.line(format!("{once} sync.Once"));
        self.e.close(")");
        self.e.blank();
        let name = self.static_name(&class.name, &method.name);
        self.e.open(format!("func {name}() *{} {{", class.name));
        self.e.open(format!("{once}.Do(func() {{"));
        self.e.line(format!("{instance} = &{}{{}}", class.name));
        self.e.close("})");
        self.e.line(format!("return {instance}"));
        self.e.close("}");
    }

    fn enter(&mut self, func: &Function, class: Option<&ClassDecl>) {
        let mut scope = Scope {
            returns_value: !func.return_type.is_void(),
            returns: (!func.return_type.is_void()).then(|| func.return_type.clone()),
            ..Scope::default()
        };
        if self.throwing.contains(&func.name) {
            scope.err_prefix = Some(if func.return_type.is_void() {
                String::new()
            } else {
                format!("{}, ", self.zero(&func.return_type))
            });
        }
        if let Some(class) = class {
            scope.class = Some(class.name.clone());
            if !func.is_static {
                scope.receiver = Some(receiver_name(&class.name));
            }
            for field in &class.fields {
                scope.types.insert(format!("this.{}", field.name), field.ty.clone());
            }
        }
        for p in &func.params {
            scope.types.insert(p.name.clone(), p.ty.clone());
        }
        self.scope = scope;
    }

    /// `(params) results`, without the name.
    fn signature(&mut self, func: &Function) -> String {
        let params: Vec<_> = func
            .params
            .iter()
            .map(|p| {
                let ty = self.ty(&p.ty);
                format!("{} {ty}", p.name)
            })
            .collect();
        let raises = self.throwing.contains(&func.name);
        let results = match (func.return_type.is_void(), raises) {
            (true, false) => String::new(),
            (true, true) => " error".to_string(),
            (false, false) => format!(" {}", self.ty(&func.return_type)),
            (false, true) => format!(" ({}, error)", self.ty(&func.return_type)),
        };
        format!("({}){results}", params.join(", "))
    }

    fn function(&mut self, func: &Function, name: &str, class: Option<&ClassDecl>) {
        self.enter(func, class);
        let signature = self.signature(func);
        let receiver = match (&self.scope.receiver, class) {
            (Some(r), Some(class)) => format!("({r} *{}) ", class.name),
            _ => String::new(),
        };
        if func.is_async {
            self.e.todo("async function runs synchronously; start it with `go` if needed");
        }
        self.e.open(format!("func {receiver}{name}{signature} {{"));
        self.body(&func.body);
        self.e.close("}");
    }

    fn constructor(&mut self, ctor: &Function, class: &ClassDecl) {
        self.enter(ctor, Some(class));
        self.scope.receiver = Some(receiver_name(&class.name));
        let raises = self.throwing.contains(&ctor.name);
        if raises {
            self.scope.err_prefix = Some("nil, ".to_string());
        }
        let params: Vec<_> = ctor
            .params
            .iter()
            .map(|p| {
                let ty = self.ty(&p.ty);
                format!("{} {ty}", p.name)
            })
            .collect();
        let results = if raises {
            format!("(*{}, error)", class.name)
        } else {
            format!("*{}", class.name)
        };
        self.e.open(format!(
            "func New{}({}) {results} {{",
            class.name,
            params.join(", ")
        ));
        let mut inits = BTreeMap::new();
        let mut rest = Vec::new();
        for stmt in &ctor.body {
            match lower::field_assignment(stmt) {
                Some((field, value)) if class.fields.iter().any(|f| f.name == field && !f.is_static) => {
                    inits.insert(field.to_string(), value);
                }
                _ => rest.push(stmt),
            }
        }
        let mut parts = Vec::new();
        for field in class.fields.iter().filter(|f| !f.is_static) {
            let value = inits.get(&field.name).copied().or(field.init.as_ref());
            if let Some(value) = value {
                let value = self.expr(value);
                parts.push(format!("{}: {value}", exported(&field.name, field.visibility)));
            }
        }
        let literal = format!("&{}{{{}}}", class.name, parts.join(", "));
        let r = receiver_name(&class.name);
        if rest.is_empty() {
            if raises {
                self.e.line(format!("return {literal}, nil"));
            } else {
                self.e.line(format!("return {literal}"));
            }
        } else {
            self.e.line(format!("{r} := {literal}"));
            for stmt in rest {
                self.stmt(stmt);
            }
            if raises {
                self.e.line(format!("return {r}, nil"));
            } else {
                self.e.line(format!("return {r}"));
            }
        }
        self.e.close("}");
    }

    fn body(&mut self, stmts: &[Stmt]) {
        for (i, stmt) in stmts.iter().enumerate() {
            let last = i + 1 == stmts.len();
            match stmt {
                Stmt::TryCatch {
                    body,
                    catch_param,
                    catch_body,
                    finally_body,
                } => self.try_catch(
                    body,
                    catch_param.as_deref(),
                    catch_body.as_deref(),
                    finally_body.as_deref(),
                    last,
                ),
                other => self.stmt(other),
            }
        }
        let falls_through = !matches!(stmts.last(), Some(Stmt::Return { .. } | Stmt::Throw { .. }));
        if falls_through && self.scope.err_prefix.is_some() && !self.scope.returns_value {
            self.e.line("return nil");
        }
    }

    fn block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    /// `return <zeros>, err` for the current function.
    fn propagate(&mut self, err: &str) {
        match self.scope.err_prefix.clone() {
            Some(prefix) => self.e.line(format!("return {prefix}{err}")),
            None => self.e.line(format!("panic({err})")),
        }
    }

    /// Name of a raising function called by `expr`, if any.
    fn raising_call<'e>(&self, expr: &'e Expr) -> Option<&'e str> {
        match expr {
            Expr::Call { callee, .. } => {
                lower::callee_name(callee).filter(|n| self.throwing.contains(*n))
            }
            _ => None,
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr { expr } => self.expr_stmt(expr),
            Stmt::Let(var) => self.let_stmt(var),
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
                if matches!(test, Expr::Literal { value: Literal::Bool(true) }) {
                    self.e.open("for {");
                } else {
                    let test = self.expr(test);
                    self.e.open(format!("for {test} {{"));
                }
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
                    Some(Stmt::Let(VarDecl {
                        name,
                        init: Some(value),
                        ..
                    })) => {
                        let value = self.expr(value);
                        format!("{name} := {value}")
                    }
                    Some(Stmt::Expr { expr }) => self.expr(expr),
                    _ => String::new(),
                };
                let test = test.as_ref().map(|t| self.expr(t)).unwrap_or_default();
                let update = update.as_ref().map(|u| self.post(u)).unwrap_or_default();
                if init.is_empty() && update.is_empty() {
                    if test.is_empty() {
                        self.e.open("for {");
                    } else {
                        self.e.open(format!("for {test} {{"));
                    }
                } else {
                    self.e.open(format!("for {init}; {test}; {update} {{"));
                }
                self.block(body);
                self.e.close("}");
            }
            Stmt::ForEach {
                variable,
                iterable,
                body,
            } => {
                let iterable = self.expr(iterable);
                self.e.open(format!("for _, {variable} := range {iterable} {{"));
                self.block(body);
                self.e.close("}");
            }
            Stmt::Return { value } => self.return_stmt(value.as_ref()),
            Stmt::Break => self.e.line("break"),
            Stmt::Continue => self.e.line("continue"),
            Stmt::Throw { value } => {
                let err = self.error_value(value);
                self.propagate(&err);
            }
            Stmt::TryCatch {
                body,
                catch_param,
                catch_body,
                finally_body,
            } => self.try_catch(
                body,
                catch_param.as_deref(),
                catch_body.as_deref(),
                finally_body.as_deref(),
                false,
            ),
        }
    }

    /// Post statement of a `for` clause: `i++` where possible.
    fn post(&mut self, update: &Expr) -> String {
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

    fn expr_stmt(&mut self, expr: &Expr) {
        if let Some(callee) = self.raising_call(expr)
            && self.scope.returns_error()
        {
            let call = self.expr(expr);
            let bind = if self.error_only.contains(callee) {
                "err"
            } else {
                "_, err"
            };
            self.e.open(format!("if {bind} := {call}; err != nil {{"));
            self.propagate("err");
            self.e.close("}");
            return;
        }
        if let Some((target, item)) = self.append_call(expr) {
            let target = self.expr(target);
            let item = self.expr(item);
            self.e.line(format!("{target} = append({target}, {item})"));
            return;
        }
        let text = self.expr(expr);
        self.e.line(text);
    }

    /// `xs.append(v)` on a slice → (`xs`, `v`).
    fn append_call<'e>(&self, expr: &'e Expr) -> Option<(&'e Expr, &'e Expr)> {
        let Expr::Call { callee, args } = expr else {
            return None;
        };
        let Expr::Member { object, field } = callee.as_ref() else {
            return None;
        };
        let [item] = args.as_slice() else {
            return None;
        };
        if !matches!(field.as_str(), "append" | "add" | "push") {
            return None;
        }
        matches!(self.type_of(object), Some(TypeRef::List { .. })).then_some((object.as_ref(), item))
    }

    fn type_of(&self, expr: &Expr) -> Option<&TypeRef> {
        match expr {
            Expr::Ident { name } => self.scope.types.get(name),
            Expr::Member { object, field } => match object.as_ref() {
                Expr::Ident { name } if name == "this" => {
                    self.scope.types.get(&format!("this.{field}"))
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn let_stmt(&mut self, var: &VarDecl) {
        let declared = !matches!(var.ty, TypeRef::Inferred);
        let ty = if declared {
            var.ty.clone()
        } else {
            var.init.as_ref().map(lower::infer_type).unwrap_or(TypeRef::Inferred)
        };
        self.scope.types.insert(var.name.clone(), ty.clone());
        let Some(init) = &var.init else {
            let ty = self.ty(&var.ty);
            self.e.line(format!("var {} {ty}", var.name));
            return;
        };
        if let Expr::Comprehension { .. } = init {
            self.collect_into(&var.name, &ty, init);
            return;
        }
        if let Some(callee) = self.raising_call(init) {
            let call = self.expr(init);
            if self.error_only.contains(callee) {
                self.e.todo(format!("`{callee}` returns only an error"));
            }
            self.e.line(format!("{}, err := {call}", var.name));
            self.e.open("if err != nil {");
            self.propagate("err");
            self.e.close("}");
            return;
        }
        let value = match (init, &ty) {
            (Expr::Array { items }, TypeRef::List { element }) => self.slice_literal(element, items),
            _ => self.expr(init),
        };
        if declared && !matches!(init, Expr::Array { .. }) {
            let ty = self.ty(&var.ty);
            self.e.line(format!("var {} {ty} = {value}", var.name));
        } else {
            self.e.line(format!("{} := {value}", var.name));
        }
    }

    /// Expand a comprehension into a slice-building loop assigned to `name`.
    fn collect_into(&mut self, name: &str, ty: &TypeRef, comprehension: &Expr) {
        let Expr::Comprehension {
            element,
            variable,
            iterable,
            condition,
        } = comprehension
        else {
            return;
        };
        let element_ty = match ty {
            TypeRef::List { element } => element.as_ref().clone(),
            _ => self.element_type(element, variable, iterable),
        };
        let element_ty = self.ty(&element_ty);
        let source = self.expr(iterable);
        self.e.line(format!("{name} := []{element_ty}{{}}"));
        self.e.open(format!("for _, {variable} := range {source} {{"));
        let item = self.expr(element);
        match condition {
            Some(condition) => {
                let condition = self.expr(condition);
                self.e.open(format!("if {condition} {{"));
                self.e.line(format!("{name} = append({name}, {item})"));
                self.e.close("}");
            }
            None => self.e.line(format!("{name} = append({name}, {item})")),
        }
        self.e.close("}");
    }

    fn element_type(&self, element: &Expr, variable: &str, iterable: &Expr) -> TypeRef {
        let source_element = match self.type_of(iterable) {
            Some(TypeRef::List { element }) => Some(element.as_ref().clone()),
            _ => None,
        };
        match element {
            Expr::Ident { name } if name == variable => source_element.unwrap_or(TypeRef::Any),
            other => match lower::infer_type(other) {
                TypeRef::Inferred => source_element.unwrap_or(TypeRef::Any),
                ty => ty,
            },
        }
    }

    fn return_stmt(&mut self, value: Option<&Expr>) {
        if self.scope.capture.is_some() {
            self.captured_return(value);
            return;
        }
        let Some(value) = value else {
            match self.scope.err_prefix {
                Some(_) => self.e.line("return nil"),
                None => self.e.line("return"),
            }
            return;
        };
        if let Expr::Comprehension { .. } = value {
            self.collect_into("result", &TypeRef::Inferred, value);
            self.return_value("result".to_string(), false);
            return;
        }
        // Same result shape: hand the callee's results straight back
        let forwards = self
            .raising_call(value)
            .is_some_and(|c| !self.error_only.contains(c) && self.scope.returns_value);
        let text = self.expr(value);
        self.return_value(text, forwards);
    }

    /// `return` inside a protected closure: store the value, flag it and
    /// leave the closure without an error.
    fn captured_return(&mut self, value: Option<&Expr>) {
        let Some(capture) = self.scope.capture else {
            return;
        };
        if let Some(value) = value
            && capture.value
        {
            let text = match self.raising_call(value) {
                Some(callee) if !self.error_only.contains(callee) => {
                    let call = self.expr(value);
                    self.e.line(format!("value, err := {call}"));
                    self.e.open("if err != nil {");
                    self.propagate("err");
                    self.e.close("}");
                    "value".to_string()
                }
                _ => self.expr(value),
            };
            self.e.line(format!("result = {text}"));
        }
        if capture.flag {
            self.e.line("returned = true");
        }
        self.e.line("return nil");
    }

    fn return_value(&mut self, text: String, forwards: bool) {
        if self.scope.err_prefix.is_some() && !forwards {
            self.e.line(format!("return {text}, nil"));
        } else {
            self.e.line(format!("return {text}"));
        }
    }

    fn if_chain(&mut self, keyword: &str, test: &Expr, consequent: &[Stmt], alternate: Option<&[Stmt]>) {
        let test = self.expr(test);
        self.e.open(format!("{keyword} {test} {{"));
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

    /// The protected block becomes a `func() error` closure checked right
    /// away. A `return` inside it stores its value in `result` and the
    /// function returns it once the handler has run.
    fn try_catch(
        &mut self,
        body: &[Stmt],
        catch_param: Option<&str>,
        catch_body: Option<&[Stmt]>,
        finally_body: Option<&[Stmt]>,
        tail: bool,
    ) {
        if let Some(finally_body) = finally_body {
            if !tail {
                self.e.todo("deferred block now runs when the function returns");
            }
            self.e.open("defer func() {");
            self.block(finally_body);
            self.e.close("}()");
        }
        let returns = crate::walk::any_stmt(body, |s| matches!(s, Stmt::Return { .. }));
        let outer_capture = self.scope.capture;
        // A nested block reuses the enclosing `result` and `returned`
        let capture = match (returns, outer_capture) {
            (false, _) => None,
            (true, Some(outer)) => Some(outer),
            (true, None) => {
                let value = self.scope.returns_value;
                let nested = crate::walk::any_stmt(body, |s| match s {
                    Stmt::TryCatch { body, .. } => {
                        crate::walk::any_stmt(body, |s| matches!(s, Stmt::Return { .. }))
                    }
                    _ => false,
                });
                let capture = Capture {
                    value,
                    flag: nested || !(tail && value),
                };
                if let Some(ty) = self.scope.returns.clone() {
                    let ty = self.ty(&ty);
                    self.e.line(format!("var result {ty}"));
                }
                if capture.flag {
                    self.e.line("returned := false");
                }
                Some(capture)
            }
        };

        let param = catch_param.unwrap_or("err");
        self.e.comment("errors raised in this block are handled below");
        let outer_prefix = self.scope.err_prefix.replace(String::new());
        self.scope.capture = capture.or(outer_capture);
        self.e.open(format!("if {param} := func() error {{"));
        self.block(body);
        if !matches!(body.last(), Some(Stmt::Return { .. } | Stmt::Throw { .. })) {
            self.e.line("return nil");
        }
        self.scope.err_prefix = outer_prefix;
        self.scope.capture = outer_capture;
        self.e.close(format!("}}(); {param} != nil {{"));
        self.e.indent();
        match catch_body {
            Some(catch_body) => self.block(catch_body),
            None => self.propagate(param),
        }
        self.e.close("}");

        let Some(capture) = capture else {
            return;
        };
        if outer_capture.is_some() {
            if capture.flag {
                self.e.open("if returned {");
                self.e.line("return nil");
                self.e.close("}");
            }
            return;
        }
        let result = capture.value.then(|| "result".to_string());
        if capture.flag {
            self.e.open("if returned {");
            self.finish_return(result);
            self.e.close("}");
        } else {
            self.finish_return(result);
        }
    }

    /// Return an already rendered value, or nothing, from the function.
    fn finish_return(&mut self, value: Option<String>) {
        match value {
            Some(text) => self.return_value(text, false),
            None if self.scope.err_prefix.is_some() => self.e.line("return nil"),
            None => self.e.line("return"),
        }
    }

    fn error_value(&mut self, value: &Expr) -> String {
        match value {
            Expr::New { class, args } if !self.structs.contains(class) => match args.first() {
                Some(Expr::Literal {
                    value: Literal::String(s),
                }) => {
                    self.e.import("errors");
                    format!("errors.New({})", quote(s))
                }
                Some(other) => {
                    self.e.import("fmt");
                    let other = self.expr(other);
                    format!("fmt.Errorf(\"%v\", {other})")
                }
                None => {
                    self.e.import("errors");
                    format!("errors.New({})", quote(class))
                }
            },
            Expr::Literal {
                value: Literal::String(s),
            } => {
                self.e.import("errors");
                format!("errors.New({})", quote(s))
            }
            Expr::Ident { .. } => self.expr(value),
            other => {
                self.e.import("fmt");
                let other = self.expr(other);
                format!("fmt.Errorf(\"%v\", {other})")
            }
        }
    }

    fn slice_literal(&mut self, element: &TypeRef, items: &[Expr]) -> String {
        let ty = self.ty(element);
        let items: Vec<_> = items.iter().map(|i| self.expr(i)).collect();
        format!("[]{ty}{{{}}}", items.join(", "))
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
        if name == "this"
            && let Some(receiver) = &self.scope.receiver
        {
            return receiver.clone();
        }
        self.globals
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    fn expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Literal { value } => match value {
                Literal::Null => "nil".to_string(),
                Literal::Bool(b) => b.to_string(),
                Literal::String(s) => quote(s),
                lit => number(lit).unwrap_or_default(),
            },
            Expr::Ident { name } => self.ident(name),
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
            Expr::Member { object, field } => self.member(object, field),
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
            Expr::New { class, args } => self.construct(class, args),
            Expr::Await { value } => self.expr(value),
            Expr::Array { items } => {
                let element = items.first().map(lower::infer_type).unwrap_or(TypeRef::Any);
                let element = match element {
                    TypeRef::Inferred => TypeRef::Any,
                    ty => ty,
                };
                self.slice_literal(&element, items)
            }
            Expr::Comprehension {
                element,
                variable,
                iterable,
                condition,
            } => {
                // Inline closure: the loop has no expression form
                let ty = self.element_type(element, variable, iterable);
                let ty = self.ty(&ty);
                let source = self.expr(iterable);
                let item = self.expr(element);
                let push = format!("out = append(out, {item})");
                let push = match condition {
                    Some(c) => format!("if {} {{ {push} }}", self.expr(c)),
                    None => push,
                };
                format!(
                    "func() []{ty} {{ out := []{ty}{{}}; for _, {variable} := range {source} {{ {push} }}; return out }}()"
                )
            }
        }
    }

    fn call(&mut self, callee: &Expr, args: &[Expr]) -> String {
        let rendered: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
        let args_text = rendered.join(", ");
        if is_print(callee) {
            self.e.import("fmt");
            return format!("fmt.Println({args_text})");
        }
        match callee {
            Expr::Member { object, field } => match object.as_ref() {
                Expr::Ident { name } if self.statics.contains_key(&(name.clone(), field.clone())) => {
                    let target = self.static_name(name, field);
                    format!("{target}({args_text})")
                }
                _ if matches!(field.as_str(), "size" | "length" | "len") && args.is_empty() => {
                    let object = self.expr(object);
                    format!("len({object})")
                }
                _ => {
                    let object = self.operand(object);
                    let method = self
                        .members
                        .get(field)
                        .cloned()
                        .unwrap_or_else(|| field.clone());
                    format!("{object}.{method}({args_text})")
                }
            },
            Expr::Ident { name } => {
                let target = match &self.scope.class {
                    Some(class) if self.statics.contains_key(&(class.clone(), name.clone())) => {
                        self.static_name(class, name)
                    }
                    Some(_) if self.members.contains_key(name) && self.scope.receiver.is_some() => {
                        let receiver = self.scope.receiver.clone().unwrap_or_default();
                        format!("{receiver}.{}", self.members[name])
                    }
                    _ => self.ident(name),
                };
                format!("{target}({args_text})")
            }
            other => {
                let callee = self.operand(other);
                format!("{callee}({args_text})")
            }
        }
    }

    fn member(&mut self, object: &Expr, field: &str) -> String {
        if let Expr::Ident { name } = object
            && self.statics.contains_key(&(name.clone(), field.to_string()))
        {
            return self.static_name(name, field);
        }
        if field == "length" {
            let object = self.expr(object);
            return format!("len({object})");
        }
        let object = self.operand(object);
        let field = self
            .members
            .get(field)
            .cloned()
            .unwrap_or_else(|| field.to_string());
        format!("{object}.{field}")
    }

    fn construct(&mut self, class: &str, args: &[Expr]) -> String {
        let rendered: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
        if self.structs.contains(class) {
            return format!("New{class}({})", rendered.join(", "));
        }
        match TypeRef::parse(class) {
            TypeRef::List { element } => {
                let ty = self.ty(&element);
                format!("[]{ty}{{}}")
            }
            TypeRef::Map { key, value } => {
                let key = self.ty(&key);
                let value = self.ty(&value);
                format!("map[{key}]{value}{{}}")
            }
            TypeRef::Set { element } => {
                let ty = self.ty(&element);
                format!("map[{ty}]bool{{}}")
            }
            _ if class.ends_with("Exception") || class.ends_with("Error") => {
                self.error_value(&Expr::new_object(class, args.to_vec()))
            }
            _ => format!("&{class}{{}}"),
        }
    }
}

impl Scope {
    /// Inside a protected closure this holds too: the closure hands the
    /// error to the catch clause.
    fn returns_error(&self) -> bool {
        self.err_prefix.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Field, Param};

    fn render(program: &Program) -> String {
        let generator = GoGenerator;
        generator.emit(program, &SemanticContext::new(), &generator.default_options())
    }

    fn validate() -> Function {
        Function::new(
            "validate",
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
        )
    }

    #[test]
    fn test_map_type() {
        let generator = GoGenerator;
        assert_eq!(
            generator.map_type(&TypeRef::list(TypeRef::optional(TypeRef::INT))),
            "[]*int"
        );
        assert_eq!(
            generator.map_type(&TypeRef::map(TypeRef::STRING, TypeRef::list(TypeRef::DOUBLE))),
            "map[string][]float64"
        );
        assert_eq!(generator.map_type(&TypeRef::parse("Foo<")), "interface{}");
    }

    #[test]
    fn test_throw_becomes_error_return() {
        let program = Program::new(Language::Java, vec![Decl::Function(validate())]);
        let out = render(&program);
        assert!(out.contains("package main\n\nimport \"errors\"\n"));
        assert!(out.contains("func Validate(age int) (int, error) {"));
        assert!(out.contains("\t\treturn 0, errors.New(\"negative age\")"));
        assert!(out.contains("\treturn age, nil"));
    }

    #[test]
    fn test_raising_calls_check_err() {
        let caller = Function::new(
            "run",
            vec![],
            TypeRef::Void,
            vec![Stmt::expr(Expr::call(Expr::ident("validate"), vec![Expr::int(1)]))],
        );
        let program = Program::new(
            Language::Java,
            vec![Decl::Function(validate()), Decl::Function(caller)],
        );
        let out = render(&program);
        assert!(out.contains("func Run() error {"));
        assert!(out.contains("\tif _, err := Validate(1); err != nil {\n\t\treturn err\n\t}"));
        assert!(out.contains("\treturn nil\n}"));
    }

    #[test]
    fn test_class_becomes_struct_with_receiver() {
        let class = ClassDecl::new("Circle")
            .with_field(Field::new("radius", TypeRef::DOUBLE))
            .with_method(Function::new(
                "area",
                vec![],
                TypeRef::DOUBLE,
                vec![Stmt::return_stmt(Some(Expr::binary(
                    Expr::float(3.14),
                    BinaryOp::Mul,
                    Expr::member(Expr::ident("this"), "radius"),
                )))],
            ));
        let program = Program::new(Language::Java, vec![Decl::Class(class)]);
        let out = render(&program);
        assert!(out.contains("type Circle struct {\n\tRadius float64\n}"));
        assert!(out.contains("func (c *Circle) Area() float64 {\n\treturn 3.14 * c.Radius\n}"));
    }

    #[test]
    fn test_loops() {
        let func = Function::new(
            "walk",
            vec![Param::new("xs", TypeRef::list(TypeRef::INT))],
            TypeRef::Void,
            vec![
                Stmt::let_decl("i", Some(Expr::int(0))),
                Stmt::while_loop(
                    Expr::binary(Expr::ident("i"), BinaryOp::Lt, Expr::int(10)),
                    vec![Stmt::expr(Expr::assign(
                        Expr::ident("i"),
                        Expr::binary(Expr::ident("i"), BinaryOp::Add, Expr::int(1)),
                    ))],
                ),
                Stmt::for_each(
                    "x",
                    Expr::ident("xs"),
                    vec![Stmt::expr(Expr::call(Expr::ident("print"), vec![Expr::ident("x")]))],
                ),
            ],
        );
        let program = Program::new(Language::Python, vec![Decl::Function(func)]);
        let out = render(&program);
        assert!(out.contains("\ti := 0\n"));
        assert!(out.contains("\tfor i < 10 {\n\t\ti = i + 1\n\t}"));
        assert!(out.contains("\tfor _, x := range xs {\n\t\tfmt.Println(x)\n\t}"));
    }

    #[test]
    fn test_try_catch_uses_closure() {
        let func = Function::new(
            "safe",
            vec![],
            TypeRef::Void,
            vec![Stmt::try_catch(
                vec![Stmt::throw(Expr::string("boom"))],
                Some("e"),
                Some(vec![Stmt::expr(Expr::call(
                    Expr::ident("print"),
                    vec![Expr::ident("e")],
                ))]),
                None,
            )],
        );
        let program = Program::new(Language::Java, vec![Decl::Function(func)]);
        let out = render(&program);
        assert!(out.contains("func Safe() {"));
        assert!(out.contains(
            "\tif e := func() error {\n\t\treturn errors.New(\"boom\")\n\t}(); e != nil {\n\t\tfmt.Println(e)\n\t}"
        ));
    }

    #[test]
    fn test_comprehension_expands_to_loop() {
        let func = Function::new(
            "evens",
            vec![Param::new("xs", TypeRef::list(TypeRef::INT))],
            TypeRef::list(TypeRef::INT),
            vec![
                Stmt::let_decl(
                    "out",
                    Some(Expr::Comprehension {
                        element: Box::new(Expr::ident("x")),
                        variable: "x".to_string(),
                        iterable: Box::new(Expr::ident("xs")),
                        condition: Some(Box::new(Expr::binary(
                            Expr::binary(Expr::ident("x"), BinaryOp::Mod, Expr::int(2)),
                            BinaryOp::Eq,
                            Expr::int(0),
                        ))),
                    }),
                ),
                Stmt::return_stmt(Some(Expr::ident("out"))),
            ],
        );
        let program = Program::new(Language::Python, vec![Decl::Function(func)]);
        let out = render(&program);
        assert!(out.contains("\tout := []int{}\n\tfor _, x := range xs {\n\t\tif (x % 2) == 0 {\n\t\t\tout = append(out, x)\n\t\t}\n\t}"));
    }

    #[test]
    fn test_singleton_uses_sync_once() {
        let class = ClassDecl::new("Config")
            .with_field(Field::new("instance", TypeRef::named("Config")).private().static_())
            .with_method(
                Function::new(
                    "getInstance",
                    vec![],
                    TypeRef::named("Config"),
                    vec![Stmt::return_stmt(Some(Expr::member(
                        Expr::ident("Config"),
                        "instance",
                    )))],
                )
                .static_(),
            );
        let mut program = Program::new(Language::Java, vec![Decl::Class(class)]);
        assert!(GoGenerator.adapt_pattern(&mut program, SemanticPattern::Singleton));
        let out = render(&program);
        assert!(out.contains("import \"sync\""));
        assert!(out.contains("\tconfigOnce sync.Once"));
        assert!(out.contains("func ConfigGetInstance() *Config {"));
        assert!(out.contains("\tconfigOnce.Do(func() {\n\t\tconfigInstance = &Config{}\n\t})"));
    }

    #[test]
    fn test_return_inside_try_reaches_the_caller() {
        let func = Function::new(
            "checked",
            vec![],
            TypeRef::INT,
            vec![Stmt::try_catch(
                vec![Stmt::return_stmt(Some(Expr::call(
                    Expr::ident("validate"),
                    vec![Expr::int(1)],
                )))],
                Some("e"),
                Some(vec![Stmt::return_stmt(Some(Expr::int(0)))]),
                None,
            )],
        );
        let program = Program::new(
            Language::Java,
            vec![Decl::Function(validate()), Decl::Function(func)],
        );
        let out = render(&program);
        assert!(out.contains(
            "\tvar result int
\t// errors raised in this block are handled below
\tif e := func() error {
\t\tvalue, err := Validate(1)
\t\tif err != nil {
\t\t\treturn err
\t\t}
\t\tresult = value
\t\treturn nil
\t}(); e != nil {
\t\treturn 0
\t}
\treturn result
}"
        ), "{out}");
        assert!(!out.contains("TODO"));
    }

    #[test]
    fn test_early_return_inside_try_skips_the_rest() {
        let func = Function::new(
            "stop",
            vec![Param::new("done", TypeRef::BOOL)],
            TypeRef::Void,
            vec![
                Stmt::try_catch(
                    vec![
                        Stmt::if_stmt(Expr::ident("done"), vec![Stmt::return_stmt(None)], None),
                        Stmt::expr(Expr::call(Expr::ident("print"), vec![Expr::string("a")])),
                    ],
                    Some("e"),
                    Some(vec![Stmt::expr(Expr::call(
                        Expr::ident("print"),
                        vec![Expr::ident("e")],
                    ))]),
                    None,
                ),
                Stmt::expr(Expr::call(Expr::ident("print"), vec![Expr::string("b")])),
            ],
        );
        let program = Program::new(Language::Java, vec![Decl::Function(func)]);
        let out = render(&program);
        assert!(out.contains(
            "\treturned := false
\t// errors raised in this block are handled below
\tif e := func() error {
\t\tif done {
\t\t\treturned = true
\t\t\treturn nil
\t\t}
\t\tfmt.Println(\"a\")
\t\treturn nil
\t}(); e != nil {
\t\tfmt.Println(e)
\t}
\tif returned {
\t\treturn
\t}
\tfmt.Println(\"b\")"
        ), "{out}");
    }

    #[test]
    fn test_bare_field_references_are_qualified() {
        let class = ClassDecl::new("Counter")
            .with_field(Field::new("count", TypeRef::INT).private())
            .with_field(
                Field::new("total", TypeRef::INT)
                    .private()
                    .static_()
                    .with_init(Expr::int(0)),
            )
            .with_method(Function::new(
                "get",
                vec![],
                TypeRef::INT,
                vec![
                    Stmt::expr(Expr::call(Expr::ident("print"), vec![Expr::ident("total")])),
                    Stmt::return_stmt(Some(Expr::ident("count"))),
                ],
            ));
        let program = Program::new(Language::Java, vec![Decl::Class(class)]);
        let out = render(&program);
        assert!(out.contains("\tfmt.Println(counterTotal)\n\treturn c.count\n}"), "{out}");
    }
}
