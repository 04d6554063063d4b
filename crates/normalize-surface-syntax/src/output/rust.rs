//! Rust generator.
//!
//! Classes become a `struct` plus `impl` blocks and interfaces become traits.
//! Functions that may raise return `Result<T, Box<dyn std::error::Error>>`;
//! `throw` turns into an early `Err` return and calls to other raising
//! functions propagate with `?`. Non-`Copy` parameters are borrowed when
//! memory management is explicit.

use crate::context::{SemanticContext, SemanticPattern};
use crate::emitter::{
    Emitter, TypeNotes, TypeSpelling, c_binary_op, is_print, mutated_names, needs_parens, number,
    quote, snake_case, spell_in,
};
use crate::ir::{
    BinaryOp, ClassDecl, ClassKind, Decl, Expr, Field, Function, Hint, Literal, Param, Primitive,
    Program, Stmt, TypeRef, UnaryOp, VarDecl, Visibility,
};
use crate::lower;
use crate::options::{TranslationOptions, keys};
use crate::traits::{Generator, Rendered};
use normalize_language_meta::Language;
use std::collections::{BTreeMap, BTreeSet};

const ERROR_TYPE: &str = "Box<dyn std::error::Error>";

/// Emits the IR as Rust source.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustGenerator;

fn primitive(p: Primitive) -> &'static str {
    match p {
        Primitive::Int => "i32",
        Primitive::Long => "i64",
        Primitive::Float => "f32",
        Primitive::Double => "f64",
        Primitive::Bool => "bool",
        Primitive::Char => "char",
        Primitive::String => "String",
        Primitive::Byte => "u8",
    }
}

impl TypeSpelling for RustGenerator {
    const ANY: &'static str = "Box<dyn std::any::Any>";

    fn spell(&self, ty: &TypeRef, erase: bool, notes: &mut TypeNotes) -> String {
        match ty {
            TypeRef::Void => "()".to_string(),
            TypeRef::Inferred => "_".to_string(),
            TypeRef::Any => Self::ANY.to_string(),
            TypeRef::Primitive { primitive: p } => primitive(*p).to_string(),
            TypeRef::List { element } => {
                format!("Vec<{}>", self.spell_element(element, erase, notes))
            }
            TypeRef::Set { element } => {
                notes.imports.push("std::collections::HashSet");
                format!("HashSet<{}>", self.spell_element(element, erase, notes))
            }
            TypeRef::Map { key, value } => {
                notes.imports.push("std::collections::HashMap");
                let key = self.spell_element(key, erase, notes);
                format!("HashMap<{}, {}>", key, self.spell_element(value, erase, notes))
            }
            TypeRef::Optional { inner } => format!("Option<{}>", self.spell(inner, erase, notes)),
            TypeRef::Named { name, args } if args.is_empty() => name.clone(),
            TypeRef::Named { name, args } => {
                let args: Vec<_> = args
                    .iter()
                    .map(|a| self.spell_element(a, erase, notes))
                    .collect();
                format!("{}<{}>", name, args.join(", "))
            }
            TypeRef::Unresolved { descriptor } => {
                notes.unresolved.push(descriptor.clone());
                Self::ANY.to_string()
            }
        }
    }
}

impl Generator for RustGenerator {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn default_options(&self) -> TranslationOptions {
        TranslationOptions::new()
            .with(keys::EXPLICIT_MEMORY_MANAGEMENT, true)
            .with(keys::USE_BORROWING, true)
            .with(keys::CONVERT_EXCEPTIONS_TO_RESULTS, true)
            .with(keys::PREFER_ASYNC_AWAIT, true)
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
        let program = lower::qualified(program);
        let mut emitter = RustEmitter::new(self, &program, options);
        emitter.program(&program);
        let comments = options.generate_comments();
        let source = program.source;
        emitter.e.finish(|imports| {
            let mut header = Vec::new();
            if comments {
                header.push(format!("// Translated from {source}."));
            }
            header.extend(imports.iter().map(|i| format!("use {i};")));
            header
        })
    }

    fn apply_idiom(&self, program: &mut Program, idiom: &str) -> bool {
        match idiom {
            "iterator_methods" => lower::loops_to_comprehensions(program) > 0,
            "result_types" => {
                let before: Vec<bool> = program.functions().map(|f| f.throws).collect();
                lower::mark_throws(program);
                program.functions().map(|f| f.throws).ne(before)
            }
            "zero_cost_abstractions" => lower::hint_inline(program),
            _ => false,
        }
    }

    fn adapt_pattern(&self, program: &mut Program, pattern: SemanticPattern) -> bool {
        match pattern {
            SemanticPattern::Singleton => lower::hint_singletons(program),
            SemanticPattern::DataClass => lower::hint_data_classes(program),
            // Raising functions already become `Result`, async stays `async fn`
            SemanticPattern::ErrorHandling | SemanticPattern::Async => true,
            SemanticPattern::Factory | SemanticPattern::Observer => false,
        }
    }
}

/// State of the function being emitted.
#[derive(Default)]
struct Scope {
    /// `?` and `return Err(..)` are valid here.
    in_result: bool,
    /// Returns are wrapped in `Ok`.
    wraps_ok: bool,
    /// Inside a protected block: returns become `Ok(Some(..))`.
    in_attempt: bool,
    is_async: bool,
    /// Declared return type, unless void.
    returns: Option<TypeRef>,
    borrowed: BTreeSet<String>,
    mutated: BTreeSet<String>,
    types: BTreeMap<String, TypeRef>,
    /// Methods of the enclosing class: name → is static.
    methods: BTreeMap<String, bool>,
}

struct RustEmitter<'a> {
    e: Emitter,
    spelling: &'a RustGenerator,
    options: &'a TranslationOptions,
    erase: bool,
    classes: BTreeSet<String>,
    interfaces: BTreeMap<String, BTreeSet<String>>,
    throwing: BTreeSet<String>,
    constants: BTreeMap<String, String>,
    scope: Scope,
}

impl<'a> RustEmitter<'a> {
    fn new(spelling: &'a RustGenerator, program: &Program, options: &'a TranslationOptions) -> Self {
        let classes = program.classes().map(|c| c.name.clone()).collect();
        let interfaces = program
            .classes()
            .filter(|c| c.kind == ClassKind::Interface)
            .map(|c| {
                let names = c.methods.iter().map(|m| m.name.clone()).collect();
                (c.name.clone(), names)
            })
            .collect();
        let constants = program
            .body
            .iter()
            .filter_map(|d| match d {
                Decl::Variable(v) => Some((v.name.clone(), snake_case(&v.name).to_uppercase())),
                _ => None,
            })
            .collect();
        Self {
            e: Emitter::new(options, "//"),
            spelling,
            options,
            erase: options.semantic_fallback(),
            classes,
            interfaces,
            throwing: if options.bool_or(keys::CONVERT_EXCEPTIONS_TO_RESULTS, true) {
                lower::throwing_functions(program)
            } else {
                BTreeSet::new()
            },
            constants,
            scope: Scope::default(),
        }
    }

    fn ty(&mut self, ty: &TypeRef) -> String {
        spell_in(self.spelling, &mut self.e, ty, self.erase)
    }

    /// Constants hold string literals, not owned strings.
    fn const_ty(&mut self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Primitive {
                primitive: Primitive::String,
            } => "&str".to_string(),
            other => self.ty(other),
        }
    }

    fn borrowing(&self) -> bool {
        self.options.flag(keys::EXPLICIT_MEMORY_MANAGEMENT)
            && self.options.bool_or(keys::USE_BORROWING, true)
    }

    fn program(&mut self, program: &Program) {
        for decl in &program.body {
            match decl {
                Decl::Class(class) if class.kind == ClassKind::Interface => self.interface(class),
                Decl::Class(class) => self.class(class),
                Decl::Function(func) => self.function(func, None, false),
                Decl::Variable(var) => self.constant(var),
            }
            self.e.blank();
        }
    }

    fn constant(&mut self, var: &VarDecl) {
        let ty = match (&var.ty, &var.init) {
            (TypeRef::Inferred, Some(init)) => lower::infer_type(init),
            (ty, _) => ty.clone(),
        };
        let ty = match ty {
            TypeRef::Inferred => TypeRef::Unresolved {
                descriptor: format!("<type of {}>", var.name),
            },
            ty => ty,
        };
        let ty = self.const_ty(&ty);
        let name = self
            .constants
            .get(&var.name)
            .cloned()
            .unwrap_or_else(|| var.name.clone());
        match &var.init {
            Some(init) => {
                let value = self.expr(init);
                self.e.line(format!("pub const {name}: {ty} = {value};"));
            }
            None => {
                self.e.todo(format!("`{}` has no initializer", var.name));
                self.e.line(format!("pub static {name}: Option<{ty}> = None;"));
            }
        }
    }

    // Declarations

    fn interface(&mut self, class: &ClassDecl) {
        let supertraits = match &class.extends {
            Some(parent) => format!(": {parent}"),
            None => String::new(),
        };
        self.e.open(format!("pub trait {}{} {{", class.name, supertraits));
        self.scope.methods = method_table(class);
        for (i, method) in class.methods.iter().enumerate() {
            if i > 0 {
                self.e.blank();
            }
            self.function(method, Some(class), true);
        }
        self.e.close("}");
    }

    fn class(&mut self, class: &ClassDecl) {
        let singleton = class.singleton_accessor().map(str::to_string);
        let instance_fields: Vec<&Field> = class.fields.iter().filter(|f| !f.is_static).collect();
        let static_fields: Vec<&Field> = class
            .fields
            .iter()
            .filter(|f| f.is_static && !is_singleton_instance(f, class, singleton.is_some()))
            .collect();

        if let Some(parent) = &class.extends {
            self.e.todo(format!(
                "`{}` extended `{parent}`; inherited fields and methods are not merged",
                class.name
            ));
        }
        let mut derives = vec!["Debug"];
        if class.has_hint(&Hint::DataClass) {
            derives.extend(["Clone", "PartialEq"]);
        }
        if singleton.is_some() {
            derives.push("Default");
        }
        self.e.line(format!("#[derive({})]", derives.join(", ")));
        if instance_fields.is_empty() {
            self.e.line(format!("pub struct {};", class.name));
        } else {
            self.e.open(format!("pub struct {} {{", class.name));
            for field in instance_fields {
                let ty = self.ty(&field.ty);
                let vis = visibility(field.visibility);
                self.e.line(format!("{vis}{}: {ty},", snake_case(&field.name)));
            }
            self.e.close("}");
        }

        // Methods implementing a known interface go into `impl Trait for`
        let mut by_trait: BTreeMap<&str, Vec<&Function>> = BTreeMap::new();
        let mut inherent: Vec<&Function> = Vec::new();
        for method in &class.methods {
            let owner = class
                .implements
                .iter()
                .find(|i| self.interfaces.get(*i).is_some_and(|m| m.contains(&method.name)));
            match owner {
                Some(trait_name) if !method.is_static => {
                    by_trait.entry(trait_name.as_str()).or_default().push(method)
                }
                _ => inherent.push(method),
            }
        }

        self.scope.methods = method_table(class);
        if !inherent.is_empty() || !static_fields.is_empty() || singleton.is_some() {
            self.e.blank();
            self.e.open(format!("impl {} {{", class.name));
            let mut first = true;
            for field in static_fields {
                self.static_field(field);
                first = false;
            }
            for method in inherent {
                if !first {
                    self.e.blank();
                }
                first = false;
                if lower::is_constructor(method, class) {
                    self.constructor(method, class);
                } else if singleton.as_deref() == Some(method.name.as_str()) {
                    self.singleton_accessor(method, class);
                } else {
                    self.function(method, Some(class), false);
                }
            }
            self.e.close("}");
        }
        for (trait_name, methods) in by_trait {
            self.e.blank();
            self.e.open(format!("impl {} for {} {{", trait_name, class.name));
            for (i, method) in methods.into_iter().enumerate() {
                if i > 0 {
                    self.e.blank();
                }
                self.function(method, Some(class), true);
            }
            self.e.close("}");
        }
    }

    fn static_field(&mut self, field: &Field) {
        let ty = self.const_ty(&field.ty);
        let name = snake_case(&field.name).to_uppercase();
        match &field.init {
            Some(init) => {
                let value = self.expr(init);
                self.e.line(format!("pub const {name}: {ty} = {value};"));
            }
            None => {
                self.e.todo(format!("static field `{}` has no initializer", field.name));
                self.e.line(format!("// pub const {name}: {ty};"));
            }
        }
    }

    fn singleton_accessor(&mut self, method: &Function, class: &ClassDecl) {
        self.e.import("std::sync::OnceLock");
        let name = snake_case(&method.name);
        self.e.open(format!(
            "pub fn {name}() -> &'static {} {{",
            class.name
        ));
        self.e.line(format!(
            "static INSTANCE: OnceLock<{0}> = OnceLock::new();",
            class.name
        ));
        self.e.line(format!("INSTANCE.get_or_init({}::default)", class.name));
        self.e.close("}");
    }

    fn constructor(&mut self, ctor: &Function, class: &ClassDecl) {
        self.enter(ctor, Some(class));
        let params = self.params(&ctor.params);
        let wraps = self.scope.wraps_ok;
        let ret = if wraps {
            format!("Result<Self, {ERROR_TYPE}>")
        } else {
            "Self".to_string()
        };
        self.e.open(format!("pub fn new({params}) -> {ret} {{"));
        let mut inits: BTreeMap<&str, &Expr> = BTreeMap::new();
        for stmt in &ctor.body {
            match lower::field_assignment(stmt) {
                Some((field, value)) if class.fields.iter().any(|f| f.name == field) => {
                    inits.insert(field, value);
                }
                _ => self.stmt(stmt),
            }
        }
        let mut parts = Vec::new();
        for field in class.fields.iter().filter(|f| !f.is_static) {
            let name = snake_case(&field.name);
            let value = match inits.get(field.name.as_str()).copied().or(field.init.as_ref()) {
                Some(Expr::Ident { name: src }) if snake_case(src) == name => {
                    self.owned_ident(src)
                }
                Some(value) => self.owned(value),
                None => "Default::default()".to_string(),
            };
            if value == name {
                parts.push(name);
            } else {
                parts.push(format!("{name}: {value}"));
            }
        }
        let literal = if parts.is_empty() {
            "Self".to_string()
        } else {
            format!("Self {{ {} }}", parts.join(", "))
        };
        if wraps {
            self.e.line(format!("Ok({literal})"));
        } else {
            self.e.line(literal);
        }
        self.e.close("}");
    }

    /// Set up the scope for `func`.
    fn enter(&mut self, func: &Function, owner: Option<&ClassDecl>) {
        let mut scope = Scope {
            mutated: mutated_names(&func.body),
            is_async: func.is_async && self.options.bool_or(keys::PREFER_ASYNC_AWAIT, true),
            returns: (!func.return_type.is_void()).then(|| func.return_type.clone()),
            ..Scope::default()
        };
        let raises = self.throwing.contains(&func.name);
        scope.in_result = raises;
        scope.wraps_ok = raises;
        if let Some(class) = owner {
            scope.methods = method_table(class);
            for field in &class.fields {
                scope
                    .types
                    .insert(format!("this.{}", field.name), field.ty.clone());
            }
        }
        self.scope = scope;
    }

    fn params(&mut self, params: &[Param]) -> String {
        let borrowing = self.borrowing();
        let mut out = Vec::with_capacity(params.len());
        for p in params {
            let name = snake_case(&p.name);
            self.scope.types.insert(p.name.clone(), p.ty.clone());
            let by_ref = borrowing && !p.ty.is_copy() && is_borrowable(&p.ty);
            let ty = if !by_ref {
                self.ty(&p.ty)
            } else if self.scope.mutated.contains(&p.name) {
                self.scope.borrowed.insert(p.name.clone());
                format!("&mut {}", self.ty(&p.ty))
            } else {
                self.scope.borrowed.insert(p.name.clone());
                match &p.ty {
                    TypeRef::Primitive {
                        primitive: Primitive::String,
                    } => "&str".to_string(),
                    TypeRef::List { element } if !self.erase => format!("&[{}]", self.ty(element)),
                    other => format!("&{}", self.ty(other)),
                }
            };
            out.push(format!("{name}: {ty}"));
        }
        out.join(", ")
    }

    fn function(&mut self, func: &Function, owner: Option<&ClassDecl>, in_trait: bool) {
        self.enter(func, owner);
        if self.options.optimize_performance() && (func.body.len() == 1 || func.has_hint(&Hint::Inline))
        {
            self.e.line("#[inline]");
        }
        let vis = if in_trait { "" } else { visibility(func.visibility) };
        let asyncness = if self.scope.is_async { "async " } else { "" };
        let mut params = Vec::new();
        if owner.is_some() && !func.is_static {
            params.push(if self.scope.mutated.contains("this") {
                "&mut self".to_string()
            } else {
                "&self".to_string()
            });
        }
        let rest = self.params(&func.params);
        if !rest.is_empty() {
            params.push(rest);
        }
        let ret = self.return_type(func);
        let signature = format!(
            "{vis}{asyncness}fn {}({}){ret}",
            snake_case(&func.name),
            params.join(", ")
        );
        let is_trait_decl = owner.is_some_and(|c| c.kind == ClassKind::Interface);
        if is_trait_decl && func.body.is_empty() {
            self.e.line(format!("{signature};"));
            return;
        }
        if func.is_async && !self.scope.is_async {
            self.e.todo("async function emitted as synchronous");
        }
        self.e.open(format!("{signature} {{"));
        self.body(&func.body, func.return_type.is_void());
        self.e.close("}");
    }

    fn return_type(&mut self, func: &Function) -> String {
        let ty = if func.return_type.is_void() {
            "()".to_string()
        } else {
            self.ty(&func.return_type)
        };
        if self.scope.wraps_ok {
            format!(" -> Result<{ty}, {ERROR_TYPE}>")
        } else if func.return_type.is_void() {
            String::new()
        } else {
            format!(" -> {ty}")
        }
    }

    /// Function body; the final `return` becomes a tail expression.
    fn body(&mut self, stmts: &[Stmt], void: bool) {
        let Some((last, init)) = stmts.split_last() else {
            if self.scope.wraps_ok {
                self.e.line("Ok(())");
            }
            return;
        };
        for stmt in init {
            self.stmt(stmt);
        }
        match last {
            Stmt::Return { value } => {
                let value = match value {
                    Some(v) => self.returned(v),
                    None => "()".to_string(),
                };
                if self.scope.wraps_ok {
                    self.e.line(format!("Ok({value})"));
                } else if value != "()" {
                    self.e.line(value);
                }
            }
            Stmt::Throw { .. } => self.stmt(last),
            Stmt::TryCatch {
                body,
                catch_param,
                catch_body,
                finally_body,
            } if !void => self.try_catch(
                body,
                catch_param.as_deref(),
                catch_body.as_deref(),
                finally_body.as_deref(),
                true,
            ),
            other => {
                self.stmt(other);
                if self.scope.wraps_ok && void {
                    self.e.line("Ok(())");
                }
            }
        }
    }

    // Statements

    fn block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr { expr } => {
                let text = self.expr(expr);
                self.e.line(format!("{text};"));
            }
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
                    self.e.open("loop {");
                } else {
                    let test = self.expr(test);
                    self.e.open(format!("while {test} {{"));
                }
                self.block(body);
                self.e.close("}");
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => self.for_loop(init.as_deref(), test.as_ref(), update.as_ref(), body),
            Stmt::ForEach {
                variable,
                iterable,
                body,
            } => {
                let iterable = self.iterable(iterable);
                self.e
                    .open(format!("for {} in {iterable} {{", snake_case(variable)));
                self.block(body);
                self.e.close("}");
            }
            Stmt::Return { value } => {
                let line = match value.as_ref().map(|v| self.returned(v)) {
                    Some(v) => self.return_line(&v),
                    None if self.scope.in_attempt || self.scope.wraps_ok => self.return_line("()"),
                    None => "return;".to_string(),
                };
                self.e.line(line);
            }
            Stmt::Break => self.e.line("break;"),
            Stmt::Continue => self.e.line("continue;"),
            Stmt::Throw { value } => {
                let error = self.error_value(value);
                if self.scope.in_result {
                    self.e.line(format!("return Err({error}.into());"));
                } else {
                    self.e.line(format!("panic!(\"{{}}\", {error});"));
                }
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

    /// `return value` in the current context.
    fn return_line(&self, value: &str) -> String {
        if self.scope.in_attempt {
            format!("return Ok(Some({value}));")
        } else if self.scope.wraps_ok {
            format!("return Ok({value});")
        } else {
            format!("return {value};")
        }
    }

    fn let_stmt(&mut self, var: &VarDecl) {
        let ty = match (&var.ty, &var.init) {
            (TypeRef::Inferred, Some(init)) => lower::infer_type(init),
            (ty, _) => ty.clone(),
        };
        let mutability = if var.mutable && self.scope.mutated.contains(&var.name) {
            "mut "
        } else {
            ""
        };
        let annotation = if !var.ty.is_void()
            && !matches!(var.ty, TypeRef::Inferred)
            && (self.options.include_type_annotations() || var.init.is_none())
        {
            format!(": {}", self.ty(&var.ty))
        } else {
            String::new()
        };
        let init = var.init.as_ref().map(|init| self.owned(init));
        self.scope.types.insert(var.name.clone(), ty);
        let name = snake_case(&var.name);
        match init {
            Some(init) => self
                .e
                .line(format!("let {mutability}{name}{annotation} = {init};")),
            None => self.e.line(format!("let {mutability}{name}{annotation};")),
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

    fn for_loop(
        &mut self,
        init: Option<&Stmt>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &[Stmt],
    ) {
        if let Some((var, start, end, inclusive)) = counting_loop(init, test, update) {
            let start = self.expr(start);
            let end = self.expr(end);
            let range = if inclusive { "..=" } else { ".." };
            self.e
                .open(format!("for {} in {start}{range}{end} {{", snake_case(var)));
            self.block(body);
            self.e.close("}");
            return;
        }
        if let Some(init) = init {
            self.stmt(init);
        }
        match test {
            Some(test) => {
                let test = self.expr(test);
                self.e.open(format!("while {test} {{"));
            }
            None => self.e.open("loop {"),
        }
        self.block(body);
        if let Some(update) = update {
            let update = self.expr(update);
            self.e.line(format!("{update};"));
        }
        self.e.close("}");
    }

    /// The protected block runs in a closure (an `async` block inside async
    /// functions) so `?` stops at the handler. A `return` inside it yields
    /// `Ok(Some(value))`, which is returned again once the handler and the
    /// cleanup have run. `tail` marks the last statement of a function
    /// with a value.
    fn try_catch(
        &mut self,
        body: &[Stmt],
        catch_param: Option<&str>,
        catch_body: Option<&[Stmt]>,
        finally_body: Option<&[Stmt]>,
        tail: bool,
    ) {
        let returns = crate::walk::any_stmt(body, |s| matches!(s, Stmt::Return { .. }));
        let ok = if returns {
            let ty = match &self.scope.returns {
                Some(ty) => self.spelling.spell_plain(ty),
                None => "()".to_string(),
            };
            format!("Option<{ty}>")
        } else {
            "()".to_string()
        };
        let is_async = self.scope.is_async;
        self.e.comment("errors raised in this block are handled below");
        if is_async {
            self.e
                .open(format!("let attempt: Result<{ok}, {ERROR_TYPE}> = async {{"));
        } else {
            self.e
                .open(format!("let attempt = (|| -> Result<{ok}, {ERROR_TYPE}> {{"));
        }
        let outer = (self.scope.in_result, self.scope.wraps_ok, self.scope.in_attempt);
        self.scope.in_result = true;
        self.scope.wraps_ok = false;
        self.scope.in_attempt = returns;
        self.block(body);
        let done = if returns { "None" } else { "()" };
        if is_async {
            // Pins the block's error type for `?`
            self.e.line(format!("Ok::<{ok}, {ERROR_TYPE}>({done})"));
        } else if !ends_in_exit(body) {
            self.e.line(format!("Ok({done})"));
        }
        (self.scope.in_result, self.scope.wraps_ok, self.scope.in_attempt) = outer;
        self.e.close(if is_async { "}.await;" } else { "})();" });

        let param = catch_param.map(snake_case).unwrap_or_else(|| "e".to_string());
        if !returns {
            match catch_body {
                Some(catch_body) => {
                    self.e.open(format!("if let Err({param}) = attempt {{"));
                    self.block(catch_body);
                    self.e.close("}");
                    if let Some(finally_body) = finally_body {
                        self.block(finally_body);
                    }
                }
                None => {
                    if let Some(finally_body) = finally_body {
                        self.block(finally_body);
                    }
                    if self.scope.in_result {
                        self.e.line("attempt?;");
                    } else {
                        self.e.open(format!("if let Err({param}) = attempt {{"));
                        self.e.line(format!("panic!(\"{{}}\", {param});"));
                        self.e.close("}");
                    }
                }
            }
            return;
        }

        match catch_body {
            Some(catch_body) => {
                self.e.open("let returned = match attempt {");
                self.e.line("Ok(returned) => returned,");
                self.e.open(format!("Err({param}) => {{"));
                self.block(catch_body);
                if !ends_in_exit(catch_body) {
                    self.e.line("None");
                }
                self.e.close("}");
                self.e.close("};");
                if let Some(finally_body) = finally_body {
                    self.block(finally_body);
                }
            }
            None => {
                if let Some(finally_body) = finally_body {
                    self.block(finally_body);
                }
                if self.scope.in_result {
                    self.e.line("let returned = attempt?;");
                } else {
                    self.e.open("let returned = match attempt {");
                    self.e.line("Ok(returned) => returned,");
                    self.e.line(format!("Err({param}) => panic!(\"{{}}\", {param}),"));
                    self.e.close("};");
                }
            }
        }
        if tail && !self.scope.in_attempt {
            let value = if self.scope.wraps_ok { "Ok(value)" } else { "value" };
            self.e.open("match returned {");
            self.e.line(format!("Some(value) => {value},"));
            self.e.line("None => unreachable!(\"every branch returns\"),");
            self.e.close("}");
        } else {
            let line = self.return_line("value");
            self.e.open("if let Some(value) = returned {");
            self.e.line(line);
            self.e.close("}");
        }
    }

    // Expressions

    /// Expression producing an owned value.
    fn owned(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Literal {
                value: Literal::String(s),
            } => format!("{}.to_string()", quote(s)),
            Expr::Ident { name } => self.owned_ident(name),
            _ => self.expr(expr),
        }
    }

    /// A non-`Copy` binding read by value is cloned, since the source
    /// assumed shared references.
    fn owned_ident(&mut self, name: &str) -> String {
        let text = self.ident(name);
        if self.scope.borrowed.contains(name) {
            return format!("{text}.to_owned()");
        }
        match self.scope.types.get(name) {
            Some(ty) if !ty.is_copy() && !matches!(ty, TypeRef::Inferred) => {
                format!("{text}.clone()")
            }
            _ => text,
        }
    }

    fn returned(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Ident { name } if self.scope.borrowed.contains(name.as_str()) => {
                format!("{}.to_owned()", self.ident(name))
            }
            Expr::Literal {
                value: Literal::String(s),
            } => format!("{}.to_string()", quote(s)),
            _ => self.expr(expr),
        }
    }

    fn iterable(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Ident { name } if self.scope.borrowed.contains(name.as_str()) => {
                snake_case(name)
            }
            Expr::Ident { .. } | Expr::Member { .. } => format!("&{}", self.expr(expr)),
            _ => self.expr(expr),
        }
    }

    fn error_value(&mut self, value: &Expr) -> String {
        match value {
            Expr::New { class, args } if !self.classes.contains(class) => match args.first() {
                Some(message) => self.expr(message),
                None => quote(class),
            },
            _ => self.expr(value),
        }
    }

    fn ident(&self, name: &str) -> String {
        if name == "this" {
            return "self".to_string();
        }
        if let Some(constant) = self.constants.get(name) {
            return constant.clone();
        }
        if self.classes.contains(name) || name.starts_with(|c: char| c.is_uppercase()) {
            return name.to_string();
        }
        snake_case(name)
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
                Literal::Null => "None".to_string(),
                Literal::Bool(b) => b.to_string(),
                Literal::String(s) => quote(s),
                lit => number(lit).unwrap_or_default(),
            },
            Expr::Ident { name } => self.ident(name),
            Expr::Binary { left, op, right } => self.binary(left, *op, right),
            Expr::Unary { op, operand } => {
                let operand = self.operand(operand);
                match op {
                    UnaryOp::Neg => format!("-{operand}"),
                    UnaryOp::Not => format!("!{operand}"),
                }
            }
            Expr::Call { callee, args } => self.call(callee, args, true),
            Expr::Member { object, field } => self.member(object, field),
            Expr::Index { object, index } => {
                let object = self.expr(object);
                let index = self.expr(index);
                format!("{object}[{index}]")
            }
            Expr::Assign { target, value } => {
                let target = self.expr(target);
                let value = self.owned(value);
                format!("{target} = {value}")
            }
            Expr::New { class, args } => self.construct(class, args),
            Expr::Await { value } => {
                let inner = match value.as_ref() {
                    Expr::Call { callee, args } => {
                        let text = self.call(callee, args, false);
                        let raises = lower::callee_name(callee)
                            .is_some_and(|n| self.throwing.contains(n));
                        if self.scope.is_async {
                            let q = if raises && self.scope.in_result { "?" } else { "" };
                            return format!("{text}.await{q}");
                        }
                        text
                    }
                    other => {
                        let text = self.expr(other);
                        if self.scope.is_async {
                            return format!("{text}.await");
                        }
                        text
                    }
                };
                self.e.todo("awaited call runs synchronously");
                inner
            }
            Expr::Array { items } => {
                let items: Vec<_> = items.iter().map(|i| self.owned(i)).collect();
                format!("vec![{}]", items.join(", "))
            }
            Expr::Comprehension {
                element,
                variable,
                iterable,
                condition,
            } => {
                let var = snake_case(variable);
                let copied = match iterable.as_ref() {
                    Expr::Ident { name } => match self.scope.types.get(name.as_str()) {
                        Some(TypeRef::List { element }) => element.is_copy(),
                        _ => false,
                    },
                    _ => false,
                };
                let source = self.expr(iterable);
                let mut chain = format!("{source}.iter()");
                if copied {
                    chain.push_str(".copied()");
                }
                if let Some(condition) = condition {
                    let condition = self.expr(condition);
                    let pattern = if copied { format!("&{var}") } else { var.clone() };
                    chain.push_str(&format!(".filter(|{pattern}| {condition})"));
                }
                let element = self.expr(element);
                if element != var {
                    chain.push_str(&format!(".map(|{var}| {element})"));
                }
                format!("{chain}.collect::<Vec<_>>()")
            }
        }
    }

    fn binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> String {
        if op == BinaryOp::Add && (self.is_string(left) || self.is_string(right)) {
            return self.format_concat(left, right);
        }
        if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            let null_side = match (left, right) {
                (other, Expr::Literal { value: Literal::Null })
                | (Expr::Literal { value: Literal::Null }, other) => Some(other),
                _ => None,
            };
            if let Some(other) = null_side {
                let other = self.operand(other);
                let check = if op == BinaryOp::Eq { "is_none" } else { "is_some" };
                return format!("{other}.{check}()");
            }
        }
        let left = self.operand(left);
        let right = self.operand(right);
        format!("{left} {} {right}", c_binary_op(op))
    }

    /// `"a" + b + "c"` → `format!("a{}c", b)`.
    fn format_concat(&mut self, left: &Expr, right: &Expr) -> String {
        let mut parts = Vec::new();
        self.flatten_concat(left, &mut parts);
        self.flatten_concat(right, &mut parts);
        let mut template = String::new();
        let mut args = Vec::new();
        for part in parts {
            match part {
                Expr::Literal {
                    value: Literal::String(s),
                } => {
                    let quoted = quote(s);
                    let inner = &quoted[1..quoted.len() - 1];
                    template.push_str(&inner.replace('{', "{{").replace('}', "}}"));
                }
                other => {
                    template.push_str("{}");
                    args.push(self.expr(other));
                }
            }
        }
        if args.is_empty() {
            format!("\"{template}\".to_string()")
        } else {
            format!("format!(\"{template}\", {})", args.join(", "))
        }
    }

    /// Whether `expr` is known to produce a string.
    fn is_string(&self, expr: &Expr) -> bool {
        let key = match expr {
            Expr::Literal {
                value: Literal::String(_),
            } => return true,
            Expr::Binary {
                left,
                op: BinaryOp::Add,
                right,
            } => return self.is_string(left) || self.is_string(right),
            Expr::Ident { name } => name.clone(),
            Expr::Member { object, field } if matches!(object.as_ref(), Expr::Ident { name } if name == "this") => {
                format!("this.{field}")
            }
            _ => return false,
        };
        self.scope.types.get(&key) == Some(&TypeRef::STRING)
    }

    fn flatten_concat<'e>(&self, expr: &'e Expr, parts: &mut Vec<&'e Expr>) {
        match expr {
            Expr::Binary {
                left,
                op: BinaryOp::Add,
                right,
            } if self.is_string(expr) => {
                self.flatten_concat(left, parts);
                self.flatten_concat(right, parts);
            }
            other => parts.push(other),
        }
    }

    fn call(&mut self, callee: &Expr, args: &[Expr], propagate: bool) -> String {
        if is_print(callee) {
            return self.print(args);
        }
        let rendered_args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
        let args_text = rendered_args.join(", ");
        let target = match callee {
            Expr::Member { object, field } => match object.as_ref() {
                Expr::Ident { name } if self.classes.contains(name) => {
                    format!("{name}::{}", snake_case(field))
                }
                _ => {
                    let object = self.operand(object);
                    format!("{object}.{}", snake_case(field))
                }
            },
            Expr::Ident { name } => match self.scope.methods.get(name.as_str()) {
                // Implicit receiver in class-based sources
                Some(true) => format!("Self::{}", snake_case(name)),
                Some(false) => format!("self.{}", snake_case(name)),
                None => self.ident(name),
            },
            other => {
                let text = self.expr(other);
                format!("({text})")
            }
        };
        let raises = lower::callee_name(callee).is_some_and(|n| self.throwing.contains(n));
        let question = if propagate && raises && self.scope.in_result {
            "?"
        } else {
            ""
        };
        format!("{target}({args_text}){question}")
    }

    fn print(&mut self, args: &[Expr]) -> String {
        match args {
            [] => "println!()".to_string(),
            [
                Expr::Literal {
                    value: Literal::String(s),
                },
            ] => {
                let quoted = quote(s);
                format!("println!({})", quoted.replace('{', "{{").replace('}', "}}"))
            }
            _ => {
                let template = vec!["{}"; args.len()].join(" ");
                let args: Vec<_> = args.iter().map(|a| self.expr(a)).collect();
                format!("println!(\"{template}\", {})", args.join(", "))
            }
        }
    }

    fn member(&mut self, object: &Expr, field: &str) -> String {
        match object {
            Expr::Ident { name } if self.classes.contains(name) => {
                format!("{name}::{}", snake_case(field).to_uppercase())
            }
            _ => {
                let object = self.operand(object);
                format!("{object}.{}", snake_case(field))
            }
        }
    }

    fn construct(&mut self, class: &str, args: &[Expr]) -> String {
        let args: Vec<_> = args.iter().map(|a| self.owned(a)).collect();
        let args = args.join(", ");
        if self.classes.contains(class) {
            return format!("{class}::new({args})");
        }
        match TypeRef::parse(class) {
            TypeRef::List { .. } => "Vec::new()".to_string(),
            TypeRef::Set { .. } => {
                self.e.import("std::collections::HashSet");
                "HashSet::new()".to_string()
            }
            TypeRef::Map { .. } => {
                self.e.import("std::collections::HashMap");
                "HashMap::new()".to_string()
            }
            TypeRef::Primitive {
                primitive: Primitive::String,
            } => "String::new()".to_string(),
            _ => format!("{class}::new({args})"),
        }
    }
}

fn visibility(v: Visibility) -> &'static str {
    match v {
        Visibility::Public => "pub ",
        Visibility::Protected => "pub(crate) ",
        Visibility::Private => "",
    }
}

fn method_table(class: &ClassDecl) -> BTreeMap<String, bool> {
    class
        .methods
        .iter()
        .map(|m| (m.name.clone(), m.is_static))
        .collect()
}

fn is_singleton_instance(field: &Field, class: &ClassDecl, singleton: bool) -> bool {
    singleton && matches!(&field.ty, TypeRef::Named { name, .. } if *name == class.name)
}

/// Control never falls off the end of `stmts`.
fn ends_in_exit(stmts: &[Stmt]) -> bool {
    matches!(stmts.last(), Some(Stmt::Return { .. } | Stmt::Throw { .. }))
}

/// Types passed by reference rather than moved.
fn is_borrowable(ty: &TypeRef) -> bool {
    matches!(
        ty,
        TypeRef::Primitive { .. }
            | TypeRef::List { .. }
            | TypeRef::Set { .. }
            | TypeRef::Map { .. }
            | TypeRef::Named { .. }
    )
}

/// `for (i = a; i < b; i = i + 1)` → (`i`, `a`, `b`, inclusive).
fn counting_loop<'e>(
    init: Option<&'e Stmt>,
    test: Option<&'e Expr>,
    update: Option<&'e Expr>,
) -> Option<(&'e str, &'e Expr, &'e Expr, bool)> {
    let Some(Stmt::Let(VarDecl {
        name,
        init: Some(start),
        ..
    })) = init
    else {
        return None;
    };
    let Some(Expr::Binary { left, op, right }) = test else {
        return None;
    };
    let inclusive = match op {
        BinaryOp::Lt => false,
        BinaryOp::Le => true,
        _ => return None,
    };
    if !matches!(left.as_ref(), Expr::Ident { name: n } if n == name) {
        return None;
    }
    let Some(Expr::Assign { target, value }) = update else {
        return None;
    };
    let increments = matches!(target.as_ref(), Expr::Ident { name: n } if n == name)
        && matches!(value.as_ref(), Expr::Binary { left, op: BinaryOp::Add, right }
            if matches!(left.as_ref(), Expr::Ident { name: n } if n == name)
                && matches!(right.as_ref(), Expr::Literal { value: Literal::Int(1) }));
    increments.then_some((name.as_str(), start, right.as_ref(), inclusive))
}
