//! C++ generator.
//!
//! Emits one C++17 translation unit. Classes keep value semantics with
//! members grouped by access. Protected blocks catch `std::exception`; C++
//! has no `finally`, so cleanup runs after the handler and again on the
//! rethrow path.

use crate::context::{SemanticContext, SemanticPattern};
use crate::emitter::{
    Emitter, TypeNotes, TypeSpelling, c_binary_op, is_print, mutated_names, needs_parens, number,
    quote, spell_in,
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

/// Emits the IR as a C++17 source file.
#[derive(Debug, Clone, Copy, Default)]
pub struct CppGenerator;

impl TypeSpelling for CppGenerator {
    const ANY: &'static str = "std::any";

    fn spell(&self, ty: &TypeRef, erase: bool, notes: &mut TypeNotes) -> String {
        match ty {
            TypeRef::Void => "void".to_string(),
            TypeRef::Inferred => "auto".to_string(),
            TypeRef::Any => {
                notes.imports.push("<any>");
                Self::ANY.to_string()
            }
            TypeRef::Primitive { primitive } => match primitive {
                Primitive::Int => "int",
                Primitive::Long => "long long",
                Primitive::Float => "float",
                Primitive::Double => "double",
                Primitive::Bool => "bool",
                Primitive::Char => "char",
                Primitive::String => {
                    notes.imports.push("<string>");
                    "std::string"
                }
                Primitive::Byte => {
                    notes.imports.push("<cstdint>");
                    "std::uint8_t"
                }
            }
            .to_string(),
            TypeRef::List { element } => {
                notes.imports.push("<vector>");
                format!("std::vector<{}>", self.spell_element(element, erase, notes))
            }
            TypeRef::Set { element } => {
                notes.imports.push("<unordered_set>");
                format!("std::unordered_set<{}>", self.spell_element(element, erase, notes))
            }
            TypeRef::Map { key, value } => {
                notes.imports.push("<unordered_map>");
                let key = self.spell_element(key, erase, notes);
                format!("std::unordered_map<{key}, {}>", self.spell_element(value, erase, notes))
            }
            TypeRef::Optional { inner } => {
                notes.imports.push("<optional>");
                format!("std::optional<{}>", self.spell(inner, erase, notes))
            }
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
                notes.imports.push("<any>");
                Self::ANY.to_string()
            }
        }
    }

    fn spell_element(&self, ty: &TypeRef, erase: bool, notes: &mut TypeNotes) -> String {
        if erase {
            notes.imports.push("<any>");
            Self::ANY.to_string()
        } else {
            self.spell(ty, erase, notes)
        }
    }
}

impl Generator for CppGenerator {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn default_options(&self) -> TranslationOptions {
        TranslationOptions::new().with(keys::EXPLICIT_MEMORY_MANAGEMENT, true)
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
        let mut emitter = CppEmitter::new(self, program, options);
        emitter.program(program);
        let comments = options.generate_comments();
        let source = program.source;
        emitter.e.finish(|imports| {
            let mut header = Vec::new();
            if comments {
                header.push(format!("// Translated from {source}."));
            }
            header.extend(imports.iter().map(|i| format!("#include {i}")));
            header
        })
    }

    fn adapt_pattern(&self, program: &mut Program, pattern: SemanticPattern) -> bool {
        match pattern {
            SemanticPattern::Singleton => lower::hint_singletons(program),
            SemanticPattern::DataClass => {
                lower::hint_data_classes(program);
                true
            }
            // Classes, virtual interfaces, futures and exceptions are native
            SemanticPattern::Factory
            | SemanticPattern::Observer
            | SemanticPattern::Async
            | SemanticPattern::ErrorHandling => true,
        }
    }
}

#[derive(Default)]
struct Scope {
    mutated: BTreeSet<String>,
    returns: Option<TypeRef>,
    /// Names bound by enclosing `catch` clauses.
    caught: Vec<String>,
    in_main: bool,
}

struct CppEmitter<'a> {
    e: Emitter,
    spelling: &'a CppGenerator,
    erase: bool,
    /// Pass non-scalar parameters as `const T&`.
    by_reference: bool,
    classes: BTreeSet<String>,
    /// Plain structs, built with brace initialisation.
    aggregates: BTreeSet<String>,
    /// Interface name to the methods it declares.
    interfaces: BTreeMap<String, BTreeSet<String>>,
    scope: Scope,
}

fn section(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "public:",
        Visibility::Protected => "protected:",
        Visibility::Private => "private:",
    }
}

/// Cheap to copy: passed by value.
fn is_scalar(ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Primitive { primitive } => !matches!(primitive, Primitive::String),
        TypeRef::Void | TypeRef::Inferred => true,
        _ => false,
    }
}

fn is_exception_class(class: &str) -> bool {
    class.ends_with("Exception") || class.ends_with("Error")
}

/// Standard exception standing in for a source exception class.
fn std_exception(class: &str) -> &'static str {
    match class {
        "IllegalArgumentException" | "NumberFormatException" | "ValueError" | "TypeError" => {
            "std::invalid_argument"
        }
        "IllegalStateException" | "UnsupportedOperationException" => "std::logic_error",
        "IndexOutOfBoundsException" | "ArrayIndexOutOfBoundsException" | "IndexError" => {
            "std::out_of_range"
        }
        _ => "std::runtime_error",
    }
}

/// Plain struct: hinted, and any constructor only assigns fields.
fn is_aggregate(class: &ClassDecl) -> bool {
    class.has_hint(&Hint::DataClass)
        && class.extends.is_none()
        && class.methods.iter().all(|m| {
            lower::is_constructor(m, class)
                && m.body.iter().all(|s| lower::field_assignment(s).is_some())
        })
}

fn is_own_type(ty: &TypeRef, class: &ClassDecl) -> bool {
    matches!(ty, TypeRef::Named { name, .. } if *name == class.name)
}

impl<'a> CppEmitter<'a> {
    fn new(spelling: &'a CppGenerator, program: &Program, options: &TranslationOptions) -> Self {
        let interfaces = program
            .classes()
            .filter(|c| c.kind == ClassKind::Interface)
            .map(|c| (c.name.clone(), c.methods.iter().map(|m| m.name.clone()).collect()))
            .collect();
        Self {
            e: Emitter::new(options, "//"),
            spelling,
            erase: options.semantic_fallback(),
            by_reference: options.bool_or(keys::EXPLICIT_MEMORY_MANAGEMENT, true),
            classes: program.classes().map(|c| c.name.clone()).collect(),
            aggregates: program
                .classes()
                .filter(|c| is_aggregate(c))
                .map(|c| c.name.clone())
                .collect(),
            interfaces,
            scope: Scope::default(),
        }
    }

    fn ty(&mut self, ty: &TypeRef) -> String {
        spell_in(self.spelling, &mut self.e, ty, self.erase)
    }

    /// Classes first, then globals, then functions. Free functions are
    /// declared up front so definitions may appear in any order.
    fn program(&mut self, program: &Program) {
        for class in program.classes() {
            self.class(class);
            self.e.blank();
        }
        for decl in &program.body {
            if let Decl::Variable(var) = decl {
                let text = self.local(var);
                self.e.line(format!("{text};"));
            }
        }
        self.e.blank();
        let functions: Vec<&Function> = program
            .body
            .iter()
            .filter_map(|d| match d {
                Decl::Function(f) => Some(f),
                _ => None,
            })
            .collect();
        if functions.len() > 1 {
            for func in functions.iter().filter(|f| !is_entry_point(f)) {
                self.enter(func);
                let signature = self.signature(func);
                self.e.line(format!("{signature};"));
            }
            self.e.blank();
        }
        for func in functions {
            self.enter(func);
            let signature = self.signature(func);
            self.e.open(format!("{signature} {{"));
            self.body(func);
            self.e.close("}");
            self.e.blank();
        }
    }

    /// Set up the scope for `func`.
    fn enter(&mut self, func: &Function) {
        self.scope = Scope {
            mutated: mutated_names(&func.body),
            returns: Some(func.return_type.clone()),
            caught: Vec::new(),
            in_main: is_entry_point(func),
        };
    }

    fn param(&mut self, param: &Param) -> String {
        let ty = self.ty(&param.ty);
        if self.by_reference && !is_scalar(&param.ty) && !self.scope.mutated.contains(&param.name) {
            format!("const {ty}& {}", param.name)
        } else {
            format!("{ty} {}", param.name)
        }
    }

    fn params(&mut self, func: &Function) -> String {
        let params: Vec<_> = func.params.iter().map(|p| self.param(p)).collect();
        params.join(", ")
    }

    fn return_type(&mut self, func: &Function) -> String {
        let ty = self.ty(&func.return_type);
        if func.is_async {
            self.e.import("<future>");
            format!("std::future<{ty}>")
        } else {
            ty
        }
    }

    fn signature(&mut self, func: &Function) -> String {
        if self.scope.in_main {
            return "int main()".to_string();
        }
        let ret = self.return_type(func);
        let params = self.params(func);
        format!("{ret} {}({params})", func.name)
    }

    /// Function body; async functions run it on `std::async`.
    fn body(&mut self, func: &Function) {
        if func.is_async {
            let ret = self.ty(&func.return_type);
            self.e
                .open(format!("return std::async(std::launch::async, [=]() -> {ret} {{"));
            self.block(&func.body);
            self.e.close("});");
        } else {
            self.block(&func.body);
        }
    }

    fn class(&mut self, class: &ClassDecl) {
        if class.kind == ClassKind::Interface {
            self.interface(class);
            return;
        }
        if self.aggregates.contains(&class.name) {
            self.e.open(format!("struct {} {{", class.name));
            for field in &class.fields {
                self.field(field);
            }
            self.e.close("};");
            return;
        }
        let mut bases = Vec::new();
        if let Some(parent) = &class.extends {
            bases.push(format!("public {parent}"));
        }
        bases.extend(class.implements.iter().map(|i| format!("public {i}")));
        if bases.is_empty() {
            self.e.open(format!("class {} {{", class.name));
        } else {
            self.e
                .open(format!("class {} : {} {{", class.name, bases.join(", ")));
        }
        let singleton = class.singleton_accessor().map(str::to_string);
        let overrides: BTreeSet<String> = class
            .implements
            .iter()
            .filter_map(|i| self.interfaces.get(i))
            .flatten()
            .cloned()
            .collect();
        let mut first = true;
        for visibility in [Visibility::Public, Visibility::Protected, Visibility::Private] {
            let fields: Vec<&Field> = class
                .fields
                .iter()
                .filter(|f| f.visibility == visibility)
                .filter(|f| !(singleton.is_some() && f.is_static && is_own_type(&f.ty, class)))
                .collect();
            let methods: Vec<&Function> = class
                .methods
                .iter()
                .filter(|m| m.visibility == visibility)
                .collect();
            if fields.is_empty() && methods.is_empty() {
                continue;
            }
            if !first {
                self.e.blank();
            }
            first = false;
            self.e.dedent();
            self.e.line(section(visibility));
            self.e.indent();
            for (i, method) in methods.iter().enumerate() {
                if i > 0 {
                    self.e.blank();
                }
                if singleton.as_deref() == Some(method.name.as_str()) {
                    self.singleton_accessor(method, class);
                } else if lower::is_constructor(method, class) {
                    self.constructor(method, class);
                } else {
                    self.method(method, overrides.contains(&method.name));
                }
            }
            if !methods.is_empty() && !fields.is_empty() {
                self.e.blank();
            }
            for field in fields {
                self.field(field);
            }
        }
        self.e.close("};");
    }

    fn interface(&mut self, class: &ClassDecl) {
        match &class.extends {
            Some(parent) => self
                .e
                .open(format!("class {} : public {parent} {{", class.name)),
            None => self.e.open(format!("class {} {{", class.name)),
        }
        self.e.dedent();
        self.e.line("public:");
        self.e.indent();
        self.e.line(format!("virtual ~{}() = default;", class.name));
        for method in &class.methods {
            self.enter(method);
            let signature = self.signature(method);
            self.e.line(format!("virtual {signature} = 0;"));
        }
        self.e.close("};");
    }

    fn field(&mut self, field: &Field) {
        let declared = match (&field.ty, &field.init) {
            (TypeRef::Inferred, Some(init)) => lower::infer_type(init),
            (ty, _) => ty.clone(),
        };
        let ty = if matches!(declared, TypeRef::Inferred) {
            self.e.todo(format!("type of field `{}` is unknown", field.name));
            self.ty(&TypeRef::Any)
        } else {
            self.ty(&declared)
        };
        let statik = if field.is_static { "static inline " } else { "" };
        match &field.init {
            Some(init) => {
                let value = self.expr(init);
                self.e
                    .line(format!("{statik}{ty} {} = {value};", field.name));
            }
            None => self.e.line(format!("{statik}{ty} {}{{}};", field.name)),
        }
    }

    /// Leading field assignments become the member initializer list.
    fn constructor(&mut self, ctor: &Function, class: &ClassDecl) {
        self.enter(ctor);
        let params = self.params(ctor);
        let split = ctor
            .body
            .iter()
            .take_while(|s| {
                lower::field_assignment(s)
                    .is_some_and(|(f, _)| class.fields.iter().any(|x| x.name == f && !x.is_static))
            })
            .count();
        let (assignments, rest) = ctor.body.split_at(split);
        let mut inits = Vec::new();
        for (field, value) in assignments.iter().filter_map(lower::field_assignment) {
            let value = self.expr(value);
            inits.push(format!("{field}({value})"));
        }
        let explicit = if ctor.params.len() == 1 { "explicit " } else { "" };
        let mut head = format!("{explicit}{}({params})", class.name);
        if !inits.is_empty() {
            head.push_str(&format!(" : {}", inits.join(", ")));
        }
        if rest.is_empty() {
            self.e.line(format!("{head} {{}}"));
        } else {
            self.e.open(format!("{head} {{"));
            self.block(rest);
            self.e.close("}");
        }
    }

    fn method(&mut self, method: &Function, overrides: bool) {
        self.enter(method);
        self.scope.in_main = false;
        let signature = self.signature(method);
        let statik = if method.is_static { "static " } else { "" };
        let suffix = if overrides { " override" } else { "" };
        self.e.open(format!("{statik}{signature}{suffix} {{"));
        self.body(method);
        self.e.close("}");
    }

    fn singleton_accessor(&mut self, method: &Function, class: &ClassDecl) {
        self.e
            .open(format!("static {}& {}() {{", class.name, method.name));
        self.e.line(format!("static {} instance;", class.name));
        self.e.line("return instance;");
        self.e.close("}");
    }

    fn block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn local(&mut self, var: &VarDecl) -> String {
        let reassigned = var.mutable && self.scope.mutated.contains(&var.name);
        if let Some(Expr::Array { items }) = &var.init
            && items.is_empty()
        {
            let ty = match &var.ty {
                TypeRef::Inferred => {
                    self.e.todo(format!("element type of `{}` is unknown", var.name));
                    self.ty(&TypeRef::list(TypeRef::Any))
                }
                ty => self.ty(ty),
            };
            return format!("{ty} {}", var.name);
        }
        let ty = match (&var.ty, &var.init) {
            (TypeRef::Inferred, Some(_)) => "auto".to_string(),
            (TypeRef::Inferred, None) => {
                self.e.todo(format!("type of `{}` is unknown", var.name));
                self.ty(&TypeRef::Any)
            }
            (ty, _) => self.ty(ty),
        };
        let fixed = if !reassigned && var.init.is_some() {
            "const "
        } else {
            ""
        };
        match &var.init {
            Some(Expr::Comprehension {
                element,
                variable,
                iterable,
                condition,
            }) => {
                let value = self.comprehension(element, variable, iterable, condition.as_deref(), &var.ty);
                format!("{fixed}{ty} {} = {value}", var.name)
            }
            Some(init) => {
                let value = self.expr(init);
                format!("{fixed}{ty} {} = {value}", var.name)
            }
            None => format!("{ty} {}{{}}", var.name),
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
                let binding = if self.scope.mutated.contains(variable) {
                    "auto&"
                } else {
                    "const auto&"
                };
                self.e
                    .open(format!("for ({binding} {variable} : {iterable}) {{"));
                self.block(body);
                self.e.close("}");
            }
            Stmt::Return {
                value:
                    Some(Expr::Comprehension {
                        element,
                        variable,
                        iterable,
                        condition,
                    }),
            } => {
                let returns = self.scope.returns.clone().unwrap_or(TypeRef::Inferred);
                let value = self.comprehension(element, variable, iterable, condition.as_deref(), &returns);
                self.e.line(format!("return {value};"));
            }
            Stmt::Return { value: Some(value) } => {
                let value = self.expr(value);
                self.e.line(format!("return {value};"));
            }
            Stmt::Return { value: None } if self.scope.in_main => self.e.line("return 0;"),
            Stmt::Return { value: None } => self.e.line("return;"),
            Stmt::Break => self.e.line("break;"),
            Stmt::Continue => self.e.line("continue;"),
            Stmt::Throw { value } => {
                let text = self.thrown(value);
                self.e.line(format!("{text};"));
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
            ),
        }
    }

    fn try_catch(
        &mut self,
        body: &[Stmt],
        catch_param: Option<&str>,
        catch_body: Option<&[Stmt]>,
        finally_body: Option<&[Stmt]>,
    ) {
        let leaves_early = crate::walk::any_stmt(body, |s| matches!(s, Stmt::Return { .. }))
            || catch_body.is_some_and(|c| {
                crate::walk::any_stmt(c, |s| matches!(s, Stmt::Return { .. } | Stmt::Throw { .. }))
            });
        if finally_body.is_some() && leaves_early {
            self.e
                .todo("cleanup after this block is skipped when it returns or rethrows");
        }
        self.e.open("try {");
        self.block(body);
        self.e.dedent();
        match catch_body {
            Some(catch_body) => {
                self.e.import("<exception>");
                match catch_param {
                    Some(param) => {
                        self.e
                            .open(format!("}} catch (const std::exception& {param}) {{"));
                        self.scope.caught.push(param.to_string());
                    }
                    None => self.e.open("} catch (const std::exception&) {"),
                }
                self.block(catch_body);
                if catch_param.is_some() {
                    self.scope.caught.pop();
                }
            }
            None => {
                self.e.open("} catch (...) {");
                if let Some(finally_body) = finally_body {
                    self.block(finally_body);
                }
                self.e.line("throw;");
            }
        }
        self.e.close("}");
        if let Some(finally_body) = finally_body {
            self.block(finally_body);
        }
    }

    fn thrown(&mut self, value: &Expr) -> String {
        match value {
            Expr::Ident { name } if self.scope.caught.contains(name) => "throw".to_string(),
            Expr::New { class, args } if !self.classes.contains(class) => {
                self.e.import("<stdexcept>");
                let message = match args.first() {
                    Some(arg) => self.expr(arg),
                    None => quote(class),
                };
                format!("throw {}({message})", std_exception(class))
            }
            Expr::Literal {
                value: Literal::String(s),
            } => {
                self.e.import("<stdexcept>");
                format!("throw std::runtime_error({})", quote(s))
            }
            other => format!("throw {}", self.expr(other)),
        }
    }

    /// `i = i + 1` → `++i`.
    fn update(&mut self, update: &Expr) -> String {
        if let Expr::Assign { target, value } = update
            && let Expr::Ident { name } = target.as_ref()
            && let Expr::Binary { left, op, right } = value.as_ref()
            && matches!(left.as_ref(), Expr::Ident { name: l } if l == name)
            && matches!(right.as_ref(), Expr::Literal { value: Literal::Int(1) })
        {
            match op {
                BinaryOp::Add => return format!("++{name}"),
                BinaryOp::Sub => return format!("--{name}"),
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
                Literal::Null => {
                    self.e.import("<optional>");
                    "std::nullopt".to_string()
                }
                Literal::Bool(b) => b.to_string(),
                Literal::String(s) => quote(s),
                Literal::Int(n) if i32::try_from(*n).is_err() => format!("{n}LL"),
                lit => number(lit).unwrap_or_default(),
            },
            Expr::Ident { name } if name == "this" || name == "self" => "*this".to_string(),
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
            Expr::New { class, args } => {
                let rendered: Vec<_> = args.iter().map(|a| self.expr(a)).collect();
                if self.aggregates.contains(class) {
                    return format!("{class}{{{}}}", rendered.join(", "));
                }
                if self.classes.contains(class) {
                    return format!("{class}({})", rendered.join(", "));
                }
                match TypeRef::parse(class) {
                    ty @ (TypeRef::List { .. } | TypeRef::Map { .. } | TypeRef::Set { .. }) => {
                        format!("{}{{}}", self.ty(&ty))
                    }
                    _ if is_exception_class(class) => {
                        self.e.import("<stdexcept>");
                        let message = rendered.first().cloned().unwrap_or_else(|| quote(class));
                        format!("{}({message})", std_exception(class))
                    }
                    _ => format!("{class}({})", rendered.join(", ")),
                }
            }
            Expr::Await { value } => {
                let value = self.operand(value);
                format!("{value}.get()")
            }
            Expr::Array { items } => {
                self.e.import("<vector>");
                let items: Vec<_> = items.iter().map(|i| self.expr(i)).collect();
                format!("std::vector{{{}}}", items.join(", "))
            }
            Expr::Comprehension {
                element,
                variable,
                iterable,
                condition,
            } => self.comprehension(element, variable, iterable, condition.as_deref(), &TypeRef::Inferred),
        }
    }

    fn member(&mut self, object: &Expr, field: &str) -> String {
        match object {
            Expr::Ident { name } if name == "this" || name == "self" => format!("this->{field}"),
            Expr::Ident { name } if self.classes.contains(name) => format!("{name}::{field}"),
            _ => {
                let object = self.operand(object);
                match field {
                    "length" | "size" => format!("{object}.size()"),
                    _ => format!("{object}.{field}"),
                }
            }
        }
    }

    fn call(&mut self, callee: &Expr, args: &[Expr]) -> String {
        if is_print(callee) {
            self.e.import("<iostream>");
            let mut parts = Vec::with_capacity(args.len());
            for arg in args {
                match arg {
                    Expr::Ident { name } if self.scope.caught.contains(name) => {
                        parts.push(format!("{name}.what()"));
                    }
                    other => parts.push(self.operand(other)),
                }
            }
            if parts.is_empty() {
                return "std::cout << std::endl".to_string();
            }
            return format!("std::cout << {} << std::endl", parts.join(" << \" \" << "));
        }
        let rendered: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
        let args_text = rendered.join(", ");
        match callee {
            Expr::Member { object, field } => match object.as_ref() {
                Expr::Ident { name }
                    if self.scope.caught.contains(name)
                        && matches!(field.as_str(), "getMessage" | "message") =>
                {
                    format!("{name}.what()")
                }
                Expr::Ident { name } if name == "this" || name == "self" => {
                    format!("this->{field}({args_text})")
                }
                Expr::Ident { name } if self.classes.contains(name) => {
                    format!("{name}::{field}({args_text})")
                }
                _ => {
                    let object_text = self.operand(object);
                    match field.as_str() {
                        "size" | "length" | "len" if args.is_empty() => format!("{object_text}.size()"),
                        "isEmpty" | "is_empty" if args.is_empty() => format!("{object_text}.empty()"),
                        "add" | "append" | "push" => format!("{object_text}.push_back({args_text})"),
                        _ => format!("{object_text}.{field}({args_text})"),
                    }
                }
            },
            Expr::Ident { name } if name == "len" && rendered.len() == 1 => {
                format!("{args_text}.size()")
            }
            Expr::Ident { name } => format!("{name}({args_text})"),
            other => {
                let callee = self.operand(other);
                format!("{callee}({args_text})")
            }
        }
    }

    /// A collected list, built by an immediately invoked lambda. `declared`
    /// is the list type the result lands in, when known.
    fn comprehension(
        &mut self,
        element: &Expr,
        variable: &str,
        iterable: &Expr,
        condition: Option<&Expr>,
        declared: &TypeRef,
    ) -> String {
        let element_ty = match declared {
            TypeRef::List { element } => (**element).clone(),
            _ => lower::infer_type(element),
        };
        let element_ty = if matches!(element_ty, TypeRef::Inferred) {
            self.e.todo("element type of the collected list is unknown");
            TypeRef::Any
        } else {
            element_ty
        };
        let list = self.ty(&TypeRef::list(element_ty));
        let iterable = self.expr(iterable);
        let element = self.expr(element);
        let push = match condition {
            Some(condition) => {
                let condition = self.expr(condition);
                format!("if ({condition}) out.push_back({element});")
            }
            None => format!("out.push_back({element});"),
        };
        format!("[&] {{ {list} out; for (const auto& {variable} : {iterable}) {{ {push} }} return out; }}()")
    }
}

/// A parameterless `void main`, which C++ spells `int main()`.
fn is_entry_point(func: &Function) -> bool {
    func.name == "main" && func.params.is_empty() && func.return_type.is_void() && !func.is_static
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(program: &Program) -> String {
        let generator = CppGenerator;
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
        let generator = CppGenerator;
        assert_eq!(
            generator.map_type(&TypeRef::list(TypeRef::optional(TypeRef::INT))),
            "std::vector<std::optional<int>>"
        );
        assert_eq!(
            generator.map_type(&TypeRef::map(TypeRef::STRING, TypeRef::DOUBLE)),
            "std::unordered_map<std::string, double>"
        );
        assert_eq!(generator.map_type(&TypeRef::parse("Map<int")), "std::any");
    }

    #[test]
    fn test_throw_maps_to_standard_exception() {
        let program = Program::new(Language::Java, vec![Decl::Function(validate())]);
        assert_eq!(
            render(&program),
            "// Translated from Java.\n#include <stdexcept>\n\nint validate(int age) {\n    if (age < 0) {\n        throw std::invalid_argument(\"negative age\");\n    }\n    return age;\n}\n"
        );
    }

    #[test]
    fn test_free_functions_are_declared_first() {
        let caller = Function::new(
            "main",
            vec![],
            TypeRef::Void,
            vec![Stmt::expr(Expr::call(
                Expr::ident("print"),
                vec![Expr::call(Expr::ident("validate"), vec![Expr::int(1)])],
            ))],
        );
        let program = Program::new(
            Language::Python,
            vec![Decl::Function(caller), Decl::Function(validate())],
        );
        let out = render(&program);
        assert!(out.contains("\nint validate(int age);\n\nint main() {\n"), "{out}");
        assert!(out.contains("    std::cout << validate(1) << std::endl;\n"));
        assert!(out.contains("#include <iostream>\n#include <stdexcept>\n"));
    }

    #[test]
    fn test_class_sections_and_initializer_list() {
        let class = ClassDecl::new("Account")
            .with_field(Field::new("owner", TypeRef::STRING).private())
            .with_field(Field::new("balance", TypeRef::DOUBLE).private())
            .with_method(Function::new(
                "Account",
                vec![Param::new("owner", TypeRef::STRING)],
                TypeRef::Void,
                vec![
                    Stmt::expr(Expr::assign(
                        Expr::member(Expr::ident("this"), "owner"),
                        Expr::ident("owner"),
                    )),
                    Stmt::expr(Expr::assign(
                        Expr::member(Expr::ident("this"), "balance"),
                        Expr::float(0.0),
                    )),
                ],
            ))
            .with_method(Function::new(
                "deposit",
                vec![Param::new("amount", TypeRef::DOUBLE)],
                TypeRef::Void,
                vec![Stmt::expr(Expr::assign(
                    Expr::member(Expr::ident("this"), "balance"),
                    Expr::binary(
                        Expr::member(Expr::ident("this"), "balance"),
                        BinaryOp::Add,
                        Expr::ident("amount"),
                    ),
                ))],
            ))
            .with_method(Function::new(
                "getOwner",
                vec![],
                TypeRef::STRING,
                vec![Stmt::return_stmt(Some(Expr::ident("owner")))],
            ));
        let program = Program::new(Language::Java, vec![Decl::Class(class)]);
        let out = render(&program);
        assert!(out.contains(
            "class Account {
public:
    explicit Account(const std::string& owner) : owner(owner), balance(0.0) {}

    void deposit(double amount) {
        this->balance = this->balance + amount;
    }

    std::string getOwner() {
        return owner;
    }

private:
    std::string owner{};
    double balance{};
};"
        ), "{out}");
    }

    #[test]
    fn test_interface_methods_are_pure_virtual() {
        let shape = ClassDecl::new("Shape")
            .with_kind(ClassKind::Interface)
            .with_method(Function::new("area", vec![], TypeRef::DOUBLE, vec![]));
        let mut square = ClassDecl::new("Square")
            .with_field(Field::new("side", TypeRef::DOUBLE))
            .with_method(Function::new(
                "area",
                vec![],
                TypeRef::DOUBLE,
                vec![Stmt::return_stmt(Some(Expr::binary(
                    Expr::ident("side"),
                    BinaryOp::Mul,
                    Expr::ident("side"),
                )))],
            ));
        square.implements.push("Shape".to_string());
        let program = Program::new(
            Language::Java,
            vec![Decl::Class(shape), Decl::Class(square)],
        );
        let out = render(&program);
        assert!(out.contains(
            "class Shape {\npublic:\n    virtual ~Shape() = default;\n    virtual double area() = 0;\n};"
        ), "{out}");
        assert!(out.contains("class Square : public Shape {\npublic:\n    double area() override {\n"));
        assert!(out.contains("\n    double side{};\n};"));
    }

    #[test]
    fn test_try_catch_runs_cleanup_after_handler() {
        let func = Function::new(
            "safe",
            vec![],
            TypeRef::Void,
            vec![Stmt::try_catch(
                vec![Stmt::expr(Expr::call(Expr::ident("risky"), vec![]))],
                Some("e"),
                Some(vec![Stmt::expr(Expr::call(
                    Expr::ident("print"),
                    vec![Expr::ident("e")],
                ))]),
                Some(vec![Stmt::expr(Expr::call(
                    Expr::ident("print"),
                    vec![Expr::string("done")],
                ))]),
            )],
        );
        let program = Program::new(Language::Java, vec![Decl::Function(func)]);
        let out = render(&program);
        assert!(out.contains(
            "    try {
        risky();
    } catch (const std::exception& e) {
        std::cout << e.what() << std::endl;
    }
    std::cout << \"done\" << std::endl;
}"
        ), "{out}");
        assert!(out.contains("#include <exception>\n#include <iostream>\n"));
        assert!(!out.contains("TODO"));
    }

    #[test]
    fn test_try_without_handler_rethrows_after_cleanup() {
        let func = Function::new(
            "guarded",
            vec![],
            TypeRef::Void,
            vec![Stmt::try_catch(
                vec![Stmt::expr(Expr::call(Expr::ident("risky"), vec![]))],
                None,
                None,
                Some(vec![Stmt::expr(Expr::call(Expr::ident("release"), vec![]))]),
            )],
        );
        let program = Program::new(Language::Java, vec![Decl::Function(func)]);
        let out = render(&program);
        assert!(out.contains(
            "    try {\n        risky();\n    } catch (...) {\n        release();\n        throw;\n    }\n    release();\n"
        ), "{out}");
    }

    #[test]
    fn test_singleton_uses_function_local_static() {
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
        assert!(CppGenerator.adapt_pattern(&mut program, SemanticPattern::Singleton));
        let out = render(&program);
        assert!(out.contains(
            "    static Config& getInstance() {\n        static Config instance;\n        return instance;\n    }"
        ), "{out}");
        assert!(!out.contains("static inline Config"));
    }

    #[test]
    fn test_comprehension_collects_into_vector() {
        let func = Function::new(
            "evens",
            vec![Param::new("xs", TypeRef::list(TypeRef::INT))],
            TypeRef::list(TypeRef::INT),
            vec![Stmt::return_stmt(Some(Expr::Comprehension {
                element: Box::new(Expr::ident("x")),
                variable: "x".to_string(),
                iterable: Box::new(Expr::ident("xs")),
                condition: Some(Box::new(Expr::binary(
                    Expr::binary(Expr::ident("x"), BinaryOp::Mod, Expr::int(2)),
                    BinaryOp::Eq,
                    Expr::int(0),
                ))),
            }))],
        );
        let program = Program::new(Language::Python, vec![Decl::Function(func)]);
        let out = render(&program);
        assert!(out.contains("std::vector<int> evens(const std::vector<int>& xs) {\n"));
        assert!(out.contains(
            "    return [&] { std::vector<int> out; for (const auto& x : xs) { if ((x % 2) == 0) out.push_back(x); } return out; }();"
        ), "{out}");
    }

    #[test]
    fn test_async_function_runs_on_std_async() {
        let func = Function::new(
            "load",
            vec![Param::new("path", TypeRef::STRING)],
            TypeRef::STRING,
            vec![Stmt::return_stmt(Some(Expr::await_(Expr::call(
                Expr::ident("fetch"),
                vec![Expr::ident("path")],
            ))))],
        )
        .async_();
        let program = Program::new(Language::Python, vec![Decl::Function(func)]);
        let out = render(&program);
        assert!(out.contains(
            "std::future<std::string> load(const std::string& path) {
    return std::async(std::launch::async, [=]() -> std::string {
        return fetch(path).get();
    });
}"
        ), "{out}");
        assert!(out.contains("#include <future>\n"));
    }

    #[test]
    fn test_values_without_explicit_memory_management() {
        let func = Function::new(
            "greet",
            vec![Param::new("name", TypeRef::STRING)],
            TypeRef::Void,
            vec![Stmt::expr(Expr::call(Expr::ident("print"), vec![Expr::ident("name")]))],
        );
        let program = Program::new(Language::Python, vec![Decl::Function(func)]);
        let options = CppGenerator
            .default_options()
            .with(keys::EXPLICIT_MEMORY_MANAGEMENT, false);
        let out = CppGenerator.emit(&program, &SemanticContext::new(), &options);
        assert!(out.contains("void greet(std::string name) {\n"), "{out}");
    }

    #[test]
    fn test_data_class_becomes_aggregate() {
        let class = ClassDecl::new("Point")
            .with_field(Field::new("x", TypeRef::INT))
            .with_field(Field::new("y", TypeRef::INT));
        let origin = Function::new(
            "origin",
            vec![],
            TypeRef::named("Point"),
            vec![Stmt::return_stmt(Some(Expr::new_object(
                "Point",
                vec![Expr::int(0), Expr::int(0)],
            )))],
        );
        let mut program = Program::new(
            Language::Python,
            vec![Decl::Class(class), Decl::Function(origin)],
        );
        assert!(CppGenerator.adapt_pattern(&mut program, SemanticPattern::DataClass));
        let out = render(&program);
        assert!(out.contains("struct Point {\n    int x{};\n    int y{};\n};"), "{out}");
        assert!(out.contains("Point origin() {\n    return Point{0, 0};\n}"));
    }
}
