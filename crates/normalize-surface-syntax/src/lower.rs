//! Structural passes over the IR.
//!
//! Lowering rewrites a tree into the model of one language before it is
//! emitted or handed to the next hop. The idiom and pattern passes here are
//! tree rewrites too; generators pick the ones that suit their target.

use crate::ir::{
    ClassDecl, ClassKind, Decl, Expr, Function, Hint, Program, Stmt, TypeRef, VarDecl,
};
use crate::shape;
use crate::walk::{Visitor, any_expr, for_each_block_mut, walk_expr, walk_stmts};
use normalize_language_meta::{ConcurrencyModel, Language, LanguageFeatures, Paradigm};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Class that receives free functions in class-only languages.
pub const MAIN_CLASS: &str = "Main";

/// Default lowering into `language`, whose profile is `features`, right
/// before `language` renders the tree. The tree keeps its source language.
pub fn lower_for(program: &Program, language: Language, features: &LanguageFeatures) -> Program {
    let mut lowered = lower_through(program, language, features);
    if features.type_system.is_dynamic() {
        erase_local_types(&mut lowered);
    }
    if features.paradigm == Paradigm::ObjectOriented {
        wrap_free_functions(&mut lowered);
    } else {
        unwrap_main_class(&mut lowered);
    }
    lowered
}

/// Lowering through an intermediate language.
///
/// Only losses the intermediate's model imposes are carried: raising
/// functions are marked and a channel-based language drops `async`.
/// Declared types and declaration layout stay for the final target.
pub fn lower_through(program: &Program, language: Language, features: &LanguageFeatures) -> Program {
    let mut lowered = program.clone();
    mark_throws(&mut lowered);
    if features.concurrency_model == ConcurrencyModel::CspChannels {
        strip_async(&mut lowered);
    }
    tracing::trace!(%language, "lowered");
    lowered
}

/// Whether `stmts` can raise out of the enclosing function, either with a
/// `throw` or by calling one of the `throwing` functions, without a catch
/// clause in between.
pub fn stmts_raise(stmts: &[Stmt], throwing: &BTreeSet<String>) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Stmt::Throw { .. } => true,
        Stmt::Expr { expr } => calls_any(expr, throwing),
        Stmt::Let(var) => var.init.as_ref().is_some_and(|e| calls_any(e, throwing)),
        Stmt::Return { value } => value.as_ref().is_some_and(|e| calls_any(e, throwing)),
        Stmt::Block { body } => stmts_raise(body, throwing),
        Stmt::While { test, body } => calls_any(test, throwing) || stmts_raise(body, throwing),
        Stmt::For {
            init,
            test,
            update,
            body,
        } => {
            init.as_deref()
                .is_some_and(|s| stmts_raise(std::slice::from_ref(s), throwing))
                || test.as_ref().is_some_and(|e| calls_any(e, throwing))
                || update.as_ref().is_some_and(|e| calls_any(e, throwing))
                || stmts_raise(body, throwing)
        }
        Stmt::ForEach { iterable, body, .. } => {
            calls_any(iterable, throwing) || stmts_raise(body, throwing)
        }
        Stmt::If {
            test,
            consequent,
            alternate,
        } => {
            calls_any(test, throwing)
                || stmts_raise(consequent, throwing)
                || alternate
                    .as_deref()
                    .is_some_and(|alt| stmts_raise(alt, throwing))
        }
        Stmt::TryCatch {
            body,
            catch_body,
            finally_body,
            ..
        } => {
            // A catch clause swallows what its body raises
            let escapes_body = catch_body.is_none() && stmts_raise(body, throwing);
            escapes_body
                || catch_body
                    .as_deref()
                    .is_some_and(|c| stmts_raise(c, throwing))
                || finally_body
                    .as_deref()
                    .is_some_and(|f| stmts_raise(f, throwing))
        }
        Stmt::Break | Stmt::Continue => false,
    })
}

/// Whether `stmts` contain an escaping `throw`.
pub fn stmts_throw(stmts: &[Stmt]) -> bool {
    stmts_raise(stmts, &BTreeSet::new())
}

/// Name a call resolves to: `f` in `f(x)` and `obj.f(x)`.
pub fn callee_name(callee: &Expr) -> Option<&str> {
    match callee {
        Expr::Ident { name } => Some(name),
        Expr::Member { field, .. } => Some(field),
        _ => None,
    }
}

struct CallFinder<'a> {
    names: &'a BTreeSet<String>,
    found: bool,
}

impl Visitor for CallFinder<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Call { callee, .. } = expr
            && callee_name(callee).is_some_and(|n| self.names.contains(n))
        {
            self.found = true;
        }
    }
}

/// Whether `expr` calls any function named in `names`.
pub fn calls_any(expr: &Expr, names: &BTreeSet<String>) -> bool {
    if names.is_empty() {
        return false;
    }
    let mut finder = CallFinder {
        names,
        found: false,
    };
    walk_expr(&mut finder, expr);
    finder.found
}

/// Names of functions and methods that may raise, directly or through
/// calls to each other. Computed to a fixed point.
pub fn throwing_functions(program: &Program) -> BTreeSet<String> {
    let mut names: BTreeSet<String> = program
        .functions()
        .filter(|f| f.throws || stmts_throw(&f.body))
        .map(|f| f.name.clone())
        .collect();
    loop {
        let more: Vec<String> = program
            .functions()
            .filter(|f| !names.contains(&f.name) && stmts_raise(&f.body, &names))
            .map(|f| f.name.clone())
            .collect();
        if more.is_empty() {
            return names;
        }
        names.extend(more);
    }
}

/// Declared as throwing or containing an escaping `throw`.
pub fn may_throw(func: &Function) -> bool {
    func.throws || stmts_throw(&func.body)
}

/// Set `throws` on every function that may raise.
pub fn mark_throws(program: &mut Program) {
    let throwing = throwing_functions(program);
    for func in program.functions_mut() {
        func.throws = func.throws || throwing.contains(&func.name);
    }
}

/// Best-effort type of an expression from its shape alone.
pub fn infer_type(expr: &Expr) -> TypeRef {
    use crate::ir::{BinaryOp, Literal, UnaryOp};
    match expr {
        Expr::Literal { value } => match value {
            Literal::Int(_) => TypeRef::INT,
            Literal::Float(_) => TypeRef::DOUBLE,
            Literal::Bool(_) => TypeRef::BOOL,
            Literal::String(_) => TypeRef::STRING,
            Literal::Null => TypeRef::Inferred,
        },
        Expr::New { class, .. } => match TypeRef::parse(class) {
            TypeRef::Unresolved { .. } => TypeRef::Inferred,
            ty => ty,
        },
        Expr::Array { items } => {
            TypeRef::list(items.first().map(infer_type).unwrap_or(TypeRef::Any))
        }
        Expr::Binary { left, op, .. } => match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                infer_type(left)
            }
            _ => TypeRef::BOOL,
        },
        Expr::Unary { op: UnaryOp::Not, .. } => TypeRef::BOOL,
        Expr::Unary { operand, .. } => infer_type(operand),
        _ => TypeRef::Inferred,
    }
}

/// Constructor of `class`: named after the class or by convention.
pub fn is_constructor(func: &Function, class: &ClassDecl) -> bool {
    func.name == class.name || matches!(func.name.as_str(), "constructor" | "__init__")
}

/// `this.field = value` → (`field`, `value`).
pub fn field_assignment(stmt: &Stmt) -> Option<(&str, &Expr)> {
    let Stmt::Expr {
        expr: Expr::Assign { target, value },
    } = stmt
    else {
        return None;
    };
    match target.as_ref() {
        Expr::Member { object, field }
            if matches!(object.as_ref(), Expr::Ident { name } if name == "this" || name == "self") =>
        {
            Some((field.as_str(), value.as_ref()))
        }
        _ => None,
    }
}

/// Drop declared types of locals.
pub fn erase_local_types(program: &mut Program) {
    for func in program.functions_mut() {
        for_each_block_mut(&mut func.body, &mut |block: &mut Vec<Stmt>| {
            for stmt in block.iter_mut() {
                match stmt {
                    Stmt::Let(var) => var.ty = TypeRef::Inferred,
                    Stmt::For {
                        init: Some(init), ..
                    } => {
                        if let Stmt::Let(var) = init.as_mut() {
                            var.ty = TypeRef::Inferred;
                        }
                    }
                    _ => {}
                }
            }
        });
    }
}

/// Move free functions and module variables into a static-only
/// [`MAIN_CLASS`]. Returns whether anything moved.
pub fn wrap_free_functions(program: &mut Program) -> bool {
    let mut main = ClassDecl::new(MAIN_CLASS);
    let mut rest = Vec::with_capacity(program.body.len());
    for decl in std::mem::take(&mut program.body) {
        match decl {
            Decl::Function(func) => main.methods.push(func.static_()),
            Decl::Variable(var) => main.fields.push(crate::ir::Field {
                name: var.name,
                ty: var.ty,
                visibility: crate::ir::Visibility::Public,
                is_static: true,
                init: var.init,
                span: var.span,
            }),
            class => rest.push(class),
        }
    }
    let moved = !main.methods.is_empty() || !main.fields.is_empty();
    if moved {
        // Reuse an existing Main class rather than declaring a second one
        match rest.iter_mut().find_map(|d| match d {
            Decl::Class(c) if c.name == MAIN_CLASS => Some(c),
            _ => None,
        }) {
            Some(existing) => {
                existing.fields.append(&mut main.fields);
                existing.methods.append(&mut main.methods);
            }
            None => rest.push(Decl::Class(main)),
        }
    }
    program.body = rest;
    moved
}

/// Turn a static-only [`MAIN_CLASS`] back into free functions and module
/// variables. Returns whether anything moved.
pub fn unwrap_main_class(program: &mut Program) -> bool {
    let Some(at) = program.body.iter().position(|d| match d {
        Decl::Class(c) => {
            c.name == MAIN_CLASS
                && c.kind == ClassKind::Class
                && c.extends.is_none()
                && c.implements.is_empty()
                && c.fields.iter().all(|f| f.is_static)
                && c.methods.iter().all(|m| m.is_static)
        }
        _ => false,
    }) else {
        return false;
    };
    let Decl::Class(main) = program.body.remove(at) else {
        return false;
    };
    let mut decls = Vec::with_capacity(main.fields.len() + main.methods.len());
    for field in main.fields {
        decls.push(Decl::Variable(VarDecl {
            name: field.name,
            ty: field.ty,
            init: field.init,
            mutable: true,
            span: field.span,
        }));
    }
    for mut method in main.methods {
        method.is_static = false;
        decls.push(Decl::Function(method));
    }
    program.body.splice(at..at, decls);
    // `Main.helper()` now names a free function
    for func in program.functions_mut() {
        map_exprs_in(&mut func.body, &mut |expr| {
            if let Expr::Member { object, field } = expr
                && matches!(object.as_ref(), Expr::Ident { name } if name == MAIN_CLASS)
            {
                *expr = Expr::ident(std::mem::take(field));
            }
        });
    }
    true
}

/// Qualify bare references to fields inside methods: `count` becomes
/// `this.count` and a static `total` becomes `Class.total`. Locals and
/// parameters that shadow a field are left alone. Returns whether anything
/// changed.
pub fn qualify_field_refs(program: &mut Program) -> bool {
    let mut changed = false;
    for decl in &mut program.body {
        let Decl::Class(class) = decl else { continue };
        if class.kind == ClassKind::Interface || class.fields.is_empty() {
            continue;
        }
        let instance: BTreeSet<String> = class
            .fields
            .iter()
            .filter(|f| !f.is_static)
            .map(|f| f.name.clone())
            .collect();
        let statics: BTreeSet<String> = class
            .fields
            .iter()
            .filter(|f| f.is_static)
            .map(|f| f.name.clone())
            .collect();
        let class_name = class.name.clone();
        for method in &mut class.methods {
            let bound = bound_names(method);
            let is_static = method.is_static;
            map_exprs_in(&mut method.body, &mut |expr| {
                let Expr::Ident { name } = expr else { return };
                if bound.contains(name.as_str()) {
                    return;
                }
                let owner = if !is_static && instance.contains(name.as_str()) {
                    "this"
                } else if statics.contains(name.as_str()) {
                    class_name.as_str()
                } else {
                    return;
                };
                let field = std::mem::take(name);
                *expr = Expr::member(Expr::ident(owner), field);
                changed = true;
            });
        }
    }
    changed
}

/// `program` with [`qualify_field_refs`] applied. Borrowed when no class
/// declares a field.
pub fn qualified(program: &Program) -> Cow<'_, Program> {
    if !program.classes().any(|c| !c.fields.is_empty()) {
        return Cow::Borrowed(program);
    }
    let mut owned = program.clone();
    qualify_field_refs(&mut owned);
    Cow::Owned(owned)
}

/// Parameters and every name declared anywhere in the body.
fn bound_names(func: &Function) -> BTreeSet<String> {
    struct Binder(BTreeSet<String>);
    impl Visitor for Binder {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            match stmt {
                Stmt::Let(var) => {
                    self.0.insert(var.name.clone());
                }
                Stmt::ForEach { variable, .. } => {
                    self.0.insert(variable.clone());
                }
                Stmt::TryCatch {
                    catch_param: Some(param),
                    ..
                } => {
                    self.0.insert(param.clone());
                }
                _ => {}
            }
        }

        fn visit_expr(&mut self, expr: &Expr) {
            if let Expr::Comprehension { variable, .. } = expr {
                self.0.insert(variable.clone());
            }
        }
    }
    let mut binder = Binder(func.params.iter().map(|p| p.name.clone()).collect());
    walk_stmts(&mut binder, &func.body);
    binder.0
}

/// Make every function synchronous and unwrap `await` expressions.
pub fn strip_async(program: &mut Program) -> bool {
    let mut changed = false;
    for func in program.functions_mut() {
        if func.is_async {
            func.is_async = false;
            changed = true;
        }
        if any_expr(&func.body, |e| matches!(e, Expr::Await { .. })) {
            map_exprs_in(&mut func.body, &mut unwrap_await);
            changed = true;
        }
    }
    changed
}

fn unwrap_await(expr: &mut Expr) {
    if let Expr::Await { value } = expr {
        let inner = std::mem::replace(value.as_mut(), Expr::null());
        *expr = inner;
        unwrap_await(expr);
    }
}

/// Apply `f` to every expression in `stmts`, children before parents.
pub fn map_exprs_in(stmts: &mut [Stmt], f: &mut impl FnMut(&mut Expr)) {
    for stmt in stmts {
        match stmt {
            Stmt::Expr { expr } | Stmt::Throw { value: expr } => map_expr(expr, f),
            Stmt::Let(var) => {
                if let Some(init) = &mut var.init {
                    map_expr(init, f);
                }
            }
            Stmt::Block { body } => map_exprs_in(body, f),
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                map_expr(test, f);
                map_exprs_in(consequent, f);
                if let Some(alt) = alternate {
                    map_exprs_in(alt, f);
                }
            }
            Stmt::While { test, body } => {
                map_expr(test, f);
                map_exprs_in(body, f);
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                if let Some(init) = init {
                    map_exprs_in(std::slice::from_mut(init.as_mut()), f);
                }
                if let Some(test) = test {
                    map_expr(test, f);
                }
                if let Some(update) = update {
                    map_expr(update, f);
                }
                map_exprs_in(body, f);
            }
            Stmt::ForEach { iterable, body, .. } => {
                map_expr(iterable, f);
                map_exprs_in(body, f);
            }
            Stmt::Return { value } => {
                if let Some(value) = value {
                    map_expr(value, f);
                }
            }
            Stmt::TryCatch {
                body,
                catch_body,
                finally_body,
                ..
            } => {
                map_exprs_in(body, f);
                if let Some(catch_body) = catch_body {
                    map_exprs_in(catch_body, f);
                }
                if let Some(finally_body) = finally_body {
                    map_exprs_in(finally_body, f);
                }
            }
            Stmt::Break | Stmt::Continue => {}
        }
    }
}

fn map_expr(expr: &mut Expr, f: &mut impl FnMut(&mut Expr)) {
    match expr {
        Expr::Literal { .. } | Expr::Ident { .. } => {}
        Expr::Binary { left, right, .. } => {
            map_expr(left, f);
            map_expr(right, f);
        }
        Expr::Unary { operand, .. } => map_expr(operand, f),
        Expr::Call { callee, args } => {
            map_expr(callee, f);
            args.iter_mut().for_each(|a| map_expr(a, f));
        }
        Expr::Member { object, .. } => map_expr(object, f),
        Expr::Index { object, index } => {
            map_expr(object, f);
            map_expr(index, f);
        }
        Expr::Assign { target, value } => {
            map_expr(target, f);
            map_expr(value, f);
        }
        Expr::New { args, .. } => args.iter_mut().for_each(|a| map_expr(a, f)),
        Expr::Await { value } => map_expr(value, f),
        Expr::Array { items } => items.iter_mut().for_each(|i| map_expr(i, f)),
        Expr::Comprehension {
            element,
            iterable,
            condition,
            ..
        } => {
            map_expr(iterable, f);
            if let Some(condition) = condition {
                map_expr(condition, f);
            }
            map_expr(element, f);
        }
    }
    f(expr);
}

// Collection-building loops

const APPEND_METHODS: &[&str] = &["append", "add", "push"];

fn is_empty_collection(expr: &Expr) -> bool {
    match expr {
        Expr::Array { items } => items.is_empty(),
        Expr::New { class, args } => args.is_empty() && class.contains("List"),
        Expr::Call { callee, args } if args.is_empty() => match callee.as_ref() {
            Expr::Ident { name } => name == "list",
            Expr::Member { object, field } => {
                field == "new" && matches!(object.as_ref(), Expr::Ident { name } if name == "Vec")
            }
            _ => false,
        },
        _ => false,
    }
}

/// `acc.append(e)` → `e`, when `acc` is the accumulator.
fn appended_element<'a>(stmt: &'a Stmt, acc: &str) -> Option<&'a Expr> {
    let Stmt::Expr {
        expr: Expr::Call { callee, args },
    } = stmt
    else {
        return None;
    };
    let Expr::Member { object, field } = callee.as_ref() else {
        return None;
    };
    let receiver_is_acc = matches!(object.as_ref(), Expr::Ident { name } if name == acc);
    if receiver_is_acc && APPEND_METHODS.contains(&field.as_str()) && args.len() == 1 {
        args.first()
    } else {
        None
    }
}

fn mentions(expr: &Expr, name: &str) -> bool {
    let stmts = [Stmt::expr(expr.clone())];
    any_expr(&stmts, |e| matches!(e, Expr::Ident { name: n } if n == name))
}

/// Comprehension equivalent of a `for` loop that only appends to `acc`.
fn loop_as_comprehension(stmt: &Stmt, acc: &str) -> Option<Expr> {
    let Stmt::ForEach {
        variable,
        iterable,
        body,
    } = stmt
    else {
        return None;
    };
    let [inner] = body.as_slice() else {
        return None;
    };
    let (element, condition) = match inner {
        Stmt::If {
            test,
            consequent,
            alternate: None,
        } => match consequent.as_slice() {
            [only] => (appended_element(only, acc)?, Some(test)),
            _ => return None,
        },
        other => (appended_element(other, acc)?, None),
    };
    if mentions(element, acc) || condition.is_some_and(|c| mentions(c, acc)) {
        return None;
    }
    Some(Expr::Comprehension {
        element: Box::new(element.clone()),
        variable: variable.clone(),
        iterable: Box::new(iterable.clone()),
        condition: condition.map(|c| Box::new(c.clone())),
    })
}

/// Rewrite `acc = []; for x in xs { acc.append(f(x)) }` into a single
/// declaration initialised by a comprehension. Returns the rewrite count.
pub fn loops_to_comprehensions(program: &mut Program) -> usize {
    let mut count = 0;
    for func in program.functions_mut() {
        for_each_block_mut(&mut func.body, &mut |block: &mut Vec<Stmt>| {
            let mut i = 0;
            while i + 1 < block.len() {
                let rewrite = match &block[i] {
                    Stmt::Let(VarDecl {
                        name,
                        init: Some(init),
                        ..
                    }) if is_empty_collection(init) => loop_as_comprehension(&block[i + 1], name),
                    _ => None,
                };
                if let Some(comprehension) = rewrite {
                    if let Stmt::Let(var) = &mut block[i] {
                        var.init = Some(comprehension);
                        var.mutable = false;
                    }
                    block.remove(i + 1);
                    count += 1;
                }
                i += 1;
            }
        });
    }
    count
}

// Pattern adaptations

/// Tag singleton classes with their accessor.
pub fn hint_singletons(program: &mut Program) -> bool {
    let mut changed = false;
    for decl in &mut program.body {
        if let Decl::Class(class) = decl
            && class.singleton_accessor().is_none()
            && let Some(accessor) = shape::singleton_accessor(class).map(str::to_string)
        {
            class.hints.push(Hint::Singleton { accessor });
            changed = true;
        }
    }
    changed
}

/// Tag plain record classes.
pub fn hint_data_classes(program: &mut Program) -> bool {
    let mut changed = false;
    for decl in &mut program.body {
        if let Decl::Class(class) = decl
            && !class.has_hint(&Hint::DataClass)
            && shape::is_data_class(class)
        {
            class.hints.push(Hint::DataClass);
            changed = true;
        }
    }
    changed
}

/// Replace static-only factory classes by module-level functions named
/// after their methods.
pub fn hoist_factories(program: &mut Program) -> bool {
    let mut changed = false;
    let mut body = Vec::with_capacity(program.body.len());
    for decl in std::mem::take(&mut program.body) {
        match decl {
            Decl::Class(class)
                if shape::is_factory(&class)
                    && class.fields.is_empty()
                    && class.methods.iter().all(|m| m.is_static) =>
            {
                changed = true;
                body.extend(class.methods.into_iter().map(|mut m| {
                    m.is_static = false;
                    Decl::Function(m)
                }));
            }
            other => body.push(other),
        }
    }
    program.body = body;
    changed
}

/// Mark single-statement functions for inlining.
pub fn hint_inline(program: &mut Program) -> bool {
    let mut changed = false;
    for func in program.functions_mut() {
        if func.body.len() == 1 && !func.is_async && !func.has_hint(&Hint::Inline) {
            func.hints.push(Hint::Inline);
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOp, Field, Param, StructureEq};
    use normalize_language_meta::LanguageRegistry;

    fn square_all() -> Function {
        Function::new(
            "squares",
            vec![crate::ir::Param::new("xs", TypeRef::list(TypeRef::INT))],
            TypeRef::list(TypeRef::INT),
            vec![
                Stmt::let_decl("result", Some(Expr::array(vec![]))),
                Stmt::for_each(
                    "x",
                    Expr::ident("xs"),
                    vec![Stmt::if_stmt(
                        Expr::binary(Expr::ident("x"), BinaryOp::Gt, Expr::int(0)),
                        vec![Stmt::expr(Expr::method_call(
                            Expr::ident("result"),
                            "append",
                            vec![Expr::binary(Expr::ident("x"), BinaryOp::Mul, Expr::ident("x"))],
                        ))],
                        None,
                    )],
                ),
                Stmt::return_stmt(Some(Expr::ident("result"))),
            ],
        )
    }

    #[test]
    fn test_loop_becomes_comprehension() {
        let mut program = Program::new(Language::Python, vec![Decl::Function(square_all())]);
        assert_eq!(loops_to_comprehensions(&mut program), 1);
        let func = program.functions().next().unwrap();
        assert_eq!(func.body.len(), 2);
        let Stmt::Let(var) = &func.body[0] else {
            panic!("expected let");
        };
        assert!(matches!(
            var.init,
            Some(Expr::Comprehension {
                condition: Some(_),
                ..
            })
        ));
        // Second run finds nothing left to rewrite
        assert_eq!(loops_to_comprehensions(&mut program), 0);
    }

    #[test]
    fn test_loop_reading_accumulator_is_kept() {
        let mut func = square_all();
        func.body[1] = Stmt::for_each(
            "x",
            Expr::ident("xs"),
            vec![Stmt::expr(Expr::method_call(
                Expr::ident("result"),
                "append",
                vec![Expr::ident("result")],
            ))],
        );
        let mut program = Program::new(Language::Python, vec![Decl::Function(func)]);
        assert_eq!(loops_to_comprehensions(&mut program), 0);
    }

    #[test]
    fn test_stmts_throw_respects_catch() {
        let caught = vec![Stmt::try_catch(
            vec![Stmt::throw(Expr::string("boom"))],
            Some("e"),
            Some(vec![]),
            None,
        )];
        assert!(!stmts_throw(&caught));
        let rethrown = vec![Stmt::try_catch(
            vec![],
            Some("e"),
            Some(vec![Stmt::throw(Expr::ident("e"))]),
            None,
        )];
        assert!(stmts_throw(&rethrown));
    }

    #[test]
    fn test_throwing_propagates_through_calls() {
        let program = Program::new(
            Language::Java,
            vec![
                Decl::Function(Function::new(
                    "parse",
                    vec![],
                    TypeRef::INT,
                    vec![Stmt::throw(Expr::string("bad"))],
                )),
                Decl::Function(Function::new(
                    "load",
                    vec![],
                    TypeRef::INT,
                    vec![Stmt::return_stmt(Some(Expr::call(Expr::ident("parse"), vec![])))],
                )),
                Decl::Function(Function::new(
                    "safe",
                    vec![],
                    TypeRef::Void,
                    vec![Stmt::try_catch(
                        vec![Stmt::expr(Expr::call(Expr::ident("load"), vec![]))],
                        Some("e"),
                        Some(vec![]),
                        None,
                    )],
                )),
            ],
        );
        let names: Vec<_> = throwing_functions(&program).into_iter().collect();
        assert_eq!(names, ["load", "parse"]);
    }

    #[test]
    fn test_lower_for_java_wraps_and_marks_throws() {
        let registry = LanguageRegistry::builtin();
        let program = Program::new(
            Language::Python,
            vec![Decl::Function(Function::new(
                "check",
                vec![],
                TypeRef::Void,
                vec![Stmt::throw(Expr::string("bad"))],
            ))],
        );
        let lowered = lower_for(&program, Language::Java, registry.features_of(Language::Java));
        assert_eq!(lowered.source, Language::Python);
        let main = lowered.classes().next().expect("Main class");
        assert_eq!(main.name, MAIN_CLASS);
        assert!(main.methods[0].is_static);
        assert!(main.methods[0].throws);
        // Input is untouched
        assert!(!program.functions().next().unwrap().throws);
    }

    #[test]
    fn test_lower_for_go_strips_async() {
        let registry = LanguageRegistry::builtin();
        let program = Program::new(
            Language::TypeScript,
            vec![Decl::Function(
                Function::new(
                    "load",
                    vec![],
                    TypeRef::STRING,
                    vec![Stmt::return_stmt(Some(Expr::await_(Expr::call(
                        Expr::ident("fetch"),
                        vec![],
                    ))))],
                )
                .async_(),
            )],
        );
        let lowered = lower_for(&program, Language::Go, registry.features_of(Language::Go));
        let func = lowered.functions().next().unwrap();
        assert!(!func.is_async);
        assert_eq!(
            func.body[0],
            Stmt::return_stmt(Some(Expr::call(Expr::ident("fetch"), vec![])))
        );
    }

    #[test]
    fn test_lowering_into_same_model_is_structurally_stable() {
        let registry = LanguageRegistry::builtin();
        let program = Program::new(Language::Rust, vec![Decl::Function(square_all())]);
        let lowered = lower_for(&program, Language::Rust, registry.features_of(Language::Rust));
        assert!(program.structure_eq(&lowered));
    }

    #[test]
    fn test_lower_for_python_unwraps_static_main() {
        let registry = LanguageRegistry::builtin();
        let helper = Function::new(
            "helper",
            vec![],
            TypeRef::INT,
            vec![Stmt::return_stmt(Some(Expr::int(1)))],
        );
        let run = Function::new(
            "run",
            vec![],
            TypeRef::INT,
            vec![Stmt::return_stmt(Some(Expr::call(
                Expr::member(Expr::ident(MAIN_CLASS), "helper"),
                vec![],
            )))],
        );
        let program = Program::new(
            Language::Java,
            vec![Decl::Function(helper), Decl::Function(run)],
        );
        let java = lower_for(&program, Language::Java, registry.features_of(Language::Java));
        assert_eq!(java.classes().count(), 1);
        let python = lower_for(&java, Language::Python, registry.features_of(Language::Python));
        assert_eq!(python.classes().count(), 0);
        let names: Vec<_> = python.functions().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["helper", "run"]);
        assert!(python.functions().all(|f| !f.is_static));
        assert_eq!(
            python.functions().nth(1).unwrap().body[0],
            Stmt::return_stmt(Some(Expr::call(Expr::ident("helper"), vec![])))
        );
    }

    #[test]
    fn test_main_with_instance_state_is_kept() {
        let main = ClassDecl::new(MAIN_CLASS).with_field(Field::new("count", TypeRef::INT));
        let mut program = Program::new(Language::Java, vec![Decl::Class(main)]);
        assert!(!unwrap_main_class(&mut program));
        assert_eq!(program.classes().count(), 1);
    }

    #[test]
    fn test_lower_through_keeps_declared_types_and_layout() {
        let registry = LanguageRegistry::builtin();
        let program = Program::new(Language::Java, vec![Decl::Function(square_all())]);
        let hop = lower_through(&program, Language::Python, registry.features_of(Language::Python));
        assert!(program.structure_eq(&hop));
        let hop = lower_through(&program, Language::Java, registry.features_of(Language::Java));
        assert!(matches!(hop.body[0], Decl::Function(_)));
        assert_eq!(hop.source, Language::Java);
    }

    #[test]
    fn test_lower_through_go_drops_async() {
        let registry = LanguageRegistry::builtin();
        let program = Program::new(
            Language::TypeScript,
            vec![Decl::Function(
                Function::new("load", vec![], TypeRef::STRING, vec![]).async_(),
            )],
        );
        let hop = lower_through(&program, Language::Go, registry.features_of(Language::Go));
        assert!(!hop.functions().next().unwrap().is_async);
    }

    fn counter() -> ClassDecl {
        ClassDecl::new("Counter")
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
            ))
            .with_method(Function::new(
                "reset",
                vec![Param::new("count", TypeRef::INT)],
                TypeRef::Void,
                vec![Stmt::expr(Expr::assign(
                    Expr::member(Expr::ident("this"), "count"),
                    Expr::ident("count"),
                ))],
            ))
    }

    #[test]
    fn test_qualify_field_refs() {
        let mut program = Program::new(Language::Java, vec![Decl::Class(counter())]);
        assert!(qualify_field_refs(&mut program));
        let class = program.classes().next().unwrap();
        assert_eq!(
            class.methods[0].body,
            vec![
                Stmt::expr(Expr::call(
                    Expr::ident("log"),
                    vec![Expr::member(Expr::ident("Counter"), "total")],
                )),
                Stmt::return_stmt(Some(Expr::member(Expr::ident("this"), "count"))),
            ]
        );
        // The parameter shadows the field
        assert_eq!(
            class.methods[1].body[0],
            Stmt::expr(Expr::assign(
                Expr::member(Expr::ident("this"), "count"),
                Expr::ident("count"),
            ))
        );
        assert!(!qualify_field_refs(&mut program));
    }

    #[test]
    fn test_hoist_factories() {
        let factory = ClassDecl::new("ShapeFactory").with_method(
            Function::new(
                "createShape",
                vec![],
                TypeRef::named("Shape"),
                vec![Stmt::return_stmt(Some(Expr::new_object("Circle", vec![])))],
            )
            .static_(),
        );
        let mut program = Program::new(Language::Java, vec![Decl::Class(factory)]);
        assert!(hoist_factories(&mut program));
        assert!(matches!(&program.body[0], Decl::Function(f) if f.name == "createShape"));
    }
}
