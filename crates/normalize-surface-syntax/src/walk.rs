//! Read-only traversal of the IR.
//!
//! Walk order is pre-order and source order: `visit_*` is called on a node
//! before its children, and children are visited left to right. Methods
//! default to doing nothing, so a visitor overrides only what it inspects.

use crate::ir::{ClassDecl, Decl, Expr, Function, Program, Stmt};

/// Callbacks invoked while walking a tree.
pub trait Visitor {
    fn visit_class(&mut self, _class: &ClassDecl) {}
    fn visit_function(&mut self, _func: &Function, _owner: Option<&ClassDecl>) {}
    fn visit_stmt(&mut self, _stmt: &Stmt) {}
    fn visit_expr(&mut self, _expr: &Expr) {}
}

/// Walk every declaration of `program`.
pub fn walk_program<V: Visitor + ?Sized>(visitor: &mut V, program: &Program) {
    for decl in &program.body {
        match decl {
            Decl::Class(class) => {
                visitor.visit_class(class);
                for field in &class.fields {
                    if let Some(init) = &field.init {
                        walk_expr(visitor, init);
                    }
                }
                for method in &class.methods {
                    walk_function(visitor, method, Some(class));
                }
            }
            Decl::Function(func) => walk_function(visitor, func, None),
            Decl::Variable(var) => {
                if let Some(init) = &var.init {
                    walk_expr(visitor, init);
                }
            }
        }
    }
}

pub fn walk_function<V: Visitor + ?Sized>(
    visitor: &mut V,
    func: &Function,
    owner: Option<&ClassDecl>,
) {
    visitor.visit_function(func, owner);
    walk_stmts(visitor, &func.body);
}

pub fn walk_stmts<V: Visitor + ?Sized>(visitor: &mut V, stmts: &[Stmt]) {
    for stmt in stmts {
        walk_stmt(visitor, stmt);
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    visitor.visit_stmt(stmt);
    match stmt {
        Stmt::Expr { expr } => walk_expr(visitor, expr),
        Stmt::Let(var) => {
            if let Some(init) = &var.init {
                walk_expr(visitor, init);
            }
        }
        Stmt::Block { body } => walk_stmts(visitor, body),
        Stmt::If {
            test,
            consequent,
            alternate,
        } => {
            walk_expr(visitor, test);
            walk_stmts(visitor, consequent);
            if let Some(alt) = alternate {
                walk_stmts(visitor, alt);
            }
        }
        Stmt::While { test, body } => {
            walk_expr(visitor, test);
            walk_stmts(visitor, body);
        }
        Stmt::For {
            init,
            test,
            update,
            body,
        } => {
            if let Some(init) = init {
                walk_stmt(visitor, init);
            }
            if let Some(test) = test {
                walk_expr(visitor, test);
            }
            if let Some(update) = update {
                walk_expr(visitor, update);
            }
            walk_stmts(visitor, body);
        }
        Stmt::ForEach { iterable, body, .. } => {
            walk_expr(visitor, iterable);
            walk_stmts(visitor, body);
        }
        Stmt::Return { value } => {
            if let Some(value) = value {
                walk_expr(visitor, value);
            }
        }
        Stmt::Throw { value } => walk_expr(visitor, value),
        Stmt::TryCatch {
            body,
            catch_body,
            finally_body,
            ..
        } => {
            walk_stmts(visitor, body);
            if let Some(catch_body) = catch_body {
                walk_stmts(visitor, catch_body);
            }
            if let Some(finally_body) = finally_body {
                walk_stmts(visitor, finally_body);
            }
        }
        Stmt::Break | Stmt::Continue => {}
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    visitor.visit_expr(expr);
    match expr {
        Expr::Literal { .. } | Expr::Ident { .. } => {}
        Expr::Binary { left, right, .. } => {
            walk_expr(visitor, left);
            walk_expr(visitor, right);
        }
        Expr::Unary { operand, .. } => walk_expr(visitor, operand),
        Expr::Call { callee, args } => {
            walk_expr(visitor, callee);
            for arg in args {
                walk_expr(visitor, arg);
            }
        }
        Expr::Member { object, .. } => walk_expr(visitor, object),
        Expr::Index { object, index } => {
            walk_expr(visitor, object);
            walk_expr(visitor, index);
        }
        Expr::Assign { target, value } => {
            walk_expr(visitor, target);
            walk_expr(visitor, value);
        }
        Expr::New { args, .. } => {
            for arg in args {
                walk_expr(visitor, arg);
            }
        }
        Expr::Await { value } => walk_expr(visitor, value),
        Expr::Array { items } => {
            for item in items {
                walk_expr(visitor, item);
            }
        }
        Expr::Comprehension {
            element,
            iterable,
            condition,
            ..
        } => {
            walk_expr(visitor, iterable);
            if let Some(condition) = condition {
                walk_expr(visitor, condition);
            }
            walk_expr(visitor, element);
        }
    }
}

/// Records whether any statement or expression matched a predicate.
struct Finder<S, E> {
    stmt: S,
    expr: E,
    found: bool,
}

impl<S: FnMut(&Stmt) -> bool, E: FnMut(&Expr) -> bool> Visitor for Finder<S, E> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        self.found = self.found || (self.stmt)(stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        self.found = self.found || (self.expr)(expr);
    }
}

/// Whether any statement in `stmts` (at any depth) satisfies `pred`.
pub fn any_stmt(stmts: &[Stmt], pred: impl FnMut(&Stmt) -> bool) -> bool {
    let mut finder = Finder {
        stmt: pred,
        expr: |_: &Expr| false,
        found: false,
    };
    walk_stmts(&mut finder, stmts);
    finder.found
}

/// Whether any expression in `stmts` (at any depth) satisfies `pred`.
pub fn any_expr(stmts: &[Stmt], pred: impl FnMut(&Expr) -> bool) -> bool {
    let mut finder = Finder {
        stmt: |_: &Stmt| false,
        expr: pred,
        found: false,
    };
    walk_stmts(&mut finder, stmts);
    finder.found
}

/// Apply `f` to every statement list nested in `stmts`, innermost first,
/// and finally to `stmts` itself.
pub fn for_each_block_mut(stmts: &mut Vec<Stmt>, f: &mut impl FnMut(&mut Vec<Stmt>)) {
    for stmt in stmts.iter_mut() {
        match stmt {
            Stmt::Block { body }
            | Stmt::While { body, .. }
            | Stmt::For { body, .. }
            | Stmt::ForEach { body, .. } => for_each_block_mut(body, f),
            Stmt::If {
                consequent,
                alternate,
                ..
            } => {
                for_each_block_mut(consequent, f);
                if let Some(alt) = alternate {
                    for_each_block_mut(alt, f);
                }
            }
            Stmt::TryCatch {
                body,
                catch_body,
                finally_body,
                ..
            } => {
                for_each_block_mut(body, f);
                if let Some(catch_body) = catch_body {
                    for_each_block_mut(catch_body, f);
                }
                if let Some(finally_body) = finally_body {
                    for_each_block_mut(finally_body, f);
                }
            }
            Stmt::Expr { .. }
            | Stmt::Let(_)
            | Stmt::Return { .. }
            | Stmt::Break
            | Stmt::Continue
            | Stmt::Throw { .. } => {}
        }
    }
    f(stmts);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOp, TypeRef};
    use normalize_language_meta::Language;

    #[derive(Default)]
    struct Counter {
        functions: Vec<String>,
        exprs: usize,
    }

    impl Visitor for Counter {
        fn visit_function(&mut self, func: &Function, owner: Option<&ClassDecl>) {
            let name = match owner {
                Some(class) => format!("{}.{}", class.name, func.name),
                None => func.name.clone(),
            };
            self.functions.push(name);
        }

        fn visit_expr(&mut self, _expr: &Expr) {
            self.exprs += 1;
        }
    }

    #[test]
    fn test_walk_visits_methods_with_owner() {
        let program = Program::new(
            Language::Java,
            vec![
                Decl::Class(ClassDecl::new("Greeter").with_method(Function::new(
                    "greet",
                    vec![],
                    TypeRef::Void,
                    vec![Stmt::return_stmt(Some(Expr::binary(
                        Expr::int(1),
                        BinaryOp::Add,
                        Expr::int(2),
                    )))],
                ))),
                Decl::Function(Function::new("main", vec![], TypeRef::Void, vec![])),
            ],
        );
        let mut counter = Counter::default();
        walk_program(&mut counter, &program);
        assert_eq!(counter.functions, ["Greeter.greet", "main"]);
        assert_eq!(counter.exprs, 3);
    }

    #[test]
    fn test_any_expr_finds_nested_await() {
        let body = vec![Stmt::if_stmt(
            Expr::bool(true),
            vec![Stmt::expr(Expr::await_(Expr::call(Expr::ident("f"), vec![])))],
            None,
        )];
        assert!(any_expr(&body, |e| matches!(e, Expr::Await { .. })));
        assert!(!any_stmt(&body, |s| matches!(s, Stmt::Throw { .. })));
    }

    #[test]
    fn test_for_each_block_mut_is_innermost_first() {
        let mut body = vec![Stmt::while_loop(
            Expr::bool(true),
            vec![Stmt::Break],
        )];
        let mut sizes = Vec::new();
        for_each_block_mut(&mut body, &mut |block: &mut Vec<Stmt>| sizes.push(block.len()));
        assert_eq!(sizes, [1, 1]);
    }
}
