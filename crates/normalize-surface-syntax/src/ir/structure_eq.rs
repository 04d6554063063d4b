//! Structural equality for IR types.
//!
//! `structure_eq` compares IR trees ignoring "surface hints" - fields that
//! record where a node came from or how it should be rendered but don't
//! affect program semantics.
//!
//! # Hint Fields (ignored during comparison)
//!
//! - `span` on every declaration - source positions differ between parses
//! - `hints` on classes and functions - rendering hints from idiom passes
//! - `VarDecl::mutable` - dynamic languages don't distinguish const/let
//! - `Program::source` - the same tree can be lowered through several languages
//!
//! # Core Fields (must match exactly)
//!
//! - All names, types, values, operators
//! - Control flow structure
//! - Expression trees

use super::{ClassDecl, Decl, Expr, Field, Function, Param, Program, Stmt, VarDecl};

/// Trait for structural equality comparison.
///
/// Unlike `PartialEq`, this ignores surface hint fields that may differ
/// between languages but don't affect program semantics.
pub trait StructureEq {
    /// Compare two values for structural equality.
    fn structure_eq(&self, other: &Self) -> bool;
}

impl StructureEq for Program {
    fn structure_eq(&self, other: &Self) -> bool {
        vec_structure_eq(&self.body, &other.body)
    }
}

impl StructureEq for Decl {
    fn structure_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Decl::Class(a), Decl::Class(b)) => a.structure_eq(b),
            (Decl::Function(a), Decl::Function(b)) => a.structure_eq(b),
            (Decl::Variable(a), Decl::Variable(b)) => a.structure_eq(b),
            _ => false,
        }
    }
}

impl StructureEq for ClassDecl {
    fn structure_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.extends == other.extends
            && self.implements == other.implements
            && vec_structure_eq(&self.fields, &other.fields)
            && vec_structure_eq(&self.methods, &other.methods)
    }
}

impl StructureEq for Field {
    fn structure_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.ty == other.ty
            && self.visibility == other.visibility
            && self.is_static == other.is_static
            && option_structure_eq(self.init.as_ref(), other.init.as_ref())
    }
}

impl StructureEq for Function {
    fn structure_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.return_type == other.return_type
            && self.is_static == other.is_static
            && self.is_async == other.is_async
            && self.throws == other.throws
            && vec_structure_eq(&self.params, &other.params)
            && vec_structure_eq(&self.body, &other.body)
    }
}

impl StructureEq for Param {
    fn structure_eq(&self, other: &Self) -> bool {
        self.name == other.name && self.ty == other.ty
    }
}

// Ignore `mutable` and `span`
impl StructureEq for VarDecl {
    fn structure_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.ty == other.ty
            && option_structure_eq(self.init.as_ref(), other.init.as_ref())
    }
}

impl StructureEq for Stmt {
    fn structure_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Stmt::Expr { expr: a }, Stmt::Expr { expr: b }) => a.structure_eq(b),

            (Stmt::Let(a), Stmt::Let(b)) => a.structure_eq(b),

            (Stmt::Block { body: a }, Stmt::Block { body: b }) => vec_structure_eq(a, b),

            (
                Stmt::If {
                    test: t1,
                    consequent: c1,
                    alternate: a1,
                },
                Stmt::If {
                    test: t2,
                    consequent: c2,
                    alternate: a2,
                },
            ) => {
                t1.structure_eq(t2)
                    && vec_structure_eq(c1, c2)
                    && option_vec_structure_eq(a1.as_deref(), a2.as_deref())
            }

            (Stmt::While { test: t1, body: b1 }, Stmt::While { test: t2, body: b2 }) => {
                t1.structure_eq(t2) && vec_structure_eq(b1, b2)
            }

            (
                Stmt::For {
                    init: i1,
                    test: t1,
                    update: u1,
                    body: b1,
                },
                Stmt::For {
                    init: i2,
                    test: t2,
                    update: u2,
                    body: b2,
                },
            ) => {
                option_structure_eq(i1.as_deref(), i2.as_deref())
                    && option_structure_eq(t1.as_ref(), t2.as_ref())
                    && option_structure_eq(u1.as_ref(), u2.as_ref())
                    && vec_structure_eq(b1, b2)
            }

            (
                Stmt::ForEach {
                    variable: v1,
                    iterable: i1,
                    body: b1,
                },
                Stmt::ForEach {
                    variable: v2,
                    iterable: i2,
                    body: b2,
                },
            ) => v1 == v2 && i1.structure_eq(i2) && vec_structure_eq(b1, b2),

            (Stmt::Return { value: a }, Stmt::Return { value: b }) => {
                option_structure_eq(a.as_ref(), b.as_ref())
            }

            (Stmt::Break, Stmt::Break) => true,
            (Stmt::Continue, Stmt::Continue) => true,

            (Stmt::Throw { value: a }, Stmt::Throw { value: b }) => a.structure_eq(b),

            (
                Stmt::TryCatch {
                    body: b1,
                    catch_param: cp1,
                    catch_body: cb1,
                    finally_body: fb1,
                },
                Stmt::TryCatch {
                    body: b2,
                    catch_param: cp2,
                    catch_body: cb2,
                    finally_body: fb2,
                },
            ) => {
                vec_structure_eq(b1, b2)
                    && cp1 == cp2
                    && option_vec_structure_eq(cb1.as_deref(), cb2.as_deref())
                    && option_vec_structure_eq(fb1.as_deref(), fb2.as_deref())
            }

            _ => false,
        }
    }
}

impl StructureEq for Expr {
    fn structure_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expr::Literal { value: a }, Expr::Literal { value: b }) => a == b,
            (Expr::Ident { name: a }, Expr::Ident { name: b }) => a == b,

            (
                Expr::Binary {
                    left: l1,
                    op: o1,
                    right: r1,
                },
                Expr::Binary {
                    left: l2,
                    op: o2,
                    right: r2,
                },
            ) => o1 == o2 && l1.structure_eq(l2) && r1.structure_eq(r2),

            (
                Expr::Unary {
                    op: o1,
                    operand: e1,
                },
                Expr::Unary {
                    op: o2,
                    operand: e2,
                },
            ) => o1 == o2 && e1.structure_eq(e2),

            (
                Expr::Call {
                    callee: c1,
                    args: a1,
                },
                Expr::Call {
                    callee: c2,
                    args: a2,
                },
            ) => c1.structure_eq(c2) && vec_structure_eq(a1, a2),

            (
                Expr::Member {
                    object: o1,
                    field: f1,
                },
                Expr::Member {
                    object: o2,
                    field: f2,
                },
            ) => f1 == f2 && o1.structure_eq(o2),

            (
                Expr::Index {
                    object: o1,
                    index: i1,
                },
                Expr::Index {
                    object: o2,
                    index: i2,
                },
            ) => o1.structure_eq(o2) && i1.structure_eq(i2),

            (
                Expr::Assign {
                    target: t1,
                    value: v1,
                },
                Expr::Assign {
                    target: t2,
                    value: v2,
                },
            ) => t1.structure_eq(t2) && v1.structure_eq(v2),

            (
                Expr::New {
                    class: c1,
                    args: a1,
                },
                Expr::New {
                    class: c2,
                    args: a2,
                },
            ) => c1 == c2 && vec_structure_eq(a1, a2),

            (Expr::Await { value: a }, Expr::Await { value: b }) => a.structure_eq(b),

            (Expr::Array { items: a }, Expr::Array { items: b }) => vec_structure_eq(a, b),

            (
                Expr::Comprehension {
                    element: e1,
                    variable: v1,
                    iterable: i1,
                    condition: c1,
                },
                Expr::Comprehension {
                    element: e2,
                    variable: v2,
                    iterable: i2,
                    condition: c2,
                },
            ) => {
                v1 == v2
                    && e1.structure_eq(e2)
                    && i1.structure_eq(i2)
                    && option_structure_eq(c1.as_deref(), c2.as_deref())
            }

            _ => false,
        }
    }
}

// Helper functions

fn vec_structure_eq<T: StructureEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structure_eq(y))
}

fn option_structure_eq<T: StructureEq>(a: Option<&T>, b: Option<&T>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => x.structure_eq(y),
        _ => false,
    }
}

fn option_vec_structure_eq<T: StructureEq>(a: Option<&[T]>, b: Option<&[T]>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => vec_structure_eq(x, y),
        _ => false,
    }
}
