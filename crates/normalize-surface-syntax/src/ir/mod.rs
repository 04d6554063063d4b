//! Intermediate representation for cross-language translation.
//!
//! The IR is a plain owned tree: every node owns its children and there are
//! no parent links, so a `Program` is acyclic by construction. Declarations
//! carry a `Span` pointing back into the original source for diagnostics.

mod structure_eq;
mod types;

pub use structure_eq::StructureEq;
pub use types::{Primitive, TypeRef};

use normalize_language_meta::Language;
use serde::{Deserialize, Serialize};

/// Source position (1-based line and column) of a declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A whole translation unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Language the tree was parsed from (or lowered into, after a hop).
    pub source: Language,
    pub body: Vec<Decl>,
}

/// Top-level declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum Decl {
    Class(ClassDecl),
    Function(Function),
    Variable(VarDecl),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Class,
    Struct,
    Interface,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
}

/// Surface hints attached by idiom and pattern passes.
///
/// Hints never change what a program computes, only how a generator
/// renders it, so `StructureEq` ignores them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "hint", rename_all = "snake_case")]
pub enum Hint {
    /// Class holds one lazily created shared instance reachable via `accessor`.
    Singleton { accessor: String },
    /// Class is a plain record of fields.
    DataClass,
    /// Function body is a single expression worth inlining.
    Inline,
}

/// Class, struct or interface declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub kind: ClassKind,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<Function>,
    pub hints: Vec<Hint>,
    pub span: Span,
}

/// Field of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    pub visibility: Visibility,
    pub is_static: bool,
    pub init: Option<Expr>,
    pub span: Span,
}

/// Function or method declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeRef,
    pub body: Vec<Stmt>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_async: bool,
    /// Function may raise an exception (declared or containing `throw`).
    pub throws: bool,
    pub hints: Vec<Hint>,
    pub span: Span,
}

/// Function parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    pub span: Span,
}

/// Variable declaration (top-level or local).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: TypeRef,
    pub init: Option<Expr>,
    pub mutable: bool,
    pub span: Span,
}

/// Statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    Expr {
        expr: Expr,
    },
    Let(VarDecl),
    Block {
        body: Vec<Stmt>,
    },
    If {
        test: Expr,
        consequent: Vec<Stmt>,
        alternate: Option<Vec<Stmt>>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
    },
    /// C-style `for (init; test; update)`.
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Vec<Stmt>,
    },
    /// `for variable in iterable`.
    ForEach {
        variable: String,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    Return {
        value: Option<Expr>,
    },
    Break,
    Continue,
    Throw {
        value: Expr,
    },
    TryCatch {
        body: Vec<Stmt>,
        catch_param: Option<String>,
        catch_body: Option<Vec<Stmt>>,
        finally_body: Option<Vec<Stmt>>,
    },
}

/// Expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    Literal {
        value: Literal,
    },
    Ident {
        name: String,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// Field access `object.field`.
    Member {
        object: Box<Expr>,
        field: String,
    },
    /// Array access `object[index]`.
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// Object construction `new Class(args)`.
    New {
        class: String,
        args: Vec<Expr>,
    },
    Await {
        value: Box<Expr>,
    },
    Array {
        items: Vec<Expr>,
    },
    /// `[element for variable in iterable if condition]`, produced by the
    /// loop-collection idiom pass.
    Comprehension {
        element: Box<Expr>,
        variable: String,
        iterable: Box<Expr>,
        condition: Option<Box<Expr>>,
    },
}

/// Literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
}

// Constructors

impl Program {
    pub fn new(source: Language, body: Vec<Decl>) -> Self {
        Self { source, body }
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.body.iter().filter_map(|d| match d {
            Decl::Class(c) => Some(c),
            _ => None,
        })
    }

    /// Free functions and methods, in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.body.iter().flat_map(decl_functions)
    }

    pub fn functions_mut(&mut self) -> impl Iterator<Item = &mut Function> {
        self.body.iter_mut().flat_map(decl_functions_mut)
    }
}

fn decl_functions(decl: &Decl) -> Box<dyn Iterator<Item = &Function> + '_> {
    match decl {
        Decl::Function(f) => Box::new(std::iter::once(f)),
        Decl::Class(c) => Box::new(c.methods.iter()),
        Decl::Variable(_) => Box::new(std::iter::empty()),
    }
}

fn decl_functions_mut(decl: &mut Decl) -> Box<dyn Iterator<Item = &mut Function> + '_> {
    match decl {
        Decl::Function(f) => Box::new(std::iter::once(f)),
        Decl::Class(c) => Box::new(c.methods.iter_mut()),
        Decl::Variable(_) => Box::new(std::iter::empty()),
    }
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Class,
            extends: None,
            implements: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            hints: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn with_kind(mut self, kind: ClassKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: Function) -> Self {
        self.methods.push(method);
        self
    }

    pub fn extending(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn has_hint(&self, hint: &Hint) -> bool {
        self.hints.contains(hint)
    }

    pub fn singleton_accessor(&self) -> Option<&str> {
        self.hints.iter().find_map(|h| match h {
            Hint::Singleton { accessor } => Some(accessor.as_str()),
            _ => None,
        })
    }
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility: Visibility::Public,
            is_static: false,
            init: None,
            span: Span::default(),
        }
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_init(mut self, init: Expr) -> Self {
        self.init = Some(init);
        self
    }
}

impl Function {
    pub fn new(name: impl Into<String>, params: Vec<Param>, return_type: TypeRef, body: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            body,
            visibility: Visibility::Public,
            is_static: false,
            is_async: false,
            throws: false,
            hints: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn async_(mut self) -> Self {
        self.is_async = true;
        self
    }

    pub fn throwing(mut self) -> Self {
        self.throws = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn has_hint(&self, hint: &Hint) -> bool {
        self.hints.contains(hint)
    }
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            span: Span::default(),
        }
    }
}

impl VarDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef, init: Option<Expr>) -> Self {
        Self {
            name: name.into(),
            ty,
            init,
            mutable: true,
            span: Span::default(),
        }
    }

    pub fn immutable(mut self) -> Self {
        self.mutable = false;
        self
    }
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr { expr }
    }

    /// Mutable, untyped local.
    pub fn let_decl(name: impl Into<String>, init: Option<Expr>) -> Self {
        Stmt::Let(VarDecl::new(name, TypeRef::Inferred, init))
    }

    /// Immutable local.
    pub fn const_decl(name: impl Into<String>, init: Expr) -> Self {
        Stmt::Let(VarDecl::new(name, TypeRef::Inferred, Some(init)).immutable())
    }

    pub fn typed_let(name: impl Into<String>, ty: TypeRef, init: Option<Expr>) -> Self {
        Stmt::Let(VarDecl::new(name, ty, init))
    }

    pub fn block(body: Vec<Stmt>) -> Self {
        Stmt::Block { body }
    }

    pub fn if_stmt(test: Expr, consequent: Vec<Stmt>, alternate: Option<Vec<Stmt>>) -> Self {
        Stmt::If {
            test,
            consequent,
            alternate,
        }
    }

    pub fn while_loop(test: Expr, body: Vec<Stmt>) -> Self {
        Stmt::While { test, body }
    }

    pub fn for_loop(
        init: Option<Stmt>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Vec<Stmt>,
    ) -> Self {
        Stmt::For {
            init: init.map(Box::new),
            test,
            update,
            body,
        }
    }

    pub fn for_each(variable: impl Into<String>, iterable: Expr, body: Vec<Stmt>) -> Self {
        Stmt::ForEach {
            variable: variable.into(),
            iterable,
            body,
        }
    }

    pub fn return_stmt(value: Option<Expr>) -> Self {
        Stmt::Return { value }
    }

    pub fn throw(value: Expr) -> Self {
        Stmt::Throw { value }
    }

    pub fn try_catch(
        body: Vec<Stmt>,
        catch_param: Option<&str>,
        catch_body: Option<Vec<Stmt>>,
        finally_body: Option<Vec<Stmt>>,
    ) -> Self {
        Stmt::TryCatch {
            body,
            catch_param: catch_param.map(str::to_string),
            catch_body,
            finally_body,
        }
    }
}

impl Expr {
    pub fn null() -> Self {
        Expr::Literal {
            value: Literal::Null,
        }
    }

    pub fn bool(b: bool) -> Self {
        Expr::Literal {
            value: Literal::Bool(b),
        }
    }

    pub fn int(n: i64) -> Self {
        Expr::Literal {
            value: Literal::Int(n),
        }
    }

    pub fn float(n: f64) -> Self {
        Expr::Literal {
            value: Literal::Float(n),
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Literal {
            value: Literal::String(s.into()),
        }
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident { name: name.into() }
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    /// Method call `object.method(args)`.
    pub fn method_call(object: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::call(Expr::member(object, method), args)
    }

    pub fn member(object: Expr, field: impl Into<String>) -> Self {
        Expr::Member {
            object: Box::new(object),
            field: field.into(),
        }
    }

    pub fn index(object: Expr, index: Expr) -> Self {
        Expr::Index {
            object: Box::new(object),
            index: Box::new(index),
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn new_object(class: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::New {
            class: class.into(),
            args,
        }
    }

    pub fn await_(value: Expr) -> Self {
        Expr::Await {
            value: Box::new(value),
        }
    }

    pub fn array(items: Vec<Expr>) -> Self {
        Expr::Array { items }
    }

    /// Name of the root identifier of an access chain (`a` in `a.b[c]`).
    pub fn root_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident { name } => Some(name),
            Expr::Member { object, .. } | Expr::Index { object, .. } => object.root_ident(),
            _ => None,
        }
    }
}
