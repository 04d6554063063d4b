//! Per-render emission state shared by the generators.
//!
//! An `Emitter` is created at the start of every render and consumed at the
//! end, so no state survives between calls.

use crate::ir::{BinaryOp, Expr, Literal, TypeRef};
use crate::options::TranslationOptions;
use crate::traits::{Degradation, Rendered};
use std::collections::BTreeSet;

pub(crate) struct Emitter {
    out: String,
    indent: usize,
    unit: String,
    comment: &'static str,
    /// Marker comments waiting for the next line.
    pending: Vec<String>,
    imports: BTreeSet<String>,
    degradations: Vec<Degradation>,
    comments: bool,
}

impl Emitter {
    pub fn new(options: &TranslationOptions, comment: &'static str) -> Self {
        Self {
            out: String::new(),
            indent: 0,
            unit: " ".repeat(options.indent_size()),
            comment,
            pending: Vec::new(),
            imports: BTreeSet::new(),
            degradations: Vec::new(),
            comments: options.generate_comments(),
        }
    }

    /// Emitter using tabs, for targets whose formatter insists on them.
    pub fn with_tabs(options: &TranslationOptions, comment: &'static str) -> Self {
        let mut emitter = Self::new(options, comment);
        emitter.unit = "\t".to_string();
        emitter
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str(&self.unit);
        }
    }

    fn flush_pending(&mut self) {
        for marker in std::mem::take(&mut self.pending) {
            self.write_indent();
            self.out.push_str(self.comment);
            self.out.push(' ');
            self.out.push_str(&marker);
            self.out.push('\n');
        }
    }

    /// Write one indented line.
    pub fn line(&mut self, text: impl AsRef<str>) {
        self.flush_pending();
        self.write_indent();
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    /// Write a line and indent what follows.
    pub fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.indent += 1;
    }

    /// Dedent and write a closing line.
    pub fn close(&mut self, text: impl AsRef<str>) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn blank(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    /// Explanatory comment, dropped when comments are disabled.
    pub fn comment(&mut self, text: impl AsRef<str>) {
        if self.comments {
            let line = format!("{} {}", self.comment, text.as_ref());
            self.line(line);
        }
    }

    /// Marker comment placed above the next emitted line. Always emitted.
    pub fn todo(&mut self, text: impl Into<String>) {
        let marker = format!("TODO: {}", text.into());
        if !self.pending.contains(&marker) {
            self.pending.push(marker);
        }
    }

    /// Record an unresolved type and queue its marker.
    pub fn unresolved(&mut self, descriptor: &str, substitute: &str) {
        self.todo(format!("unresolved type `{descriptor}`"));
        let degradation = Degradation::UnresolvedType {
            descriptor: descriptor.to_string(),
            substitute: substitute.to_string(),
        };
        if !self.degradations.contains(&degradation) {
            self.degradations.push(degradation);
        }
    }

    pub fn import(&mut self, import: impl Into<String>) {
        self.imports.insert(import.into());
    }

    /// Finish the render: `header` receives the collected imports (sorted)
    /// and returns the lines that precede the body.
    pub fn finish(mut self, header: impl FnOnce(&BTreeSet<String>) -> Vec<String>) -> Rendered {
        self.flush_pending();
        let mut text = String::new();
        let header = header(&self.imports);
        if !header.is_empty() {
            for line in &header {
                text.push_str(line);
                text.push('\n');
            }
            text.push('\n');
        }
        text.push_str(self.out.trim_end());
        text.push('\n');
        Rendered {
            text,
            degradations: self.degradations,
        }
    }
}

/// Side information gathered while spelling a type.
#[derive(Default)]
pub(crate) struct TypeNotes {
    pub unresolved: Vec<String>,
    pub imports: Vec<&'static str>,
}

/// How a generator spells types.
///
/// Generators implement this once; `map_type` and in-render mapping both go
/// through it.
pub(crate) trait TypeSpelling {
    /// The target's universal type.
    const ANY: &'static str;

    /// Spell `ty`; `erase` turns collection element types into `ANY`.
    fn spell(&self, ty: &TypeRef, erase: bool, notes: &mut TypeNotes) -> String;

    /// Collection element: `ANY` when erasing.
    fn spell_element(&self, ty: &TypeRef, erase: bool, notes: &mut TypeNotes) -> String {
        if erase {
            Self::ANY.to_string()
        } else {
            self.spell(ty, erase, notes)
        }
    }

    /// Spell outside a render, discarding notes.
    fn spell_plain(&self, ty: &TypeRef) -> String {
        self.spell(ty, false, &mut TypeNotes::default())
    }
}

/// Spell a type inside a render, recording imports and degradations.
pub(crate) fn spell_in<T: TypeSpelling>(
    spelling: &T,
    emitter: &mut Emitter,
    ty: &TypeRef,
    erase: bool,
) -> String {
    let mut notes = TypeNotes::default();
    let text = spelling.spell(ty, erase, &mut notes);
    for import in notes.imports {
        emitter.import(import);
    }
    for descriptor in notes.unresolved {
        emitter.unresolved(&descriptor, T::ANY);
    }
    text
}

/// C-family binary operator token.
pub(crate) fn c_binary_op(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
    }
}

/// Whether an operand must be parenthesised when nested in a binary
/// expression.
pub(crate) fn needs_parens(expr: &Expr) -> bool {
    matches!(expr, Expr::Binary { .. } | Expr::Assign { .. })
}

/// Double-quoted string literal with C-style escapes.
pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Numeric literal text; floats always carry a decimal point.
pub(crate) fn number(lit: &Literal) -> Option<String> {
    match lit {
        Literal::Int(n) => Some(n.to_string()),
        Literal::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(format!("{f:.1}")),
        Literal::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

/// Console output calls: `print`, `println`, `console.log`,
/// `System.out.println`, `fmt.Println`.
pub(crate) fn is_print(callee: &Expr) -> bool {
    match callee {
        Expr::Ident { name } => matches!(name.as_str(), "print" | "println" | "puts"),
        Expr::Member { object, field } => match (object.as_ref(), field.as_str()) {
            (Expr::Ident { name }, "log") => name == "console",
            (Expr::Ident { name }, "Println") => name == "fmt",
            (Expr::Member { object, field: out }, "println" | "print") => {
                out == "out" && matches!(object.as_ref(), Expr::Ident { name } if name == "System")
            }
            _ => false,
        },
        _ => false,
    }
}

const MUTATING_METHODS: &[&str] = &[
    "push", "append", "add", "insert", "remove", "pop", "clear", "put", "set", "extend",
    "sort", "reverse", "addAll", "removeAll", "push_str", "truncate",
];

/// Names whose bindings are reassigned or mutated in place in `stmts`.
pub(crate) fn mutated_names(stmts: &[crate::ir::Stmt]) -> BTreeSet<String> {
    struct Mutations(BTreeSet<String>);

    impl crate::walk::Visitor for Mutations {
        fn visit_expr(&mut self, expr: &Expr) {
            let root = match expr {
                Expr::Assign { target, .. } => target.root_ident(),
                Expr::Call { callee, .. } => match callee.as_ref() {
                    Expr::Member { object, field } if MUTATING_METHODS.contains(&field.as_str()) => {
                        object.root_ident()
                    }
                    _ => None,
                },
                _ => None,
            };
            if let Some(name) = root {
                self.0.insert(name.to_string());
            }
        }
    }

    let mut found = Mutations(BTreeSet::new());
    crate::walk::walk_stmts(&mut found, stmts);
    found.0
}

/// Upper-case the first character (`name` -> `Name`).
pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `camelCase` -> `snake_case`.
pub(crate) fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::keys;

    #[test]
    fn test_markers_precede_next_line() {
        let mut e = Emitter::new(&TranslationOptions::new(), "//");
        e.open("fn f() {");
        e.unresolved("Frobnicator<", "Any");
        e.line("let x = 1;");
        e.close("}");
        let rendered = e.finish(|_| Vec::new());
        assert_eq!(
            rendered.text,
            "fn f() {\n    // TODO: unresolved type `Frobnicator<`\n    let x = 1;\n}\n"
        );
        assert_eq!(rendered.degradations.len(), 1);
    }

    #[test]
    fn test_comments_respect_option() {
        let opts = TranslationOptions::new().with(keys::GENERATE_COMMENTS, false);
        let mut e = Emitter::new(&opts, "#");
        e.comment("hello");
        e.line("x = 1");
        assert_eq!(e.finish(|_| Vec::new()).text, "x = 1\n");
    }

    #[test]
    fn test_imports_sorted_into_header() {
        let mut e = Emitter::new(&TranslationOptions::new(), "//");
        e.import("b");
        e.import("a");
        e.import("a");
        e.line("body");
        let text = e
            .finish(|imports| imports.iter().map(|i| format!("use {i};")).collect())
            .text;
        assert_eq!(text, "use a;\nuse b;\n\nbody\n");
    }

    #[test]
    fn test_is_print() {
        let println = Expr::member(Expr::member(Expr::ident("System"), "out"), "println");
        assert!(is_print(&println));
        assert!(is_print(&Expr::member(Expr::ident("console"), "log")));
        assert!(!is_print(&Expr::member(Expr::ident("logger"), "log")));
    }

    #[test]
    fn test_mutated_names() {
        use crate::ir::Stmt;
        let body = vec![
            Stmt::expr(Expr::assign(Expr::member(Expr::ident("this"), "count"), Expr::int(1))),
            Stmt::expr(Expr::method_call(Expr::ident("items"), "push", vec![Expr::int(1)])),
            Stmt::expr(Expr::method_call(Expr::ident("other"), "len", vec![])),
        ];
        let names: Vec<_> = mutated_names(&body).into_iter().collect();
        assert_eq!(names, ["items", "this"]);
    }

    #[test]
    fn test_case_helpers() {
        assert_eq!(capitalize("user"), "User");
        assert_eq!(snake_case("getInstance"), "get_instance");
        assert_eq!(snake_case("already_snake"), "already_snake");
        assert_eq!(quote("a\"b\n"), "\"a\\\"b\\n\"");
    }
}
