//! Language-neutral type descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive value types shared by every target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Int,
    Long,
    Float,
    Double,
    Bool,
    Char,
    String,
    Byte,
}

impl Primitive {
    /// Whether values are plain bits (copied, never aliased).
    pub const fn is_copy(self) -> bool {
        !matches!(self, Primitive::String)
    }
}

/// A structured type descriptor.
///
/// The closed set of primitives and collections maps onto every target;
/// `Named` types are user-defined and carried over by name. `Unresolved`
/// holds a descriptor that could not be understood at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeRef {
    Void,
    /// No declared type; left to the target's inference.
    Inferred,
    Any,
    Primitive {
        primitive: Primitive,
    },
    List {
        element: Box<TypeRef>,
    },
    Set {
        element: Box<TypeRef>,
    },
    Map {
        key: Box<TypeRef>,
        value: Box<TypeRef>,
    },
    Optional {
        inner: Box<TypeRef>,
    },
    Named {
        name: String,
        args: Vec<TypeRef>,
    },
    Unresolved {
        descriptor: String,
    },
}

impl TypeRef {
    pub const INT: TypeRef = TypeRef::Primitive {
        primitive: Primitive::Int,
    };
    pub const BOOL: TypeRef = TypeRef::Primitive {
        primitive: Primitive::Bool,
    };
    pub const STRING: TypeRef = TypeRef::Primitive {
        primitive: Primitive::String,
    };
    pub const DOUBLE: TypeRef = TypeRef::Primitive {
        primitive: Primitive::Double,
    };

    pub fn list(element: TypeRef) -> Self {
        TypeRef::List {
            element: Box::new(element),
        }
    }

    pub fn set(element: TypeRef) -> Self {
        TypeRef::Set {
            element: Box::new(element),
        }
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn optional(inner: TypeRef) -> Self {
        TypeRef::Optional {
            inner: Box::new(inner),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    /// Whether values of this type are implicitly copied on assignment in
    /// an ownership language. Unknown types are treated as owned.
    pub fn is_copy(&self) -> bool {
        match self {
            TypeRef::Primitive { primitive } => primitive.is_copy(),
            TypeRef::Void => true,
            _ => false,
        }
    }

    /// Parse a descriptor string such as `List<Optional<int>>`,
    /// `Map<String, int>`, `int[]` or `Vec<i32>`.
    ///
    /// Never fails: a descriptor that is not well formed becomes
    /// `TypeRef::Unresolved`.
    pub fn parse(descriptor: &str) -> TypeRef {
        let trimmed = descriptor.trim();
        let mut parser = Parser {
            src: trimmed,
            pos: 0,
        };
        match parser.parse_type() {
            Some(ty) if parser.at_end() => ty,
            _ => TypeRef::Unresolved {
                descriptor: trimmed.to_string(),
            },
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => f.write_str("void"),
            TypeRef::Inferred => f.write_str("_"),
            TypeRef::Any => f.write_str("any"),
            TypeRef::Primitive { primitive } => write!(f, "{:?}", primitive),
            TypeRef::List { element } => write!(f, "List<{}>", element),
            TypeRef::Set { element } => write!(f, "Set<{}>", element),
            TypeRef::Map { key, value } => write!(f, "Map<{}, {}>", key, value),
            TypeRef::Optional { inner } => write!(f, "Optional<{}>", inner),
            TypeRef::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeRef::Unresolved { descriptor } => f.write_str(descriptor),
        }
    }
}

/// Recursive-descent parser for type descriptors.
struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.pos == self.src.len()
    }

    fn skip_ws(&mut self) {
        while self.src[self.pos..].starts_with(' ') {
            self.pos += 1;
        }
    }

    fn eat(&mut self, s: &str) -> bool {
        self.skip_ws();
        if self.src[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Option<&str> {
        self.skip_ws();
        let rest = &self.src[self.pos..];
        let len = rest
            .char_indices()
            .find(|&(_, c)| !(c.is_alphanumeric() || c == '_' || c == '.' || c == ':'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if len == 0 || rest.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    fn parse_type(&mut self) -> Option<TypeRef> {
        let name = self.ident()?.to_string();
        let mut args = Vec::new();
        if self.eat("<") {
            loop {
                args.push(self.parse_type()?);
                if self.eat(",") {
                    continue;
                }
                if self.eat(">") {
                    break;
                }
                return None;
            }
        }
        let mut ty = resolve(&name, args)?;
        // Array suffixes: `int[]`, `int[][]`
        while self.eat("[]") {
            ty = TypeRef::list(ty);
        }
        // Nullable suffix: `String?`
        if self.eat("?") {
            ty = TypeRef::optional(ty);
        }
        Some(ty)
    }
}

/// Map a head name and its arguments onto the closed type set.
fn resolve(name: &str, mut args: Vec<TypeRef>) -> Option<TypeRef> {
    use Primitive as P;

    let primitive = |p| Some(TypeRef::Primitive { primitive: p });
    let one = |args: &mut Vec<TypeRef>| -> Option<Box<TypeRef>> {
        match args.len() {
            0 => Some(Box::new(TypeRef::Any)),
            1 => args.pop().map(Box::new),
            _ => None,
        }
    };

    match name {
        "void" | "None" | "Unit" => Some(TypeRef::Void),
        "any" | "Any" | "Object" | "object" | "dynamic" => Some(TypeRef::Any),
        "int" | "Integer" | "i32" | "int32" | "u32" => primitive(P::Int),
        "long" | "Long" | "i64" | "int64" | "u64" | "usize" | "isize" => primitive(P::Long),
        "float" | "Float" | "f32" | "float32" => primitive(P::Float),
        "double" | "Double" | "f64" | "float64" | "number" => primitive(P::Double),
        "bool" | "boolean" | "Boolean" | "Bool" => primitive(P::Bool),
        "char" | "Character" | "rune" => primitive(P::Char),
        "String" | "string" | "str" | "StringBuilder" => primitive(P::String),
        "byte" | "Byte" | "u8" | "i8" => primitive(P::Byte),
        "List" | "ArrayList" | "LinkedList" | "Vec" | "list" | "Array" | "Sequence" => {
            Some(TypeRef::List {
                element: one(&mut args)?,
            })
        }
        "Set" | "HashSet" | "TreeSet" | "BTreeSet" | "set" => Some(TypeRef::Set {
            element: one(&mut args)?,
        }),
        "Optional" | "Option" | "Maybe" | "Nullable" => Some(TypeRef::Optional {
            inner: one(&mut args)?,
        }),
        "Map" | "HashMap" | "TreeMap" | "BTreeMap" | "Dict" | "dict" | "Dictionary" => {
            match args.len() {
                0 => Some(TypeRef::map(TypeRef::Any, TypeRef::Any)),
                2 => {
                    let value = args.pop()?;
                    let key = args.pop()?;
                    Some(TypeRef::map(key, value))
                }
                _ => None,
            }
        }
        _ => Some(TypeRef::Named {
            name: name.to_string(),
            args,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitives() {
        assert_eq!(TypeRef::parse("int"), TypeRef::INT);
        assert_eq!(TypeRef::parse("str"), TypeRef::STRING);
        assert_eq!(TypeRef::parse("boolean"), TypeRef::BOOL);
    }

    #[test]
    fn test_parse_nested_generics() {
        assert_eq!(
            TypeRef::parse("List<Optional<int>>"),
            TypeRef::list(TypeRef::optional(TypeRef::INT))
        );
        assert_eq!(
            TypeRef::parse("Map<String, Vec<i32>>"),
            TypeRef::map(TypeRef::STRING, TypeRef::list(TypeRef::INT))
        );
    }

    #[test]
    fn test_parse_array_and_nullable_suffix() {
        assert_eq!(TypeRef::parse("int[]"), TypeRef::list(TypeRef::INT));
        assert_eq!(
            TypeRef::parse("String?"),
            TypeRef::optional(TypeRef::STRING)
        );
    }

    #[test]
    fn test_parse_named_passthrough() {
        assert_eq!(
            TypeRef::parse("Repository<User>"),
            TypeRef::Named {
                name: "Repository".into(),
                args: vec![TypeRef::named("User")],
            }
        );
    }

    #[test]
    fn test_parse_malformed_is_unresolved() {
        assert_eq!(
            TypeRef::parse("List<int"),
            TypeRef::Unresolved {
                descriptor: "List<int".into()
            }
        );
        assert!(matches!(
            TypeRef::parse("Map<int>"),
            TypeRef::Unresolved { .. }
        ));
        assert!(matches!(TypeRef::parse("9lives"), TypeRef::Unresolved { .. }));
    }

    #[test]
    fn test_display() {
        let ty = TypeRef::map(TypeRef::STRING, TypeRef::list(TypeRef::named("User")));
        assert_eq!(ty.to_string(), "Map<String, List<User>>");
    }
}
