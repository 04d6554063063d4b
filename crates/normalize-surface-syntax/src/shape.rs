//! Structural predicates over declarations.
//!
//! These recognise the shapes behind well-known design patterns. They are
//! shared by pattern detection and by the passes that adapt those patterns.

use crate::ir::{ClassDecl, ClassKind, Expr, Stmt, TypeRef, Visibility};
use crate::walk::any_stmt;

/// Accessor method name if `class` is a singleton: a private static field
/// of the class's own type plus a static method returning that type.
pub fn singleton_accessor(class: &ClassDecl) -> Option<&str> {
    let own = |ty: &TypeRef| matches!(ty, TypeRef::Named { name, .. } if *name == class.name);
    let has_instance = class
        .fields
        .iter()
        .any(|f| f.is_static && f.visibility == Visibility::Private && own(&f.ty));
    if !has_instance {
        return None;
    }
    class
        .methods
        .iter()
        .find(|m| m.is_static && m.params.is_empty() && own(&m.return_type))
        .map(|m| m.name.as_str())
}

/// Name ends in `Factory` and some `create*` method returns a new object.
pub fn is_factory(class: &ClassDecl) -> bool {
    class.name.ends_with("Factory")
        && class.methods.iter().any(|m| {
            m.name.starts_with("create")
                && any_stmt(&m.body, |s| {
                    matches!(
                        s,
                        Stmt::Return {
                            value: Some(Expr::New { .. })
                        }
                    )
                })
        })
}

/// Observer interface (`*Observer`/`*Listener` with `update`/`notify*`),
/// or a subject holding a list of observers and notifying them.
pub fn is_observer(class: &ClassDecl) -> bool {
    let notifies = |name: &str| name == "update" || name.starts_with("notify") || name.starts_with("on");
    let named = class.name.ends_with("Observer") || class.name.ends_with("Listener");
    if class.kind == ClassKind::Interface && named {
        return class.methods.iter().any(|m| notifies(&m.name));
    }
    let holds_observers = class.fields.iter().any(|f| {
        matches!(&f.ty, TypeRef::List { element }
            if matches!(element.as_ref(), TypeRef::Named { name, .. }
                if name.ends_with("Observer") || name.ends_with("Listener")))
    });
    holds_observers && class.methods.iter().any(|m| m.name.starts_with("notify"))
}

/// Plain record: instance fields only, and every method is a trivial
/// accessor (`getX`/`isX`/`setX` with at most one statement) or one of the
/// value-object conventions (`equals`, `hashCode`, `toString`).
pub fn is_data_class(class: &ClassDecl) -> bool {
    if class.kind == ClassKind::Interface || class.fields.is_empty() || class.extends.is_some() {
        return false;
    }
    if class.fields.iter().any(|f| f.is_static) {
        return false;
    }
    class.methods.iter().all(|m| {
        let accessor = m.name.starts_with("get") || m.name.starts_with("is") || m.name.starts_with("set");
        let value_object = matches!(m.name.as_str(), "equals" | "hashCode" | "toString" | "__eq__" | "__repr__");
        !m.is_static && ((accessor && m.body.len() <= 1) || value_object)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Field, Function};

    fn singleton() -> ClassDecl {
        ClassDecl::new("Config")
            .with_field(Field::new("instance", TypeRef::named("Config")).private().static_())
            .with_method(
                Function::new("getInstance", vec![], TypeRef::named("Config"), vec![]).static_(),
            )
    }

    #[test]
    fn test_singleton_accessor() {
        assert_eq!(singleton_accessor(&singleton()), Some("getInstance"));
        let public_field = ClassDecl::new("Config")
            .with_field(Field::new("instance", TypeRef::named("Config")).static_());
        assert_eq!(singleton_accessor(&public_field), None);
    }

    #[test]
    fn test_factory() {
        let factory = ClassDecl::new("ShapeFactory").with_method(
            Function::new(
                "createShape",
                vec![],
                TypeRef::named("Shape"),
                vec![Stmt::return_stmt(Some(Expr::new_object("Circle", vec![])))],
            )
            .static_(),
        );
        assert!(is_factory(&factory));
        assert!(!is_factory(&singleton()));
    }

    #[test]
    fn test_observer_interface() {
        let observer = ClassDecl::new("PriceObserver")
            .with_kind(ClassKind::Interface)
            .with_method(Function::new("update", vec![], TypeRef::Void, vec![]));
        assert!(is_observer(&observer));
    }

    #[test]
    fn test_data_class() {
        let point = ClassDecl::new("Point")
            .with_field(Field::new("x", TypeRef::INT))
            .with_field(Field::new("y", TypeRef::INT))
            .with_method(Function::new(
                "getX",
                vec![],
                TypeRef::INT,
                vec![Stmt::return_stmt(Some(Expr::member(Expr::ident("this"), "x")))],
            ));
        assert!(is_data_class(&point));
        assert!(!is_data_class(&singleton()));
    }
}
