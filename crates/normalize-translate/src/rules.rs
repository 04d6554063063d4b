//! Idiom translation rules per language pair.

use normalize_language_meta::Language;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Ordered (source, target) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: Language,
    pub target: Language,
}

impl LanguagePair {
    pub const fn new(source: Language, target: Language) -> Self {
        Self { source, target }
    }

    pub const fn reversed(self) -> Self {
        Self::new(self.target, self.source)
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Maps a source idiom to the idiom that replaces it in the target.
///
/// Built once, then read-only.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: HashMap<LanguagePair, BTreeMap<String, String>>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in rules.
    pub fn builtin() -> Self {
        use Language::*;

        let mut table = Self::new();
        table
            .add_all(
                Python,
                Java,
                &[
                    ("list_comprehensions", "stream_operations"),
                    ("decorators", "annotations_aspects"),
                    ("dynamic_typing", "generics_with_bounds"),
                    ("duck_typing", "interfaces"),
                    ("generators", "iterators_streams"),
                    ("context_managers", "try_with_resources"),
                    ("multiple_inheritance", "interfaces_composition"),
                ],
            )
            .add_all(
                Java,
                Python,
                &[
                    ("stream_operations", "list_comprehensions"),
                    ("interfaces", "duck_typing_protocols"),
                    ("generics", "type_hints"),
                    ("annotations", "decorators"),
                    ("try_with_resources", "context_managers"),
                    ("verbose_loops", "comprehensions"),
                    ("builders", "dataclasses_constructors"),
                ],
            )
            .add_all(
                Python,
                Rust,
                &[
                    ("exceptions", "result_types"),
                    ("dynamic_typing", "strong_typing_enums"),
                    ("list_comprehensions", "iterator_methods"),
                    ("duck_typing", "traits"),
                    ("reference_semantics", "ownership_borrowing"),
                    ("runtime_errors", "compile_time_safety"),
                    ("gc_memory", "stack_heap_explicit"),
                ],
            )
            .add_all(
                JavaScript,
                TypeScript,
                &[
                    ("dynamic_typing", "static_typing"),
                    ("duck_typing", "interfaces"),
                    ("prototype_inheritance", "class_inheritance"),
                    ("weak_typing", "strong_typing"),
                    ("runtime_checks", "compile_time_checks"),
                    ("any_type", "specific_types"),
                    ("loose_equality", "strict_equality"),
                ],
            )
            .add_all(
                Cpp,
                Rust,
                &[
                    ("raw_pointers", "references_boxes"),
                    ("manual_memory", "ownership_system"),
                    ("raii", "drop_trait"),
                    ("exceptions", "result_types"),
                    ("templates", "generics_traits"),
                    ("multiple_inheritance", "traits_composition"),
                    ("undefined_behavior", "memory_safety"),
                ],
            )
            .add_all(
                Go,
                Rust,
                &[
                    ("goroutines", "async_tasks"),
                    ("channels", "mpsc_channels"),
                    ("interfaces", "traits"),
                    ("error_values", "result_types"),
                    ("defer", "drop_raii"),
                    ("gc", "ownership"),
                    ("simplicity", "zero_cost_abstractions"),
                ],
            )
            .add_all(
                Java,
                Rust,
                &[
                    ("exceptions", "result_types"),
                    ("stream_operations", "iterator_methods"),
                    ("interfaces", "traits"),
                    ("generics", "generics_traits"),
                    ("garbage_collection", "ownership_borrowing"),
                ],
            )
            .add_all(
                Java,
                Go,
                &[
                    ("exceptions", "error_values"),
                    ("interfaces", "interfaces"),
                    ("threads", "goroutines"),
                ],
            )
            .add_all(
                Python,
                Go,
                &[
                    ("exceptions", "error_values"),
                    ("list_comprehensions", "range_loops"),
                    ("duck_typing", "interfaces"),
                    ("generators", "channels"),
                ],
            )
            .add_all(
                TypeScript,
                Rust,
                &[
                    ("interfaces", "traits"),
                    ("union_types", "enums"),
                    ("generics", "generics_traits"),
                    ("promises", "async_tasks"),
                ],
            );
        table
    }

    /// Add (or replace) one rule.
    pub fn add(&mut self, source: Language, target: Language, from: &str, to: &str) -> &mut Self {
        self.rules
            .entry(LanguagePair::new(source, target))
            .or_default()
            .insert(from.to_string(), to.to_string());
        self
    }

    fn add_all(&mut self, source: Language, target: Language, rules: &[(&str, &str)]) -> &mut Self {
        for (from, to) in rules {
            self.add(source, target, from, to);
        }
        self
    }

    /// Target idiom for `idiom` under `pair`, if a rule exists.
    pub fn rule_for(&self, pair: LanguagePair, idiom: &str) -> Option<&str> {
        self.rules.get(&pair)?.get(idiom).map(String::as_str)
    }

    /// Every rule of `pair`, sorted by source idiom.
    pub fn rules_for(&self, pair: LanguagePair) -> impl Iterator<Item = (&str, &str)> {
        self.rules
            .get(&pair)
            .into_iter()
            .flat_map(|rules| rules.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Number of language pairs with at least one rule.
    pub fn pair_count(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookups() {
        let table = RuleTable::builtin();
        let py_java = LanguagePair::new(Language::Python, Language::Java);
        assert_eq!(
            table.rule_for(py_java, "list_comprehensions"),
            Some("stream_operations")
        );
        assert_eq!(table.rule_for(py_java.reversed(), "builders"), Some("dataclasses_constructors"));
        assert_eq!(
            table.rule_for(LanguagePair::new(Language::Go, Language::Rust), "defer"),
            Some("drop_raii")
        );
    }

    #[test]
    fn test_unmapped_is_none() {
        let table = RuleTable::builtin();
        let pair = LanguagePair::new(Language::Python, Language::Java);
        assert_eq!(table.rule_for(pair, "walrus_operator"), None);
        let unknown = LanguagePair::new(Language::Ruby, Language::Dart);
        assert_eq!(table.rule_for(unknown, "blocks"), None);
        assert_eq!(table.rules_for(unknown).count(), 0);
    }

    #[test]
    fn test_rules_for_is_sorted() {
        let table = RuleTable::builtin();
        let pair = LanguagePair::new(Language::Java, Language::Go);
        let sources: Vec<_> = table.rules_for(pair).map(|(from, _)| from).collect();
        assert_eq!(sources, ["exceptions", "interfaces", "threads"]);
    }

    #[test]
    fn test_add_overrides() {
        let mut table = RuleTable::new();
        table.add(Language::Ruby, Language::Python, "blocks", "lambdas");
        table.add(Language::Ruby, Language::Python, "blocks", "generators");
        let pair = LanguagePair::new(Language::Ruby, Language::Python);
        assert_eq!(table.rule_for(pair, "blocks"), Some("generators"));
        assert_eq!(table.pair_count(), 1);
    }
}
