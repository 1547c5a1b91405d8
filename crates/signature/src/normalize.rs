use crate::signature::{NameQuery, Signature, TargetKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Name component of the canonical form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CanonicalName {
    Exact(String),
    Pattern { source: String, flags: String },
}

/// Deterministic, hashable rendering of a [`Signature`].
///
/// Field order is fixed by declaration order, list fields are sorted
/// case-insensitively, unset fields are dropped entirely. The compact JSON
/// of this struct is the cache key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalSignature {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<CanonicalName>,
    pub kind: TargetKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, String>,
}

impl CanonicalSignature {
    pub(crate) fn from_signature(signature: &Signature) -> Self {
        let name = signature.name.as_ref().map(|query| match query {
            NameQuery::Exact(name) => CanonicalName::Exact(name.clone()),
            NameQuery::Pattern(pattern) => CanonicalName::Pattern {
                source: pattern.source().to_string(),
                flags: pattern.flags().to_string(),
            },
        });

        Self {
            name,
            kind: signature.kind,
            methods: sorted(&signature.methods),
            fields: sorted(&signature.fields),
            extends: signature.extends.clone(),
            implements: sorted(&signature.implements),
            annotations: sorted(&signature.annotations),
            namespace: signature.namespace.clone(),
            generics: sorted(&signature.generics),
            extensions: signature.extensions.clone(),
        }
    }

    /// Compact JSON key. Serialization of this struct cannot fail: every
    /// field is a string, list, or map of strings.
    pub fn key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// Case-insensitive sort that preserves original casing; exact duplicates
/// collapse to one entry.
fn sorted(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = values.to_vec();
    out.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn key_is_independent_of_list_order() {
        let a = Signature::of("Calculator")
            .kind(TargetKind::Class)
            .methods(["subtract", "add"])
            .implements(["Printable", "Comparable"]);
        let b = Signature::of("Calculator")
            .kind(TargetKind::Class)
            .implements(["Comparable", "Printable"])
            .methods(["add", "subtract"]);

        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn key_preserves_case_but_sorts_insensitively() {
        let signature = Signature::of("Svc").methods(["Zeta", "alpha", "Beta"]);
        let canonical = signature.canonical();
        assert_eq!(canonical.methods, vec!["alpha", "Beta", "Zeta"]);
    }

    #[test]
    fn unset_fields_are_dropped() {
        let key = Signature::of("Thing").cache_key();
        assert!(!key.contains("methods"));
        assert!(!key.contains("extends"));
        assert!(key.contains("\"kind\":\"any\""));
    }

    #[test]
    fn pattern_serializes_by_source_and_flags() {
        let signature = Signature::matching("^Calc", "i").unwrap();
        let key = signature.cache_key();
        assert!(key.contains("\"source\":\"^Calc\""));
        assert!(key.contains("\"flags\":\"i\""));
    }

    #[test]
    fn duplicate_entries_collapse() {
        let signature = Signature::of("Svc").methods(["add", "add", "sub"]);
        assert_eq!(signature.canonical().methods, vec!["add", "sub"]);
    }

    #[test]
    fn different_signatures_yield_different_keys() {
        let class = Signature::of("Calculator").kind(TargetKind::Class);
        let any = Signature::of("Calculator");
        assert_ne!(class.cache_key(), any.cache_key());
    }
}
