use crate::weights::ScoreWeights;
use serde::Serialize;
use sigscout_lang::{FileMetadata, ScoreComponent, StructureInfo};
use sigscout_signature::{NameQuery, Signature};

/// Per-feature score components plus their total, kept for the diagnostic
/// query so callers can see why a match did or did not happen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub components: Vec<ScoreComponent>,
    pub total: f64,
}

impl ScoreBreakdown {
    fn new(components: Vec<ScoreComponent>) -> Self {
        let total = components.iter().map(|c| c.points).sum();
        Self { components, total }
    }
}

/// Score one structure against the signature. Features the signature does
/// not request are skipped entirely; visibility is the one always-on row.
pub fn score_structure(
    structure: &StructureInfo,
    signature: &Signature,
    weights: &ScoreWeights,
    extension: Vec<ScoreComponent>,
) -> ScoreBreakdown {
    let mut components = Vec::new();

    if let Some(name) = &signature.name {
        components.push(name_component(name, &structure.name, weights));
    }

    if signature.kind != sigscout_signature::TargetKind::Any {
        if signature.kind.accepts(structure.kind) {
            components.push(ScoreComponent::new("kind:match", weights.kind_match));
        } else {
            components.push(ScoreComponent::new("kind:mismatch", weights.kind_miss));
        }
    }

    if !signature.methods.is_empty() {
        let hits = hits(&signature.methods, &structure.methods);
        if hits == 0 {
            components.push(ScoreComponent::new("methods:0", weights.methods_none));
        } else {
            components.push(ScoreComponent::new(
                format!("methods:{hits}/{}", signature.methods.len()),
                weights.method_hit * hits as f64,
            ));
        }
    }

    if !signature.fields.is_empty() {
        let hits = hits(&signature.fields, &structure.fields);
        if hits == 0 {
            components.push(ScoreComponent::new("fields:0", weights.fields_none));
        } else {
            components.push(ScoreComponent::new(
                format!("fields:{hits}/{}", signature.fields.len()),
                weights.field_hit * hits as f64,
            ));
        }
    }

    if let Some(parent) = &signature.extends {
        let matched = structure
            .extends
            .as_deref()
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(parent));
        if matched {
            components.push(ScoreComponent::new("extends:match", weights.extends_match));
        } else {
            components.push(ScoreComponent::new("extends:miss", weights.extends_miss));
        }
    }

    if !signature.implements.is_empty() {
        let hits = hits(&signature.implements, &structure.implements);
        if hits == 0 {
            components.push(ScoreComponent::new("implements:0", weights.implements_none));
        } else {
            components.push(ScoreComponent::new(
                format!("implements:{hits}/{}", signature.implements.len()),
                weights.implements_hit * hits as f64,
            ));
        }
    }

    if !signature.annotations.is_empty() {
        let hits = hits(&signature.annotations, &structure.annotations);
        if hits == 0 {
            components.push(ScoreComponent::new(
                "annotations:0",
                weights.annotations_none,
            ));
        } else {
            components.push(ScoreComponent::new(
                format!("annotations:{hits}/{}", signature.annotations.len()),
                weights.annotation_hit * hits as f64,
            ));
        }
    }

    if let Some(namespace) = &signature.namespace {
        let matched = structure
            .namespace
            .as_deref()
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(namespace));
        if matched {
            components.push(ScoreComponent::new(
                "namespace:match",
                weights.namespace_match,
            ));
        } else {
            components.push(ScoreComponent::new("namespace:miss", weights.namespace_miss));
        }
    }

    if !signature.generics.is_empty() {
        let all_present = signature.generics.iter().all(|wanted| {
            structure
                .generics
                .iter()
                .any(|have| have.eq_ignore_ascii_case(wanted))
        });
        if all_present {
            components.push(ScoreComponent::new("generics:match", weights.generics_match));
        } else {
            components.push(ScoreComponent::new("generics:miss", weights.generics_miss));
        }
    }

    if structure.exported {
        components.push(ScoreComponent::new("visibility:exported", weights.exported));
    } else {
        components.push(ScoreComponent::new(
            "visibility:private",
            weights.not_exported,
        ));
    }

    components.extend(extension);
    ScoreBreakdown::new(components)
}

/// Best-scoring structure in one file, or `None` for an empty file.
/// Equal scores within a file resolve to the earliest declaration.
pub fn best_in_file<'m>(
    metadata: &'m FileMetadata,
    signature: &Signature,
    weights: &ScoreWeights,
    extension: impl Fn(&StructureInfo) -> Vec<ScoreComponent>,
) -> Option<(&'m StructureInfo, ScoreBreakdown)> {
    let mut best: Option<(&StructureInfo, ScoreBreakdown)> = None;
    for structure in &metadata.structures {
        let breakdown = score_structure(structure, signature, weights, extension(structure));
        let better = match &best {
            Some((_, current)) => breakdown.total > current.total,
            None => true,
        };
        if better {
            best = Some((structure, breakdown));
        }
    }
    best
}

fn name_component(query: &NameQuery, candidate: &str, weights: &ScoreWeights) -> ScoreComponent {
    match query {
        NameQuery::Exact(wanted) => {
            if candidate.eq_ignore_ascii_case(wanted) {
                ScoreComponent::new("name:exact", weights.name_exact)
            } else if candidate.to_lowercase().contains(&wanted.to_lowercase()) {
                ScoreComponent::new("name:partial", weights.name_partial)
            } else {
                ScoreComponent::new("name:miss", weights.name_miss)
            }
        }
        NameQuery::Pattern(pattern) => {
            if pattern.matches_full(candidate) {
                ScoreComponent::new("name:pattern-full", weights.name_exact)
            } else if pattern.matches_partial(candidate) {
                ScoreComponent::new("name:pattern-partial", weights.name_partial)
            } else {
                ScoreComponent::new("name:miss", weights.name_miss)
            }
        }
    }
}

fn hits(requested: &[String], present: &[String]) -> usize {
    requested
        .iter()
        .filter(|wanted| present.iter().any(|have| have.eq_ignore_ascii_case(wanted)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sigscout_lang::AccessDescriptor;
    use sigscout_signature::TargetKind;

    fn class(name: &str, methods: &[&str]) -> StructureInfo {
        let mut structure = StructureInfo::new(name, TargetKind::Class, 1);
        structure.methods = methods.iter().map(|m| m.to_string()).collect();
        structure.exported = true;
        structure.access = AccessDescriptor::Direct;
        structure
    }

    fn score(structure: &StructureInfo, signature: &Signature) -> f64 {
        score_structure(structure, signature, &ScoreWeights::default(), Vec::new()).total
    }

    #[test]
    fn exact_name_kind_and_methods() {
        let signature = Signature::of("Calculator")
            .kind(TargetKind::Class)
            .methods(["add", "subtract"]);
        let structure = class("Calculator", &["add", "subtract", "multiply"]);
        // 50 name + 20 kind + 20 methods + 5 exported
        assert_eq!(score(&structure, &signature), 95.0);
    }

    #[test]
    fn missing_methods_penalize_once() {
        let signature = Signature::of("Calculator").methods(["x"]);
        let structure = class("Calculator", &["add"]);
        // 50 name - 12 methods + 5 exported
        assert_eq!(score(&structure, &signature), 43.0);
    }

    #[test]
    fn unrequested_features_are_inert() {
        let signature = Signature::of("Calculator");
        let with_methods = class("Calculator", &["add", "subtract"]);
        let without = class("Calculator", &[]);
        assert_eq!(score(&with_methods, &signature), score(&without, &signature));
    }

    #[test]
    fn kind_mismatch_penalizes_but_does_not_exclude() {
        let signature = Signature::of("Calculator").kind(TargetKind::Class);
        let mut constant = StructureInfo::new("Calculator", TargetKind::Value, 1);
        constant.exported = true;
        // 50 name - 25 kind + 5 exported
        assert_eq!(score(&constant, &signature), 30.0);
    }

    #[test]
    fn substring_name_scores_partial() {
        let signature = Signature::of("Calculator");
        let structure = class("ScientificCalculator", &[]);
        // 25 partial + 5 exported
        assert_eq!(score(&structure, &signature), 30.0);
    }

    #[test]
    fn pattern_full_match_counts_as_exact() {
        let signature = Signature::matching("^Calc.*$", "").unwrap();
        let structure = class("Calculator", &[]);
        assert_eq!(score(&structure, &signature), 55.0);
    }

    #[test]
    fn annotations_score_per_hit() {
        let signature = Signature::of("UserService").annotations(["Injectable", "Deprecated"]);
        let mut structure = class("UserService", &[]);
        structure.annotations = vec!["Injectable".into(), "Deprecated".into()];
        // 50 name + 16 annotations + 5 exported
        assert_eq!(score(&structure, &signature), 71.0);

        structure.annotations.clear();
        // 50 name - 8 annotations + 5 exported
        assert_eq!(score(&structure, &signature), 47.0);
    }

    #[test]
    fn inheritance_and_namespace() {
        let signature = Signature::of("UserService")
            .extends("BaseService")
            .namespace("services");
        let mut structure = class("UserService", &[]);
        structure.extends = Some("BaseService".into());
        structure.namespace = Some("services".into());
        // 50 + 12 + 15 + 5
        assert_eq!(score(&structure, &signature), 82.0);
    }

    #[test]
    fn best_in_file_prefers_higher_total() {
        let signature = Signature::of("Calculator")
            .kind(TargetKind::Class)
            .methods(["add"]);
        let metadata = FileMetadata {
            path: "calc.js".into(),
            language: "javascript".into(),
            structures: vec![
                {
                    let mut v = StructureInfo::new("Calculator", TargetKind::Value, 1);
                    v.exported = true;
                    v
                },
                class("Calculator", &["add"]),
            ],
        };
        let (best, breakdown) =
            best_in_file(&metadata, &signature, &ScoreWeights::default(), |_| {
                Vec::new()
            })
            .unwrap();
        assert_eq!(best.kind, TargetKind::Class);
        assert!(breakdown.total > 0.0);
    }
}
