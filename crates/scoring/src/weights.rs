use serde::{Deserialize, Serialize};

/// Universal feature weights. Tunable per language backend but structurally
/// identical everywhere: a positive weight rewards a requested feature that
/// matched, the paired negative weight penalizes a requested feature the
/// candidate failed to satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub name_exact: f64,
    pub name_partial: f64,
    pub name_miss: f64,
    pub kind_match: f64,
    pub kind_miss: f64,
    pub method_hit: f64,
    pub methods_none: f64,
    pub field_hit: f64,
    pub fields_none: f64,
    pub extends_match: f64,
    pub extends_miss: f64,
    pub implements_hit: f64,
    pub implements_none: f64,
    pub annotation_hit: f64,
    pub annotations_none: f64,
    pub namespace_match: f64,
    pub namespace_miss: f64,
    pub generics_match: f64,
    pub generics_miss: f64,
    pub exported: f64,
    pub not_exported: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            name_exact: 50.0,
            name_partial: 25.0,
            name_miss: -15.0,
            kind_match: 20.0,
            kind_miss: -25.0,
            method_hit: 10.0,
            methods_none: -12.0,
            field_hit: 6.0,
            fields_none: -8.0,
            extends_match: 12.0,
            extends_miss: -6.0,
            implements_hit: 6.0,
            implements_none: -6.0,
            annotation_hit: 8.0,
            annotations_none: -8.0,
            namespace_match: 15.0,
            namespace_miss: -5.0,
            generics_match: 10.0,
            generics_miss: -5.0,
            exported: 5.0,
            not_exported: -2.0,
        }
    }
}
