use crate::runtime::RuntimeExport;
use serde::{Deserialize, Serialize};
use sigscout_signature::TargetKind;
use std::path::PathBuf;

/// How to re-extract a target value from its loaded module.
///
/// A closed set resolved explicitly instead of ad hoc property probing:
/// the module exports the value directly (`module.exports = X`), as a named
/// member (`exports.X` / `export class X`), or as the default export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AccessDescriptor {
    Direct,
    Default,
    Named { name: String },
}

impl AccessDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        AccessDescriptor::Named { name: name.into() }
    }
}

/// One declared structure inside a file, as reported by a language
/// integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureInfo {
    pub name: String,
    pub kind: TargetKind,
    /// Real method declarations only; data fields holding closures land in
    /// `fields`, which is what makes the validation gate meaningful.
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub generics: Vec<String>,
    pub exported: bool,
    pub access: AccessDescriptor,
    /// 1-based declaration line
    pub line: usize,
}

impl StructureInfo {
    pub fn new(name: impl Into<String>, kind: TargetKind, line: usize) -> Self {
        let name = name.into();
        Self {
            access: AccessDescriptor::named(name.clone()),
            name,
            kind,
            methods: Vec::new(),
            fields: Vec::new(),
            extends: None,
            implements: Vec::new(),
            annotations: Vec::new(),
            namespace: None,
            generics: Vec::new(),
            exported: false,
            line,
        }
    }
}

/// Everything a language integration extracted from one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub path: PathBuf,
    pub language: String,
    pub structures: Vec<StructureInfo>,
}

/// Outcome of a successful resolution: where the entity lives, the matched
/// structure, how to extract it from its module, and (in execute mode) the
/// shape the runtime actually reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTarget {
    pub path: PathBuf,
    pub structure: StructureInfo,
    pub access: AccessDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeExport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn access_descriptor_wire_format() {
        let named = AccessDescriptor::named("Calculator");
        let json = serde_json::to_string(&named).unwrap();
        assert_eq!(json, r#"{"type":"named","name":"Calculator"}"#);

        let direct: AccessDescriptor = serde_json::from_str(r#"{"type":"direct"}"#).unwrap();
        assert_eq!(direct, AccessDescriptor::Direct);
    }

    #[test]
    fn structure_defaults_to_named_access() {
        let info = StructureInfo::new("Widget", TargetKind::Class, 3);
        assert_eq!(info.access, AccessDescriptor::named("Widget"));
        assert!(!info.exported);
    }
}
