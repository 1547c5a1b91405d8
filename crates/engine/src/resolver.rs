use crate::options::ResolveMode;
use sigscout_lang::{
    AccessDescriptor, FileMetadata, LanguageIntegration, ProbeLimits, ResolvedTarget,
    RuntimeExport, StructureInfo,
};
use sigscout_signature::{Signature, TargetKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Parsed-metadata cache keyed by path and mtime, so resolving several
/// candidates from the same file parses it once.
#[derive(Default)]
pub(crate) struct ModuleCache {
    entries: HashMap<PathBuf, (Option<u64>, Arc<FileMetadata>)>,
}

impl ModuleCache {
    /// Metadata for `path`, parsed fresh unless the cached copy matches the
    /// file's current mtime.
    pub async fn fresh_metadata(
        &mut self,
        integration: &dyn LanguageIntegration,
        path: &Path,
    ) -> sigscout_lang::Result<Option<Arc<FileMetadata>>> {
        let mtime = crate::util::file_mtime_ms(path).await;
        if let Some((cached_mtime, metadata)) = self.entries.get(path) {
            if *cached_mtime == mtime && mtime.is_some() {
                return Ok(Some(Arc::clone(metadata)));
            }
            self.entries.remove(path);
        }
        match integration.parse_file(path).await? {
            Some(metadata) => {
                let metadata = Arc::new(metadata);
                self.entries
                    .insert(path.to_path_buf(), (mtime, Arc::clone(&metadata)));
                Ok(Some(metadata))
            }
            None => Ok(None),
        }
    }
}

fn contains_ci(haystack: &[String], needle: &str) -> bool {
    haystack.iter().any(|h| h.eq_ignore_ascii_case(needle))
}

fn base_name(ty: &str) -> &str {
    let ty = ty.split('<').next().unwrap_or(ty);
    ty.rsplit('.').next().unwrap_or(ty).trim()
}

/// Hard validation: every requested feature must actually be present on the
/// structure. Scoring tolerates partial matches; resolution does not.
pub(crate) fn validate(structure: &StructureInfo, signature: &Signature) -> bool {
    if !signature.kind.accepts(structure.kind) {
        return false;
    }
    if !signature
        .methods
        .iter()
        .all(|m| contains_ci(&structure.methods, m))
    {
        return false;
    }
    if !signature
        .fields
        .iter()
        .all(|f| contains_ci(&structure.fields, f))
    {
        return false;
    }
    if let Some(extends) = &signature.extends {
        let matched = structure
            .extends
            .as_deref()
            .map(|base| base_name(base).eq_ignore_ascii_case(base_name(extends)))
            .unwrap_or(false);
        if !matched {
            return false;
        }
    }
    if !signature.implements.iter().all(|iface| {
        structure
            .implements
            .iter()
            .any(|have| base_name(have).eq_ignore_ascii_case(base_name(iface)))
    }) {
        return false;
    }
    true
}

fn runtime_kind_compatible(kind: TargetKind, runtime_kind: &str) -> bool {
    match kind {
        TargetKind::Any => true,
        TargetKind::Class | TargetKind::Struct => runtime_kind == "class",
        TargetKind::Function => runtime_kind == "function" || runtime_kind == "class",
        // Interfaces, traits and modules are erased at runtime; enums and
        // plain values surface as objects.
        _ => true,
    }
}

fn matching_export<'a>(
    exports: &'a [RuntimeExport],
    access: &AccessDescriptor,
) -> Option<&'a RuntimeExport> {
    exports.iter().find(|export| export.access == *access)
}

/// Resolve one file against a signature.
///
/// Re-parses the file (through the mtime-aware module cache) so metadata
/// that drifted since scan time is caught here rather than handed to the
/// caller. `preferred` pins the structure a scoring pass selected; without
/// it the first valid structure in declaration order wins.
pub(crate) async fn resolve_file(
    integration: &dyn LanguageIntegration,
    modules: &mut ModuleCache,
    path: &Path,
    signature: &Signature,
    preferred: Option<&str>,
    mode: ResolveMode,
    limits: &ProbeLimits,
) -> sigscout_lang::Result<Option<ResolvedTarget>> {
    let metadata = match modules.fresh_metadata(integration, path).await? {
        Some(metadata) => metadata,
        None => return Ok(None),
    };

    let structure = match preferred {
        Some(name) => metadata
            .structures
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name) && validate(s, signature)),
        None => metadata.structures.iter().find(|s| validate(s, signature)),
    };
    let structure = match structure {
        Some(structure) => structure.clone(),
        None => return Ok(None),
    };

    let runtime = match mode {
        ResolveMode::Describe => None,
        ResolveMode::Execute => match integration.probe_runtime(path, limits).await? {
            // Parse-only integration: fall back to metadata validation
            None => None,
            Some(exports) => {
                let export = match matching_export(&exports, &structure.access) {
                    Some(export) => export,
                    None => {
                        log::debug!(
                            "{}: probe reported no export matching {:?}",
                            path.display(),
                            structure.access
                        );
                        return Ok(None);
                    }
                };
                if !runtime_kind_compatible(structure.kind, &export.kind) {
                    log::debug!(
                        "{}: runtime kind {} incompatible with {:?}",
                        path.display(),
                        export.kind,
                        structure.kind
                    );
                    return Ok(None);
                }
                if !signature.methods.iter().all(|m| export.has_callable(m)) {
                    log::debug!(
                        "{}: runtime export of {} lacks a requested method",
                        path.display(),
                        structure.name
                    );
                    return Ok(None);
                }
                Some(export.clone())
            }
        },
    };

    Ok(Some(ResolvedTarget {
        path: path.to_path_buf(),
        access: structure.access.clone(),
        structure,
        runtime,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sigscout_signature::NameQuery;

    fn structure() -> StructureInfo {
        let mut s = StructureInfo::new("UserService", TargetKind::Class, 4);
        s.methods = vec!["create".into(), "findById".into()];
        s.fields = vec!["repository".into()];
        s.extends = Some("BaseService".into());
        s.implements = vec!["Disposable".into()];
        s
    }

    #[test]
    fn validates_when_every_requested_feature_is_present() {
        let sig = Signature::of("UserService")
            .kind(TargetKind::Class)
            .methods(["create", "findById"])
            .fields(["repository"])
            .extends("BaseService");
        assert!(validate(&structure(), &sig));
    }

    #[test]
    fn rejects_a_missing_method() {
        let sig = Signature::of("UserService").methods(["create", "destroy"]);
        assert!(!validate(&structure(), &sig));
    }

    #[test]
    fn rejects_kind_mismatch() {
        let sig = Signature::of("UserService").kind(TargetKind::Function);
        assert!(!validate(&structure(), &sig));
    }

    #[test]
    fn extends_matches_on_base_name() {
        let sig = Signature::of("UserService").extends("core.BaseService");
        assert!(validate(&structure(), &sig));
        let sig = Signature::of("UserService").extends("OtherBase");
        assert!(!validate(&structure(), &sig));
    }

    #[test]
    fn methods_requested_as_fields_do_not_count() {
        // Closure-valued data members live in `fields`; requesting them as
        // methods must fail the gate.
        let mut s = StructureInfo::new("Calculator", TargetKind::Class, 1);
        s.fields = vec!["add".into(), "subtract".into()];
        let sig = Signature::of("Calculator").methods(["add"]);
        assert!(!validate(&s, &sig));
    }

    #[test]
    fn name_query_plays_no_part_in_validation() {
        // Name drives scoring and candidate choice, not the hard gate.
        let sig = Signature {
            name: Some(NameQuery::Exact("SomethingElse".into())),
            ..Signature::default()
        };
        assert!(validate(&structure(), &sig));
    }

    #[tokio::test]
    async fn module_cache_serves_unchanged_files() {
        use sigscout_lang::JsIntegration;
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("svc.js");
        std::fs::write(&path, "class UserService { create() {} }\nmodule.exports = UserService;\n")
            .unwrap();

        let integration = JsIntegration::new();
        let mut modules = ModuleCache::default();
        let first = modules
            .fresh_metadata(&integration, &path)
            .await
            .unwrap()
            .unwrap();
        let second = modules
            .fresh_metadata(&integration, &path)
            .await
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.structures[0].name, "UserService");
    }
}
