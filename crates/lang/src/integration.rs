use crate::error::Result;
use crate::metadata::{FileMetadata, StructureInfo};
use crate::runtime::{ProbeLimits, RuntimeExport};
use async_trait::async_trait;
use serde::Serialize;
use sigscout_signature::Signature;
use std::path::Path;

/// One labeled contribution to a candidate's score. The feature label is
/// what the diagnostic query shows, e.g. `name:exact` or `methods:2/2`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponent {
    pub feature: String,
    pub points: f64,
}

impl ScoreComponent {
    pub fn new(feature: impl Into<String>, points: f64) -> Self {
        Self {
            feature: feature.into(),
            points,
        }
    }
}

/// Per-language metadata extraction and scoring hooks.
///
/// Implemented once per source language, outside the discovery core. The
/// core only ever sees [`FileMetadata`]; it never inspects syntax itself.
#[async_trait]
pub trait LanguageIntegration: Send + Sync {
    /// Stable identifier ("javascript", "java", ...)
    fn language_id(&self) -> &'static str;

    /// File extensions this integration claims, without the leading dot
    fn file_extensions(&self) -> &[&'static str];

    /// Extract declared structures from one file.
    ///
    /// `Ok(None)` means the file is well-formed but contains nothing worth
    /// considering; parse failures are errors (the scanner logs and skips).
    async fn parse_file(&self, path: &Path) -> Result<Option<FileMetadata>>;

    /// Language-specific additions to the universal score table. Default:
    /// nothing.
    fn score_extension(
        &self,
        _structure: &StructureInfo,
        _signature: &Signature,
    ) -> Vec<ScoreComponent> {
        Vec::new()
    }

    /// Load the module in its host runtime and report export shapes.
    ///
    /// `Ok(None)` means this integration is parse-only (statically analyzed
    /// host); execute-mode resolution then falls back to metadata
    /// validation. Implementations must honor the probe limits: hard
    /// timeout, bounded output.
    async fn probe_runtime(
        &self,
        _path: &Path,
        _limits: &ProbeLimits,
    ) -> Result<Option<Vec<RuntimeExport>>> {
        Ok(None)
    }
}
