use serde::Serialize;
use sigscout_scoring::ScoreBreakdown;
use sigscout_signature::SignatureError;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// A candidate that ranked but did not resolve, kept on `NotFound` so the
/// failure is diagnosable without a second run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearMiss {
    pub relative_path: String,
    pub structure: String,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Failures surfaced by `discover`. Parse failures, unsafe candidates,
/// validation rejections and cache corruption are all recovered internally
/// and never abort a call on their own.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// No candidate survived ranking and resolution
    #[error("no candidate satisfied signature {key} ({examined} candidates examined)")]
    NotFound {
        /// Canonical signature key, echoed back
        key: String,
        examined: usize,
        near_misses: Vec<NearMiss>,
    },

    /// The optional per-call deadline elapsed
    #[error("discovery deadline of {deadline:?} exceeded ({examined} candidates examined)")]
    DeadlineExceeded {
        deadline: Duration,
        /// Candidates ranked before the deadline hit
        examined: usize,
    },

    /// Signature failed to build or normalize
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    /// Scan root was unusable
    #[error("scan error: {0}")]
    Scan(#[from] sigscout_scanner::ScanError),

    /// IO error outside the scan itself
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiscoveryError {
    /// Near-miss diagnostics when this is a `NotFound`
    pub fn near_misses(&self) -> &[NearMiss] {
        match self {
            DiscoveryError::NotFound { near_misses, .. } => near_misses,
            _ => &[],
        }
    }
}
