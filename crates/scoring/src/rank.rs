use crate::score::ScoreBreakdown;
use serde::Serialize;
use sigscout_lang::StructureInfo;
use std::cmp::Ordering;
use std::path::PathBuf;

/// One file's contribution to a scan: the best-scoring structure in that
/// file plus everything ranking needs. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub path: PathBuf,
    pub language: String,
    pub structure: StructureInfo,
    pub breakdown: ScoreBreakdown,
    /// Modification time (epoch ms) captured at scan time
    pub mtime_ms: Option<u64>,
    /// Component count below the scan root
    pub depth: usize,
}

impl Candidate {
    pub fn score(&self) -> f64 {
        self.breakdown.total
    }
}

/// Deterministic total order: higher score, then most recently modified,
/// then shallower path, then lexicographic path.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(compare);
}

fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    b.score()
        .total_cmp(&a.score())
        .then_with(|| b.mtime_ms.unwrap_or(0).cmp(&a.mtime_ms.unwrap_or(0)))
        .then_with(|| a.depth.cmp(&b.depth))
        .then_with(|| a.path.cmp(&b.path))
}
