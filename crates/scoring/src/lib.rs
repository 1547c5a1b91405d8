//! # sigscout-scoring
//!
//! Weighted structural scoring and deterministic ranking.
//!
//! Every file's extracted metadata is scored against the signature feature
//! by feature; unrequested features contribute nothing either way. The
//! universal weight table lives in [`ScoreWeights`]; language backends add
//! their own components through the integration's `score_extension` hook.
//! Ranking is total and reproducible for a fixed file-system state.

mod rank;
mod score;
mod weights;

pub use rank::{rank, Candidate};
pub use score::{best_in_file, score_structure, ScoreBreakdown};
pub use weights::ScoreWeights;
