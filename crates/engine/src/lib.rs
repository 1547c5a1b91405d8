//! Structural discovery engine.
//!
//! Finds source-code entities by what they are instead of where they live.
//! A caller describes the target as a [`Signature`] (name, kind, methods,
//! inheritance, ...) and the engine locates the best match under a root
//! directory, surviving file moves and renames that break path-based
//! lookups.
//!
//! One `discover` call runs a fixed pipeline:
//!
//! ```text
//! signature -> cache probe -> scan -> score -> rank -> gate -> resolve
//! ```
//!
//! Results are cached in two tiers (in-memory LRU plus one JSON file per
//! root) keyed by the signature's canonical form, and invalidated by file
//! mtime. Candidates whose raw source matches the deny list never reach
//! the resolver.
//!
//! ```no_run
//! use sigscout_engine::DiscoveryEngine;
//! use sigscout_lang::JsIntegration;
//! use sigscout_signature::{Signature, TargetKind};
//! use std::sync::Arc;
//!
//! # async fn run() -> sigscout_engine::Result<()> {
//! let engine = DiscoveryEngine::new("/path/to/project", Arc::new(JsIntegration::new()));
//! let signature = Signature::of("UserService")
//!     .kind(TargetKind::Class)
//!     .methods(["create", "findById"]);
//! let target = engine.discover(&signature).await?;
//! println!("{}", target.path.display());
//! # Ok(())
//! # }
//! ```

mod cache;
mod engine;
mod error;
mod options;
mod resolver;
mod safety;
mod util;

pub use cache::CacheEntry;
pub use engine::{CandidateReport, DiscoveryEngine};
pub use error::{DiscoveryError, NearMiss, Result};
pub use options::{CacheOptions, DiscoveryOptions, ResolveMode, SecurityOptions};
pub use safety::SafetyGate;

pub use sigscout_lang::{
    AccessDescriptor, FileMetadata, JsIntegration, LanguageIntegration, ProbeLimits,
    ResolvedTarget, StructureInfo,
};
pub use sigscout_scoring::{ScoreBreakdown, ScoreWeights};
pub use sigscout_signature::{NameQuery, Signature, SignatureError, TargetKind};
