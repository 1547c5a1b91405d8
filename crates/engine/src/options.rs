use sigscout_lang::ProbeLimits;
use sigscout_scanner::{default_concurrency, DEFAULT_SKIP_DIRS};
use sigscout_scoring::ScoreWeights;
use std::path::PathBuf;
use std::time::Duration;

/// How a ranked candidate is turned into a resolved target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Re-parse and validate metadata; never executes target code
    Describe,
    /// Additionally load the module in its host runtime and require
    /// requested methods to be truly callable
    Execute,
}

#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub enabled: bool,
    /// Persistent cache file, relative to the discovery root
    pub file: PathBuf,
    /// 0 = entries never expire
    pub ttl_seconds: u64,
    /// Bound on the in-memory tier
    pub runtime_entries: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            file: PathBuf::from(".discovery-cache.json"),
            ttl_seconds: 0,
            runtime_entries: 128,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SecurityOptions {
    /// Disable the safety gate entirely. Off by default for a reason.
    pub allow_unsafe: bool,
    /// Extra denylist patterns on top of the built-in set
    pub deny_patterns: Vec<String>,
}

/// Tuning for one discovery engine. Defaults match the documented external
/// interface: unlimited depth, bounded concurrency, cache on, gate on.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub max_depth: Option<usize>,
    pub max_concurrency: usize,
    /// Candidates must score strictly above this to be considered
    pub min_candidate_score: f64,
    pub skip_directories: Vec<String>,
    /// Empty = the language integration's defaults
    pub extensions: Vec<String>,
    pub cache: CacheOptions,
    pub security: SecurityOptions,
    pub resolve_mode: ResolveMode,
    /// Overall deadline for one `discover` call
    pub deadline: Option<Duration>,
    /// Near misses carried on a `NotFound`
    pub near_miss_limit: usize,
    pub weights: ScoreWeights,
    pub probe: ProbeLimits,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            max_concurrency: default_concurrency(),
            min_candidate_score: 0.0,
            skip_directories: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
            extensions: Vec::new(),
            cache: CacheOptions::default(),
            security: SecurityOptions::default(),
            resolve_mode: ResolveMode::Describe,
            deadline: None,
            near_miss_limit: 5,
            weights: ScoreWeights::default(),
            probe: ProbeLimits::default(),
        }
    }
}
