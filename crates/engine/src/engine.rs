use crate::cache::{CacheEntry, ResultCache};
use crate::error::{DiscoveryError, NearMiss, Result};
use crate::options::DiscoveryOptions;
use crate::resolver::{resolve_file, ModuleCache};
use crate::safety::SafetyGate;
use crate::util::{depth_below, file_mtime_ms, join_relative, namespace_for, relative_string, unix_now_ms};
use serde::Serialize;
use sigscout_lang::{AccessDescriptor, LanguageIntegration, ResolvedTarget};
use sigscout_scanner::ScanOptions;
use sigscout_scoring::{best_in_file, rank, Candidate, ScoreBreakdown};
use sigscout_signature::{Signature, TargetKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// One candidate as reported by the diagnostic query, ranked order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateReport {
    pub relative_path: String,
    pub structure: String,
    pub kind: TargetKind,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub safe: bool,
}

/// Structural discovery over one root directory.
///
/// A discovery call runs the full pipeline: cache probe, concurrent scan,
/// scoring, ranking, safety gating and resolution, in that order. The
/// engine is cheap to share behind an `Arc`; all interior state is behind
/// async locks.
pub struct DiscoveryEngine {
    root: PathBuf,
    integration: Arc<dyn LanguageIntegration>,
    options: DiscoveryOptions,
    safety: SafetyGate,
    cache: Mutex<ResultCache>,
    modules: Mutex<ModuleCache>,
}

impl DiscoveryEngine {
    pub fn new(root: impl Into<PathBuf>, integration: Arc<dyn LanguageIntegration>) -> Self {
        Self::with_options(root, integration, DiscoveryOptions::default())
    }

    pub fn with_options(
        root: impl Into<PathBuf>,
        integration: Arc<dyn LanguageIntegration>,
        options: DiscoveryOptions,
    ) -> Self {
        let root = root.into();
        Self {
            safety: SafetyGate::new(&options.security),
            cache: Mutex::new(ResultCache::new(&root, &options.cache)),
            modules: Mutex::new(ModuleCache::default()),
            root,
            integration,
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }

    /// Find the best entity matching `signature`.
    ///
    /// Returns the highest-ranked candidate that passes the safety gate and
    /// hard validation, consulting the result cache first. `NotFound`
    /// carries the near-miss list for diagnosis.
    pub async fn discover(&self, signature: &Signature) -> Result<ResolvedTarget> {
        let progress = Arc::new(AtomicUsize::new(0));
        match self.options.deadline {
            Some(deadline) => {
                let attempt = self.discover_uncapped(signature, Arc::clone(&progress));
                match tokio::time::timeout(deadline, attempt).await {
                    Ok(result) => result,
                    Err(_) => Err(DiscoveryError::DeadlineExceeded {
                        deadline,
                        examined: progress.load(Ordering::Relaxed),
                    }),
                }
            }
            None => self.discover_uncapped(signature, progress).await,
        }
    }

    async fn discover_uncapped(
        &self,
        signature: &Signature,
        progress: Arc<AtomicUsize>,
    ) -> Result<ResolvedTarget> {
        let key = signature.cache_key();

        if let Some(entry) = self.cache.lock().await.lookup(&key).await {
            match self.resolve_cached(&entry, signature).await {
                Some(target) => {
                    log::debug!("cache hit for {key}: {}", entry.relative_path);
                    return Ok(target);
                }
                None => {
                    // The file changed out from under the entry.
                    log::debug!("evicting stale cache entry for {key}");
                    self.cache.lock().await.remove(&key).await;
                }
            }
        }

        let candidates = self.scan_candidates(signature, progress).await?;
        let examined = candidates.len();
        log::debug!("{examined} candidates for {key}");

        for candidate in &candidates {
            if !self.passes_safety(&candidate.path).await {
                continue;
            }
            let resolved = {
                let mut modules = self.modules.lock().await;
                resolve_file(
                    self.integration.as_ref(),
                    &mut modules,
                    &candidate.path,
                    signature,
                    Some(&candidate.structure.name),
                    self.options.resolve_mode,
                    &self.options.probe,
                )
                .await
            };
            match resolved {
                Ok(Some(target)) => {
                    self.remember(&key, candidate, &target).await;
                    return Ok(target);
                }
                Ok(None) => {
                    log::debug!(
                        "candidate {} failed validation",
                        candidate.path.display()
                    );
                }
                Err(e) => {
                    log::debug!(
                        "candidate {} failed to resolve: {e}",
                        candidate.path.display()
                    );
                }
            }
        }

        let near_misses = candidates
            .iter()
            .take(self.options.near_miss_limit)
            .map(|candidate| NearMiss {
                relative_path: relative_string(&self.root, &candidate.path),
                structure: candidate.structure.name.clone(),
                score: candidate.score(),
                breakdown: candidate.breakdown.clone(),
            })
            .collect();
        Err(DiscoveryError::NotFound {
            key,
            examined,
            near_misses,
        })
    }

    /// Every scored candidate in ranked order, with its full score
    /// breakdown and safety verdict. Bypasses the cache and resolves
    /// nothing.
    pub async fn explain(&self, signature: &Signature) -> Result<Vec<CandidateReport>> {
        let candidates = self
            .scan_candidates(signature, Arc::new(AtomicUsize::new(0)))
            .await?;
        let mut reports = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let safe = self.passes_safety(&candidate.path).await;
            reports.push(CandidateReport {
                relative_path: relative_string(&self.root, &candidate.path),
                structure: candidate.structure.name.clone(),
                kind: candidate.structure.kind,
                score: candidate.score(),
                breakdown: candidate.breakdown,
                safe,
            });
        }
        Ok(reports)
    }

    /// Drop both cache tiers and delete the persistent file
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear().await;
    }

    /// `progress` counts candidates as they are found, so a deadline that
    /// cuts the scan short can still report how far it got.
    async fn scan_candidates(
        &self,
        signature: &Signature,
        progress: Arc<AtomicUsize>,
    ) -> Result<Vec<Candidate>> {
        let scan_options = ScanOptions {
            max_depth: self.options.max_depth,
            max_concurrency: self.options.max_concurrency,
            skip_directories: self.options.skip_directories.clone(),
            extensions: if self.options.extensions.is_empty() {
                self.integration
                    .file_extensions()
                    .iter()
                    .map(|e| e.to_string())
                    .collect()
            } else {
                self.options.extensions.clone()
            },
        };

        let integration = Arc::clone(&self.integration);
        let signature = Arc::new(signature.clone());
        let weights = Arc::new(self.options.weights.clone());
        let root = self.root.clone();
        let min_score = self.options.min_candidate_score;

        let mut candidates =
            sigscout_scanner::collect(&self.root, scan_options, move |path| {
                let integration = Arc::clone(&integration);
                let signature = Arc::clone(&signature);
                let weights = Arc::clone(&weights);
                let progress = Arc::clone(&progress);
                let root = root.clone();
                async move {
                    let mut metadata = match integration.parse_file(&path).await {
                        Ok(Some(metadata)) => metadata,
                        Ok(None) => return None,
                        Err(e) => {
                            log::debug!("skipping unparseable {}: {e}", path.display());
                            return None;
                        }
                    };

                    // Directory-derived namespace when the language
                    // declares none.
                    let namespace = namespace_for(&root, &path);
                    for structure in &mut metadata.structures {
                        if structure.namespace.is_none() {
                            structure.namespace = namespace.clone();
                        }
                    }

                    let (structure, breakdown) =
                        best_in_file(&metadata, &signature, &weights, |structure| {
                            integration.score_extension(structure, &signature)
                        })?;
                    if breakdown.total <= min_score {
                        return None;
                    }
                    let structure = structure.clone();
                    let mtime_ms = file_mtime_ms(&path).await;
                    let depth = depth_below(&root, &path);
                    progress.fetch_add(1, Ordering::Relaxed);
                    Some(Candidate {
                        language: metadata.language,
                        structure,
                        breakdown,
                        mtime_ms,
                        depth,
                        path,
                    })
                }
            })
            .await?;

        rank(&mut candidates);
        Ok(candidates)
    }

    /// Re-validate a cache entry against the current file contents
    async fn resolve_cached(
        &self,
        entry: &CacheEntry,
        signature: &Signature,
    ) -> Option<ResolvedTarget> {
        let path = join_relative(&self.root, &entry.relative_path);
        if !self.passes_safety(&path).await {
            return None;
        }
        let preferred = match &entry.access {
            AccessDescriptor::Named { name } => Some(name.as_str()),
            AccessDescriptor::Direct | AccessDescriptor::Default => None,
        };
        let mut modules = self.modules.lock().await;
        match resolve_file(
            self.integration.as_ref(),
            &mut modules,
            &path,
            signature,
            preferred,
            self.options.resolve_mode,
            &self.options.probe,
        )
        .await
        {
            Ok(target) => target,
            Err(e) => {
                log::debug!("cached path {} failed to resolve: {e}", path.display());
                None
            }
        }
    }

    async fn remember(&self, key: &str, candidate: &Candidate, target: &ResolvedTarget) {
        if !self.options.cache.enabled {
            return;
        }
        let entry = CacheEntry {
            relative_path: relative_string(&self.root, &candidate.path),
            access: target.access.clone(),
            score: candidate.score(),
            timestamp: unix_now_ms(),
            mtime_ms: file_mtime_ms(&candidate.path).await,
        };
        self.cache.lock().await.store(key.to_string(), entry).await;
    }

    /// A file only reaches the resolver when its raw source clears the
    /// denylist. Unreadable files fail closed.
    async fn passes_safety(&self, path: &Path) -> bool {
        let source = match tokio::fs::read_to_string(path).await {
            Ok(source) => source,
            Err(e) => {
                log::warn!("cannot read {} for safety check: {e}", path.display());
                return false;
            }
        };
        match self.safety.violation(&source) {
            None => true,
            Some(pattern) => {
                log::debug!("excluding {}: matches deny pattern {pattern}", path.display());
                false
            }
        }
    }
}
