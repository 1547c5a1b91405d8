use crate::options::CacheOptions;
use crate::util::{file_mtime_ms, join_relative, unix_now_ms};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use sigscout_lang::AccessDescriptor;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// One prior resolution, keyed by canonical signature. The path is stored
/// root-relative so the persistent file survives machine and checkout
/// moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub relative_path: String,
    pub access: AccessDescriptor,
    pub score: f64,
    /// Epoch ms at store time, for TTL
    pub timestamp: u64,
    /// Modification time of the resolved file at store time
    pub mtime_ms: Option<u64>,
}

/// Two cache tiers over one key space: a bounded in-memory LRU map and one
/// JSON document per discovery root, lazily loaded once per process.
pub(crate) struct ResultCache {
    root: PathBuf,
    file: PathBuf,
    enabled: bool,
    ttl_seconds: u64,
    runtime: LruCache<String, CacheEntry>,
    persistent: BTreeMap<String, CacheEntry>,
    loaded: bool,
}

impl ResultCache {
    pub fn new(root: &Path, options: &CacheOptions) -> Self {
        let capacity = NonZeroUsize::new(options.runtime_entries.max(1))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            root: root.to_path_buf(),
            file: root.join(&options.file),
            enabled: options.enabled,
            ttl_seconds: options.ttl_seconds,
            runtime: LruCache::new(capacity),
            persistent: BTreeMap::new(),
            loaded: false,
        }
    }

    /// Fresh entry for `key`, or `None`. Stale and expired entries are
    /// dropped on the way; persistent hits are promoted to the runtime
    /// tier.
    pub async fn lookup(&mut self, key: &str) -> Option<CacheEntry> {
        if !self.enabled {
            return None;
        }
        self.ensure_loaded().await;

        if let Some(entry) = self.runtime.get(key).cloned() {
            if self.is_fresh(&entry).await {
                return Some(entry);
            }
            self.runtime.pop(key);
            self.persistent.remove(key);
        }

        if let Some(entry) = self.persistent.get(key).cloned() {
            if self.is_fresh(&entry).await {
                self.runtime.put(key.to_string(), entry.clone());
                return Some(entry);
            }
            self.persistent.remove(key);
        }
        None
    }

    /// Record a successful resolution in both tiers. Persist failures are
    /// warnings; the in-memory result stands either way.
    pub async fn store(&mut self, key: String, entry: CacheEntry) {
        if !self.enabled {
            return;
        }
        self.ensure_loaded().await;
        self.runtime.put(key.clone(), entry.clone());
        self.persistent.insert(key, entry);
        if let Err(e) = self.save().await {
            log::warn!("failed to persist discovery cache {}: {e}", self.file.display());
        }
    }

    /// Drop one key from both tiers (cached resolution failed validation)
    pub async fn remove(&mut self, key: &str) {
        self.runtime.pop(key);
        if self.persistent.remove(key).is_some() {
            if let Err(e) = self.save().await {
                log::warn!(
                    "failed to persist discovery cache {}: {e}",
                    self.file.display()
                );
            }
        }
    }

    /// Empty both tiers and delete the persistent file
    pub async fn clear(&mut self) {
        self.runtime.clear();
        self.persistent.clear();
        self.loaded = true;
        match tokio::fs::remove_file(&self.file).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("failed to remove cache file {}: {e}", self.file.display()),
        }
    }

    async fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;

        let bytes = match tokio::fs::read(&self.file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                log::warn!("cannot read cache file {}: {e}", self.file.display());
                return;
            }
        };
        let loaded: BTreeMap<String, CacheEntry> = match serde_json::from_slice(&bytes) {
            Ok(loaded) => loaded,
            Err(e) => {
                // Corrupt cache is treated as empty, never fatal.
                log::warn!("ignoring corrupt cache file {}: {e}", self.file.display());
                return;
            }
        };

        for (key, entry) in loaded {
            if self.is_fresh(&entry).await {
                self.persistent.insert(key, entry);
            }
        }
    }

    /// Usable iff the file still exists with the recorded mtime and the
    /// entry is within TTL (0 = never expires).
    async fn is_fresh(&self, entry: &CacheEntry) -> bool {
        if self.ttl_seconds > 0 {
            let age_ms = unix_now_ms().saturating_sub(entry.timestamp);
            if age_ms > self.ttl_seconds * 1000 {
                return false;
            }
        }
        let path = join_relative(&self.root, &entry.relative_path);
        match file_mtime_ms(&path).await {
            Some(current) => entry.mtime_ms == Some(current),
            None => false,
        }
    }

    /// Write-to-temp-then-rename so concurrent readers never observe a
    /// partial document.
    async fn save(&self) -> std::io::Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.persistent)?;
        let tmp = self.file.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.file).await?;
        Ok(())
    }
}
