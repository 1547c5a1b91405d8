use crate::error::{Result, ScanError};
use crate::filters::{is_eligible_file, DEFAULT_SKIP_DIRS};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Traversal bounds and filters
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// `None` = unlimited; `Some(0)` scans only the root's own files
    pub max_depth: Option<usize>,
    /// Units of work (directory reads, file evaluations) in flight at once
    pub max_concurrency: usize,
    /// Directory names pruned without descending, case-insensitive
    pub skip_directories: Vec<String>,
    /// Allowed file extensions, lowercase, without the leading dot
    pub extensions: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            max_concurrency: default_concurrency(),
            skip_directories: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
            extensions: Vec::new(),
        }
    }
}

/// Default bound: a small multiple of available parallelism
pub fn default_concurrency() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus * 2).clamp(1, 64)
}

struct ScanContext<F> {
    options: ScanOptions,
    semaphore: Semaphore,
    evaluate: F,
}

/// Walk `root` and evaluate every eligible file exactly once.
///
/// `evaluate` returning `None` drops the file silently; result order is
/// unspecified (callers rank). Unreadable subdirectories are logged and
/// skipped; only an unreadable root is an error.
pub async fn collect<T, F, Fut>(root: &Path, options: ScanOptions, evaluate: F) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: Fn(PathBuf) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<T>> + Send + 'static,
{
    let metadata = tokio::fs::metadata(root).await?;
    if !metadata.is_dir() {
        return Err(ScanError::InvalidRoot(root.display().to_string()));
    }

    let permits = options.max_concurrency.max(1);
    let context = Arc::new(ScanContext {
        options,
        semaphore: Semaphore::new(permits),
        evaluate,
    });

    Ok(walk_dir(context, root.to_path_buf(), 0).await)
}

/// Boxed for recursion through spawned subtasks. A permit is held across a
/// single directory read or file evaluation, never while joining children.
fn walk_dir<T, F, Fut>(
    context: Arc<ScanContext<F>>,
    dir: PathBuf,
    depth: usize,
) -> Pin<Box<dyn Future<Output = Vec<T>> + Send>>
where
    T: Send + 'static,
    F: Fn(PathBuf) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<T>> + Send + 'static,
{
    Box::pin(async move {
        let entries = {
            // Never closed; acquire cannot fail.
            let _permit = context.semaphore.acquire().await;
            match read_entries(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("skipping unreadable directory {}: {e}", dir.display());
                    return Vec::new();
                }
            }
        };

        let mut tasks: JoinSet<Vec<T>> = JoinSet::new();
        for (path, is_dir) in entries {
            if is_dir {
                if !should_descend(&context.options, &path, depth) {
                    continue;
                }
                tasks.spawn(walk_dir(context.clone(), path, depth + 1));
            } else if is_eligible_file(&path, &context.options.extensions) {
                let context = context.clone();
                tasks.spawn(async move {
                    let _permit = context.semaphore.acquire().await;
                    (context.evaluate)(path).await.into_iter().collect()
                });
            }
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(mut batch) => results.append(&mut batch),
                Err(e) => log::warn!("scan task failed: {e}"),
            }
        }
        results
    })
}

async fn read_entries(dir: &Path) -> std::io::Result<Vec<(PathBuf, bool)>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let file_type = entry.file_type().await?;
        if file_type.is_symlink() {
            log::debug!("skipping symlink {}", entry.path().display());
            continue;
        }
        entries.push((entry.path(), file_type.is_dir()));
    }
    Ok(entries)
}

fn should_descend(options: &ScanOptions, path: &Path, parent_depth: usize) -> bool {
    if let Some(max) = options.max_depth {
        if parent_depth >= max {
            return false;
        }
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    !options
        .skip_directories
        .iter()
        .any(|skip| skip.eq_ignore_ascii_case(name))
}
