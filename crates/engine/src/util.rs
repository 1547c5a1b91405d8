use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Current modification time in epoch ms, `None` when unreadable
pub(crate) async fn file_mtime_ms(path: &Path) -> Option<u64> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    let modified = metadata.modified().ok()?;
    modified
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_millis() as u64)
}

/// Root-relative path with forward slashes, portable across checkouts
pub(crate) fn relative_string(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Rebuild an absolute path from a stored relative one. `.`/`..` segments
/// are dropped: a hand-edited cache file must not be able to point the
/// engine outside its root.
pub(crate) fn join_relative(root: &Path, relative: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for part in relative
        .split('/')
        .filter(|p| !p.is_empty() && *p != "." && *p != "..")
    {
        path.push(part);
    }
    path
}

/// Component count below the root (a file directly in the root has depth 0)
pub(crate) fn depth_below(root: &Path, path: &Path) -> usize {
    path.strip_prefix(root)
        .map(|rel| rel.components().count().saturating_sub(1))
        .unwrap_or(0)
}

/// Dotted namespace derived from the file's directory below the root,
/// used when the language itself has no package declaration.
pub(crate) fn namespace_for(root: &Path, path: &Path) -> Option<String> {
    let parent = path.parent()?;
    let relative = parent.strip_prefix(root).ok()?;
    let namespace = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join(".");
    if namespace.is_empty() {
        None
    } else {
        Some(namespace)
    }
}
