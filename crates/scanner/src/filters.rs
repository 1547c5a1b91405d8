use std::path::Path;

/// Directories pruned without descending: dependency trees, VCS state,
/// build output, caches, existing test suites.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    // VCS / tooling
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    // dependencies / caches
    "node_modules",
    "vendor",
    "third_party",
    "third-party",
    "__pycache__",
    ".cache",
    ".venv",
    "venv",
    // build output
    "build",
    "dist",
    "out",
    "target",
    "coverage",
    ".next",
    ".turbo",
    // existing tests
    "test",
    "tests",
    "__tests__",
    "__mocks__",
    "spec",
];

/// True when the file should reach evaluation: allowed extension and none
/// of the noise patterns below.
pub fn is_eligible_file(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = ext.to_lowercase();
    if !extensions.iter().any(|candidate| candidate == &ext) {
        return false;
    }

    !(is_declaration_file(name)
        || is_generated_file(name)
        || is_backup_file(name)
        || is_copy_file(name)
        || is_test_file(path, name))
}

/// `.d.ts` and friends: types only, nothing to resolve
fn is_declaration_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".d.ts") || lower.ends_with(".d.mts") || lower.ends_with(".d.cts")
}

fn is_generated_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains(".min.") || lower.contains(".bundle.") || lower.contains(".generated.")
}

fn is_backup_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with('~')
        || lower.ends_with(".bak")
        || lower.ends_with(".orig")
        || lower.ends_with(".swp")
}

/// Editor/file-manager duplicates: "thing copy.js", "thing-copy.js",
/// "thing (2).js"
fn is_copy_file(name: &str) -> bool {
    let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(name);
    let lower = stem.to_lowercase();
    if lower.ends_with(" copy") || lower.ends_with("-copy") || lower.ends_with(".copy") {
        return true;
    }
    if let (Some(open), true) = (lower.rfind(" ("), lower.ends_with(')')) {
        let inner = &lower[open + 2..lower.len() - 1];
        if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
    }
    false
}

fn is_test_file(path: &Path, name: &str) -> bool {
    let lower = name.to_lowercase();
    let stem = lower.rsplit_once('.').map(|(s, _)| s).unwrap_or(&lower);
    if stem.ends_with(".test") || stem.ends_with(".spec") {
        return true;
    }
    if stem.starts_with("test_") || stem.ends_with("_test") {
        return true;
    }
    path.components().any(|c| {
        matches!(
            c.as_os_str().to_str(),
            Some("__tests__") | Some("__mocks__")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn js_extensions() -> Vec<String> {
        vec!["js".into(), "ts".into()]
    }

    fn eligible(path: &str) -> bool {
        is_eligible_file(&PathBuf::from(path), &js_extensions())
    }

    #[test]
    fn accepts_plain_source() {
        assert!(eligible("src/calculator.js"));
        assert!(eligible("src/Service.ts"));
    }

    #[test]
    fn rejects_wrong_extension() {
        assert!(!eligible("src/readme.md"));
        assert!(!eligible("src/noext"));
    }

    #[test]
    fn rejects_declarations_and_generated() {
        assert!(!eligible("src/types.d.ts"));
        assert!(!eligible("dist/app.min.js"));
        assert!(!eligible("dist/app.bundle.js"));
    }

    #[test]
    fn rejects_backups_and_copies() {
        assert!(!eligible("src/old.js.bak"));
        assert!(!eligible("src/calc copy.js"));
        assert!(!eligible("src/calc-copy.js"));
        assert!(!eligible("src/calc (2).js"));
        assert!(eligible("src/copyright.js"));
    }

    #[test]
    fn rejects_test_files() {
        assert!(!eligible("src/calc.test.js"));
        assert!(!eligible("src/calc.spec.ts"));
        assert!(!eligible("src/test_calc.js"));
        assert!(!eligible("src/calc_test.js"));
        assert!(!eligible("src/__tests__/calc.js"));
        assert!(eligible("src/latest.js"));
    }
}
