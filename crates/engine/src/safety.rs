use crate::options::SecurityOptions;
use regex::Regex;

/// Built-in denylist: process spawning, dynamic code construction,
/// destructive file-system calls. Matched against raw source before any
/// candidate can reach the resolver.
const DEFAULT_DENY: &[&str] = &[
    r#"require\s*\(\s*['"]child_process['"]\s*\)"#,
    r#"from\s+['"]child_process['"]"#,
    r"\bexecSync\s*\(",
    r"\bspawnSync\s*\(",
    r"\bexecFileSync\s*\(",
    r"\beval\s*\(",
    r"new\s+Function\s*\(",
    r"\brmSync\s*\(",
    r"\brmdirSync\s*\(",
    r"\bunlinkSync\s*\(",
    r"\brm\s+-rf\b",
    r"process\.exit\s*\(",
];

/// Static pre-load rejection of unsafe candidates. An untrusted codebase
/// must not be able to get dangerous code executed merely by being scanned.
pub struct SafetyGate {
    patterns: Vec<Regex>,
    allow_unsafe: bool,
}

impl SafetyGate {
    pub fn new(security: &SecurityOptions) -> Self {
        let mut patterns = Vec::with_capacity(DEFAULT_DENY.len() + security.deny_patterns.len());
        for source in DEFAULT_DENY {
            match Regex::new(source) {
                Ok(regex) => patterns.push(regex),
                Err(e) => log::error!("built-in deny pattern '{source}' failed to compile: {e}"),
            }
        }
        for source in &security.deny_patterns {
            match Regex::new(source) {
                Ok(regex) => patterns.push(regex),
                Err(e) => log::warn!("ignoring invalid deny pattern '{source}': {e}"),
            }
        }
        Self {
            patterns,
            allow_unsafe: security.allow_unsafe,
        }
    }

    /// First denylist pattern the source matches, if any
    pub fn violation(&self, source: &str) -> Option<&str> {
        if self.allow_unsafe {
            return None;
        }
        self.patterns
            .iter()
            .find(|pattern| pattern.is_match(source))
            .map(|pattern| pattern.as_str())
    }

    pub fn is_safe(&self, source: &str) -> bool {
        self.violation(source).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> SafetyGate {
        SafetyGate::new(&SecurityOptions::default())
    }

    #[test]
    fn plain_code_is_safe() {
        assert!(gate().is_safe("class Calculator { add(a, b) { return a + b; } }"));
    }

    #[test]
    fn process_spawning_is_rejected() {
        let source = "const { execSync } = require('child_process');\nexecSync('ls');";
        assert!(!gate().is_safe(source));
    }

    #[test]
    fn destructive_fs_calls_are_rejected() {
        assert!(!gate().is_safe("fs.rmSync('/', { recursive: true });"));
        assert!(!gate().is_safe("exec('rm -rf /tmp/x')"));
    }

    #[test]
    fn dynamic_code_is_rejected() {
        assert!(!gate().is_safe("eval('2 + 2')"));
        assert!(!gate().is_safe("const f = new Function('return 1');"));
    }

    #[test]
    fn evaluate_identifier_is_not_eval() {
        assert!(gate().is_safe("this.evaluate(expression)"));
    }

    #[test]
    fn allow_unsafe_disables_the_gate() {
        let gate = SafetyGate::new(&SecurityOptions {
            allow_unsafe: true,
            deny_patterns: Vec::new(),
        });
        assert!(gate.is_safe("eval('anything')"));
    }

    #[test]
    fn extra_patterns_extend_the_denylist() {
        let gate = SafetyGate::new(&SecurityOptions {
            allow_unsafe: false,
            deny_patterns: vec![r"forbiddenCall\(".to_string()],
        });
        assert!(!gate.is_safe("forbiddenCall();"));
    }
}
