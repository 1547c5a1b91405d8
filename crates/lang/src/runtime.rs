use crate::error::{IntegrationError, Result};
use crate::metadata::AccessDescriptor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

/// Hard limits for a runtime probe. One malformed target file must not be
/// able to stall a discovery call or exhaust its memory.
#[derive(Debug, Clone)]
pub struct ProbeLimits {
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

impl Default for ProbeLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_output_bytes: 1024 * 1024,
        }
    }
}

/// Shape of one export as reported by the host runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeExport {
    pub access: AccessDescriptor,
    /// "class", "function" or "value"
    pub kind: String,
    #[serde(default)]
    pub callable_methods: Vec<String>,
    #[serde(default)]
    pub properties: Vec<String>,
}

impl RuntimeExport {
    pub fn has_callable(&self, method: &str) -> bool {
        self.callable_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method))
    }
}

/// Loads the target module inside `node` and prints every export shape as
/// JSON. Own + prototype function-valued properties count as callable;
/// everything else is a plain property.
const PROBE_SCRIPT: &str = r#"
const target = process.argv[1];
delete require.cache[require.resolve(target)];
const mod = require(target);
const isClass = (v) =>
  typeof v === 'function' && /^\s*class[\s{]/.test(Function.prototype.toString.call(v));
const methodsOf = (v) => {
  const out = new Set();
  if (typeof v === 'function' && v.prototype) {
    for (const k of Object.getOwnPropertyNames(v.prototype)) {
      if (k === 'constructor') continue;
      const d = Object.getOwnPropertyDescriptor(v.prototype, k);
      if (d && typeof d.value === 'function') out.add(k);
    }
  }
  if (v && (typeof v === 'object' || typeof v === 'function')) {
    for (const k of Object.getOwnPropertyNames(v)) {
      try { if (typeof v[k] === 'function') out.add(k); } catch (_) {}
    }
  }
  return [...out];
};
const propsOf = (v) => {
  const out = [];
  if (v && typeof v === 'object') {
    for (const k of Object.getOwnPropertyNames(v)) {
      try { if (typeof v[k] !== 'function') out.push(k); } catch (_) {}
    }
  }
  return out;
};
const shape = (v, access) => ({
  access,
  kind: isClass(v) ? 'class' : typeof v === 'function' ? 'function' : 'value',
  callableMethods: methodsOf(v),
  properties: propsOf(v),
});
const shapes = [shape(mod, { type: 'direct' })];
if (mod && typeof mod === 'object') {
  for (const key of Object.keys(mod)) {
    const access = key === 'default' ? { type: 'default' } : { type: 'named', name: key };
    shapes.push(shape(mod[key], access));
  }
}
process.stdout.write(JSON.stringify(shapes));
"#;

/// Load `path` in a `node` subprocess and report its export shapes.
///
/// The child is killed on timeout or output overflow; either failure only
/// fails this one candidate.
pub async fn probe_node_exports(path: &Path, limits: &ProbeLimits) -> Result<Vec<RuntimeExport>> {
    log::debug!("probing {} in node", path.display());
    let mut child = Command::new("node")
        .arg("-e")
        .arg(PROBE_SCRIPT)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| IntegrationError::ProbeFailed("stdout not captured".into()))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| IntegrationError::ProbeFailed("stderr not captured".into()))?;

    let limit = limits.max_output_bytes;
    let read_streams = async {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut out_take = (&mut stdout).take(limit as u64 + 1);
        let mut err_take = (&mut stderr).take(8 * 1024);
        let out_read = out_take.read_to_end(&mut out);
        let err_read = err_take.read_to_end(&mut err);
        let (out_res, err_res) = tokio::join!(out_read, err_read);
        out_res?;
        err_res?;
        Ok::<_, std::io::Error>((out, err))
    };

    let (out, err) = match timeout(limits.timeout, read_streams).await {
        Ok(Ok(streams)) => streams,
        Ok(Err(e)) => {
            let _ = child.start_kill();
            return Err(e.into());
        }
        Err(_) => {
            let _ = child.start_kill();
            return Err(IntegrationError::ProbeTimeout {
                timeout: limits.timeout,
            });
        }
    };

    if out.len() > limit {
        let _ = child.start_kill();
        return Err(IntegrationError::ProbeOutputOverflow { limit });
    }

    let status = match timeout(limits.timeout, child.wait()).await {
        Ok(status) => status?,
        Err(_) => {
            let _ = child.start_kill();
            return Err(IntegrationError::ProbeTimeout {
                timeout: limits.timeout,
            });
        }
    };

    if !status.success() {
        let detail = String::from_utf8_lossy(&err);
        return Err(IntegrationError::ProbeFailed(format!(
            "node exited with {status}: {}",
            detail.trim()
        )));
    }

    Ok(serde_json::from_slice(&out)?)
}
