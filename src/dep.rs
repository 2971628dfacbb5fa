use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::backend::{SourceControl, backend_for};

/// One dependency entry from the manifest.
///
/// Each entry names a source location (`src`), an optional local alias path
/// (`as`), and an optional pin (`hash` and/or `branch`). The runtime fields
/// (`exists`, the backend handle) are derived per run and never persisted.
///
/// Example TOML:
/// ```toml
/// [[deps]]
/// src    = "github.com/araddon/gou"
/// branch = "develop"
/// build  = true
/// ```
#[derive(Deserialize)]
pub struct Dependency {
    /// Canonical source identifier, e.g. `github.com/araddon/gou`.
    /// May carry a `#hash` fragment until [`setup`](Self::setup) splits it.
    pub src: String,
    /// Local placement diverging from the canonical path.
    #[serde(rename = "as", default)]
    pub alias: Option<String>,
    /// Revision hash to check out; wins over `branch`.
    #[serde(default)]
    pub hash: Option<String>,
    /// Branch to check out when no hash is pinned.
    #[serde(default)]
    pub branch: Option<String>,
    /// Run the build tool after a successful checkout.
    #[serde(default)]
    pub build: bool,
    /// Whether the local path existed this run. Recomputed every run.
    #[serde(skip)]
    pub exists: bool,
    #[serde(skip)]
    backend: Option<Box<dyn SourceControl>>,
}

impl Dependency {
    /// Construct a bare entry for the given source identifier.
    ///
    /// Mostly useful for tests and programmatic callers; manifest entries
    /// are deserialized directly.
    pub fn new(src: impl Into<String>) -> Self {
        Dependency {
            src: src.into(),
            alias: None,
            hash: None,
            branch: None,
            build: false,
            exists: false,
            backend: None,
        }
    }

    /// Split the `path#hash` identifier and assign a backend.
    ///
    /// Idempotent: running it twice yields the same (path, hash, backend)
    /// tuple. A hash already set from the manifest is never overwritten by
    /// the split, but the fragment is still removed from the path.
    ///
    /// # Errors
    /// Returns an error for malformed identifiers (empty path, empty
    /// fragment, more than one `#`).
    pub fn setup(&mut self) -> Result<()> {
        let (path, hash) = split_pin(&self.src)?;
        self.src = path;
        if self.hash.is_none() {
            self.hash = hash;
        }
        self.backend = Some(backend_for(&self.src));
        Ok(())
    }

    /// The backend assigned at setup.
    pub fn backend(&self) -> Result<&dyn SourceControl> {
        self.backend
            .as_deref()
            .ok_or_else(|| anyhow!("no backend assigned for {} (setup not run)", self.src))
    }

    /// Name used in progress lines and reports.
    pub fn display(&self) -> &str {
        &self.src
    }

    /// Local working copy location: `<root>/<as>` when aliased, else
    /// `<root>/<src>`.
    pub fn local_path(&self, root: &Path) -> PathBuf {
        root.join(self.alias.as_deref().unwrap_or(&self.src))
    }
}

/// Split a composite `path#hash` identifier into its parts.
///
/// Plain identifiers pass through with no hash. Malformed input (empty
/// path, empty fragment, multiple `#`) is rejected instead of silently
/// ignored.
pub fn split_pin(src: &str) -> Result<(String, Option<String>)> {
    let parts: Vec<&str> = src.split('#').collect();
    match parts.as_slice() {
        [path] if !path.is_empty() => Ok(((*path).to_string(), None)),
        [path, hash] if !path.is_empty() && !hash.is_empty() => {
            Ok(((*path).to_string(), Some((*hash).to_string())))
        }
        _ => bail!("malformed dependency identifier: {src:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_pin_plain_path_has_no_hash() {
        let (path, hash) = split_pin("github.com/araddon/gou").unwrap();
        assert_eq!(path, "github.com/araddon/gou");
        assert_eq!(hash, None);
    }

    #[test]
    fn split_pin_composite_yields_path_and_hash() {
        let (path, hash) = split_pin("host/org/repo#abcdef").unwrap();
        assert_eq!(path, "host/org/repo");
        assert_eq!(hash.as_deref(), Some("abcdef"));
    }

    #[test]
    fn split_pin_rejects_malformed_identifiers() {
        assert!(split_pin("a#b#c").is_err());
        assert!(split_pin("#h").is_err());
        assert!(split_pin("p#").is_err());
        assert!(split_pin("").is_err());
    }

    #[test]
    fn setup_splits_composite_identifier() {
        let mut dep = Dependency::new("host/org/repo#abcdef");
        dep.setup().unwrap();
        assert_eq!(dep.src, "host/org/repo");
        assert_eq!(dep.hash.as_deref(), Some("abcdef"));
    }

    #[test]
    fn setup_is_idempotent() {
        let mut dep = Dependency::new("github.com/org/repo#abcdef");
        dep.setup().unwrap();
        let first = (
            dep.src.clone(),
            dep.hash.clone(),
            dep.backend().unwrap().name(),
        );
        dep.setup().unwrap();
        let second = (
            dep.src.clone(),
            dep.hash.clone(),
            dep.backend().unwrap().name(),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn setup_keeps_explicit_hash_over_fragment() {
        let mut dep = Dependency::new("host/org/repo#fragment");
        dep.hash = Some("explicit".into());
        dep.setup().unwrap();
        assert_eq!(dep.src, "host/org/repo");
        assert_eq!(dep.hash.as_deref(), Some("explicit"));
    }

    #[test]
    fn local_path_prefers_alias() {
        let mut dep = Dependency::new("github.com/org/repo");
        let root = Path::new("/work");
        assert_eq!(dep.local_path(root), Path::new("/work/github.com/org/repo"));
        dep.alias = Some("vendor/repo".into());
        assert_eq!(dep.local_path(root), Path::new("/work/vendor/repo"));
    }
}
