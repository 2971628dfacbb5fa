use anyhow::{Context, Result};
use colored::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dep::Dependency;

/// The dependency manifest loaded from `deps.toml`.
///
/// An ordered sequence of `[[deps]]` records, each describing one
/// externally hosted source dependency.
///
/// Example TOML:
/// ```toml
/// [[deps]]
/// src    = "github.com/araddon/gou"
/// branch = "develop"
///
/// [[deps]]
/// src   = "github.com/lytics/cache#deadbeef"
/// as    = "vendor/cache"
/// build = true
/// ```
#[derive(Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub deps: Vec<Dependency>,
}

/// Load and parse a manifest file.
///
/// # Errors
/// - Returns an error if the file cannot be read; the message names the
///   resolved path.
/// - Returns an error if parsing the TOML fails.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("manifest not found: {}", path.display()))?;
    let m: Manifest = toml::from_str(&txt)
        .with_context(|| format!("failed to parse manifest {}", path.display()))?;
    Ok(m)
}

/// Read-only configuration shared across all sync tasks.
///
/// Threaded explicitly through the orchestrator into every backend call;
/// there is no global mutable state.
#[derive(Clone)]
pub struct SyncConfig {
    /// Base directory under which every local working copy is rooted.
    pub root: PathBuf,
    /// Skip the dirty check and force the clean gate to pass.
    pub allow_dirty: bool,
    /// Fallback checkout target and detached-HEAD recovery branch.
    pub base_branch: String,
    /// Path to the git executable.
    pub git_bin: String,
    /// Path to the fetch/build tool executable.
    pub tool_bin: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            root: PathBuf::from("."),
            allow_dirty: false,
            base_branch: "master".to_string(),
            git_bin: "git".to_string(),
            tool_bin: "go".to_string(),
        }
    }
}

/// CLI command: print each manifest entry with its pin and backend.
///
/// Example output:
/// ```text
/// - github.com/araddon/gou (git) [branch develop]
/// - github.com/lytics/cache -> vendor/cache (git) [hash deadbeef]
/// - launchpad.net/goyaml (fetch) [default]
/// ```
pub fn cmd_list(manifest_path: &Path) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    for mut dep in manifest.deps {
        dep.setup()?;
        let pin = match (&dep.hash, &dep.branch) {
            (Some(h), _) => format!("hash {h}"),
            (None, Some(b)) => format!("branch {b}"),
            (None, None) => "default".to_string(),
        };
        let backend = dep.backend()?.name();
        match &dep.alias {
            Some(alias) => println!(
                "- {} -> {} ({}) [{}]",
                dep.src,
                alias,
                backend.cyan(),
                pin.yellow()
            ),
            None => println!("- {} ({}) [{}]", dep.src, backend.cyan(), pin.yellow()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_manifest_parses_all_fields() {
        let td = tempdir().unwrap();
        let path = td.path().join("deps.toml");
        fs::write(
            &path,
            r#"
[[deps]]
src    = "github.com/araddon/gou"
branch = "develop"

[[deps]]
src   = "github.com/lytics/cache#deadbeef"
as    = "vendor/cache"
build = true
"#,
        )
        .unwrap();

        let m = load_manifest(&path).unwrap();
        assert_eq!(m.deps.len(), 2);
        assert_eq!(m.deps[0].src, "github.com/araddon/gou");
        assert_eq!(m.deps[0].branch.as_deref(), Some("develop"));
        assert!(!m.deps[0].build);
        assert_eq!(m.deps[1].alias.as_deref(), Some("vendor/cache"));
        assert!(m.deps[1].build);
        // fragment split happens at setup, not at load
        assert_eq!(m.deps[1].src, "github.com/lytics/cache#deadbeef");
    }

    #[test]
    fn load_manifest_error_names_path() {
        let td = tempdir().unwrap();
        let path = td.path().join("absent.toml");
        let err = load_manifest(&path).err().unwrap();
        assert!(format!("{err}").contains("absent.toml"));
    }

    #[test]
    fn load_manifest_rejects_bad_toml() {
        let td = tempdir().unwrap();
        let path = td.path().join("deps.toml");
        fs::write(&path, "[[deps]\nsrc = ").unwrap();
        assert!(load_manifest(&path).is_err());
    }
}
