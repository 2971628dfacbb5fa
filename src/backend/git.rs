use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

use super::{SourceControl, run_command, run_expect};
use crate::config::SyncConfig;
use crate::dep::Dependency;

/// Branch names a pinned hash can never be; a failing pull on any other
/// pin is treated as a detached-HEAD condition.
const LONG_LIVED_BRANCHES: &[&str] = &["master", "develop", "gh-pages"];

/// Backend for forge-hosted repositories, driving the external git client.
pub struct Git;

impl Git {
    /// Escape a detached HEAD: check out the base branch, retry the pull
    /// once, then return to the pinned hash.
    fn recover_detached_head(&self, dep: &Dependency, cfg: &SyncConfig, dir: &Path) -> Result<()> {
        run_expect(&cfg.git_bin, &["checkout", &cfg.base_branch], dir)?;
        run_expect(&cfg.git_bin, &["pull"], dir)?;
        if let Some(hash) = dep.hash.as_deref() {
            run_expect(&cfg.git_bin, &["checkout", hash], dir)?;
        }
        Ok(())
    }
}

impl SourceControl for Git {
    fn name(&self) -> &'static str {
        "git"
    }

    fn check_clean(&self, dep: &Dependency, cfg: &SyncConfig) -> Result<bool> {
        let dir = dep.local_path(&cfg.root);
        let out = run_command(&cfg.git_bin, &["diff", "--exit-code"], &dir)?;
        Ok(out.status.success() && out.stdout.is_empty())
    }

    fn clone_repo(&self, dep: &Dependency, cfg: &SyncConfig) -> Result<()> {
        let path = dep.local_path(&cfg.root);
        if path.exists() {
            return Ok(());
        }
        let parent = path
            .parent()
            .with_context(|| format!("no parent directory for {}", path.display()))?;
        let target = path
            .file_name()
            .and_then(|s| s.to_str())
            .with_context(|| format!("unusable local path {}", path.display()))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
        let remote = remote_url(&dep.src)?;
        run_expect(&cfg.git_bin, &["clone", &remote, target], parent)?;
        Ok(())
    }

    fn pull(&self, dep: &Dependency, cfg: &SyncConfig) -> Result<()> {
        let dir = dep.local_path(&cfg.root);
        let out = run_command(&cfg.git_bin, &["pull"], &dir)?;
        if out.status.success() {
            return Ok(());
        }
        let detached = dep.exists
            && dep
                .hash
                .as_deref()
                .is_some_and(|h| !LONG_LIVED_BRANCHES.contains(&h));
        if detached {
            return self
                .recover_detached_head(dep, cfg, &dir)
                .with_context(|| format!("detached-HEAD recovery failed in {}", dir.display()));
        }
        bail!(
            "`{} pull` failed in {} ({}): {}",
            cfg.git_bin,
            dir.display(),
            out.status,
            String::from_utf8_lossy(&out.stderr).trim(),
        );
    }

    fn checkout(&self, dep: &Dependency, cfg: &SyncConfig) -> Result<()> {
        let dir = dep.local_path(&cfg.root);
        let target = checkout_ref(dep, &cfg.base_branch);
        run_expect(&cfg.git_bin, &["checkout", target], &dir)?;
        self.pull(dep, cfg)
    }
}

/// Derive the ssh remote from the identifier's host/org/repo segments,
/// e.g. `github.com/lytics/cache` -> `git@github.com:lytics/cache.git`.
fn remote_url(src: &str) -> Result<String> {
    let parts: Vec<&str> = src.split('/').collect();
    if parts.len() < 3 {
        bail!("not a forge identifier: {src}");
    }
    Ok(format!("git@{}:{}/{}.git", parts[0], parts[1], parts[2]))
}

/// Resolution order: pinned hash > pinned branch > base branch.
fn checkout_ref<'a>(dep: &'a Dependency, base: &'a str) -> &'a str {
    dep.hash
        .as_deref()
        .or(dep.branch.as_deref())
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_url_uses_first_three_segments() {
        assert_eq!(
            remote_url("github.com/lytics/cache").unwrap(),
            "git@github.com:lytics/cache.git"
        );
        assert_eq!(
            remote_url("github.com/org/repo/nested/pkg").unwrap(),
            "git@github.com:org/repo.git"
        );
    }

    #[test]
    fn remote_url_rejects_short_identifiers() {
        assert!(remote_url("launchpad.net/goyaml").is_err());
    }

    #[test]
    fn checkout_ref_prefers_hash_then_branch_then_base() {
        let mut dep = Dependency::new("github.com/org/repo");
        dep.hash = Some("h1".into());
        dep.branch = Some("b1".into());
        assert_eq!(checkout_ref(&dep, "master"), "h1");

        dep.hash = None;
        assert_eq!(checkout_ref(&dep, "master"), "b1");

        dep.branch = None;
        assert_eq!(checkout_ref(&dep, "master"), "master");
    }
}
