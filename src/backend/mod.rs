mod fetch;
mod git;

pub use fetch::FetchTool;
pub use git::Git;

use anyhow::{Context, Result, bail};
use regex::Regex;
use std::path::Path;
use std::process::{Command, Output};

use crate::config::SyncConfig;
use crate::dep::Dependency;

/// Primitive source-control operations against one dependency's local path.
///
/// The concrete backend is selected once at setup from the identifier shape
/// and stored on the entry; it is never re-resolved later. All operations
/// shell out to external executables named in [`SyncConfig`].
pub trait SourceControl: Send + Sync {
    /// Short backend name for listings ("git", "fetch").
    fn name(&self) -> &'static str;

    /// Whether the working tree is free of uncommitted changes.
    /// Dirty is a report, never an error by itself.
    fn check_clean(&self, dep: &Dependency, cfg: &SyncConfig) -> Result<bool>;

    /// Create the local working copy if it does not exist yet.
    fn clone_repo(&self, dep: &Dependency, cfg: &SyncConfig) -> Result<()>;

    /// Bring the current ref up to date.
    fn pull(&self, dep: &Dependency, cfg: &SyncConfig) -> Result<()>;

    /// Switch to the pinned ref, then pull it up to date.
    fn checkout(&self, dep: &Dependency, cfg: &SyncConfig) -> Result<()>;
}

/// Select the backend for an identifier.
///
/// Forge-style identifiers (dotted hostname followed by at least two more
/// path segments, e.g. `github.com/org/repo`) get the git backend;
/// everything else falls back to the generic fetch tool.
pub fn backend_for(src: &str) -> Box<dyn SourceControl> {
    if is_forge(src) {
        Box::new(Git)
    } else {
        Box::new(FetchTool)
    }
}

fn is_forge(src: &str) -> bool {
    let re = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9.-]*\.[A-Za-z]{2,}(/[^/#\s]+){2,}$").unwrap();
    re.is_match(src)
}

/// Run an external command and capture its output.
///
/// Only spawn failures are errors here; callers inspect the exit status
/// themselves when a nonzero exit is meaningful (e.g. `git diff`).
pub(crate) fn run_command(bin: &str, args: &[&str], cwd: &Path) -> Result<Output> {
    Command::new(bin)
        .args(args)
        .current_dir(cwd)
        .output()
        .with_context(|| format!("failed to spawn `{bin} {}` in {}", args.join(" "), cwd.display()))
}

/// Run an external command and require a zero exit status.
///
/// Captured stdout/stderr is attached to the error on failure.
pub(crate) fn run_expect(bin: &str, args: &[&str], cwd: &Path) -> Result<Output> {
    let out = run_command(bin, args, cwd)?;
    if !out.status.success() {
        bail!(
            "`{bin} {}` failed in {} ({}): {} {}",
            args.join(" "),
            cwd.display(),
            out.status,
            String::from_utf8_lossy(&out.stdout).trim(),
            String::from_utf8_lossy(&out.stderr).trim(),
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forge_identifiers_get_git_backend() {
        assert_eq!(backend_for("github.com/org/repo").name(), "git");
        assert_eq!(backend_for("git.example.io/team/lib").name(), "git");
        assert_eq!(backend_for("github.com/org/repo/subdir").name(), "git");
    }

    #[test]
    fn non_forge_identifiers_get_fetch_backend() {
        // two segments only
        assert_eq!(backend_for("launchpad.net/goyaml").name(), "fetch");
        assert_eq!(backend_for("plainname").name(), "fetch");
        assert_eq!(backend_for("no-dots/org/repo").name(), "fetch");
        assert_eq!(backend_for("github.com//repo").name(), "fetch");
    }
}
