use anyhow::Result;

use super::{SourceControl, run_expect};
use crate::config::SyncConfig;
use crate::dep::Dependency;

/// Backend for non-forge identifiers.
///
/// Delegates the whole fetch-and-place to the configured external tool
/// (`<tool> get -u <src>`, run from the workspace root); the tool decides
/// where the source lands. No ref concept exists, so checkout is a no-op
/// and the working tree is always considered clean.
pub struct FetchTool;

impl SourceControl for FetchTool {
    fn name(&self) -> &'static str {
        "fetch"
    }

    fn check_clean(&self, _dep: &Dependency, _cfg: &SyncConfig) -> Result<bool> {
        Ok(true)
    }

    fn clone_repo(&self, dep: &Dependency, cfg: &SyncConfig) -> Result<()> {
        self.pull(dep, cfg)
    }

    fn pull(&self, dep: &Dependency, cfg: &SyncConfig) -> Result<()> {
        run_expect(&cfg.tool_bin, &["get", "-u", &dep.src], &cfg.root)?;
        Ok(())
    }

    fn checkout(&self, _dep: &Dependency, _cfg: &SyncConfig) -> Result<()> {
        Ok(())
    }
}
