mod progress;

use anyhow::{Context, Result, bail};
use colored::*;
use indicatif::{MultiProgress, ProgressBar};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::build::run_build;
use crate::config::{SyncConfig, load_manifest};
use crate::dep::Dependency;

use progress::{err_style, ok_style, spinner_style};

/// Per-entry result of the clean-check phase.
#[derive(Debug)]
pub struct CleanOutcome {
    pub display: String,
    pub clean: bool,
    pub detail: Option<String>,
}

/// Per-entry result of the sync phase.
///
/// A build failure is recorded separately and never flips a successful
/// checkout to failed.
#[derive(Debug)]
pub struct SyncOutcome {
    pub display: String,
    pub error: Option<String>,
    pub build_error: Option<String>,
}

impl SyncOutcome {
    pub fn synced(&self) -> bool {
        self.error.is_none()
    }
}

/// All manifest entries plus the shared run configuration.
///
/// Orchestrates the three phases: sequential `setup`, then the concurrent
/// clean-check gate, then the concurrent sync. Phases never overlap; each
/// concurrent phase joins all its tasks before returning and folds typed
/// per-entry results in one place.
pub struct DependencySet {
    deps: Vec<Dependency>,
    cfg: SyncConfig,
}

impl DependencySet {
    pub fn new(deps: Vec<Dependency>, cfg: SyncConfig) -> Self {
        DependencySet { deps, cfg }
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Split composite identifiers and assign a backend to every entry.
    ///
    /// Sequential and idempotent. A malformed identifier is fatal here,
    /// before any phase touches the filesystem.
    pub fn setup(&mut self) -> Result<()> {
        for dep in &mut self.deps {
            dep.setup()?;
        }
        Ok(())
    }

    /// Run the clean-check phase: one task per entry, all to completion.
    ///
    /// Each task creates the entry's parent directories (no content is
    /// fetched), refreshes the existence flag, and asks the backend for a
    /// dirty/clean verdict unless `allow_dirty` is set. Every violation is
    /// surfaced in one pass; evaluate the gate with
    /// [`gate_passed`](Self::gate_passed).
    pub fn check_clean(&mut self, mp: Option<&MultiProgress>) -> Result<Vec<CleanOutcome>> {
        let pool = thread_pool(self.deps.len())?;
        let bars = make_bars(mp, &self.deps, "checking");
        let Self { deps, cfg } = self;
        let cfg: &SyncConfig = cfg;

        let outcomes: Vec<CleanOutcome> = pool.install(|| {
            deps.par_iter_mut()
                .enumerate()
                .map(|(idx, dep)| {
                    let out = clean_task(dep, cfg);
                    if out.clean {
                        finish_bar(&bars, idx, true, format!("checked {}", out.display));
                    } else {
                        let why = out.detail.as_deref().unwrap_or("not clean");
                        finish_bar(&bars, idx, false, format!("{} ({})", out.display, why));
                    }
                    out
                })
                .collect()
        });
        Ok(outcomes)
    }

    /// Fold clean-check outcomes: true iff every entry was clean, or the
    /// allow-dirty override is set.
    pub fn gate_passed(&self, outcomes: &[CleanOutcome]) -> bool {
        self.cfg.allow_dirty || outcomes.iter().all(|o| o.clean)
    }

    /// Run the sync phase: one task per entry, concurrently.
    ///
    /// Each task clones the working copy if absent, checks out the pinned
    /// ref (hash > branch > base branch) and pulls it up to date, then
    /// runs the build tool when the entry asks for it. A failing or slow
    /// entry never blocks or aborts its siblings; the call returns once
    /// all tasks have joined.
    pub fn sync(&mut self, mp: Option<&MultiProgress>) -> Result<Vec<SyncOutcome>> {
        let pool = thread_pool(self.deps.len())?;
        let bars = make_bars(mp, &self.deps, "syncing");
        let Self { deps, cfg } = self;
        let cfg: &SyncConfig = cfg;

        let outcomes: Vec<SyncOutcome> = pool.install(|| {
            deps.par_iter_mut()
                .enumerate()
                .map(|(idx, dep)| {
                    let out = sync_task(dep, cfg);
                    match (&out.error, &out.build_error) {
                        (Some(e), _) => {
                            finish_bar(&bars, idx, false, format!("{} (error: {e})", out.display));
                        }
                        (None, Some(be)) => {
                            finish_bar(
                                &bars,
                                idx,
                                false,
                                format!("synced {} (build failed: {be})", out.display),
                            );
                        }
                        (None, None) => {
                            finish_bar(&bars, idx, true, format!("synced {}", out.display));
                        }
                    }
                    out
                })
                .collect()
        });
        Ok(outcomes)
    }
}

/// One pool thread per entry, so a stalled external process blocks only
/// its owning task.
fn thread_pool(entries: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(entries.max(1))
        .build()
        .context("failed to build sync thread pool")
}

fn make_bars(
    mp: Option<&MultiProgress>,
    deps: &[Dependency],
    verb: &str,
) -> Option<Vec<ProgressBar>> {
    let mp = mp?;
    let style = spinner_style();
    Some(
        deps.iter()
            .map(|dep| {
                let pb = mp.add(ProgressBar::new_spinner());
                pb.set_style(style.clone());
                pb.set_message(format!("{verb} {}", dep.display()));
                pb.enable_steady_tick(Duration::from_millis(80));
                pb
            })
            .collect(),
    )
}

fn finish_bar(bars: &Option<Vec<ProgressBar>>, idx: usize, ok: bool, msg: String) {
    if let Some(bars) = bars {
        let pb = &bars[idx];
        pb.set_style(if ok { ok_style() } else { err_style() });
        pb.finish_with_message(msg);
    }
}

fn clean_task(dep: &mut Dependency, cfg: &SyncConfig) -> CleanOutcome {
    let display = dep.display().to_string();
    let path = dep.local_path(&cfg.root);

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        return CleanOutcome {
            display,
            clean: false,
            detail: Some(format!("cannot create {}: {e}", parent.display())),
        };
    }

    dep.exists = path.is_dir();
    if path.exists() && !dep.exists {
        return CleanOutcome {
            display,
            clean: false,
            detail: Some(format!("{} exists but is not a directory", path.display())),
        };
    }
    if cfg.allow_dirty || !dep.exists {
        return CleanOutcome {
            display,
            clean: true,
            detail: None,
        };
    }

    let verdict = match dep.backend() {
        Ok(backend) => backend.check_clean(dep, cfg),
        Err(e) => Err(e),
    };
    match verdict {
        Ok(true) => CleanOutcome {
            display,
            clean: true,
            detail: None,
        },
        Ok(false) => CleanOutcome {
            display,
            clean: false,
            detail: Some(format!("uncommitted changes in {}", path.display())),
        },
        Err(e) => CleanOutcome {
            display,
            clean: false,
            detail: Some(format!("{e:#}")),
        },
    }
}

fn sync_task(dep: &mut Dependency, cfg: &SyncConfig) -> SyncOutcome {
    let display = dep.display().to_string();
    let mut build_error = None;
    let res = sync_entry(dep, cfg, &mut build_error);
    SyncOutcome {
        display,
        error: res.err().map(|e| format!("{e:#}")),
        build_error,
    }
}

fn sync_entry(dep: &mut Dependency, cfg: &SyncConfig, build_error: &mut Option<String>) -> Result<()> {
    dep.backend()?.clone_repo(dep, cfg)?;
    dep.exists = true;
    dep.backend()?.checkout(dep, cfg)?;
    if dep.build
        && let Err(e) = run_build(&cfg.tool_bin, &dep.local_path(&cfg.root))
    {
        *build_error = Some(format!("{e:#}"));
    }
    Ok(())
}

/// CLI command: run-all — setup, clean gate, then concurrent sync.
///
/// Exits nonzero (via the returned error) when the clean gate fails and
/// the override is unset. Individual sync failures are shown per entry
/// and in the summary but do not change the exit code.
pub fn cmd_sync(manifest_path: &Path, cfg: SyncConfig) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    let mut set = DependencySet::new(manifest.deps, cfg);
    if set.is_empty() {
        eprintln!("no dependencies in {}", manifest_path.display());
        return Ok(());
    }
    set.setup()?;

    let mp = MultiProgress::new();
    let clean = set.check_clean(Some(&mp))?;
    if !set.gate_passed(&clean) {
        bail!("unclean working trees; commit your changes or rerun with --allow-dirty");
    }

    let outcomes = set.sync(Some(&mp))?;
    let failed = outcomes.iter().filter(|o| !o.synced()).count();
    let build_failed = outcomes.iter().filter(|o| o.build_error.is_some()).count();
    if failed > 0 || build_failed > 0 {
        let synced = outcomes.len() - failed;
        println!(
            "{} synced, {} failed, {} build failures",
            synced.to_string().green(),
            failed.to_string().red(),
            build_failed.to_string().red(),
        );
    }
    Ok(())
}

/// CLI command: the clean-state gate, standalone.
pub fn cmd_check(manifest_path: &Path, cfg: SyncConfig) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    let mut set = DependencySet::new(manifest.deps, cfg);
    if set.is_empty() {
        eprintln!("no dependencies in {}", manifest_path.display());
        return Ok(());
    }
    set.setup()?;

    let mp = MultiProgress::new();
    let outcomes = set.check_clean(Some(&mp))?;
    if !set.gate_passed(&outcomes) {
        bail!("unclean working trees; commit your changes or rerun with --allow-dirty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(display: &str, clean: bool) -> CleanOutcome {
        CleanOutcome {
            display: display.to_string(),
            clean,
            detail: None,
        }
    }

    #[test]
    fn empty_set_reports_empty() {
        let set = DependencySet::new(vec![], SyncConfig::default());
        assert!(set.is_empty());
        let set = DependencySet::new(
            vec![Dependency::new("github.com/org/repo")],
            SyncConfig::default(),
        );
        assert!(!set.is_empty());
    }

    #[test]
    fn gate_fails_on_any_dirty_entry() {
        let set = DependencySet::new(vec![], SyncConfig::default());
        let outcomes = vec![outcome("a", true), outcome("b", false)];
        assert!(!set.gate_passed(&outcomes));
        assert!(set.gate_passed(&[outcome("a", true)]));
    }

    #[test]
    fn allow_dirty_always_passes_gate() {
        let cfg = SyncConfig {
            allow_dirty: true,
            ..SyncConfig::default()
        };
        let set = DependencySet::new(vec![], cfg);
        let outcomes = vec![outcome("a", false), outcome("b", false)];
        assert!(set.gate_passed(&outcomes));
    }
}
