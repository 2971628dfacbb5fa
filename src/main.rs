//! # depsync
//!
//! **depsync** synchronizes externally hosted source dependencies declared
//! in a TOML manifest.
//!
//! Features:
//! - `depsync sync` clones/updates every entry at its pinned hash or branch
//! - `depsync check` runs the clean-working-tree gate standalone
//! - `depsync list` shows manifest entries with pin and backend metadata
//! - `depsync root` prints the resolved workspace root
//!
//! Local working copies live under `$DEPSYNC_ROOT` (current directory when
//! unset). This CLI is built with [clap](https://docs.rs/clap).

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use depsync::{SyncConfig, cmd_check, cmd_list, cmd_sync, workspace_root};
use std::path::PathBuf;

/// Command-line interface definition.
///
/// Parsed using `clap` derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "depsync",
    version,
    about = "depsync - manifest-driven source dependency synchronizer",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

/// Flags shared by the sync and check subcommands.
#[derive(Args, Debug)]
struct SyncOpts {
    /// Manifest file listing dependencies
    #[arg(long, default_value = "deps.toml")]
    manifest: PathBuf,
    /// Proceed even when working trees have uncommitted changes
    #[arg(long)]
    allow_dirty: bool,
    /// Fallback branch for checkout and detached-HEAD recovery
    #[arg(long, default_value = "master")]
    base_branch: String,
    /// Path to the git executable
    #[arg(long, default_value = "git")]
    git_bin: String,
    /// Path to the fetch/build tool executable
    #[arg(long, default_value = "go")]
    tool_bin: String,
}

impl SyncOpts {
    fn config(&self) -> Result<SyncConfig> {
        Ok(SyncConfig {
            root: workspace_root()?,
            allow_dirty: self.allow_dirty,
            base_branch: self.base_branch.clone(),
            git_bin: self.git_bin.clone(),
            tool_bin: self.tool_bin.clone(),
        })
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Cmd {
    /// Clone/update dependencies declared in the manifest
    Sync(SyncOpts),
    /// Check every working tree for uncommitted changes
    Check(SyncOpts),
    /// List manifest entries with pin and backend metadata
    List {
        /// Manifest file listing dependencies
        #[arg(long, default_value = "deps.toml")]
        manifest: PathBuf,
    },
    /// Print the workspace root directory
    Root,
}

/// CLI entry point.
///
/// Parses arguments with `clap` and executes the selected subcommand.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.cmd.unwrap();

    match cmd {
        Cmd::Sync(opts) => cmd_sync(&opts.manifest, opts.config()?),
        Cmd::Check(opts) => cmd_check(&opts.manifest, opts.config()?),
        Cmd::List { manifest } => cmd_list(&manifest),
        Cmd::Root => {
            println!("{}", workspace_root()?.display());
            Ok(())
        }
    }
}
