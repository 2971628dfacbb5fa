//! Library crate for **depsync**.
//!
//! depsync keeps a set of externally hosted source dependencies in sync
//! with a TOML manifest: for each entry it ensures a local working copy
//! exists under the workspace root, gates on a clean working tree, and
//! checks out the pinned revision or branch in parallel across entries,
//! optionally running a build tool afterwards.
//!
//! Each submodule encapsulates one responsibility (manifest loading,
//! source-control backends, sync orchestration, etc.). The `pub use`
//! re-exports make the command entry points and core types accessible
//! from the crate root.

mod backend;
mod build;
mod config;
mod dep;
mod paths;
mod sync;

pub use backend::{SourceControl, backend_for};
pub use config::{Manifest, SyncConfig, cmd_list, load_manifest};
pub use dep::{Dependency, split_pin};
pub use paths::workspace_root;
pub use sync::{CleanOutcome, DependencySet, SyncOutcome, cmd_check, cmd_sync};
