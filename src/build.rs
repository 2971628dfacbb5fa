use anyhow::Result;
use std::path::Path;

use crate::backend::run_expect;

/// Invoke the external build tool for one dependency.
///
/// Runs `<tool> clean` followed by `<tool> install` with the working
/// directory fixed to the dependency's local path. A nonzero exit of
/// either step is reported with captured output; the caller decides how
/// to record it (a build failure never flips a successful checkout).
pub fn run_build(tool: &str, dir: &Path) -> Result<()> {
    run_expect(tool, &["clean"], dir)?;
    run_expect(tool, &["install"], dir)?;
    Ok(())
}
