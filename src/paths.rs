use anyhow::Result;
use std::{env, path::PathBuf};

/// Base directory for all local working copies.
///
/// Read from `DEPSYNC_ROOT`; falls back to the current directory when the
/// variable is unset or empty. Every dependency's local path is rooted
/// under it as `<root>/<path-or-alias>`.
pub fn workspace_root() -> Result<PathBuf> {
    match env::var_os("DEPSYNC_ROOT") {
        Some(v) if !v.is_empty() => Ok(PathBuf::from(v)),
        _ => Ok(env::current_dir()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn root_comes_from_env_when_set() {
        unsafe { env::set_var("DEPSYNC_ROOT", "/srv/deps") };
        assert_eq!(workspace_root().unwrap(), PathBuf::from("/srv/deps"));
        unsafe { env::remove_var("DEPSYNC_ROOT") };
    }

    #[test]
    #[serial]
    fn root_falls_back_to_cwd() {
        unsafe { env::remove_var("DEPSYNC_ROOT") };
        assert_eq!(workspace_root().unwrap(), env::current_dir().unwrap());
    }

    #[test]
    #[serial]
    fn empty_env_value_falls_back_to_cwd() {
        unsafe { env::set_var("DEPSYNC_ROOT", "") };
        assert_eq!(workspace_root().unwrap(), env::current_dir().unwrap());
        unsafe { env::remove_var("DEPSYNC_ROOT") };
    }
}
