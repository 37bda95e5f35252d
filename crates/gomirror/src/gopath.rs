//! GOPATH and GOBIN resolution
//!
//! Mirrors the toolchain's defaulting rules: environment override first,
//! then `<home>/go`.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving workspace directories
#[derive(Debug, Error)]
pub enum GopathError {
    /// No home directory to anchor the default GOPATH
    #[error("Cannot determine home directory for default GOPATH")]
    NoHomeDir,
}

/// Resolve the GOPATH root.
///
/// Uses the first non-empty element of the `GOPATH` environment path
/// list when set, otherwise `<home>/go`.
pub fn gopath() -> Result<PathBuf, GopathError> {
    resolve_gopath(env::var_os("GOPATH"))
}

/// Resolve the binary output directory.
///
/// `$GOBIN` wins when set and non-empty; otherwise `gopath()/bin`.
pub fn go_bin_dir() -> Result<PathBuf, GopathError> {
    resolve_go_bin_dir(env::var_os("GOBIN"), env::var_os("GOPATH"))
}

fn resolve_gopath(value: Option<OsString>) -> Result<PathBuf, GopathError> {
    if let Some(value) = value {
        if let Some(first) = env::split_paths(&value).find(|path| !path.as_os_str().is_empty()) {
            return Ok(first);
        }
    }

    match dirs::home_dir() {
        Some(home) => Ok(home.join("go")),
        None => Err(GopathError::NoHomeDir),
    }
}

fn resolve_go_bin_dir(
    gobin: Option<OsString>,
    gopath: Option<OsString>,
) -> Result<PathBuf, GopathError> {
    if let Some(value) = gobin {
        if !value.is_empty() {
            return Ok(PathBuf::from(value));
        }
    }

    Ok(resolve_gopath(gopath)?.join("bin"))
}
