//! Error types for the gitdeploy core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`DeployError`] enum unifies them all for callers that want a
//! single error type. No error is retried anywhere in the core; the first
//! failure propagates to the caller.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for a deploy run.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from option validation and configuration loading.
///
/// These are reported before any pipeline work begins — a deploy with an
/// invalid configuration never touches the scratch directory or the remote.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The source directory to deploy does not exist or is not a directory.
    #[error("the source directory to deploy is required: '{0}' is not a directory")]
    SourceDirMissing(PathBuf),

    /// No remote repository URL was supplied.
    #[error("the URL to a remote git repository is required")]
    UrlMissing,

    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing {
        var: String,
        field: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from invoking the `git` CLI.
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` binary was not found on `$PATH`.
    #[error("git binary not found: {0}")]
    BinaryNotFound(String),

    /// A `git` command exited with a non-zero status.
    #[error("git command failed (exit {exit_code}): {stderr}")]
    CommandFailed {
        exit_code: i32,
        stderr: String,
    },

    /// Generic I/O wrapper (spawn / pipe failures).
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Synchronization errors
// ---------------------------------------------------------------------------

/// Errors from the tree synchronizer.
///
/// A failing filesystem operation aborts the synchronization pass
/// immediately; the destination tree is left in its partially synchronized
/// state for inspection (no rollback is attempted).
#[derive(Debug, Error)]
pub enum SyncError {
    /// A delete, copy, or mkdir failed mid-synchronization.
    #[error("filesystem operation failed at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Attach the offending path to a raw I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
