//! Remote branch existence probe.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::errors::GitError;

/// Whether `branch` exists on the remote at `url`.
///
/// Runs `git ls-remote --heads <url> <branch>`; an empty listing means the
/// branch does not exist. The deploy entry point uses this to choose between
/// cloning the existing branch and creating it fresh after a bare clone.
pub async fn branch_exists(url: &str, branch: &str) -> Result<bool, GitError> {
    let output = Command::new("git")
        .args(["ls-remote", "--heads", url, branch])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::BinaryNotFound("git".into())
            } else {
                GitError::IoError(e)
            }
        })?;

    if !output.status.success() {
        return Err(GitError::CommandFailed {
            exit_code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let exists = lists_branch(&stdout, branch);
    debug!(url, branch, exists, "probed remote branch");
    Ok(exists)
}

/// Whether any line of an `ls-remote --heads` listing references `branch`.
///
/// Lines have the form `<sha>\trefs/heads/<name>`; the full ref is compared
/// so that `main` does not match `main2`.
fn lists_branch(output: &str, branch: &str) -> bool {
    let full_ref = format!("refs/heads/{branch}");
    output
        .lines()
        .any(|line| line.split_whitespace().any(|field| field == full_ref))
}
