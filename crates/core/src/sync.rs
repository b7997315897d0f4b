//! Tree synchronization: mirror a source directory into a live working tree.
//!
//! Two reconciliation passes drive the synchronizer. The first runs against
//! the destination with ancestor protection and decides what to delete — this
//! is what keeps repository-control data (`.git/**` and anything else the
//! caller protects) alive across a re-synchronization. The second runs
//! against the source and decides what to copy.
//!
//! After [`synchronize`] returns, the destination holds exactly the union of
//! the paths protected from deletion (where not overwritten) and the paths
//! copied from the source; nothing stale outside both sets survives.
//!
//! A failing filesystem operation aborts the pass immediately and leaves the
//! destination partially synchronized. No rollback is attempted.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::errors::SyncError;
use crate::patterns::{MatchOptions, PatternInput};
use crate::reconcile::reconcile;

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// The two result sets a synchronization run acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    /// Destination-relative paths eligible for deletion.
    pub to_delete: BTreeSet<String>,
    /// Source-relative paths to copy into the destination.
    pub to_copy: BTreeSet<String>,
}

/// Compute the delete and copy sets without touching the filesystem beyond
/// read-only traversal. Used directly by dry runs.
pub fn plan(
    source_dir: &Path,
    source_exclude: &PatternInput,
    dest_dir: &Path,
    dest_exclude: &PatternInput,
) -> SyncPlan {
    let everything = PatternInput::from("**/*");
    let to_delete = reconcile(
        &everything,
        dest_exclude,
        dest_dir,
        MatchOptions::hidden(),
        true,
    );
    let to_copy = reconcile(
        &everything,
        source_exclude,
        source_dir,
        MatchOptions::hidden(),
        false,
    );
    SyncPlan { to_delete, to_copy }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Counters describing what a synchronization run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Entries removed from the destination (files and directory trees).
    pub deleted: usize,
    /// Files copied into the destination.
    pub copied_files: usize,
    /// Directories created in the destination.
    pub created_dirs: usize,
}

// ---------------------------------------------------------------------------
// Synchronize
// ---------------------------------------------------------------------------

/// Mirror `source_dir` into `dest_dir`.
///
/// Paths matching `dest_exclude` (and, transitively, their ancestor
/// directories) survive in the destination; paths matching `source_exclude`
/// are not copied. Existing destination files are overwritten; directory
/// creation is idempotent.
pub fn synchronize(
    source_dir: &Path,
    source_exclude: &PatternInput,
    dest_dir: &Path,
    dest_exclude: &PatternInput,
) -> Result<SyncStats, SyncError> {
    info!(
        source = %source_dir.display(),
        dest = %dest_dir.display(),
        "copying source tree into working tree"
    );

    let plan = plan(source_dir, source_exclude, dest_dir, dest_exclude);
    let mut stats = SyncStats::default();

    // Delete pass: clear the destination of everything not protected.
    for rel in &plan.to_delete {
        let full = dest_dir.join(rel);
        let meta = match fs::symlink_metadata(&full) {
            Ok(meta) => meta,
            // Already gone — removed with a parent earlier in the pass.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(SyncError::io(full, err)),
        };
        if meta.is_dir() {
            fs::remove_dir_all(&full).map_err(|e| SyncError::io(&full, e))?;
        } else {
            fs::remove_file(&full).map_err(|e| SyncError::io(&full, e))?;
        }
        debug!(path = rel.as_str(), "deleted");
        stats.deleted += 1;
    }

    // Copy pass: mirror the selected source entries.
    for rel in &plan.to_copy {
        let src = source_dir.join(rel);
        let dest = dest_dir.join(rel);
        if src.is_dir() {
            fs::create_dir_all(&dest).map_err(|e| SyncError::io(&dest, e))?;
            stats.created_dirs += 1;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
            }
            fs::copy(&src, &dest).map_err(|e| SyncError::io(&dest, e))?;
            debug!(path = rel.as_str(), "copied");
            stats.copied_files += 1;
        }
    }

    info!(
        deleted = stats.deleted,
        copied = stats.copied_files,
        dirs = stats.created_dirs,
        "synchronization complete"
    );
    Ok(stats)
}

/// [`synchronize`], then invoke `hook` with the resolved absolute destination
/// directory.
pub fn synchronize_with_hook<F>(
    source_dir: &Path,
    source_exclude: &PatternInput,
    dest_dir: &Path,
    dest_exclude: &PatternInput,
    hook: F,
) -> Result<SyncStats, SyncError>
where
    F: FnOnce(&Path),
{
    let stats = synchronize(source_dir, source_exclude, dest_dir, dest_exclude)?;
    let resolved = dest_dir
        .canonicalize()
        .map_err(|e| SyncError::io(dest_dir, e))?;
    hook(&resolved);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, rel.as_bytes()).unwrap();
    }

    #[test]
    fn test_plan_separates_delete_and_copy_sets() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        touch(src.path(), "a.txt");
        touch(dest.path(), "old.txt");
        touch(dest.path(), ".git/HEAD");

        let plan = plan(
            src.path(),
            &PatternInput::from(".git/**"),
            dest.path(),
            &PatternInput::from(".git/**"),
        );
        assert!(plan.to_delete.contains("old.txt"));
        assert!(!plan.to_delete.iter().any(|p| p.starts_with(".git")));
        assert_eq!(plan.to_copy.iter().collect::<Vec<_>>(), vec!["a.txt"]);
    }

    #[test]
    fn test_hook_receives_resolved_destination() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        touch(src.path(), "a.txt");

        let mut seen = None;
        synchronize_with_hook(
            src.path(),
            &PatternInput::empty(),
            dest.path(),
            &PatternInput::empty(),
            |resolved| seen = Some(resolved.to_path_buf()),
        )
        .unwrap();

        assert_eq!(seen.unwrap(), dest.path().canonicalize().unwrap());
    }
}
