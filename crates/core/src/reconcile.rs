//! Include/exclude set reconciliation.
//!
//! [`reconcile`] decides which relative paths survive in a tree given an
//! include pattern set and an exclude pattern set:
//!
//! ```text
//! result = union(include matches)
//!        − union(exclude matches)
//!        − [optionally] ancestors of the exclude matches
//! ```
//!
//! Ancestor protection exists so that excluding a leaf (say `.git/HEAD`) also
//! exempts the directories that exist only to contain it — without it, a
//! delete pass driven by `**/*` would remove `.git` out from under the
//! excluded file.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use crate::patterns::{match_pattern, MatchOptions, PatternInput};

/// Compute the set of relative paths kept after applying include and exclude
/// pattern sets against `base_dir`.
///
/// With `protect_ancestors`, every strict parent directory of an excluded
/// match is excluded as well. The parent walk stops at the traversal root —
/// it never produces `.`, an empty component, or an absolute path.
///
/// An exclude pattern that matches nothing is a no-op. A path excluded but
/// never included was never eligible to begin with; exclusion does not have
/// to intersect the include set.
pub fn reconcile(
    include: &PatternInput,
    exclude: &PatternInput,
    base_dir: &Path,
    options: MatchOptions,
    protect_ancestors: bool,
) -> BTreeSet<String> {
    let mut included = BTreeSet::new();
    for pattern in include.flatten() {
        included.extend(match_pattern(&pattern, base_dir, options));
    }

    let mut excluded = BTreeSet::new();
    for pattern in exclude.flatten() {
        let matches = match_pattern(&pattern, base_dir, options);
        if protect_ancestors {
            for path in &matches {
                for ancestor in ancestors_of(path) {
                    // Once an ancestor is recorded, everything above it
                    // already is too.
                    if !excluded.insert(ancestor) {
                        break;
                    }
                }
            }
        }
        excluded.extend(matches);
    }

    let result: BTreeSet<String> = included.difference(&excluded).cloned().collect();
    debug!(
        included = included.len(),
        excluded = excluded.len(),
        kept = result.len(),
        "reconciled pattern sets"
    );
    result
}

/// The strict parent directories of a normalized relative path, nearest
/// first, up to (not including) the traversal root.
pub fn ancestors_of(path: &str) -> Vec<String> {
    let mut ancestors = Vec::new();
    let mut current = path;
    while let Some(idx) = current.rfind('/') {
        current = &current[..idx];
        if current.is_empty() || current == "." {
            break;
        }
        ancestors.push(current.to_string());
    }
    ancestors
}
