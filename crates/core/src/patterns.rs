//! Glob pattern inputs and filesystem matching.
//!
//! Patterns arrive from config files and callers either as a single glob
//! string or as arbitrarily nested groups of them ([`PatternInput`]); they are
//! flattened once at the boundary and treated as a set from then on — only
//! membership matters, never order.
//!
//! [`match_pattern`] evaluates one glob against a base directory and returns
//! the set of matching relative paths. Matching is done against
//! forward-slash-normalized relative paths so the resulting sets compare
//! consistently across platforms.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// Pattern input
// ---------------------------------------------------------------------------

/// A glob pattern, or an arbitrarily nested group of them.
///
/// Deserializes from either a bare string or a (possibly nested) array of
/// strings, so config files can write `ignore = "*.log"` as well as
/// `ignore = ["*.log", ["build/**", "dist/**"]]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PatternInput {
    /// A single glob pattern.
    Pattern(String),
    /// A nested group of pattern inputs.
    Group(Vec<PatternInput>),
}

impl PatternInput {
    /// An empty pattern set.
    pub fn empty() -> Self {
        Self::Group(Vec::new())
    }

    /// Flatten the nested structure into a flat pattern list.
    ///
    /// Duplicates are not removed here; downstream consumers accumulate
    /// matches via set union, which collapses them.
    pub fn flatten(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut Vec<String>) {
        match self {
            Self::Pattern(p) => out.push(p.clone()),
            Self::Group(group) => {
                for input in group {
                    input.flatten_into(out);
                }
            }
        }
    }

    /// A new input with `pattern` appended; the receiver is not mutated.
    pub fn with_appended(&self, pattern: &str) -> Self {
        let mut flat = self.flatten();
        flat.push(pattern.to_string());
        Self::Group(flat.into_iter().map(Self::Pattern).collect())
    }
}

impl Default for PatternInput {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for PatternInput {
    fn from(pattern: &str) -> Self {
        Self::Pattern(pattern.to_string())
    }
}

impl From<String> for PatternInput {
    fn from(pattern: String) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<Vec<String>> for PatternInput {
    fn from(patterns: Vec<String>) -> Self {
        Self::Group(patterns.into_iter().map(Self::Pattern).collect())
    }
}

// ---------------------------------------------------------------------------
// Match options
// ---------------------------------------------------------------------------

/// Options for [`match_pattern`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Include entries with a dot-leading path component.
    ///
    /// When `false`, hidden entries still match a pattern that spells a
    /// dot-leading component itself (e.g. `.git/**`).
    pub include_hidden: bool,
}

impl MatchOptions {
    /// Options with hidden entries included.
    pub fn hidden() -> Self {
        Self {
            include_hidden: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Evaluate one glob `pattern` against `base_dir`.
///
/// Returns the set of matching paths — files and directories — relative to
/// `base_dir`, normalized to forward slashes. Every intermediate directory is
/// listed as its own entry, so `**/*` enumerates directories explicitly. A
/// pattern that matches nothing yields an empty set; it is never an error.
///
/// Traversal is read-only. Entries that cannot be read (permission, broken
/// link) are skipped with a debug log; real I/O failures surface later from
/// whichever copy/delete pass touches the path.
pub fn match_pattern(pattern: &str, base_dir: &Path, options: MatchOptions) -> BTreeSet<String> {
    let mut matches = BTreeSet::new();
    if !base_dir.is_dir() {
        return matches;
    }

    let allow_hidden = options.include_hidden || pattern_spells_hidden(pattern);

    for entry in WalkDir::new(base_dir).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(%err, "skipping unreadable entry during pattern match");
                continue;
            }
        };
        let rel = match entry.path().strip_prefix(base_dir) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let rel = normalize_rel_path(rel);
        if !allow_hidden && has_hidden_component(&rel) {
            continue;
        }
        if glob_match::glob_match(pattern, &rel) {
            matches.insert(rel);
        }
    }

    debug!(pattern, count = matches.len(), "pattern matched");
    matches
}

/// Normalize a relative path to forward-slash form.
fn normalize_rel_path(rel: &Path) -> String {
    let s = rel.to_string_lossy();
    if s.contains('\\') {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}

/// Whether any path component starts with the hidden-file marker.
fn has_hidden_component(rel: &str) -> bool {
    rel.split('/').any(|c| c.starts_with('.'))
}

/// Whether the pattern itself spells a dot-leading component, in which case
/// hidden entries are eligible even without `include_hidden`.
fn pattern_spells_hidden(pattern: &str) -> bool {
    pattern.split('/').any(|c| c.starts_with('.'))
}
