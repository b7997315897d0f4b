//! The deploy entry point: publish a source tree to a branch of a remote
//! git repository.
//!
//! A deploy clones the remote into a scratch working tree, synchronizes the
//! source into it (preserving `.git/**` and any caller-protected paths),
//! commits, optionally tags, and pushes. When the remote already has the
//! target branch it is cloned directly; otherwise the branch is created fresh
//! after a plain clone. A clean `git status` after staging short-circuits the
//! commit and push — republishing identical output is not an error, it is a
//! no-op.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{ConfigError, DeployError, SyncError};
use crate::git::{branch_exists, GitStep};
use crate::patterns::PatternInput;
use crate::pipeline::{run_pipeline, PipelineStep, StepOutcome};
use crate::sync::synchronize;

/// Pattern protecting version-control metadata. Appended to both ignore sets
/// on every deploy, regardless of caller input.
pub const GIT_METADATA_PATTERN: &str = ".git/**";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for one deploy run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployOptions {
    /// Directory holding the build output to publish. Must exist.
    pub src: PathBuf,

    /// Scratch working-tree directory. Deleted and recreated per run.
    #[serde(default = "default_tmp")]
    pub tmp: PathBuf,

    /// Remote git repository URL.
    #[serde(default)]
    pub url: String,

    /// Environment variable holding the remote URL (e.g. one carrying an
    /// access token). Resolved at config-load time when `url` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_env: Option<String>,

    /// Target branch name.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Commit message.
    #[serde(default = "default_message")]
    pub message: String,

    /// Annotated tag to create after the commit. None = no tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Tag annotation message.
    #[serde(default = "default_message")]
    pub tag_message: String,

    /// Patterns excluded from the source copy.
    #[serde(default)]
    pub src_ignore_patterns: PatternInput,

    /// Patterns protected from deletion in the working tree.
    #[serde(default)]
    pub repo_ignore_patterns: PatternInput,
}

fn default_tmp() -> PathBuf {
    PathBuf::from("tmp/deployDir")
}
fn default_branch() -> String {
    "master".into()
}
fn default_message() -> String {
    "autocommit".into()
}

impl DeployOptions {
    /// Options for deploying `src` to `url` with all defaults.
    pub fn new(src: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            tmp: default_tmp(),
            url: url.into(),
            url_env: None,
            branch: default_branch(),
            message: default_message(),
            tag: None,
            tag_message: default_message(),
            src_ignore_patterns: PatternInput::empty(),
            repo_ignore_patterns: PatternInput::empty(),
        }
    }

    /// Check the required fields. Called before any pipeline work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.src.is_dir() {
            return Err(ConfigError::SourceDirMissing(self.src.clone()));
        }
        if self.url.trim().is_empty() {
            return Err(ConfigError::UrlMissing);
        }
        Ok(())
    }
}

/// Callback invoked with the resolved scratch directory after the source
/// tree has been copied in, before staging.
pub type PostDeployHook = Box<dyn FnOnce(&Path) + Send>;

// ---------------------------------------------------------------------------
// Pipeline adapters
// ---------------------------------------------------------------------------

/// Tree synchronization as a pipeline step.
struct SyncStep {
    source: PathBuf,
    source_exclude: PatternInput,
    dest: PathBuf,
    dest_exclude: PatternInput,
}

#[async_trait]
impl PipelineStep for SyncStep {
    fn describe(&self) -> String {
        format!(
            "copy {} into {}",
            self.source.display(),
            self.dest.display()
        )
    }

    async fn run(&mut self, skip: bool) -> StepOutcome {
        if skip {
            return StepOutcome::success();
        }
        match synchronize(
            &self.source,
            &self.source_exclude,
            &self.dest,
            &self.dest_exclude,
        ) {
            Ok(_) => StepOutcome::success(),
            Err(err) => StepOutcome::Failure(err.into()),
        }
    }
}

/// Post-deploy hook as a pipeline step.
struct HookStep {
    dir: PathBuf,
    hook: Option<PostDeployHook>,
}

#[async_trait]
impl PipelineStep for HookStep {
    fn describe(&self) -> String {
        "post-deploy hook".into()
    }

    async fn run(&mut self, skip: bool) -> StepOutcome {
        let Some(hook) = self.hook.take() else {
            return StepOutcome::success();
        };
        if skip {
            return StepOutcome::success();
        }
        info!(dir = %self.dir.display(), "executing post-deploy hook");
        let resolved = match self.dir.canonicalize() {
            Ok(resolved) => resolved,
            Err(err) => return StepOutcome::Failure(SyncError::io(&self.dir, err).into()),
        };
        hook(&resolved);
        StepOutcome::success()
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run a full deploy: clone, synchronize, commit, optionally tag, push.
pub async fn deploy(options: DeployOptions) -> Result<(), DeployError> {
    deploy_with_hook(options, None).await
}

/// [`deploy`] with an optional post-synchronization hook.
pub async fn deploy_with_hook(
    options: DeployOptions,
    hook: Option<PostDeployHook>,
) -> Result<(), DeployError> {
    options.validate()?;

    // Fresh pattern sets; the caller's inputs are never mutated.
    let src_ignore = options.src_ignore_patterns.with_appended(GIT_METADATA_PATTERN);
    let repo_ignore = options
        .repo_ignore_patterns
        .with_appended(GIT_METADATA_PATTERN);

    prepare_scratch_dir(&options.tmp)?;

    let branch_present = branch_exists(&options.url, &options.branch).await?;
    info!(
        branch = options.branch.as_str(),
        present = branch_present,
        "probed target branch"
    );

    let steps = assemble_steps(&options, src_ignore, repo_ignore, branch_present, hook);
    run_pipeline(steps).await
}

/// Delete any pre-existing scratch directory and recreate it empty.
fn prepare_scratch_dir(tmp: &Path) -> Result<(), SyncError> {
    if tmp.exists() {
        fs::remove_dir_all(tmp).map_err(|e| SyncError::io(tmp, e))?;
    }
    fs::create_dir_all(tmp).map_err(|e| SyncError::io(tmp, e))?;
    debug!(dir = %tmp.display(), "prepared scratch working tree");
    Ok(())
}

/// Build the ordered step list for a deploy.
///
/// With the branch present on the remote it is cloned directly and a
/// `status --porcelain` after staging gates the commit/push pair; with the
/// branch missing there is nothing to diff against, so the status gate is
/// omitted and the (possibly empty) first commit is always made.
fn assemble_steps(
    options: &DeployOptions,
    src_ignore: PatternInput,
    repo_ignore: PatternInput,
    branch_present: bool,
    hook: Option<PostDeployHook>,
) -> Vec<Box<dyn PipelineStep>> {
    let cwd = options.tmp.clone();
    let sync_step = Box::new(SyncStep {
        source: options.src.clone(),
        source_exclude: src_ignore,
        dest: options.tmp.clone(),
        dest_exclude: repo_ignore,
    });
    let hook_step = Box::new(HookStep {
        dir: options.tmp.clone(),
        hook,
    });

    let mut steps: Vec<Box<dyn PipelineStep>> = Vec::new();
    if branch_present {
        steps.push(GitStep::boxed(
            [
                "clone",
                "-b",
                options.branch.as_str(),
                options.url.as_str(),
                ".",
            ],
            &cwd,
        ));
        steps.push(sync_step);
        steps.push(hook_step);
        steps.push(GitStep::boxed(["add", "--all"], &cwd));
        steps.push(GitStep::boxed(["status", "--porcelain"], &cwd));
    } else {
        steps.push(GitStep::boxed(["clone", options.url.as_str(), "."], &cwd));
        steps.push(GitStep::boxed(
            ["checkout", "-B", options.branch.as_str()],
            &cwd,
        ));
        steps.push(sync_step);
        steps.push(hook_step);
        steps.push(GitStep::boxed(["add", "--all"], &cwd));
    }

    steps.push(GitStep::boxed(
        [
            "commit".to_string(),
            "--allow-empty".to_string(),
            format!("--message={}", options.message),
        ],
        &cwd,
    ));
    if let Some(tag) = &options.tag {
        steps.push(GitStep::boxed(
            ["tag", "-a", tag.as_str(), "-m", options.tag_message.as_str()],
            &cwd,
        ));
    }
    steps.push(GitStep::boxed(
        [
            "push",
            "--prune",
            "--quiet",
            "--follow-tags",
            options.url.as_str(),
            options.branch.as_str(),
        ],
        &cwd,
    ));

    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe_all(steps: &[Box<dyn PipelineStep>]) -> Vec<String> {
        steps.iter().map(|s| s.describe()).collect()
    }

    #[test]
    fn test_defaults() {
        let options = DeployOptions::new("dist", "https://example.com/repo.git");
        assert_eq!(options.tmp, PathBuf::from("tmp/deployDir"));
        assert_eq!(options.branch, "master");
        assert_eq!(options.message, "autocommit");
        assert_eq!(options.tag, None);
        assert_eq!(options.tag_message, "autocommit");
    }

    #[test]
    fn test_validate_rejects_missing_source() {
        let options = DeployOptions::new("/no/such/source", "https://example.com/repo.git");
        assert!(matches!(
            options.validate(),
            Err(ConfigError::SourceDirMissing(_))
        ));
    }

    #[test]
    fn test_validate_rejects_missing_url() {
        let dir = tempfile::tempdir().unwrap();
        let options = DeployOptions::new(dir.path(), "");
        assert!(matches!(options.validate(), Err(ConfigError::UrlMissing)));
    }

    #[tokio::test]
    async fn test_deploy_fails_fast_on_invalid_options() {
        let err = deploy(DeployOptions::new("/no/such/source", "https://x/y.git"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeployError::Config(ConfigError::SourceDirMissing(_))
        ));
    }

    #[test]
    fn test_step_sequence_for_existing_branch() {
        let mut options = DeployOptions::new("dist", "https://example.com/repo.git");
        options.tag = Some("v1.0.0".into());
        let steps = assemble_steps(
            &options,
            PatternInput::from(GIT_METADATA_PATTERN),
            PatternInput::from(GIT_METADATA_PATTERN),
            true,
            None,
        );
        assert_eq!(
            describe_all(&steps),
            vec![
                "git clone -b master https://example.com/repo.git .",
                "copy dist into tmp/deployDir",
                "post-deploy hook",
                "git add --all",
                "git status --porcelain",
                "git commit --allow-empty --message=autocommit",
                "git tag -a v1.0.0 -m autocommit",
                "git push --prune --quiet --follow-tags https://example.com/repo.git master",
            ]
        );
    }

    #[test]
    fn test_step_sequence_for_missing_branch() {
        let options = DeployOptions::new("dist", "https://example.com/repo.git");
        let steps = assemble_steps(
            &options,
            PatternInput::empty(),
            PatternInput::empty(),
            false,
            None,
        );
        let described = describe_all(&steps);
        // A fresh branch is created after a plain clone, and there is no
        // status gate: the first commit is always made.
        assert_eq!(described[0], "git clone https://example.com/repo.git .");
        assert_eq!(described[1], "git checkout -B master");
        assert!(!described.iter().any(|d| d.starts_with("git status")));
        assert!(described.iter().any(|d| d.starts_with("git commit")));
    }

    #[test]
    fn test_ignore_inputs_not_mutated_by_deploy_assembly() {
        let caller_patterns = PatternInput::from(vec!["*.map".to_string()]);
        let protected = caller_patterns.with_appended(GIT_METADATA_PATTERN);
        assert_eq!(caller_patterns.flatten(), vec!["*.map"]);
        assert_eq!(protected.flatten(), vec!["*.map", GIT_METADATA_PATTERN]);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: DeployOptions = toml::from_str(
            r#"
src = "dist"
url = "https://example.com/repo.git"
src_ignore_patterns = ["*.map", ["*.d.ts"]]
"#,
        )
        .unwrap();
        assert_eq!(options.branch, "master");
        assert_eq!(options.tmp, PathBuf::from("tmp/deployDir"));
        assert_eq!(
            options.src_ignore_patterns.flatten(),
            vec!["*.map", "*.d.ts"]
        );
    }
}
