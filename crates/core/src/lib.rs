//! gitdeploy core library.
//!
//! This crate provides the machinery for publishing build output into a
//! branch of a remote git repository: glob pattern matching and
//! include/exclude set reconciliation, tree synchronization that preserves
//! repository metadata, a sequential step pipeline with skip-on-no-change
//! semantics, git CLI steps, and the deploy entry point that wires them
//! together.

pub mod config;
pub mod deploy;
pub mod errors;
pub mod git;
pub mod patterns;
pub mod pipeline;
pub mod reconcile;
pub mod sync;

// Re-exports for convenience.
pub use config::DeployConfig;
pub use deploy::{deploy, deploy_with_hook, DeployOptions, PostDeployHook, GIT_METADATA_PATTERN};
pub use errors::DeployError;
pub use patterns::{MatchOptions, PatternInput};
pub use pipeline::{run_pipeline, PipelineStep, StepOutcome};
pub use reconcile::reconcile;
pub use sync::{plan, synchronize, SyncPlan, SyncStats};
