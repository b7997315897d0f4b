//! Sequential step pipeline with skip-on-no-change semantics.
//!
//! A deploy is an ordered list of steps — git invocations, the tree
//! synchronizer, the post-deploy hook — executed strictly one at a time. A
//! step can finish in one of two ways, modeled as an explicit tagged result
//! rather than a callback convention:
//!
//! - [`StepOutcome::Success`], optionally raising `skip_rest` so that the
//!   remaining steps are told there is nothing left to do (e.g. a clean
//!   `git status` short-circuits the commit and push that follow, without
//!   that being an error);
//! - [`StepOutcome::Failure`], which aborts the pipeline immediately and
//!   propagates the error to the caller.
//!
//! Once raised, the skip flag is sticky for every remaining step. There is no
//! cancellation and no retry; a hung step blocks the pipeline.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::errors::DeployError;

// ---------------------------------------------------------------------------
// Step contract
// ---------------------------------------------------------------------------

/// How a pipeline step finished.
#[derive(Debug)]
pub enum StepOutcome {
    /// The step completed; with `skip_rest`, subsequent steps receive
    /// `skip = true`.
    Success { skip_rest: bool },
    /// The step failed; the pipeline stops here.
    Failure(DeployError),
}

impl StepOutcome {
    /// Plain success without skip escalation.
    pub fn success() -> Self {
        Self::Success { skip_rest: false }
    }

    /// Success that declares the remaining steps unnecessary.
    pub fn skip_rest() -> Self {
        Self::Success { skip_rest: true }
    }
}

/// A unit of sequential deploy work.
///
/// `run` is invoked exactly once. `skip` is true when an earlier step raised
/// `skip_rest`; a skipped step must not perform observable side effects.
#[async_trait]
pub trait PipelineStep: Send {
    /// Short human-readable description, used in log lines.
    fn describe(&self) -> String;

    /// Execute the step.
    async fn run(&mut self, skip: bool) -> StepOutcome;
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Execute `steps` in order.
///
/// The next step starts only after the previous one resolves. The first
/// [`StepOutcome::Failure`] aborts the run and propagates its error; no
/// further step is invoked after a failure.
pub async fn run_pipeline(steps: Vec<Box<dyn PipelineStep>>) -> Result<(), DeployError> {
    let mut skip = false;
    for mut step in steps {
        debug!(step = %step.describe(), skip, "running pipeline step");
        match step.run(skip).await {
            StepOutcome::Success { skip_rest } => {
                if skip_rest && !skip {
                    info!(step = %step.describe(), "skipping remaining pipeline steps");
                    skip = true;
                }
            }
            StepOutcome::Failure(err) => {
                warn!(step = %step.describe(), error = %err, "pipeline step failed");
                return Err(err);
            }
        }
    }
    Ok(())
}
