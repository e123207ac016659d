//! Runs the sweepers in order and applies the failure policy.
//!
//! Account-scoped kinds go first (users, metastores, workspaces, networks,
//! storage configurations, credentials), then the Unity Catalog kinds of the
//! chosen workspace. Nothing is rolled back when a stage fails.

use std::fmt;

use tracing::{error, info};

use crate::api::{AccountClient, ApiError, Severity, WorkspaceClient};
use crate::cli::FailureMode;
use crate::config::PlatformConfig;
use crate::resource::ResourceKind;
use crate::sweep::{ResourceApi, SweepContext, SweepError, SweepReport, SweepRule, Sweeper};

/// What to do after a stage fails.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FailurePolicy {
    /// Stop at the first failure.
    #[default]
    Abort,
    /// Keep going past retryable failures; stop on fatal ones.
    ContinueRetryable,
    /// Record every failure and keep going.
    Continue,
}

/// Control flow chosen by a [`FailurePolicy`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    /// Stop the run.
    Abort,
    /// Move on to the next stage.
    Continue,
}

impl FailurePolicy {
    /// Flow after a failure of the given severity.
    #[must_use]
    pub const fn on_failure(self, severity: Severity) -> Flow {
        match (self, severity) {
            (Self::Continue, _) | (Self::ContinueRetryable, Severity::Retryable) => Flow::Continue,
            _ => Flow::Abort,
        }
    }
}

impl From<FailureMode> for FailurePolicy {
    fn from(value: FailureMode) -> Self {
        match value {
            FailureMode::Abort => Self::Abort,
            FailureMode::ContinueRetryable => Self::ContinueRetryable,
            FailureMode::Continue => Self::Continue,
        }
    }
}

/// A sweeper over a type-erased collection.
pub struct Stage<'a> {
    sweeper: Sweeper<Box<dyn ResourceApi + Send + Sync + 'a>>,
}

impl<'a> Stage<'a> {
    /// Wraps `api` with `rule`.
    #[must_use]
    pub fn new<A>(api: A, rule: SweepRule) -> Self
    where
        A: ResourceApi + Send + Sync + 'a,
    {
        let boxed: Box<dyn ResourceApi + Send + Sync + 'a> = Box::new(api);
        Self {
            sweeper: Sweeper::new(boxed, rule),
        }
    }

    /// Kind swept by this stage.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.sweeper.rule().kind
    }
}

impl fmt::Debug for Stage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("rule", self.sweeper.rule())
            .finish_non_exhaustive()
    }
}

/// Builds the full stage list: every account kind, then every Unity Catalog
/// kind of `workspace`.
///
/// # Errors
///
/// Returns [`ApiError::Unsupported`] when a kind is paired with the wrong
/// client, which indicates a mismatch in [`ResourceKind::ACCOUNT`] or
/// [`ResourceKind::WORKSPACE`].
pub fn sweep_stages<'a>(
    account: &'a AccountClient,
    workspace: &'a WorkspaceClient,
    config: &PlatformConfig,
) -> Result<Vec<Stage<'a>>, ApiError> {
    let mut stages = Vec::with_capacity(ResourceKind::ACCOUNT.len() + ResourceKind::WORKSPACE.len());
    for kind in ResourceKind::ACCOUNT {
        stages.push(Stage::new(
            account.collection(kind)?,
            SweepRule::for_kind(kind, config),
        ));
    }
    for kind in ResourceKind::WORKSPACE {
        stages.push(Stage::new(
            workspace.collection(kind)?,
            SweepRule::for_kind(kind, config),
        ));
    }
    Ok(stages)
}

/// Result of a full run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    /// Reports of stages that completed, in run order.
    pub reports: Vec<SweepReport>,
    /// Failures recorded, in run order.
    pub failures: Vec<SweepError>,
    /// Whether the policy stopped the run early.
    pub aborted: bool,
}

impl RunSummary {
    /// Returns `true` when every stage completed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total delete calls issued.
    #[must_use]
    pub fn deleted(&self) -> usize {
        self.reports.iter().map(|report| report.deleted).sum()
    }
}

/// Runs `stages` in order.
pub async fn run(stages: &[Stage<'_>], ctx: &SweepContext, policy: FailurePolicy) -> RunSummary {
    let mut summary = RunSummary::default();
    for stage in stages {
        info!("Sweeping {}", stage.kind());
        match stage.sweeper.sweep(ctx).await {
            Ok(report) => summary.reports.push(report),
            Err(err) => {
                error!("{err}");
                let flow = policy.on_failure(err.source.severity());
                summary.failures.push(err);
                if flow == Flow::Abort {
                    summary.aborted = true;
                    break;
                }
            }
        }
    }
    summary
}
