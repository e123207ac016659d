//! Command-line interface definitions for the `bricksweep` binaries.
//!
//! This module centralises the clap parser structures so both binaries and
//! the build script can reuse them when generating the manual pages. Flag
//! names keep the underscore spelling operators already script against.

use clap::{Parser, ValueEnum};

/// Arguments for the `bricksweep` binary.
#[derive(Debug, Parser)]
#[command(
    name = "bricksweep",
    about = "Delete stale Databricks account and Unity Catalog resources"
)]
pub struct SweepCli {
    /// Databricks account id.
    #[arg(long = "databricks_account_id", env = "DATABRICKS_ACCOUNT_ID")]
    pub databricks_account_id: String,
    /// Deployment name of the workspace whose Unity Catalog objects are
    /// swept.
    #[arg(long = "databricks_workspace_id", env = "DATABRICKS_WORKSPACE_ID")]
    pub databricks_workspace_id: String,
    /// Service principal client id.
    #[arg(long = "client_id", env = "DATABRICKS_CLIENT_ID")]
    pub client_id: String,
    /// Service principal client secret.
    #[arg(long = "client_secret", env = "DATABRICKS_CLIENT_SECRET")]
    pub client_secret: String,
    /// Delete resources whose name starts with this prefix instead of
    /// selecting by age.
    #[arg(long)]
    pub prefix: Option<String>,
    /// Log what would be deleted without deleting anything.
    #[arg(long = "dry_run")]
    pub dry_run: bool,
    /// Age in days after which unprefixed resources are deleted. Overrides
    /// the configured value.
    #[arg(long = "max_age_days", value_name = "DAYS")]
    pub max_age_days: Option<u32>,
    /// What to do when a sweep stage fails.
    #[arg(long = "on_failure", value_enum, default_value_t = FailureMode::Abort)]
    pub on_failure: FailureMode,
}

/// Arguments for the `bricksweep-update` binary.
#[derive(Debug, Parser)]
#[command(
    name = "bricksweep-update",
    about = "Reconfigure workshop clusters and workspace permissions"
)]
pub struct UpdateCli {
    /// Databricks account id.
    #[arg(long = "databricks_account_id", env = "DATABRICKS_ACCOUNT_ID")]
    pub databricks_account_id: String,
    /// Service principal client id.
    #[arg(long = "client_id", env = "DATABRICKS_CLIENT_ID")]
    pub client_id: String,
    /// Service principal client secret.
    #[arg(long = "client_secret", env = "DATABRICKS_CLIENT_SECRET")]
    pub client_secret: String,
    /// Log what would change without changing anything.
    #[arg(long = "dry_run")]
    pub dry_run: bool,
    /// Operation to perform.
    #[arg(long, value_enum, default_value_t = UpdateAction::UpdateClusters)]
    pub action: UpdateAction,
    /// Only process this deployment. Overrides the configured target.
    #[arg(long = "deployment_name", value_name = "NAME")]
    pub deployment_name: Option<String>,
}

/// Failure handling accepted by `--on_failure`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum FailureMode {
    /// Stop at the first failure.
    #[default]
    Abort,
    /// Keep going past throttling, server and transport errors.
    ContinueRetryable,
    /// Keep going past every failure.
    Continue,
}

/// Operations offered by `bricksweep-update`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum UpdateAction {
    /// Rewrite every cluster to the workshop shape.
    #[default]
    UpdateClusters,
    /// Start every cluster.
    StartClusters,
    /// Grant the admin principal admin on every workspace.
    GrantAdmin,
}
