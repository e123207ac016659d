//! Core library for the `bricksweep` Databricks clean-up tools.
//!
//! The crate authenticates a service principal against the account console,
//! then sweeps account resources (users, metastores, workspaces, networks,
//! storage and credential configurations) and one workspace's Unity Catalog
//! objects by name prefix or age. A second tool rewrites workshop clusters
//! and workspace permissions.

pub mod api;
pub mod assignments;
pub mod auth;
pub mod cli;
pub mod clusters;
pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod policy;
pub mod resource;
pub mod sweep;
pub mod test_support;

pub use api::{AccountClient, ApiClient, ApiError, Severity, WorkspaceClient};
pub use assignments::{GrantReport, WorkspaceDirectory, grant_workspace_admin};
pub use auth::{AccessToken, AuthError, ClientCredentials, fetch_token};
pub use clusters::{ClusterApi, ClusterError, ClusterReport, ClusterTemplate, ClusterUpdater};
pub use config::{ClusterConfig, ConfigError, PlatformConfig};
pub use orchestrator::{FailurePolicy, Flow, RunSummary, Stage};
pub use policy::{Decision, Protection, Reason, RetentionPolicy, Selector};
pub use resource::{Resource, ResourceKind, Scope};
pub use sweep::{ResourceApi, SweepContext, SweepError, SweepReport, SweepRule, Sweeper};
