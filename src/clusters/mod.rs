//! Cluster rewrites for workshop workspaces.
//!
//! Every cluster in a workspace is turned into the same single-node,
//! single-user shape, pinned to the workspace's first instance profile and
//! pointed at a default catalog derived from the deployment name.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::info;

use crate::api::{
    ApiError, ApiFuture, ClusterEdit, ClusterInfo, InstanceProfile, WorkspaceClient,
    models::AwsAttributes,
};
use crate::assignments::WorkspaceDirectory;
use crate::config::ClusterConfig;

const INITIAL_CATALOG_KEY: &str = "spark.databricks.sql.initial.catalog.name";
const SPARK_MASTER_KEY: &str = "spark.master";

static DIGITS: LazyLock<Regex> = LazyLock::new(digit_pattern);

#[expect(clippy::expect_used, reason = "the pattern is a valid literal")]
fn digit_pattern() -> Regex {
    Regex::new(r"\d+").expect("digit pattern compiles")
}

/// Workspace calls needed by the cluster updater.
pub trait ClusterApi {
    /// Lists every cluster.
    fn list_clusters(&self) -> ApiFuture<'_, Vec<ClusterInfo>>;

    /// Lists registered instance profiles.
    fn list_instance_profiles(&self) -> ApiFuture<'_, Vec<InstanceProfile>>;

    /// Replaces a cluster's specification.
    fn edit_cluster<'a>(&'a self, edit: &'a ClusterEdit) -> ApiFuture<'a, ()>;

    /// Starts a cluster.
    fn start_cluster<'a>(&'a self, cluster_id: &'a str) -> ApiFuture<'a, ()>;
}

impl ClusterApi for WorkspaceClient {
    fn list_clusters(&self) -> ApiFuture<'_, Vec<ClusterInfo>> {
        Box::pin(Self::list_clusters(self))
    }

    fn list_instance_profiles(&self) -> ApiFuture<'_, Vec<InstanceProfile>> {
        Box::pin(Self::list_instance_profiles(self))
    }

    fn edit_cluster<'a>(&'a self, edit: &'a ClusterEdit) -> ApiFuture<'a, ()> {
        Box::pin(Self::edit_cluster(self, edit))
    }

    fn start_cluster<'a>(&'a self, cluster_id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(Self::start_cluster(self, cluster_id))
    }
}

/// Errors raised while rewriting or starting clusters.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ClusterError {
    /// Raised when an API call fails.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Raised when the workspace has no instance profile to attach.
    #[error("no instance profile registered in the workspace")]
    NoInstanceProfile,
    /// Raised when the deployment name carries no digits for the catalog.
    #[error("deployment name {deployment} contains no digits")]
    NoDeploymentDigits {
        /// Deployment name as listed.
        deployment: String,
    },
}

/// Returns the first run of digits in a deployment name.
///
/// # Errors
///
/// Returns [`ClusterError::NoDeploymentDigits`] when there are none.
pub fn deployment_digits(deployment: &str) -> Result<String, ClusterError> {
    DIGITS
        .find(deployment)
        .map(|found| found.as_str().to_owned())
        .ok_or_else(|| ClusterError::NoDeploymentDigits {
            deployment: deployment.to_owned(),
        })
}

/// Target shape for rewritten clusters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterTemplate {
    config: ClusterConfig,
    single_user: String,
}

impl ClusterTemplate {
    /// Creates a template owned by `single_user`.
    #[must_use]
    pub fn new(config: ClusterConfig, single_user: impl Into<String>) -> Self {
        Self {
            config,
            single_user: single_user.into(),
        }
    }

    /// Default catalog for a deployment, `catalog_<digits>` by default.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NoDeploymentDigits`] when the deployment name
    /// has no digits.
    pub fn default_catalog(&self, deployment: &str) -> Result<String, ClusterError> {
        let digits = deployment_digits(deployment)?;
        Ok(format!("{}{digits}", self.config.catalog_prefix))
    }

    /// Builds the edit request for one cluster.
    #[must_use]
    pub fn edit_for(
        &self,
        cluster_id: &str,
        instance_profile_arn: &str,
        default_catalog: &str,
    ) -> ClusterEdit {
        let spark_conf = BTreeMap::from([
            (
                String::from(SPARK_MASTER_KEY),
                self.config.spark_master.clone(),
            ),
            (
                String::from(INITIAL_CATALOG_KEY),
                default_catalog.to_owned(),
            ),
        ]);
        ClusterEdit {
            cluster_id: cluster_id.to_owned(),
            cluster_name: self.config.cluster_name.clone(),
            spark_version: self.config.spark_version.clone(),
            node_type_id: self.config.node_type_id.clone(),
            driver_node_type_id: self.config.node_type_id.clone(),
            num_workers: 0,
            data_security_mode: String::from("SINGLE_USER"),
            single_user_name: self.single_user.clone(),
            runtime_engine: String::from("STANDARD"),
            aws_attributes: AwsAttributes {
                availability: String::from("ON_DEMAND"),
                ebs_volume_count: 0,
                instance_profile_arn: instance_profile_arn.to_owned(),
            },
            spark_conf,
            autotermination_minutes: self.config.autotermination_minutes,
        }
    }
}

/// What a cluster pass did.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClusterReport {
    /// Clusters listed.
    pub examined: usize,
    /// Edit calls issued.
    pub updated: usize,
    /// Start calls issued.
    pub started: usize,
}

/// Rewrites or starts every cluster in one workspace.
#[derive(Clone, Debug)]
pub struct ClusterUpdater<C: ClusterApi> {
    api: C,
    template: ClusterTemplate,
    dry_run: bool,
}

impl<C: ClusterApi> ClusterUpdater<C> {
    /// Creates an updater.
    #[must_use]
    pub const fn new(api: C, template: ClusterTemplate, dry_run: bool) -> Self {
        Self {
            api,
            template,
            dry_run,
        }
    }

    /// Rewrites every cluster to the template shape.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError`] when a call fails, the workspace has no
    /// instance profile, or the deployment name has no digits. Clusters
    /// edited before the failure stay edited.
    pub async fn update_clusters(&self, deployment: &str) -> Result<ClusterReport, ClusterError> {
        let clusters = self.api.list_clusters().await?;
        let mut report = ClusterReport {
            examined: clusters.len(),
            ..ClusterReport::default()
        };
        if self.dry_run {
            for cluster in &clusters {
                info!("Would Update Cluster: {}", cluster.cluster_id);
            }
            return Ok(report);
        }
        if clusters.is_empty() {
            return Ok(report);
        }

        let profile = self
            .api
            .list_instance_profiles()
            .await?
            .into_iter()
            .next()
            .ok_or(ClusterError::NoInstanceProfile)?;
        let catalog = self.template.default_catalog(deployment)?;
        info!("Default Catalog: {catalog}");

        for cluster in &clusters {
            let edit =
                self.template
                    .edit_for(&cluster.cluster_id, &profile.instance_profile_arn, &catalog);
            info!("Updating Cluster: {}", cluster.cluster_id);
            self.api.edit_cluster(&edit).await?;
            report.updated += 1;
        }
        Ok(report)
    }

    /// Starts every cluster.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::Api`] on the first failing call.
    pub async fn start_clusters(&self) -> Result<ClusterReport, ClusterError> {
        let clusters = self.api.list_clusters().await?;
        let mut report = ClusterReport {
            examined: clusters.len(),
            ..ClusterReport::default()
        };
        for cluster in &clusters {
            if self.dry_run {
                info!("Would Start Cluster: {}", cluster.cluster_id);
                continue;
            }
            info!("Starting Cluster: {}", cluster.cluster_id);
            self.api.start_cluster(&cluster.cluster_id).await?;
            report.started += 1;
        }
        Ok(report)
    }
}

/// Lists workspaces and returns the deployment names to process: only
/// `target` when given, otherwise every workspace that has one.
///
/// # Errors
///
/// Returns [`ApiError`] when the listing fails.
pub async fn target_deployments<D>(
    directory: &D,
    target: Option<&str>,
) -> Result<Vec<String>, ApiError>
where
    D: WorkspaceDirectory + ?Sized,
{
    let workspaces = directory.list_workspaces().await?;
    let mut deployments = Vec::new();
    for workspace in workspaces {
        let Some(deployment) = workspace.deployment_name else {
            continue;
        };
        info!("Workspace:{deployment}");
        if target.is_none_or(|wanted| wanted == deployment) {
            deployments.push(deployment);
        }
    }
    Ok(deployments)
}
