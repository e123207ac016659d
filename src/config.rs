//! Configuration loading via `ortho-config`.
//!
//! Hosts, principal ids and the other values the scripts used to hard-code
//! live here so operators can override them from `bricksweep.toml` or
//! `BRICKSWEEP_*` environment variables without touching the sweep logic.

use std::ffi::OsString;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::policy::DEFAULT_MAX_AGE_DAYS;

/// Placeholder replaced by the workspace deployment name in
/// [`PlatformConfig::workspace_host_template`].
pub const WORKSPACE_PLACEHOLDER: &str = "{workspace}";

/// Account-wide settings shared by both binaries.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "BRICKSWEEP",
    discovery(
        app_name = "bricksweep",
        env_var = "BRICKSWEEP_CONFIG_PATH",
        config_file_name = "bricksweep.toml",
        dotfile_name = ".bricksweep.toml",
        project_file_name = "bricksweep.toml"
    )
)]
pub struct PlatformConfig {
    /// Account console host used for OIDC and account-level APIs.
    #[ortho_config(default = "https://accounts.cloud.databricks.com".to_owned())]
    pub accounts_host: String,
    /// Workspace host with a `{workspace}` placeholder for the deployment
    /// name.
    #[ortho_config(default = "https://{workspace}.cloud.databricks.com".to_owned())]
    pub workspace_host_template: String,
    /// Principal that receives ownership of Unity Catalog objects before they
    /// are swept.
    #[ortho_config(default = "128c2d08-969f-45bc-8305-917fb0f58c72".to_owned())]
    pub owner_principal_id: String,
    /// Principal granted workspace admin by `bricksweep-update`.
    #[ortho_config(default = "7698820785010707".to_owned())]
    pub admin_principal_id: String,
    /// Shared lab user that is never deleted and runs single-user clusters.
    #[ortho_config(default = "labuser+1@awsbricks.com".to_owned())]
    pub protected_user: String,
    /// Users whose name contains this domain are swept.
    #[ortho_config(default = "@awsbricks.com".to_owned())]
    pub user_domain: String,
    /// Age in days after which unprefixed resources are swept.
    #[ortho_config(default = DEFAULT_MAX_AGE_DAYS)]
    pub max_age_days: u32,
    /// Deployment whose clusters `bricksweep-update` rewrites. Every
    /// workspace is processed when unset.
    pub target_deployment: Option<String>,
}

/// Cluster shape applied by `bricksweep-update`.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "BRICKSWEEP_CLUSTER",
    discovery(
        app_name = "bricksweep",
        env_var = "BRICKSWEEP_CONFIG_PATH",
        config_file_name = "bricksweep.toml",
        dotfile_name = ".bricksweep.toml",
        project_file_name = "bricksweep.toml"
    )
)]
pub struct ClusterConfig {
    /// Databricks runtime version.
    #[ortho_config(default = "15.4.x-cpu-ml-scala2.12".to_owned())]
    pub spark_version: String,
    /// Worker and driver node type.
    #[ortho_config(default = "r6id.xlarge".to_owned())]
    pub node_type_id: String,
    /// Name given to every rewritten cluster.
    #[ortho_config(default = "Workshop Cluster".to_owned())]
    pub cluster_name: String,
    /// Value of `spark.master` for the single-node layout.
    #[ortho_config(default = "local[*, 4]".to_owned())]
    pub spark_master: String,
    /// Prefix of the default catalog name; the deployment digits follow it.
    #[ortho_config(default = "catalog_".to_owned())]
    pub catalog_prefix: String,
    /// Idle minutes before the cluster terminates.
    #[ortho_config(default = 120)]
    pub autotermination_minutes: u32,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to bricksweep.toml",
            metadata.description, metadata.env_var, metadata.toml_key
        )));
    }
    Ok(())
}

impl PlatformConfig {
    /// Loads configuration without parsing CLI arguments. Values merge
    /// defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("bricksweep")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is blank
    /// and [`ConfigError::Invalid`] when a value cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_field(
            &self.accounts_host,
            &FieldMetadata::new(
                "accounts host",
                "BRICKSWEEP_ACCOUNTS_HOST",
                "accounts_host",
            ),
        )?;
        require_field(
            &self.workspace_host_template,
            &FieldMetadata::new(
                "workspace host template",
                "BRICKSWEEP_WORKSPACE_HOST_TEMPLATE",
                "workspace_host_template",
            ),
        )?;
        require_field(
            &self.owner_principal_id,
            &FieldMetadata::new(
                "owner principal id",
                "BRICKSWEEP_OWNER_PRINCIPAL_ID",
                "owner_principal_id",
            ),
        )?;
        require_field(
            &self.admin_principal_id,
            &FieldMetadata::new(
                "admin principal id",
                "BRICKSWEEP_ADMIN_PRINCIPAL_ID",
                "admin_principal_id",
            ),
        )?;
        require_field(
            &self.protected_user,
            &FieldMetadata::new(
                "protected user",
                "BRICKSWEEP_PROTECTED_USER",
                "protected_user",
            ),
        )?;
        require_field(
            &self.user_domain,
            &FieldMetadata::new("user domain", "BRICKSWEEP_USER_DOMAIN", "user_domain"),
        )?;
        if !self.workspace_host_template.contains(WORKSPACE_PLACEHOLDER) {
            return Err(ConfigError::Invalid {
                field: "workspace_host_template",
                message: format!("must contain {WORKSPACE_PLACEHOLDER}"),
            });
        }
        if self.max_age_days == 0 {
            return Err(ConfigError::Invalid {
                field: "max_age_days",
                message: String::from("must be at least one day"),
            });
        }
        Ok(())
    }

    /// Interpolates a deployment name into the workspace host template.
    #[must_use]
    pub fn workspace_host(&self, workspace: &str) -> String {
        self.workspace_host_template
            .replace(WORKSPACE_PLACEHOLDER, workspace)
    }
}

impl ClusterConfig {
    /// Loads cluster configuration without parsing CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("bricksweep")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates cluster configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a field is blank or the auto-termination
    /// window is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_field(
            &self.spark_version,
            &FieldMetadata::new(
                "Spark runtime version",
                "BRICKSWEEP_CLUSTER_SPARK_VERSION",
                "spark_version",
            ),
        )?;
        require_field(
            &self.node_type_id,
            &FieldMetadata::new(
                "node type",
                "BRICKSWEEP_CLUSTER_NODE_TYPE_ID",
                "node_type_id",
            ),
        )?;
        require_field(
            &self.cluster_name,
            &FieldMetadata::new(
                "cluster name",
                "BRICKSWEEP_CLUSTER_CLUSTER_NAME",
                "cluster_name",
            ),
        )?;
        require_field(
            &self.spark_master,
            &FieldMetadata::new(
                "Spark master",
                "BRICKSWEEP_CLUSTER_SPARK_MASTER",
                "spark_master",
            ),
        )?;
        if self.autotermination_minutes == 0 {
            return Err(ConfigError::Invalid {
                field: "autotermination_minutes",
                message: String::from("must be at least one minute"),
            });
        }
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds an unusable value.
    #[error("invalid {field}: {message}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
