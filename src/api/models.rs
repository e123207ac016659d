//! Wire shapes for the account and workspace REST APIs.
//!
//! Only the fields the sweepers read are modelled; everything else in the
//! payloads is ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resource::{Resource, ResourceKind};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ScimUserList {
    #[serde(rename = "Resources", default)]
    pub(crate) resources: Vec<ScimUser>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScimUser {
    id: String,
    #[serde(rename = "userName", default)]
    user_name: String,
}

impl From<ScimUser> for Resource {
    fn from(value: ScimUser) -> Self {
        Self::new(ResourceKind::User, value.id, value.user_name)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MetastoreList {
    #[serde(default)]
    pub(crate) metastores: Vec<MetastoreInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetastoreInfo {
    metastore_id: String,
    #[serde(default)]
    name: String,
    created_at: Option<i64>,
    owner: Option<String>,
}

impl From<MetastoreInfo> for Resource {
    fn from(value: MetastoreInfo) -> Self {
        Self::new(ResourceKind::Metastore, value.metastore_id, value.name)
            .created_at_millis(value.created_at)
            .owner(value.owner)
    }
}

/// A workspace as reported by the account API.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct WorkspaceInfo {
    /// Numeric workspace id.
    pub workspace_id: i64,
    /// Human-readable workspace name.
    #[serde(default)]
    pub workspace_name: String,
    /// Creation time in epoch milliseconds.
    pub creation_time: Option<i64>,
    /// Subdomain of the workspace host.
    pub deployment_name: Option<String>,
}

impl From<WorkspaceInfo> for Resource {
    fn from(value: WorkspaceInfo) -> Self {
        Self::new(
            ResourceKind::Workspace,
            value.workspace_id.to_string(),
            value.workspace_name,
        )
        .created_at_millis(value.creation_time)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NetworkInfo {
    network_id: String,
    #[serde(default)]
    network_name: String,
    creation_time: Option<i64>,
}

impl From<NetworkInfo> for Resource {
    fn from(value: NetworkInfo) -> Self {
        Self::new(ResourceKind::NetworkConfig, value.network_id, value.network_name)
            .created_at_millis(value.creation_time)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StorageConfigInfo {
    storage_configuration_id: String,
    #[serde(default)]
    storage_configuration_name: String,
    creation_time: Option<i64>,
}

impl From<StorageConfigInfo> for Resource {
    fn from(value: StorageConfigInfo) -> Self {
        Self::new(
            ResourceKind::StorageConfig,
            value.storage_configuration_id,
            value.storage_configuration_name,
        )
        .created_at_millis(value.creation_time)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CredentialInfo {
    credentials_id: String,
    #[serde(default)]
    credentials_name: String,
    creation_time: Option<i64>,
}

impl From<CredentialInfo> for Resource {
    fn from(value: CredentialInfo) -> Self {
        Self::new(
            ResourceKind::CredentialConfig,
            value.credentials_id,
            value.credentials_name,
        )
        .created_at_millis(value.creation_time)
    }
}

/// External locations, storage credentials and catalogs share this shape.
#[derive(Debug, Deserialize)]
pub(crate) struct SecurableInfo {
    name: String,
    created_at: Option<i64>,
    owner: Option<String>,
}

impl SecurableInfo {
    pub(crate) fn into_resource(self, kind: ResourceKind) -> Resource {
        Resource::new(kind, self.name.clone(), self.name)
            .created_at_millis(self.created_at)
            .owner(self.owner)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExternalLocationList {
    #[serde(default)]
    pub(crate) external_locations: Vec<SecurableInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StorageCredentialList {
    #[serde(default)]
    pub(crate) storage_credentials: Vec<SecurableInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CatalogList {
    #[serde(default)]
    pub(crate) catalogs: Vec<SecurableInfo>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OwnerUpdate<'a> {
    pub(crate) owner: &'a str,
}

/// Permission levels assignable on a workspace.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkspacePermission {
    /// Full workspace administration.
    Admin,
}

#[derive(Debug, Serialize)]
pub(crate) struct PermissionAssignment<'a> {
    pub(crate) permissions: &'a [WorkspacePermission],
}

/// A cluster as reported by the clusters API.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ClusterInfo {
    /// Cluster id.
    pub cluster_id: String,
    /// Display name.
    #[serde(default)]
    pub cluster_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ClusterList {
    #[serde(default)]
    pub(crate) clusters: Vec<ClusterInfo>,
}

/// An instance profile registered with a workspace.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct InstanceProfile {
    /// IAM instance profile ARN.
    pub instance_profile_arn: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InstanceProfileList {
    #[serde(default)]
    pub(crate) instance_profiles: Vec<InstanceProfile>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClusterStart<'a> {
    pub(crate) cluster_id: &'a str,
}

/// AWS placement attributes of a cluster.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AwsAttributes {
    /// Capacity type, for example `ON_DEMAND`.
    pub availability: String,
    /// Extra EBS volumes per node.
    pub ebs_volume_count: u32,
    /// Instance profile attached to every node.
    pub instance_profile_arn: String,
}

/// Full replacement specification sent to `clusters/edit`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ClusterEdit {
    /// Cluster being rewritten.
    pub cluster_id: String,
    /// Name after the edit.
    pub cluster_name: String,
    /// Databricks runtime version.
    pub spark_version: String,
    /// Worker node type.
    pub node_type_id: String,
    /// Driver node type.
    pub driver_node_type_id: String,
    /// Worker count; zero means single node.
    pub num_workers: u32,
    /// Access mode, for example `SINGLE_USER`.
    pub data_security_mode: String,
    /// User allowed on a single-user cluster.
    pub single_user_name: String,
    /// Runtime engine, for example `STANDARD`.
    pub runtime_engine: String,
    /// AWS placement.
    pub aws_attributes: AwsAttributes,
    /// Spark configuration entries.
    pub spark_conf: BTreeMap<String, String>,
    /// Idle minutes before termination.
    pub autotermination_minutes: u32,
}
