//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, PoisonError};

use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::{Mutex, MutexGuard};

use crate::api::{
    ApiError, ApiFuture, ClusterEdit, ClusterInfo, InstanceProfile, WorkspaceInfo,
    WorkspacePermission,
};
use crate::assignments::WorkspaceDirectory;
use crate::clusters::{ClusterApi, ClusterTemplate};
use crate::config::{ClusterConfig, PlatformConfig};
use crate::policy::{DEFAULT_MAX_AGE_DAYS, RetentionPolicy};
use crate::resource::{Resource, ResourceKind};
use crate::sweep::{ResourceApi, SweepContext};

type Shared<T> = Arc<std::sync::Mutex<T>>;

fn with<T, R>(shared: &Shared<T>, f: impl FnOnce(&mut T) -> R) -> R {
    let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// Principal used as the ownership-transfer target in fixtures.
pub const OWNER_PRINCIPAL: &str = "128c2d08-969f-45bc-8305-917fb0f58c72";

/// Fixed reference time used by fixtures.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Platform configuration with the built-in defaults.
#[must_use]
pub fn platform_config() -> PlatformConfig {
    PlatformConfig {
        accounts_host: String::from("https://accounts.cloud.databricks.com"),
        workspace_host_template: String::from("https://{workspace}.cloud.databricks.com"),
        owner_principal_id: String::from(OWNER_PRINCIPAL),
        admin_principal_id: String::from("7698820785010707"),
        protected_user: String::from("labuser+1@awsbricks.com"),
        user_domain: String::from("@awsbricks.com"),
        max_age_days: DEFAULT_MAX_AGE_DAYS,
        target_deployment: None,
    }
}

/// Cluster configuration with the built-in defaults.
#[must_use]
pub fn cluster_config() -> ClusterConfig {
    ClusterConfig {
        spark_version: String::from("15.4.x-cpu-ml-scala2.12"),
        node_type_id: String::from("r6id.xlarge"),
        cluster_name: String::from("Workshop Cluster"),
        spark_master: String::from("local[*, 4]"),
        catalog_prefix: String::from("catalog_"),
        autotermination_minutes: 120,
    }
}

/// Template owned by the default protected user.
#[must_use]
pub fn cluster_template() -> ClusterTemplate {
    ClusterTemplate::new(cluster_config(), platform_config().protected_user)
}

/// Edit request for `cluster_id` with a placeholder profile and catalog.
#[must_use]
pub fn cluster_edit(cluster_id: &str) -> ClusterEdit {
    cluster_template().edit_for(
        cluster_id,
        "arn:aws:iam::123456789012:instance-profile/workshop",
        "catalog_096215581514",
    )
}

/// Sweep context at [`fixed_now`] with the default age threshold.
#[must_use]
pub fn sweep_context(dry_run: bool, prefix: Option<&str>) -> SweepContext {
    SweepContext {
        dry_run,
        now: fixed_now(),
        policy: RetentionPolicy::new(prefix.map(str::to_owned), DEFAULT_MAX_AGE_DAYS),
        owner_principal: String::from(OWNER_PRINCIPAL),
    }
}

/// Resource named `name` with no creation time.
#[must_use]
pub fn resource(kind: ResourceKind, name: &str) -> Resource {
    Resource::new(kind, format!("id-{name}"), name)
}

/// Resource created `days` days before [`fixed_now`].
#[must_use]
pub fn aged_resource(kind: ResourceKind, name: &str, days: i64) -> Resource {
    resource(kind, name).created_at(fixed_now() - Duration::days(days))
}

/// Workspace listing entry for `deployment`.
#[must_use]
pub fn workspace(workspace_id: i64, deployment: &str) -> WorkspaceInfo {
    WorkspaceInfo {
        workspace_id,
        workspace_name: deployment.to_owned(),
        creation_time: None,
        deployment_name: Some(deployment.to_owned()),
    }
}

/// HTTP status failure as the client would report it.
#[must_use]
pub fn status_error(status: u16) -> ApiError {
    ApiError::Status {
        method: String::from("DELETE"),
        path: String::from("/api/test"),
        status,
        body: String::from("simulated failure"),
    }
}

/// Records a single call made through [`FakeResources`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResourceCall {
    /// The collection was listed.
    List,
    /// A resource was deleted, by name.
    Delete(String),
    /// Ownership of a resource was transferred.
    TransferOwner {
        /// Resource name.
        name: String,
        /// New owner.
        owner: String,
    },
}

#[derive(Debug, Default)]
struct ResourceState {
    items: Vec<Resource>,
    calls: Vec<ResourceCall>,
    list_failure: Option<ApiError>,
    delete_failures: HashMap<String, ApiError>,
    transfer_failures: HashMap<String, ApiError>,
}

/// In-memory resource collection that records every call.
///
/// Deleted resources disappear from later listings. Clones share state so a
/// test can keep a handle after moving the fake into a sweeper.
#[derive(Clone, Debug)]
pub struct FakeResources {
    kind: ResourceKind,
    state: Shared<ResourceState>,
}

impl FakeResources {
    /// Creates a collection holding `items`.
    #[must_use]
    pub fn new(kind: ResourceKind, items: Vec<Resource>) -> Self {
        Self {
            kind,
            state: Arc::new(std::sync::Mutex::new(ResourceState {
                items,
                ..ResourceState::default()
            })),
        }
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ResourceCall> {
        with(&self.state, |state| state.calls.clone())
    }

    /// Names of deleted resources, in call order.
    #[must_use]
    pub fn deleted(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ResourceCall::Delete(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Names still present.
    #[must_use]
    pub fn remaining(&self) -> Vec<String> {
        with(&self.state, |state| {
            state.items.iter().map(|item| item.name.clone()).collect()
        })
    }

    /// Makes the next list call fail.
    pub fn fail_list(&self, error: ApiError) {
        with(&self.state, |state| state.list_failure = Some(error));
    }

    /// Makes deleting `name` fail.
    pub fn fail_delete(&self, name: &str, error: ApiError) {
        with(&self.state, |state| {
            state.delete_failures.insert(name.to_owned(), error);
        });
    }

    /// Makes transferring `name` fail.
    pub fn fail_transfer(&self, name: &str, error: ApiError) {
        with(&self.state, |state| {
            state.transfer_failures.insert(name.to_owned(), error);
        });
    }
}

impl ResourceApi for FakeResources {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn list(&self) -> ApiFuture<'_, Vec<Resource>> {
        let result = with(&self.state, |state| {
            state.calls.push(ResourceCall::List);
            state
                .list_failure
                .take()
                .map_or_else(|| Ok(state.items.clone()), Err)
        });
        Box::pin(std::future::ready(result))
    }

    fn delete<'a>(&'a self, resource: &'a Resource) -> ApiFuture<'a, ()> {
        let result = with(&self.state, |state| {
            state.calls.push(ResourceCall::Delete(resource.name.clone()));
            if let Some(error) = state.delete_failures.get(&resource.name) {
                return Err(error.clone());
            }
            state.items.retain(|item| item.name != resource.name);
            Ok(())
        });
        Box::pin(std::future::ready(result))
    }

    fn transfer_owner<'a>(&'a self, resource: &'a Resource, owner: &'a str) -> ApiFuture<'a, ()> {
        let result = with(&self.state, |state| {
            state.calls.push(ResourceCall::TransferOwner {
                name: resource.name.clone(),
                owner: owner.to_owned(),
            });
            if let Some(error) = state.transfer_failures.get(&resource.name) {
                return Err(error.clone());
            }
            for item in &mut state.items {
                if item.name == resource.name {
                    item.owner = Some(owner.to_owned());
                }
            }
            Ok(())
        });
        Box::pin(std::future::ready(result))
    }
}

/// Records a single call made through [`FakeDirectory`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DirectoryCall {
    /// Workspaces were listed.
    List,
    /// Permissions were assigned.
    Assign {
        /// Target workspace.
        workspace_id: i64,
        /// Principal receiving the permissions.
        principal_id: String,
        /// Permissions assigned.
        permissions: Vec<WorkspacePermission>,
    },
}

#[derive(Debug, Default)]
struct DirectoryState {
    workspaces: Vec<WorkspaceInfo>,
    calls: Vec<DirectoryCall>,
    list_failure: Option<ApiError>,
    assign_failures: BTreeMap<i64, ApiError>,
}

/// In-memory account workspace directory.
#[derive(Clone, Debug)]
pub struct FakeDirectory {
    state: Shared<DirectoryState>,
}

impl FakeDirectory {
    /// Creates a directory listing `workspaces`.
    #[must_use]
    pub fn new(workspaces: Vec<WorkspaceInfo>) -> Self {
        Self {
            state: Arc::new(std::sync::Mutex::new(DirectoryState {
                workspaces,
                ..DirectoryState::default()
            })),
        }
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<DirectoryCall> {
        with(&self.state, |state| state.calls.clone())
    }

    /// Makes the next list call fail.
    pub fn fail_list(&self, error: ApiError) {
        with(&self.state, |state| state.list_failure = Some(error));
    }

    /// Makes assignments on `workspace_id` fail.
    pub fn fail_assign(&self, workspace_id: i64, error: ApiError) {
        with(&self.state, |state| {
            state.assign_failures.insert(workspace_id, error);
        });
    }
}

impl WorkspaceDirectory for FakeDirectory {
    fn list_workspaces(&self) -> ApiFuture<'_, Vec<WorkspaceInfo>> {
        let result = with(&self.state, |state| {
            state.calls.push(DirectoryCall::List);
            state
                .list_failure
                .take()
                .map_or_else(|| Ok(state.workspaces.clone()), Err)
        });
        Box::pin(std::future::ready(result))
    }

    fn assign_permissions<'a>(
        &'a self,
        workspace_id: i64,
        principal_id: &'a str,
        permissions: &'a [WorkspacePermission],
    ) -> ApiFuture<'a, ()> {
        let result = with(&self.state, |state| {
            state.calls.push(DirectoryCall::Assign {
                workspace_id,
                principal_id: principal_id.to_owned(),
                permissions: permissions.to_vec(),
            });
            state
                .assign_failures
                .get(&workspace_id)
                .map_or(Ok(()), |error| Err(error.clone()))
        });
        Box::pin(std::future::ready(result))
    }
}

/// Records a single call made through [`FakeClusters`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClusterCall {
    /// Clusters were listed.
    ListClusters,
    /// Instance profiles were listed.
    ListInstanceProfiles,
    /// A cluster was edited.
    Edit(Box<ClusterEdit>),
    /// A cluster was started.
    Start(String),
}

#[derive(Debug, Default)]
struct ClusterState {
    clusters: Vec<ClusterInfo>,
    profiles: Vec<InstanceProfile>,
    calls: Vec<ClusterCall>,
    edit_failures: BTreeMap<String, ApiError>,
    start_failures: BTreeMap<String, ApiError>,
}

/// In-memory workspace cluster API.
#[derive(Clone, Debug)]
pub struct FakeClusters {
    state: Shared<ClusterState>,
}

impl FakeClusters {
    /// Creates a workspace with the given cluster ids and instance profile
    /// ARNs.
    #[must_use]
    pub fn new(cluster_ids: &[&str], profile_arns: &[&str]) -> Self {
        let clusters = cluster_ids
            .iter()
            .map(|id| ClusterInfo {
                cluster_id: (*id).to_owned(),
                cluster_name: format!("cluster {id}"),
            })
            .collect();
        let profiles = profile_arns
            .iter()
            .map(|arn| InstanceProfile {
                instance_profile_arn: (*arn).to_owned(),
            })
            .collect();
        Self {
            state: Arc::new(std::sync::Mutex::new(ClusterState {
                clusters,
                profiles,
                ..ClusterState::default()
            })),
        }
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ClusterCall> {
        with(&self.state, |state| state.calls.clone())
    }

    /// Edit requests issued, in call order.
    #[must_use]
    pub fn edits(&self) -> Vec<ClusterEdit> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ClusterCall::Edit(edit) => Some(*edit),
                _ => None,
            })
            .collect()
    }

    /// Makes editing `cluster_id` fail.
    pub fn fail_edit(&self, cluster_id: &str, error: ApiError) {
        with(&self.state, |state| {
            state.edit_failures.insert(cluster_id.to_owned(), error);
        });
    }

    /// Makes starting `cluster_id` fail.
    pub fn fail_start(&self, cluster_id: &str, error: ApiError) {
        with(&self.state, |state| {
            state.start_failures.insert(cluster_id.to_owned(), error);
        });
    }
}

impl ClusterApi for FakeClusters {
    fn list_clusters(&self) -> ApiFuture<'_, Vec<ClusterInfo>> {
        let result = with(&self.state, |state| {
            state.calls.push(ClusterCall::ListClusters);
            Ok(state.clusters.clone())
        });
        Box::pin(std::future::ready(result))
    }

    fn list_instance_profiles(&self) -> ApiFuture<'_, Vec<InstanceProfile>> {
        let result = with(&self.state, |state| {
            state.calls.push(ClusterCall::ListInstanceProfiles);
            Ok(state.profiles.clone())
        });
        Box::pin(std::future::ready(result))
    }

    fn edit_cluster<'a>(&'a self, edit: &'a ClusterEdit) -> ApiFuture<'a, ()> {
        let result = with(&self.state, |state| {
            state.calls.push(ClusterCall::Edit(Box::new(edit.clone())));
            state
                .edit_failures
                .get(&edit.cluster_id)
                .map_or(Ok(()), |error| Err(error.clone()))
        });
        Box::pin(std::future::ready(result))
    }

    fn start_cluster<'a>(&'a self, cluster_id: &'a str) -> ApiFuture<'a, ()> {
        let result = with(&self.state, |state| {
            state.calls.push(ClusterCall::Start(cluster_id.to_owned()));
            state
                .start_failures
                .get(cluster_id)
                .map_or(Ok(()), |error| Err(error.clone()))
        });
        Box::pin(std::future::ready(result))
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
