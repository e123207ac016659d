//! [`ResourceApi`] implementations backed by the REST clients.

use reqwest::{Method, Request};

use super::models::{
    CatalogList, CredentialInfo, ExternalLocationList, MetastoreList, NetworkInfo, OwnerUpdate,
    ScimUserList, StorageConfigInfo, StorageCredentialList, WorkspaceInfo,
};
use super::{AccountClient, ApiError, ApiFuture, WorkspaceClient};
use crate::resource::{Resource, ResourceKind, Scope};
use crate::sweep::ResourceApi;

const FORCE: [(&str, &str); 1] = [("force", "true")];
const UNITY_CATALOG: [&str; 3] = ["api", "2.1", "unity-catalog"];

/// One account-scoped resource kind.
#[derive(Clone, Copy, Debug)]
pub struct AccountCollection<'c> {
    client: &'c AccountClient,
    kind: ResourceKind,
}

impl<'c> AccountCollection<'c> {
    pub(super) fn new(client: &'c AccountClient, kind: ResourceKind) -> Result<Self, ApiError> {
        if kind.scope() != Scope::Account {
            return Err(ApiError::Unsupported {
                operation: "account collection",
                kind,
            });
        }
        Ok(Self { client, kind })
    }

    /// Path segments below `/api/2.0/accounts/{account_id}`.
    const fn collection_path(&self) -> &'static [&'static str] {
        match self.kind {
            ResourceKind::User => &["scim", "v2", "Users"],
            ResourceKind::Metastore => &["metastores"],
            ResourceKind::Workspace => &["workspaces"],
            ResourceKind::NetworkConfig => &["networks"],
            ResourceKind::StorageConfig => &["storage-configurations"],
            _ => &["credentials"],
        }
    }

    fn segments<'a>(&'a self, id: Option<&'a str>) -> Vec<&'a str> {
        let mut segments = vec!["api", "2.0", "accounts", self.client.account_id()];
        segments.extend_from_slice(self.collection_path());
        segments.extend(id);
        segments
    }

    pub(crate) fn list_request(&self) -> Result<Request, ApiError> {
        self.client.api().get(&self.segments(None))
    }

    pub(crate) fn delete_request(&self, resource: &Resource) -> Result<Request, ApiError> {
        let segments = self.segments(Some(resource.id.as_str()));
        let query: &[(&str, &str)] = if self.kind == ResourceKind::Metastore {
            &FORCE
        } else {
            &[]
        };
        self.client.api().delete(&segments, query)
    }

    async fn fetch(&self) -> Result<Vec<Resource>, ApiError> {
        let api = self.client.api();
        let request = self.list_request()?;
        let resources = match self.kind {
            ResourceKind::User => api
                .execute_json::<ScimUserList>(request)
                .await?
                .resources
                .into_iter()
                .map(Resource::from)
                .collect(),
            ResourceKind::Metastore => api
                .execute_json::<MetastoreList>(request)
                .await?
                .metastores
                .into_iter()
                .map(Resource::from)
                .collect(),
            ResourceKind::Workspace => api
                .execute_json::<Vec<WorkspaceInfo>>(request)
                .await?
                .into_iter()
                .map(Resource::from)
                .collect(),
            ResourceKind::NetworkConfig => api
                .execute_json::<Vec<NetworkInfo>>(request)
                .await?
                .into_iter()
                .map(Resource::from)
                .collect(),
            ResourceKind::StorageConfig => api
                .execute_json::<Vec<StorageConfigInfo>>(request)
                .await?
                .into_iter()
                .map(Resource::from)
                .collect(),
            _ => api
                .execute_json::<Vec<CredentialInfo>>(request)
                .await?
                .into_iter()
                .map(Resource::from)
                .collect(),
        };
        Ok(resources)
    }

    async fn remove(&self, resource: &Resource) -> Result<(), ApiError> {
        let request = self.delete_request(resource)?;
        self.client.api().execute(request).await
    }
}

impl ResourceApi for AccountCollection<'_> {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn list(&self) -> ApiFuture<'_, Vec<Resource>> {
        Box::pin(self.fetch())
    }

    fn delete<'a>(&'a self, resource: &'a Resource) -> ApiFuture<'a, ()> {
        Box::pin(self.remove(resource))
    }
}

/// One Unity Catalog resource kind inside a workspace.
#[derive(Clone, Copy, Debug)]
pub struct WorkspaceCollection<'c> {
    client: &'c WorkspaceClient,
    kind: ResourceKind,
}

impl<'c> WorkspaceCollection<'c> {
    pub(super) fn new(client: &'c WorkspaceClient, kind: ResourceKind) -> Result<Self, ApiError> {
        if kind.scope() != Scope::Workspace {
            return Err(ApiError::Unsupported {
                operation: "workspace collection",
                kind,
            });
        }
        Ok(Self { client, kind })
    }

    const fn collection(&self) -> &'static str {
        match self.kind {
            ResourceKind::ExternalLocation => "external-locations",
            ResourceKind::StorageCredential => "storage-credentials",
            _ => "catalogs",
        }
    }

    fn segments<'a>(&self, name: Option<&'a str>) -> Vec<&'a str> {
        let mut segments: Vec<&'a str> = UNITY_CATALOG.to_vec();
        segments.push(self.collection());
        segments.extend(name);
        segments
    }

    pub(crate) fn list_request(&self) -> Result<Request, ApiError> {
        self.client.api().get(&self.segments(None))
    }

    pub(crate) fn delete_request(&self, resource: &Resource) -> Result<Request, ApiError> {
        let segments = self.segments(Some(resource.name.as_str()));
        self.client.api().delete(&segments, &FORCE)
    }

    pub(crate) fn owner_request(
        &self,
        resource: &Resource,
        owner: &str,
    ) -> Result<Request, ApiError> {
        let segments = self.segments(Some(resource.name.as_str()));
        self.client
            .api()
            .json(Method::PATCH, &segments, &OwnerUpdate { owner })
    }

    async fn fetch(&self) -> Result<Vec<Resource>, ApiError> {
        let api = self.client.api();
        let request = self.list_request()?;
        let securables = match self.kind {
            ResourceKind::ExternalLocation => {
                api.execute_json::<ExternalLocationList>(request)
                    .await?
                    .external_locations
            }
            ResourceKind::StorageCredential => {
                api.execute_json::<StorageCredentialList>(request)
                    .await?
                    .storage_credentials
            }
            _ => api.execute_json::<CatalogList>(request).await?.catalogs,
        };
        Ok(securables
            .into_iter()
            .map(|securable| securable.into_resource(self.kind))
            .collect())
    }

    async fn remove(&self, resource: &Resource) -> Result<(), ApiError> {
        let request = self.delete_request(resource)?;
        self.client.api().execute(request).await
    }

    async fn set_owner(&self, resource: &Resource, owner: &str) -> Result<(), ApiError> {
        let request = self.owner_request(resource, owner)?;
        self.client.api().execute(request).await
    }
}

impl ResourceApi for WorkspaceCollection<'_> {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn list(&self) -> ApiFuture<'_, Vec<Resource>> {
        Box::pin(self.fetch())
    }

    fn delete<'a>(&'a self, resource: &'a Resource) -> ApiFuture<'a, ()> {
        Box::pin(self.remove(resource))
    }

    fn transfer_owner<'a>(&'a self, resource: &'a Resource, owner: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(self.set_owner(resource, owner))
    }
}
