//! REST clients for the account and workspace control planes.
//!
//! [`AccountClient`] talks to the account console host and
//! [`WorkspaceClient`] to one workspace host. Both are thin wrappers over a
//! shared [`ApiClient`] that attaches the bearer token, checks the status of
//! every response and decodes JSON bodies. Calls are never retried.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use reqwest::{Method, Request, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::auth::AccessToken;
use crate::config::PlatformConfig;
use crate::resource::ResourceKind;

mod collections;
mod error;
pub mod models;

pub use collections::{AccountCollection, WorkspaceCollection};
pub use error::{ApiError, Severity};
pub use models::{ClusterEdit, ClusterInfo, InstanceProfile, WorkspaceInfo, WorkspacePermission};

/// Future returned by API capability traits.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Authenticated HTTP client bound to one host.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    host: Url,
    token: AccessToken,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("host", &self.host.as_str())
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client for `host`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidHost`] when `host` is not an absolute URL
    /// that can carry a path.
    pub fn new(http: reqwest::Client, host: &str, token: AccessToken) -> Result<Self, ApiError> {
        let parsed = Url::parse(host).map_err(|err| ApiError::InvalidHost {
            host: host.to_owned(),
            message: err.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidHost {
                host: host.to_owned(),
                message: String::from("host cannot carry a path"),
            });
        }
        Ok(Self {
            http,
            host: parsed,
            token,
        })
    }

    /// Host the client is bound to.
    #[must_use]
    pub const fn host(&self) -> &Url {
        &self.host
    }

    /// Appends path segments to the host, percent-encoding each one.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.host.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidHost {
                host: self.host.to_string(),
                message: String::from("host cannot carry a path"),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Builds an authenticated `GET` request.
    pub(crate) fn get(&self, segments: &[&str]) -> Result<Request, ApiError> {
        self.build(Method::GET, segments, |builder| builder)
    }

    /// Builds an authenticated `DELETE` request with optional query pairs.
    pub(crate) fn delete(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Request, ApiError> {
        self.build(Method::DELETE, segments, |builder| builder.query(query))
    }

    /// Builds an authenticated request carrying a JSON body.
    pub(crate) fn json<B>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<Request, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.build(method, segments, |builder| builder.json(body))
    }

    fn build(
        &self,
        method: Method,
        segments: &[&str],
        finish: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Request, ApiError> {
        let url = self.url(segments)?;
        let path = url.path().to_owned();
        let builder = self
            .http
            .request(method, url)
            .bearer_auth(self.token.secret());
        finish(builder)
            .build()
            .map_err(|err| ApiError::Request {
                path,
                message: err.to_string(),
            })
    }

    async fn send(&self, request: Request) -> Result<reqwest::Response, ApiError> {
        let method = request.method().to_string();
        let path = request.url().path().to_owned();
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|err| ApiError::Transport {
                path: path.clone(),
                message: err.to_string(),
            })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            method,
            path,
            status: status.as_u16(),
            body,
        })
    }

    /// Sends `request` and discards the response body.
    pub(crate) async fn execute(&self, request: Request) -> Result<(), ApiError> {
        self.send(request).await?;
        Ok(())
    }

    /// Sends `request` and decodes the JSON response body.
    pub(crate) async fn execute_json<T>(&self, request: Request) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let path = request.url().path().to_owned();
        let response = self.send(request).await?;
        let body = response.text().await.map_err(|err| ApiError::Transport {
            path: path.clone(),
            message: err.to_string(),
        })?;
        serde_json::from_str(&body).map_err(|err| ApiError::Decode {
            path,
            message: err.to_string(),
        })
    }
}

/// Client for account-level APIs (`/api/2.0/accounts/{account_id}/...`).
#[derive(Clone, Debug)]
pub struct AccountClient {
    api: ApiClient,
    account_id: String,
}

impl AccountClient {
    /// Wraps an [`ApiClient`] bound to the accounts host.
    #[must_use]
    pub const fn new(api: ApiClient, account_id: String) -> Self {
        Self { api, account_id }
    }

    /// Account the client operates on.
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Underlying HTTP client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Collection for an account-scoped resource kind.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unsupported`] for workspace-scoped kinds.
    pub fn collection(
        &self,
        kind: ResourceKind,
    ) -> Result<AccountCollection<'_>, ApiError> {
        AccountCollection::new(self, kind)
    }

    /// Lists every workspace in the account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the call fails.
    pub async fn list_workspaces(&self) -> Result<Vec<WorkspaceInfo>, ApiError> {
        self.api.execute_json(self.workspaces_request()?).await
    }

    /// Replaces a principal's permissions on a workspace.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the call fails.
    pub async fn assign_workspace_permissions(
        &self,
        workspace_id: i64,
        principal_id: &str,
        permissions: &[WorkspacePermission],
    ) -> Result<(), ApiError> {
        let request = self.assignment_request(workspace_id, principal_id, permissions)?;
        self.api.execute(request).await
    }

    fn workspaces_request(&self) -> Result<Request, ApiError> {
        self.api
            .get(&["api", "2.0", "accounts", &self.account_id, "workspaces"])
    }

    fn assignment_request(
        &self,
        workspace_id: i64,
        principal_id: &str,
        permissions: &[WorkspacePermission],
    ) -> Result<Request, ApiError> {
        let workspace = workspace_id.to_string();
        self.api.json(
            Method::PUT,
            &[
                "api",
                "2.0",
                "accounts",
                &self.account_id,
                "workspaces",
                &workspace,
                "permissionassignments",
                "principals",
                principal_id,
            ],
            &models::PermissionAssignment { permissions },
        )
    }
}

/// Client for workspace-level APIs.
#[derive(Clone, Debug)]
pub struct WorkspaceClient {
    api: ApiClient,
}

impl WorkspaceClient {
    /// Wraps an [`ApiClient`] bound to a workspace host.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Underlying HTTP client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Collection for a workspace-scoped resource kind.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unsupported`] for account-scoped kinds.
    pub fn collection(
        &self,
        kind: ResourceKind,
    ) -> Result<WorkspaceCollection<'_>, ApiError> {
        WorkspaceCollection::new(self, kind)
    }

    /// Lists every cluster in the workspace.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the call fails.
    pub async fn list_clusters(&self) -> Result<Vec<ClusterInfo>, ApiError> {
        let request = self.api.get(&["api", "2.1", "clusters", "list"])?;
        let list: models::ClusterList = self.api.execute_json(request).await?;
        Ok(list.clusters)
    }

    /// Lists instance profiles registered with the workspace.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the call fails.
    pub async fn list_instance_profiles(&self) -> Result<Vec<InstanceProfile>, ApiError> {
        let request = self.api.get(&["api", "2.0", "instance-profiles", "list"])?;
        let list: models::InstanceProfileList = self.api.execute_json(request).await?;
        Ok(list.instance_profiles)
    }

    /// Replaces a cluster's specification.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the call fails.
    pub async fn edit_cluster(&self, edit: &ClusterEdit) -> Result<(), ApiError> {
        self.api.execute(self.edit_request(edit)?).await
    }

    /// Starts a terminated cluster.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the call fails.
    pub async fn start_cluster(&self, cluster_id: &str) -> Result<(), ApiError> {
        self.api.execute(self.start_request(cluster_id)?).await
    }

    fn edit_request(&self, edit: &ClusterEdit) -> Result<Request, ApiError> {
        self.api
            .json(Method::POST, &["api", "2.1", "clusters", "edit"], edit)
    }

    fn start_request(&self, cluster_id: &str) -> Result<Request, ApiError> {
        self.api.json(
            Method::POST,
            &["api", "2.1", "clusters", "start"],
            &models::ClusterStart { cluster_id },
        )
    }
}

/// Builds the account-scoped client.
///
/// # Errors
///
/// Returns [`ApiError::InvalidHost`] when the configured accounts host is
/// not a URL.
pub fn build_account_client(
    http: reqwest::Client,
    config: &PlatformConfig,
    token: AccessToken,
    account_id: &str,
) -> Result<AccountClient, ApiError> {
    let api = ApiClient::new(http, &config.accounts_host, token)?;
    Ok(AccountClient::new(api, account_id.to_owned()))
}

/// Builds a workspace-scoped client for a deployment name.
///
/// # Errors
///
/// Returns [`ApiError::InvalidHost`] when the interpolated host is not a URL.
pub fn build_workspace_client(
    http: reqwest::Client,
    config: &PlatformConfig,
    token: AccessToken,
    workspace: &str,
) -> Result<WorkspaceClient, ApiError> {
    let api = ApiClient::new(http, &config.workspace_host(workspace), token)?;
    Ok(WorkspaceClient::new(api))
}

#[cfg(test)]
mod tests;
