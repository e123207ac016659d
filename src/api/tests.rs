//! Unit tests for the REST client plumbing.

use super::*;
use crate::resource::Resource;
use rstest::rstest;

fn client(host: &str) -> ApiClient {
    ApiClient::new(reqwest::Client::new(), host, AccessToken::new("tok")).expect("valid host")
}

#[test]
fn url_percent_encodes_segments() {
    let api = client("https://ws.cloud.databricks.com");
    let url = api
        .url(&["api", "2.1", "unity-catalog", "catalogs", "team a/b"])
        .expect("url should build");
    assert_eq!(
        url.as_str(),
        "https://ws.cloud.databricks.com/api/2.1/unity-catalog/catalogs/team%20a%2Fb"
    );
}

#[test]
fn invalid_host_is_rejected() {
    let err = ApiClient::new(reqwest::Client::new(), "not a url", AccessToken::new("tok"))
        .expect_err("host must parse");
    assert!(matches!(err, ApiError::InvalidHost { .. }));
}

#[test]
fn workspace_builder_interpolates_deployment_name() {
    let config = crate::test_support::platform_config();
    let client = build_workspace_client(
        reqwest::Client::new(),
        &config,
        AccessToken::new("tok"),
        "dbc-1234",
    )
    .expect("client should build");
    assert_eq!(
        client.api().host().as_str(),
        "https://dbc-1234.cloud.databricks.com/"
    );
}

#[test]
fn debug_output_hides_token() {
    let rendered = format!("{:?}", client("https://accounts.cloud.databricks.com"));
    assert!(!rendered.contains("tok\""), "rendered: {rendered}");
}

#[rstest]
#[case::throttled(429, Severity::Retryable)]
#[case::server(503, Severity::Retryable)]
#[case::unauthorised(401, Severity::Fatal)]
#[case::not_found(404, Severity::Fatal)]
#[case::conflict(409, Severity::Fatal)]
fn status_errors_are_classified(#[case] status: u16, #[case] expected: Severity) {
    let err = ApiError::Status {
        method: String::from("DELETE"),
        path: String::from("/api"),
        status,
        body: String::new(),
    };
    assert_eq!(err.severity(), expected);
}

#[test]
fn transport_errors_are_retryable() {
    let err = ApiError::Transport {
        path: String::from("/api"),
        message: String::from("connection reset"),
    };
    assert_eq!(err.severity(), Severity::Retryable);
}

#[test]
fn account_collection_rejects_workspace_kinds() {
    let account = AccountClient::new(
        client("https://accounts.cloud.databricks.com"),
        String::from("acc"),
    );
    let err = account
        .collection(ResourceKind::Catalog)
        .expect_err("catalogs live in workspaces");
    assert_eq!(
        err,
        ApiError::Unsupported {
            operation: "account collection",
            kind: ResourceKind::Catalog,
        }
    );
}

#[test]
fn workspace_payload_maps_to_resource() {
    let payload = r#"[{"workspace_id":42,"workspace_name":"test-ws1",
        "creation_time":1700000000000,"deployment_name":"dbc-42","pricing_tier":"PREMIUM"}]"#;
    let workspaces: Vec<WorkspaceInfo> = serde_json::from_str(payload).expect("payload parses");
    let resource = Resource::from(workspaces.into_iter().next().expect("one workspace"));
    assert_eq!(resource.id, "42");
    assert_eq!(resource.name, "test-ws1");
    assert_eq!(
        resource.created_at.map(|at| at.timestamp_millis()),
        Some(1_700_000_000_000)
    );
}

#[test]
fn scim_payload_maps_user_name() {
    let payload = r#"{"totalResults":1,"Resources":[{"id":"u1","userName":"a@awsbricks.com"}]}"#;
    let users: models::ScimUserList = serde_json::from_str(payload).expect("payload parses");
    let resources = users
        .resources
        .into_iter()
        .map(Resource::from)
        .collect::<Vec<_>>();
    assert_eq!(
        resources,
        vec![Resource::new(ResourceKind::User, "u1", "a@awsbricks.com")]
    );
}

#[test]
fn empty_catalog_listing_defaults_to_no_items() {
    let catalogs: models::CatalogList = serde_json::from_str("{}").expect("payload parses");
    assert!(catalogs.catalogs.is_empty());
}

#[test]
fn cluster_edit_serialises_single_node_shape() {
    let edit = crate::test_support::cluster_edit("c-1");
    let value = serde_json::to_value(&edit).expect("edit serialises");
    assert_eq!(value["num_workers"], 0);
    assert_eq!(value["data_security_mode"], "SINGLE_USER");
    assert_eq!(value["aws_attributes"]["availability"], "ON_DEMAND");
}

#[test]
fn permissions_serialise_upper_case() {
    let body = models::PermissionAssignment {
        permissions: &[WorkspacePermission::Admin],
    };
    assert_eq!(
        serde_json::to_string(&body).expect("serialises"),
        r#"{"permissions":["ADMIN"]}"#
    );
}

fn account_client() -> AccountClient {
    AccountClient::new(
        client("https://accounts.cloud.databricks.com"),
        String::from("acc"),
    )
}

fn workspace_client() -> WorkspaceClient {
    WorkspaceClient::new(client("https://dbc-1.cloud.databricks.com"))
}

fn json_body(request: &Request) -> serde_json::Value {
    let bytes = request
        .body()
        .and_then(reqwest::Body::as_bytes)
        .expect("request should carry a buffered body");
    serde_json::from_slice(bytes).expect("body should be JSON")
}

fn bearer(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(reqwest::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

#[rstest]
#[case::users(ResourceKind::User, "/api/2.0/accounts/acc/scim/v2/Users")]
#[case::metastores(ResourceKind::Metastore, "/api/2.0/accounts/acc/metastores")]
#[case::workspaces(ResourceKind::Workspace, "/api/2.0/accounts/acc/workspaces")]
#[case::networks(ResourceKind::NetworkConfig, "/api/2.0/accounts/acc/networks")]
#[case::storage(
    ResourceKind::StorageConfig,
    "/api/2.0/accounts/acc/storage-configurations"
)]
#[case::credentials(ResourceKind::CredentialConfig, "/api/2.0/accounts/acc/credentials")]
fn account_kinds_list_their_collection(#[case] kind: ResourceKind, #[case] path: &str) {
    let account = account_client();
    let request = account
        .collection(kind)
        .expect("account kind")
        .list_request()
        .expect("request builds");

    assert_eq!(*request.method(), Method::GET);
    assert_eq!(request.url().path(), path);
    assert_eq!(request.url().query(), None);
    assert_eq!(bearer(&request), Some("Bearer tok"));
}

#[rstest]
#[case::users(ResourceKind::User, "/api/2.0/accounts/acc/scim/v2/Users/id-old", None)]
#[case::metastores(
    ResourceKind::Metastore,
    "/api/2.0/accounts/acc/metastores/id-old",
    Some("force=true")
)]
#[case::workspaces(ResourceKind::Workspace, "/api/2.0/accounts/acc/workspaces/id-old", None)]
#[case::networks(ResourceKind::NetworkConfig, "/api/2.0/accounts/acc/networks/id-old", None)]
#[case::storage(
    ResourceKind::StorageConfig,
    "/api/2.0/accounts/acc/storage-configurations/id-old",
    None
)]
#[case::credentials(
    ResourceKind::CredentialConfig,
    "/api/2.0/accounts/acc/credentials/id-old",
    None
)]
fn account_kinds_delete_by_id(
    #[case] kind: ResourceKind,
    #[case] path: &str,
    #[case] query: Option<&str>,
) {
    let account = account_client();
    let target = crate::test_support::resource(kind, "old");
    let request = account
        .collection(kind)
        .expect("account kind")
        .delete_request(&target)
        .expect("request builds");

    assert_eq!(*request.method(), Method::DELETE);
    assert_eq!(request.url().path(), path);
    assert_eq!(request.url().query(), query);
}

#[rstest]
#[case::external_locations(ResourceKind::ExternalLocation, "external-locations")]
#[case::storage_credentials(ResourceKind::StorageCredential, "storage-credentials")]
#[case::catalogs(ResourceKind::Catalog, "catalogs")]
fn unity_catalog_kinds_are_addressed_by_name(
    #[case] kind: ResourceKind,
    #[case] collection: &str,
) {
    let workspace = workspace_client();
    let items = workspace.collection(kind).expect("workspace kind");
    let target = crate::test_support::resource(kind, "old");
    let base = format!("/api/2.1/unity-catalog/{collection}");

    let list = items.list_request().expect("list builds");
    assert_eq!(*list.method(), Method::GET);
    assert_eq!(list.url().path(), base);

    let delete = items.delete_request(&target).expect("delete builds");
    assert_eq!(*delete.method(), Method::DELETE);
    assert_eq!(delete.url().path(), format!("{base}/old"));
    assert_eq!(delete.url().query(), Some("force=true"));

    let owner = items
        .owner_request(&target, "sp-owner")
        .expect("owner update builds");
    assert_eq!(*owner.method(), Method::PATCH);
    assert_eq!(owner.url().path(), format!("{base}/old"));
    assert_eq!(json_body(&owner), serde_json::json!({ "owner": "sp-owner" }));
    assert_eq!(bearer(&owner), Some("Bearer tok"));
}

#[test]
fn admin_assignment_puts_permissions_for_principal() {
    let request = account_client()
        .assignment_request(42, "sp-admin", &[WorkspacePermission::Admin])
        .expect("request builds");

    assert_eq!(*request.method(), Method::PUT);
    assert_eq!(
        request.url().path(),
        "/api/2.0/accounts/acc/workspaces/42/permissionassignments/principals/sp-admin"
    );
    assert_eq!(
        json_body(&request),
        serde_json::json!({ "permissions": ["ADMIN"] })
    );
}

#[test]
fn workspace_listing_uses_account_collection_path() {
    let request = account_client()
        .workspaces_request()
        .expect("request builds");
    assert_eq!(request.url().path(), "/api/2.0/accounts/acc/workspaces");
}

#[test]
fn cluster_requests_post_to_clusters_api() {
    let workspace = workspace_client();

    let edit = workspace
        .edit_request(&crate::test_support::cluster_edit("c-1"))
        .expect("edit builds");
    assert_eq!(*edit.method(), Method::POST);
    assert_eq!(edit.url().path(), "/api/2.1/clusters/edit");
    assert_eq!(json_body(&edit)["cluster_id"], "c-1");

    let start = workspace.start_request("c-1").expect("start builds");
    assert_eq!(*start.method(), Method::POST);
    assert_eq!(start.url().path(), "/api/2.1/clusters/start");
    assert_eq!(json_body(&start), serde_json::json!({ "cluster_id": "c-1" }));
}
