//! Workspace permission assignment across the whole account.

use tracing::info;

use crate::api::{AccountClient, ApiError, ApiFuture, WorkspaceInfo, WorkspacePermission};

/// Account calls needed to enumerate workspaces and assign permissions.
pub trait WorkspaceDirectory {
    /// Lists every workspace in the account.
    fn list_workspaces(&self) -> ApiFuture<'_, Vec<WorkspaceInfo>>;

    /// Replaces a principal's permissions on one workspace.
    fn assign_permissions<'a>(
        &'a self,
        workspace_id: i64,
        principal_id: &'a str,
        permissions: &'a [WorkspacePermission],
    ) -> ApiFuture<'a, ()>;
}

impl WorkspaceDirectory for AccountClient {
    fn list_workspaces(&self) -> ApiFuture<'_, Vec<WorkspaceInfo>> {
        Box::pin(Self::list_workspaces(self))
    }

    fn assign_permissions<'a>(
        &'a self,
        workspace_id: i64,
        principal_id: &'a str,
        permissions: &'a [WorkspacePermission],
    ) -> ApiFuture<'a, ()> {
        Box::pin(self.assign_workspace_permissions(workspace_id, principal_id, permissions))
    }
}

/// Outcome of [`grant_workspace_admin`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GrantReport {
    /// Workspaces listed.
    pub examined: usize,
    /// Assignments issued.
    pub granted: usize,
}

/// Grants `principal_id` admin on every workspace, regardless of name or
/// age.
///
/// # Errors
///
/// Returns the first [`ApiError`]; earlier grants stay in place.
pub async fn grant_workspace_admin<D>(
    directory: &D,
    principal_id: &str,
    dry_run: bool,
) -> Result<GrantReport, ApiError>
where
    D: WorkspaceDirectory + ?Sized,
{
    let workspaces = directory.list_workspaces().await?;
    let mut report = GrantReport {
        examined: workspaces.len(),
        granted: 0,
    };
    for workspace in &workspaces {
        if dry_run {
            info!(
                "Would Update Workspace Permission: {}",
                workspace.workspace_id
            );
            continue;
        }
        info!("Updating Workspace Permission: {}", workspace.workspace_id);
        directory
            .assign_permissions(
                workspace.workspace_id,
                principal_id,
                &[WorkspacePermission::Admin],
            )
            .await?;
        report.granted += 1;
    }
    Ok(report)
}
