//! Workshop maintenance for `bricksweep`.
//!
//! This binary rewrites the clusters of the target deployment (or every
//! deployment) to the workshop shape, starts them, or grants the admin
//! principal admin on every workspace.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing::info;

use bricksweep::api::{AccountClient, build_account_client, build_workspace_client};
use bricksweep::cli::{UpdateAction, UpdateCli};
use bricksweep::clusters::target_deployments;
use bricksweep::{
    ApiError, AuthError, ClientCredentials, ClusterConfig, ClusterError, ClusterTemplate,
    ClusterUpdater, ConfigError, PlatformConfig, fetch_token, grant_workspace_admin, logging,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("API call failed: {0}")]
    Api(#[from] ApiError),
    #[error("cluster update failed for {deployment}: {source}")]
    Cluster {
        deployment: String,
        #[source]
        source: ClusterError,
    },
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = UpdateCli::parse();
    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(err) => {
            writeln!(io::stderr(), "{err}").ok();
            1
        }
    };

    process::exit(exit_code);
}

async fn run(cli: UpdateCli) -> Result<(), CliError> {
    let mut config = PlatformConfig::load_without_cli_args()?;
    apply_overrides(&mut config, &cli);
    config.validate()?;
    let credentials = ClientCredentials::new(cli.client_id.as_str(), cli.client_secret.as_str())?;

    info!("Databricks Account ID: {}", cli.databricks_account_id);
    let http = reqwest::Client::new();
    let token = fetch_token(
        &http,
        &config.accounts_host,
        &cli.databricks_account_id,
        &credentials,
    )
    .await?;
    let account = build_account_client(
        http.clone(),
        &config,
        token.clone(),
        &cli.databricks_account_id,
    )?;
    if cli.dry_run {
        info!("DRY RUN - No changes will be made");
    }

    let Some(pass) = cluster_pass(cli.action) else {
        let report = grant_workspace_admin(&account, &config.admin_principal_id, cli.dry_run).await?;
        info!(
            examined = report.examined,
            granted = report.granted,
            "permission update finished"
        );
        return Ok(());
    };

    let cluster_config = ClusterConfig::load_without_cli_args()?;
    cluster_config.validate()?;
    let template = ClusterTemplate::new(cluster_config, config.protected_user.clone());
    let plan = Plan {
        account: &account,
        http,
        token,
        config: &config,
        template,
    };
    plan.clusters(pass, cli.dry_run).await
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ClusterPass {
    Update,
    Start,
}

/// Cluster pass for `action`, or `None` when the action is not about clusters.
const fn cluster_pass(action: UpdateAction) -> Option<ClusterPass> {
    match action {
        UpdateAction::UpdateClusters => Some(ClusterPass::Update),
        UpdateAction::StartClusters => Some(ClusterPass::Start),
        UpdateAction::GrantAdmin => None,
    }
}

struct Plan<'a> {
    account: &'a AccountClient,
    http: reqwest::Client,
    token: bricksweep::AccessToken,
    config: &'a PlatformConfig,
    template: ClusterTemplate,
}

impl Plan<'_> {
    async fn clusters(&self, pass: ClusterPass, dry_run: bool) -> Result<(), CliError> {
        let deployments =
            target_deployments(self.account, self.config.target_deployment.as_deref()).await?;
        for deployment in deployments {
            let workspace = build_workspace_client(
                self.http.clone(),
                self.config,
                self.token.clone(),
                &deployment,
            )?;
            let updater = ClusterUpdater::new(workspace, self.template.clone(), dry_run);
            let outcome = match pass {
                ClusterPass::Update => updater.update_clusters(&deployment).await,
                ClusterPass::Start => updater.start_clusters().await,
            };
            let report = outcome.map_err(|source| CliError::Cluster {
                deployment: deployment.clone(),
                source,
            })?;
            info!(
                deployment = %deployment,
                examined = report.examined,
                updated = report.updated,
                started = report.started,
                "cluster pass finished"
            );
        }
        Ok(())
    }
}

fn apply_overrides(config: &mut PlatformConfig, cli: &UpdateCli) {
    if let Some(deployment) = cli.deployment_name.as_deref() {
        config.target_deployment = Some(deployment.to_owned());
    }
}
