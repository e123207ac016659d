//! Binary entry point for the `bricksweep` sweeper.

use std::io::{self, Write};
use std::process;

use chrono::Utc;
use clap::Parser;
use thiserror::Error;
use tracing::info;

use bricksweep::api::{build_account_client, build_workspace_client};
use bricksweep::cli::SweepCli;
use bricksweep::orchestrator::{self, FailurePolicy, RunSummary};
use bricksweep::{
    ApiError, AuthError, ClientCredentials, ConfigError, PlatformConfig, RetentionPolicy,
    SweepContext, fetch_token, logging,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("client setup failed: {0}")]
    Client(#[from] ApiError),
    #[error("sweep incomplete: {failed} stage(s) failed")]
    Incomplete { failed: usize },
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = SweepCli::parse();
    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

async fn run(cli: SweepCli) -> Result<(), CliError> {
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
    let workspace = build_workspace_client(http, &config, token, &cli.databricks_workspace_id)?;

    if cli.dry_run {
        info!("DRY RUN - No resources will be deleted");
    }
    let ctx = sweep_context(&cli, &config);
    let stages = orchestrator::sweep_stages(&account, &workspace, &config)?;
    let summary = orchestrator::run(&stages, &ctx, FailurePolicy::from(cli.on_failure)).await;
    summarise(&summary)
}

fn apply_overrides(config: &mut PlatformConfig, cli: &SweepCli) {
    if let Some(days) = cli.max_age_days {
        config.max_age_days = days;
    }
}

fn sweep_context(cli: &SweepCli, config: &PlatformConfig) -> SweepContext {
    SweepContext {
        dry_run: cli.dry_run,
        now: Utc::now(),
        policy: RetentionPolicy::new(cli.prefix.clone(), config.max_age_days),
        owner_principal: config.owner_principal_id.clone(),
    }
}

fn summarise(summary: &RunSummary) -> Result<(), CliError> {
    info!(
        stages = summary.reports.len(),
        deleted = summary.deleted(),
        "sweep finished"
    );
    if summary.is_clean() {
        Ok(())
    } else {
        Err(CliError::Incomplete {
            failed: summary.failures.len(),
        })
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use bricksweep::cli::FailureMode;
    use bricksweep::test_support::platform_config;
    use bricksweep::{ResourceKind, SweepError, SweepReport};

    fn cli(prefix: Option<&str>, max_age_days: Option<u32>) -> SweepCli {
        SweepCli {
            databricks_account_id: String::from("acc"),
            databricks_workspace_id: String::from("dbc-1"),
            client_id: String::from("id"),
            client_secret: String::from("secret"),
            prefix: prefix.map(str::to_owned),
            dry_run: true,
            max_age_days,
            on_failure: FailureMode::Abort,
        }
    }

    #[test]
    fn max_age_flag_overrides_configuration() {
        let mut config = platform_config();
        apply_overrides(&mut config, &cli(None, Some(30)));
        assert_eq!(config.max_age_days, 30);
    }

    #[test]
    fn configuration_age_applies_without_flag() {
        let mut config = platform_config();
        apply_overrides(&mut config, &cli(None, None));
        let ctx = sweep_context(&cli(None, None), &config);
        assert_eq!(ctx.policy.max_age(), chrono::Duration::days(7));
        assert!(ctx.dry_run);
    }

    #[test]
    fn empty_prefix_falls_back_to_age() {
        let ctx = sweep_context(&cli(Some(""), None), &platform_config());
        assert_eq!(ctx.policy.prefix(), None);
    }

    #[test]
    fn failures_make_the_run_incomplete() {
        let summary = RunSummary {
            reports: Vec::<SweepReport>::new(),
            failures: vec![SweepError {
                kind: ResourceKind::User,
                source: ApiError::Transport {
                    path: String::from("/api"),
                    message: String::from("reset"),
                },
            }],
            aborted: true,
        };
        let err = summarise(&summary).expect_err("failures should surface");
        assert!(matches!(err, CliError::Incomplete { failed: 1 }));
        assert!(summarise(&RunSummary::default()).is_ok());
    }

    #[test]
    fn write_error_writes_cli_error() {
        let mut buf = Vec::new();
        let err = CliError::Auth(AuthError::MissingAccessToken);
        write_error(&mut buf, &err);
        let rendered = String::from_utf8(buf).expect("utf8");
        assert!(
            rendered.starts_with("authentication failed"),
            "rendered: {rendered}"
        );
    }
}
