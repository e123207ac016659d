//! Generic resource sweeper.
//!
//! One routine serves every resource kind. A [`ResourceApi`] supplies the
//! list/delete (and, for Unity Catalog securables, ownership transfer)
//! calls; a [`SweepRule`] supplies the per-kind selection and protection;
//! a [`SweepContext`] carries the dry-run flag, clock and retention policy.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{ApiError, ApiFuture};
use crate::config::PlatformConfig;
use crate::policy::{self, Decision, Protection, Reason, RetentionPolicy, Selector};
use crate::resource::{Resource, ResourceKind};

/// Calls a sweeper needs for one resource kind.
pub trait ResourceApi {
    /// Kind served by this collection.
    fn kind(&self) -> ResourceKind;

    /// Lists every resource of the kind.
    fn list(&self) -> ApiFuture<'_, Vec<Resource>>;

    /// Deletes one resource.
    fn delete<'a>(&'a self, resource: &'a Resource) -> ApiFuture<'a, ()>;

    /// Makes `owner` the owner of `resource`. Kinds without owners reject
    /// the call.
    fn transfer_owner<'a>(
        &'a self,
        _resource: &'a Resource,
        _owner: &'a str,
    ) -> ApiFuture<'a, ()> {
        let kind = self.kind();
        Box::pin(async move {
            Err(ApiError::Unsupported {
                operation: "ownership transfer",
                kind,
            })
        })
    }
}

impl<T: ResourceApi + ?Sized> ResourceApi for Box<T> {
    fn kind(&self) -> ResourceKind {
        (**self).kind()
    }

    fn list(&self) -> ApiFuture<'_, Vec<Resource>> {
        (**self).list()
    }

    fn delete<'a>(&'a self, resource: &'a Resource) -> ApiFuture<'a, ()> {
        (**self).delete(resource)
    }

    fn transfer_owner<'a>(&'a self, resource: &'a Resource, owner: &'a str) -> ApiFuture<'a, ()> {
        (**self).transfer_owner(resource, owner)
    }
}

/// Per-kind sweep behaviour.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SweepRule {
    /// Kind the rule applies to.
    pub kind: ResourceKind,
    /// How candidates are picked.
    pub selector: Selector,
    /// Names that are never touched.
    pub protection: Protection,
    /// Whether every unprotected resource is handed to the owner principal
    /// before the policy runs.
    pub transfer_owner: bool,
}

impl SweepRule {
    /// Rule for `kind` using the configured protected user and domain.
    #[must_use]
    pub fn for_kind(kind: ResourceKind, config: &PlatformConfig) -> Self {
        let (selector, protection, transfer_owner) = match kind {
            ResourceKind::User => (
                Selector::AccountDomain(config.user_domain.clone()),
                Protection::Named(config.protected_user.clone()),
                false,
            ),
            ResourceKind::ExternalLocation | ResourceKind::StorageCredential => {
                (Selector::PrefixOrAge, Protection::Unprotected, true)
            }
            ResourceKind::Catalog => (Selector::PrefixOrAge, Protection::SystemCatalogs, true),
            _ => (Selector::PrefixOrAge, Protection::Unprotected, false),
        };
        Self {
            kind,
            selector,
            protection,
            transfer_owner,
        }
    }

    /// Decision for a single resource.
    #[must_use]
    pub fn decide(&self, resource: &Resource, ctx: &SweepContext) -> Decision {
        policy::evaluate_with(
            &self.selector,
            &self.protection,
            &ctx.policy,
            &resource.name,
            resource.created_at,
            ctx.now,
        )
    }
}

/// Values shared by every sweep in a run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SweepContext {
    /// Log instead of mutating.
    pub dry_run: bool,
    /// Reference time for age checks.
    pub now: DateTime<Utc>,
    /// Prefix and age threshold.
    pub policy: RetentionPolicy,
    /// Principal receiving ownership of transferred resources.
    pub owner_principal: String,
}

/// What one sweep did.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SweepReport {
    /// Kind swept.
    pub kind: ResourceKind,
    /// Resources returned by the list call.
    pub examined: usize,
    /// Names selected for deletion, in list order.
    pub selected: Vec<String>,
    /// Delete calls issued.
    pub deleted: usize,
    /// Ownership transfer calls issued.
    pub owner_transfers: usize,
    /// Whether the sweep ran in dry-run mode.
    pub dry_run: bool,
}

impl SweepReport {
    const fn empty(kind: ResourceKind, dry_run: bool) -> Self {
        Self {
            kind,
            examined: 0,
            selected: Vec::new(),
            deleted: 0,
            owner_transfers: 0,
            dry_run,
        }
    }
}

/// Raised when an API call fails mid-sweep. Work already done is not
/// rolled back.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{kind} sweep failed: {source}")]
pub struct SweepError {
    /// Kind being swept.
    pub kind: ResourceKind,
    /// Failing call.
    #[source]
    pub source: ApiError,
}

/// Lists one resource kind and deletes what its rule selects.
#[derive(Clone, Debug)]
pub struct Sweeper<A: ResourceApi> {
    api: A,
    rule: SweepRule,
}

impl<A: ResourceApi> Sweeper<A> {
    /// Creates a sweeper over `api` applying `rule`.
    #[must_use]
    pub const fn new(api: A, rule: SweepRule) -> Self {
        Self { api, rule }
    }

    /// Rule in effect.
    #[must_use]
    pub const fn rule(&self) -> &SweepRule {
        &self.rule
    }

    /// Performs the sweep.
    ///
    /// Protected resources are skipped outright. When the rule asks for it,
    /// every other resource is first handed to the owner principal, whether
    /// or not it is then deleted. In dry-run mode neither transfers nor
    /// deletes are issued; each candidate produces exactly one log line.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError`] on the first failing call.
    pub async fn sweep(&self, ctx: &SweepContext) -> Result<SweepReport, SweepError> {
        let kind = self.rule.kind;
        let fail = |source: ApiError| SweepError { kind, source };
        let mut report = SweepReport::empty(kind, ctx.dry_run);

        let resources = self.api.list().await.map_err(fail)?;
        report.examined = resources.len();

        for resource in &resources {
            if self.rule.protection.protects(&resource.name) {
                debug!(kind = %kind, name = %resource.name, "skipping protected resource");
                continue;
            }

            if self.rule.transfer_owner && !ctx.dry_run {
                self.api
                    .transfer_owner(resource, &ctx.owner_principal)
                    .await
                    .map_err(fail)?;
                report.owner_transfers += 1;
            }

            let Decision::Delete(reason) = self.rule.decide(resource, ctx) else {
                continue;
            };
            report.selected.push(resource.name.clone());
            let detail = describe(reason, resource, ctx);
            if ctx.dry_run {
                info!("DRY RUN: Would delete {kind} {}{detail}", resource.name);
            } else {
                info!("Deleting {kind} {}{detail}", resource.name);
                self.api.delete(resource).await.map_err(fail)?;
                report.deleted += 1;
            }
        }

        Ok(report)
    }
}

fn describe(reason: Reason, resource: &Resource, ctx: &SweepContext) -> String {
    match (reason, ctx.policy.prefix(), resource.created_at) {
        (Reason::PrefixMatch, Some(prefix), _) => format!(" with prefix {prefix}"),
        (Reason::Expired, _, Some(created)) => format!(" created on {created}"),
        _ => String::new(),
    }
}
