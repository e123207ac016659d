//! Shared fixtures and helpers for sweep BDD scenarios.

use bricksweep::test_support::{FakeResources, aged_resource, resource};
use bricksweep::{Resource, ResourceKind, SweepError, SweepReport};
use rstest::fixture;

#[derive(Clone, Debug)]
pub enum SweepOutcome {
    Success(SweepReport),
    Failure(SweepError),
}

#[derive(Clone, Debug)]
pub struct SweepWorld {
    pub collection: Option<FakeResources>,
    pub prefix: Option<String>,
    pub dry_run: bool,
    pub outcome: Option<SweepOutcome>,
}

#[fixture]
pub fn sweep_world() -> SweepWorld {
    SweepWorld {
        collection: None,
        prefix: None,
        dry_run: false,
        outcome: None,
    }
}

pub fn parse_kind(label: &str) -> ResourceKind {
    match label {
        "user" => ResourceKind::User,
        "metastore" => ResourceKind::Metastore,
        "workspace" => ResourceKind::Workspace,
        "network" => ResourceKind::NetworkConfig,
        "storage configuration" => ResourceKind::StorageConfig,
        "credential" => ResourceKind::CredentialConfig,
        "external location" => ResourceKind::ExternalLocation,
        "storage credential" => ResourceKind::StorageCredential,
        "catalog" => ResourceKind::Catalog,
        other => panic!("unknown resource kind in feature file: {other}"),
    }
}

/// Parses `name` or `name:age_in_days` entries separated by commas.
pub fn parse_resources(kind: ResourceKind, entries: &str) -> Vec<Resource> {
    split_names(entries)
        .into_iter()
        .map(|entry| match entry.split_once(':') {
            Some((name, days)) => {
                let age = days
                    .parse::<i64>()
                    .unwrap_or_else(|err| panic!("invalid age for {name}: {err}"));
                aged_resource(kind, name, age)
            }
            None => resource(kind, &entry),
        })
        .collect()
}

pub fn split_names(entries: &str) -> Vec<String> {
    entries
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}
