//! BDD step definitions for sweep behaviour.

use bricksweep::test_support::{FakeResources, platform_config, status_error, sweep_context};
use bricksweep::{ApiError, ResourceApi, SweepRule, Sweeper};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{SweepOutcome, SweepWorld, parse_kind, parse_resources, split_names};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn collection(sweep_world: &SweepWorld) -> Result<&FakeResources, StepError> {
    sweep_world
        .collection
        .as_ref()
        .ok_or_else(|| StepError::Assertion(String::from("no collection configured")))
}

#[given("a \"{kind}\" collection holding \"{names}\"")]
fn collection_holding(mut sweep_world: SweepWorld, kind: String, names: String) -> SweepWorld {
    let parsed = parse_kind(kind.trim());
    sweep_world.collection = Some(FakeResources::new(
        parsed,
        parse_resources(parsed, &names),
    ));
    sweep_world
}

#[given("the prefix \"{prefix}\"")]
fn with_prefix(mut sweep_world: SweepWorld, prefix: String) -> SweepWorld {
    sweep_world.prefix = Some(prefix);
    sweep_world
}

#[given("dry run mode")]
fn dry_run_mode(mut sweep_world: SweepWorld) -> SweepWorld {
    sweep_world.dry_run = true;
    sweep_world
}

#[given("deleting \"{name}\" fails with status {status:u16}")]
fn deleting_fails(sweep_world: SweepWorld, name: String, status: u16) -> SweepWorld {
    let Some(fake) = sweep_world.collection.as_ref() else {
        panic!("test setup requires a collection");
    };
    fake.fail_delete(&name, status_error(status));
    sweep_world
}

#[when("I run the sweep")]
fn run_sweep(mut sweep_world: SweepWorld) -> SweepWorld {
    let runtime = Runtime::new().unwrap_or_else(|err| panic!("test runtime should start: {err}"));
    let fake = sweep_world
        .collection
        .clone()
        .unwrap_or_else(|| panic!("test setup requires a collection"));
    let rule = SweepRule::for_kind(fake.kind(), &platform_config());
    let ctx = sweep_context(sweep_world.dry_run, sweep_world.prefix.as_deref());
    let sweeper = Sweeper::new(fake, rule);
    sweep_world.outcome = Some(match runtime.block_on(sweeper.sweep(&ctx)) {
        Ok(report) => SweepOutcome::Success(report),
        Err(err) => SweepOutcome::Failure(err),
    });
    sweep_world
}

#[then("the deleted names are \"{names}\"")]
fn deleted_names(sweep_world: &SweepWorld, names: String) -> Result<(), StepError> {
    let deleted = collection(sweep_world)?.deleted();
    let expected = split_names(&names);
    if deleted == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected deletions {expected:?}, got {deleted:?}"
        )))
    }
}

#[then("the remaining names are \"{names}\"")]
fn remaining_names(sweep_world: &SweepWorld, names: String) -> Result<(), StepError> {
    let remaining = collection(sweep_world)?.remaining();
    let expected = split_names(&names);
    if remaining == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected remaining {expected:?}, got {remaining:?}"
        )))
    }
}

#[then("nothing is deleted")]
fn nothing_deleted(sweep_world: &SweepWorld) -> Result<(), StepError> {
    let deleted = collection(sweep_world)?.deleted();
    if deleted.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "dry run deleted {deleted:?}"
        )))
    }
}

#[then("the sweep selected \"{names}\"")]
fn sweep_selected(sweep_world: &SweepWorld, names: String) -> Result<(), StepError> {
    let Some(SweepOutcome::Success(report)) = sweep_world.outcome.as_ref() else {
        return Err(StepError::Assertion(format!(
            "expected a successful sweep, got {:?}",
            sweep_world.outcome
        )));
    };
    let expected = split_names(&names);
    if report.selected == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected selection {expected:?}, got {:?}",
            report.selected
        )))
    }
}

#[then("the sweep fails with status {status:u16}")]
fn sweep_fails(sweep_world: &SweepWorld, status: u16) -> Result<(), StepError> {
    let Some(SweepOutcome::Failure(err)) = sweep_world.outcome.as_ref() else {
        return Err(StepError::Assertion(format!(
            "expected a failed sweep, got {:?}",
            sweep_world.outcome
        )));
    };
    match &err.source {
        ApiError::Status { status: actual, .. } if *actual == status => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected status {status}, got {other}"
        ))),
    }
}
