//! BDD scenarios for the resource sweeper.

use rstest_bdd_macros::scenario;

use super::test_helpers::{SweepWorld, sweep_world};

#[scenario(
    path = "tests/features/sweep.feature",
    name = "Delete workspaces matching the prefix"
)]
fn scenario_prefix_sweep(sweep_world: SweepWorld) {
    let _ = sweep_world;
}

#[scenario(
    path = "tests/features/sweep.feature",
    name = "Delete only expired resources when no prefix is given"
)]
fn scenario_age_sweep(sweep_world: SweepWorld) {
    let _ = sweep_world;
}

#[scenario(
    path = "tests/features/sweep.feature",
    name = "Dry run reports candidates without deleting"
)]
fn scenario_dry_run(sweep_world: SweepWorld) {
    let _ = sweep_world;
}

#[scenario(
    path = "tests/features/sweep.feature",
    name = "Built-in catalogs survive an age sweep"
)]
fn scenario_protected_catalogs(sweep_world: SweepWorld) {
    let _ = sweep_world;
}

#[scenario(
    path = "tests/features/sweep.feature",
    name = "The shared lab user is never deleted"
)]
fn scenario_protected_user(sweep_world: SweepWorld) {
    let _ = sweep_world;
}

#[scenario(
    path = "tests/features/sweep.feature",
    name = "Stop at the first failed deletion"
)]
fn scenario_failed_deletion(sweep_world: SweepWorld) {
    let _ = sweep_world;
}
