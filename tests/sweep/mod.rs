//! Sweep BDD suite.

mod bdd_steps;
mod scenarios;
mod test_helpers;
