//! # Integration Tests
//!
//! Cross-subsystem scenario tests that drive the assembled provider runtime
//! through whole blocks: throttled slashing under pressure, key-assignment
//! rule walk-throughs, randomized assignment/power simulations, and
//! validator-set replication.
//!
//! The `fixture` module provides the simulated collaborators (staking with a
//! staged power table, a recording transport) shared by every suite.

pub mod fixture;

#[cfg(test)]
mod key_assignment_simulation;
#[cfg(test)]
mod replication;
#[cfg(test)]
mod throttle_scenarios;
