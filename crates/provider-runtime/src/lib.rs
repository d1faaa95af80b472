//! # Provider Runtime
//!
//! Wires the provider subsystems into the per-block pipeline:
//!
//! ```text
//! BeginBlock:  replenish slash meter, prune expired key assignments
//! (txs):       governance messages, inbound consumer packets
//! EndBlock:    replicate validator sets to launched consumers
//! ```
//!
//! The surrounding chain application (block production, mempool, transport
//! internals) is an external collaborator; this crate only sequences the
//! subsystems within a block and adapts the key-assignment service to the
//! resolver ports the other subsystems consume.

pub mod adapters;
pub mod error;
pub mod runtime;

pub use adapters::KeyAssignmentAdapter;
pub use error::{RuntimeError, RuntimeResult};
pub use runtime::ProviderRuntime;
