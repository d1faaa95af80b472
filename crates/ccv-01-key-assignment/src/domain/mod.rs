//! Domain layer: consumer lifecycle phases, the typed assignment store over
//! the ordered state store, key encoding, and invariant checks.

pub mod invariants;
pub mod keys;
pub mod phase;
pub mod store;

pub use invariants::{check_pruning_property, check_unique_consumer_addrs};
pub use phase::{ConsumerPhase, ConsumerRecord};
pub use store::KeyAssignmentStore;
