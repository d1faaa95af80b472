//! # CCV-01 Key Assignment - Consumer Consensus Keys Subsystem
//!
//! ## Purpose
//!
//! Lets each provider validator use a distinct consensus key on each consumer
//! chain. Maintains the bidirectional mapping between provider validators and
//! their consumer-specific keys, keeps historical consumer addresses
//! resolvable for the unbonding window, and bounds storage by pruning expired
//! reverse-lookup entries on a wall-clock schedule.
//!
//! ## Domain Invariants
//!
//! | Invariant | Meaning | Enforcement |
//! |-----------|---------|-------------|
//! | Uniqueness | No two provider validators resolve to the same consumer address on the same consumer | `service.rs` - `assign_consumer_key()` rejection chain |
//! | Bounded storage | Every reverse-lookup entry is either a current assignment or scheduled for pruning | `service.rs` - prune scheduling on reassignment; checked by `domain/invariants.rs` |
//! | Lookup stability | A consumer address active at block time t resolves to the same provider address until the pruner passes t | `service.rs` - `prune_key_assignments()` deletes only expired, non-current entries |
//!
//! ## Assignment Rules
//!
//! `assign_consumer_key` rejects, in order:
//!
//! 1. consumers outside the Initialized/Launched phases,
//! 2. keys whose consumer address is already claimed by another validator
//!    (including addresses still inside the unbonding window),
//! 3. keys currently used by a *different* active provider validator,
//! 4. a validator "assigning" its own provider key when it has no prior
//!    assignment on that consumer (the no-op default reassignment; the same
//!    move is the legitimate undo once a non-default key was assigned).
//!
//! ## Outbound Dependencies
//!
//! | Collaborator | Trait | Purpose |
//! |--------------|-------|---------|
//! | Staking | `StakingQuery` | Active-validator lookup by consensus address, unbonding time |
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use ccv_01_key_assignment::{KeyAssignmentService, ports::inbound::KeyAssignmentApi};
//!
//! let service = KeyAssignmentService::new(state_store, staking);
//! let consumer = service.create_consumer("pion-1".to_string()).await?;
//! service.set_consumer_phase(&consumer, ConsumerPhase::Initialized).await?;
//! service.assign_consumer_key(&consumer, &validator, new_key, ctx).await?;
//! ```

pub mod domain;
pub mod error;
pub mod metrics;
pub mod msgs;
pub mod ports;
pub mod service;

pub use domain::phase::{ConsumerPhase, ConsumerRecord};
pub use domain::store::KeyAssignmentStore;
pub use error::{KeyAssignmentError, KeyAssignmentResult};
pub use msgs::{MsgAssignConsumerKey, MsgCreateConsumer, MsgUpdateConsumer, ProviderMsg};
pub use ports::inbound::KeyAssignmentApi;
pub use ports::outbound::StakingQuery;
pub use service::KeyAssignmentService;
