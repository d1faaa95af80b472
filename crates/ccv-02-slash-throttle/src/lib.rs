//! # CCV-02 Slash Throttle - Consumer-Initiated Slashing Subsystem
//!
//! ## Purpose
//!
//! Rate-limits slashing requests arriving from consumer chains so that a
//! single misbehaving or compromised consumer cannot jail more than a
//! configured fraction of provider power per replenish period. The limiter is
//! an integer slash meter: downtime slashes drain it by the jailed
//! validator's power, a wall-clock schedule refills it, and an exhausted
//! meter *bounces* requests back to the consumer for retry.
//!
//! ## Meter State Machine
//!
//! ```text
//! (positive) --admit downtime slash (power p)--> meter -= p   [may go <= 0]
//! (any)      --block time >= candidate--> meter = min(allowance, meter + allowance)
//!                                         candidate = block time + period
//! ```
//!
//! The meter can be driven arbitrarily negative in a single block (the first
//! admitted slash may exceed the allowance) and then needs
//! ceil(|deficit| / allowance) replenish ticks to turn positive again.
//!
//! ## Double Signs
//!
//! Double-sign infractions are cryptographically provable and rare, so they
//! bypass the meter entirely: the validator is jailed immediately and a slash
//! log entry is recorded, with the meter untouched.
//!
//! ## Back-pressure
//!
//! Bouncing is the sole back-pressure mechanism. The provider keeps no queue
//! of pending slashes; the consumer's CCV module retries a bounced request
//! with a fresh sequence number after backoff.
//!
//! ## Outbound Dependencies
//!
//! | Collaborator | Trait | Purpose |
//! |--------------|-------|---------|
//! | Staking | `StakingSlashing` | Validator lookup, power tables, jailing |
//! | Key Assignment | `ConsumerAddressResolver` | Consumer address -> provider validator |

pub mod domain;
pub mod error;
pub mod metrics;
pub mod packet_handler;
pub mod ports;
pub mod service;

pub use domain::fraction::ReplenishFraction;
pub use domain::params::ThrottleParams;
pub use domain::store::ThrottleStore;
pub use error::{ThrottleError, ThrottleResult};
pub use packet_handler::PacketHandler;
pub use ports::inbound::ThrottleApi;
pub use ports::outbound::{ConsumerAddressResolver, StakingSlashing};
pub use service::ThrottleService;
