//! Driving and driven ports for the Slash Throttle subsystem.

pub mod inbound;
pub mod outbound;

pub use inbound::ThrottleApi;
pub use outbound::{ConsumerAddressResolver, StakingSlashing};
