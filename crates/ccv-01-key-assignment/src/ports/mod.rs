//! Driving and driven ports for the Key Assignment subsystem.

pub mod inbound;
pub mod outbound;

pub use inbound::KeyAssignmentApi;
pub use outbound::StakingQuery;
