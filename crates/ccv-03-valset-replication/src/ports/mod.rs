//! Driven ports for the ValSet Replication subsystem.

pub mod outbound;

pub use outbound::{
    AllowAll, BondedSetProvider, BondedValidator, KeyLookup, PacketSender, ValidatorFilter,
};
