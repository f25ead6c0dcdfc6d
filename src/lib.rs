//! Bonding Protocol
//!
//! Workspace facade over the contract crate.

pub use bonding_protocol_contracts::*;
