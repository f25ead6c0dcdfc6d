//! Bonding Protocol Contracts
//!
//! Collateralized bonding engine and share vault on Casper.
//!
//! ## Architecture
//!
//! - **Bonding**: Holds collateral per account and issues the stable token
//!   against it, with per-block interest and price-driven liquidation
//! - **Earn**: Share vault over the stable token whose price grows with a
//!   per-block reward schedule
//! - **PriceOracle**: Admin-fed price table read through `PriceFeed`
//! - **PermissionedToken**: CEP-18 ledger with permissioned mint/burn, used
//!   for the stable token
//!
//! Accounting lives in plain functions (`math`, `interest`, `position`,
//! `health`, `rewards`) so the modules only load state, call them and move
//! tokens.

#![cfg_attr(target_arch = "wasm32", no_std)]

#[cfg(target_arch = "wasm32")]
extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Core module declarations
pub mod errors;
pub mod events;
pub mod health;
pub mod interest;
pub mod interfaces;
pub mod math;
pub mod position;
pub mod rewards;
pub mod types;

// Contract modules
pub mod bonding;
pub mod earn;
pub mod oracle;
pub mod token;
