//! Contracts the engine and the vault talk to.
//!
//! Argument names match the entry points of [`crate::oracle::PriceOracle`]
//! and [`crate::token::PermissionedToken`]; any contract exposing the same
//! entry points can be injected instead.

use odra::prelude::*;
use odra::casper_types::U256;

/// Oracle price feed, 1e18-scaled quotes keyed by asset symbol
#[odra::external_contract]
pub trait PriceFeed {
    fn get_price(&self, asset: String) -> U256;
}

/// CEP-18 token ledger
#[odra::external_contract]
pub trait Cep18Token {
    fn balance_of(&self, account: Address) -> U256;
    fn transfer(&mut self, recipient: Address, amount: U256) -> bool;
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool;
}

/// Ledger that lets permissioned contracts mint and burn
#[odra::external_contract]
pub trait MintableToken {
    fn mint(&mut self, to: Address, amount: U256);
    fn burn_from(&mut self, from: Address, amount: U256);
}
