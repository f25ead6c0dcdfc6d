//! Price Oracle Contract
//!
//! Admin-fed table of 1e18-scaled prices keyed by asset symbol. The engine
//! reads it through [`crate::interfaces::PriceFeed`].

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::ProtocolError;
use crate::events::PriceUpdated;

#[odra::module(events = [PriceUpdated])]
pub struct PriceOracle {
    /// Address allowed to publish prices
    admin: Var<Address>,
    /// Latest price per asset symbol
    prices: Mapping<String, U256>,
    /// Block time of the latest update per asset symbol
    updated_at: Mapping<String, u64>,
}

#[odra::module]
impl PriceOracle {
    pub fn init(&mut self, admin: Address) {
        self.admin.set(admin);
    }

    /// Publish prices for several assets at once
    pub fn set_price(&mut self, assets: Vec<String>, prices: Vec<U256>) {
        self.require_admin();
        if assets.len() != prices.len() {
            self.env().revert(ProtocolError::PriceLengthMismatch);
        }

        let now = self.env().get_block_time();
        for (asset, price) in assets.into_iter().zip(prices) {
            self.prices.set(&asset, price);
            self.updated_at.set(&asset, now);
            self.env().emit_event(PriceUpdated { asset, price });
        }
    }

    /// Latest price for `asset`; reverts when it was never set or is zero
    pub fn get_price(&self, asset: String) -> U256 {
        match self.prices.get(&asset) {
            Some(price) if !price.is_zero() => price,
            _ => self.env().revert(ProtocolError::PriceUnavailable),
        }
    }

    pub fn get_updated_at(&self, asset: String) -> u64 {
        self.updated_at.get(&asset).unwrap_or_default()
    }

    pub fn get_admin(&self) -> Option<Address> {
        self.admin.get()
    }

    pub fn transfer_admin(&mut self, new_admin: Address) {
        self.require_admin();
        self.admin.set(new_admin);
    }

    fn require_admin(&self) {
        if self.admin.get() != Some(self.env().caller()) {
            self.env().revert(ProtocolError::Unauthorized);
        }
    }
}
