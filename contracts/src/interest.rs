//! Per-position interest accrual.
//!
//! Interest is simple interest on principal, charged per logical block and
//! settled whenever a position is touched. The engine keeps a [`RateIndex`]:
//! the sum of the per-block rate over every elapsed block. A position stores
//! the index it was last settled at and owes `debt * (index_now - snapshot)`.
//!
//! - Each block accrues at the rate in force during that block
//! - Accrued interest is kept apart from principal and never capitalized
//! - Owed amounts round up

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::{ProtocolError, ProtocolResult};
use crate::math::{self, one};
use crate::types::Position;

/// Block time units (milliseconds) per logical block
pub const BLOCK_TIME: u64 = 1_000;

/// Seconds in a year (365 days)
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Basis points scale (100% = 10000 bps)
pub const BPS_SCALE: u64 = 10_000;

/// Logical block for a chain block time
pub fn block_at(block_time: u64) -> u64 {
    block_time / BLOCK_TIME
}

/// Per-block rate (1e18 scaled) equivalent to an annual rate in basis points.
///
/// One logical block is one second, so 10000 bps gives `1e18 / 31_536_000`.
pub fn rate_per_block_from_apr_bps(apr_bps: u32) -> U256 {
    U256::from(apr_bps) * one() / U256::from(BPS_SCALE) / U256::from(SECONDS_PER_YEAR)
}

/// Cumulative interest per unit of principal, 1e18 scaled
#[odra::odra_type]
#[derive(Default)]
pub struct RateIndex {
    /// Sum of `rate * blocks` over every closed rate period
    pub cumulative: U256,
    /// Logical block `cumulative` was brought forward to
    pub updated_at: u64,
}

impl RateIndex {
    pub fn starting_at(now: u64) -> Self {
        Self { cumulative: U256::zero(), updated_at: now }
    }

    /// Index at `now` if `rate_per_block` has applied since `updated_at`
    pub fn value_at(&self, rate_per_block: U256, now: u64) -> ProtocolResult<U256> {
        if now <= self.updated_at || rate_per_block.is_zero() {
            return Ok(self.cumulative);
        }
        let elapsed = U256::from(now - self.updated_at);
        let growth = rate_per_block
            .checked_mul(elapsed)
            .ok_or(ProtocolError::MathOverflow)?;
        math::checked_add(self.cumulative, growth)
    }

    /// Close the period charged at `rate_per_block`. Called before the rate
    /// changes.
    pub fn advance(&mut self, rate_per_block: U256, now: u64) -> ProtocolResult<()> {
        self.cumulative = self.value_at(rate_per_block, now)?;
        if now > self.updated_at {
            self.updated_at = now;
        }
        Ok(())
    }
}

/// Interest owed on `debt` between two index readings
///
/// `I = debt * (index_now - snapshot) / 1e18`, rounded up. Zero when there
/// is no debt or the index has not moved.
pub fn accrue(debt: U256, snapshot: U256, index_now: U256) -> ProtocolResult<U256> {
    if debt.is_zero() || index_now <= snapshot {
        return Ok(U256::zero());
    }
    math::mul_up(debt, index_now - snapshot)
}

/// Settle pending interest into `position.interest` and move its snapshot
/// to `index_now` and its checkpoint to `now`. Returns the newly accrued
/// amount.
pub fn settle(position: &mut Position, index_now: U256, now: u64) -> ProtocolResult<U256> {
    let accrued = accrue(position.debt, position.rate_index, index_now)?;
    position.interest = math::checked_add(position.interest, accrued)?;
    if index_now > position.rate_index {
        position.rate_index = index_now;
    }
    if now > position.checkpoint {
        position.checkpoint = now;
    }
    Ok(accrued)
}

/// Copy of `position` as it would look if settled at `index_now`
pub fn project(position: &Position, index_now: U256, now: u64) -> ProtocolResult<Position> {
    let mut projected = position.clone();
    settle(&mut projected, index_now, now)?;
    Ok(projected)
}
