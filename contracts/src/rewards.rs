//! Share accounting for the Earn vault.
//!
//! The vault tracks `total_underlying` and `total_shares`; their ratio is the
//! share price. Rewards drip into `total_underlying` per logical block, so
//! the price only ever goes up. Share amounts minted and underlying paid out
//! both round down, which keeps the price non-decreasing.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::{ProtocolError, ProtocolResult};
use crate::math::{checked_add, mul_div_down, one};

/// Vault totals
#[odra::odra_type]
#[derive(Default)]
pub struct VaultState {
    pub total_shares: U256,
    pub total_underlying: U256,
}

/// Per-block reward emission
#[odra::odra_type]
#[derive(Default)]
pub struct RewardSchedule {
    /// Underlying added to the vault per logical block
    pub reward_per_block: U256,
    /// Last block that earns rewards; 0 means open-ended
    pub end_block: u64,
    /// Block rewards were last settled at
    pub last_reward_block: u64,
}

impl RewardSchedule {
    /// Schedule starting at `now` that runs for `blocks` (0 = open-ended)
    pub fn starting_at(now: u64, reward_per_block: U256, blocks: u64) -> Self {
        let end_block = if blocks == 0 { 0 } else { now.saturating_add(blocks) };
        Self { reward_per_block, end_block, last_reward_block: now }
    }

    fn capped(&self, now: u64) -> u64 {
        if self.end_block == 0 { now } else { now.min(self.end_block) }
    }
}

/// Reward due at `now`, capped by the unallocated underlying the vault holds
pub fn pending_reward(
    state: &VaultState,
    schedule: &RewardSchedule,
    now: u64,
    available: U256,
) -> ProtocolResult<U256> {
    if state.total_shares.is_zero() || schedule.reward_per_block.is_zero() {
        return Ok(U256::zero());
    }
    let until = schedule.capped(now);
    if until <= schedule.last_reward_block {
        return Ok(U256::zero());
    }
    let elapsed = U256::from(until - schedule.last_reward_block);
    let reward = schedule
        .reward_per_block
        .checked_mul(elapsed)
        .ok_or(ProtocolError::MathOverflow)?;
    Ok(reward.min(available))
}

/// Fold the pending reward into `state` and move the schedule to `now`.
/// Returns the reward added.
pub fn settle(
    state: &mut VaultState,
    schedule: &mut RewardSchedule,
    now: u64,
    available: U256,
) -> ProtocolResult<U256> {
    let reward = pending_reward(state, schedule, now, available)?;
    state.total_underlying = checked_add(state.total_underlying, reward)?;
    if now > schedule.last_reward_block {
        schedule.last_reward_block = now;
    }
    Ok(reward)
}

/// Shares minted for depositing `amount`, rounded down
pub fn shares_for_deposit(state: &VaultState, amount: U256) -> ProtocolResult<U256> {
    let shares = if state.total_shares.is_zero() {
        amount
    } else {
        mul_div_down(amount, state.total_shares, state.total_underlying)?
    };
    if shares.is_zero() {
        return Err(ProtocolError::ZeroShares);
    }
    Ok(shares)
}

/// Underlying paid for redeeming `shares`, rounded down
pub fn underlying_for_shares(state: &VaultState, shares: U256) -> ProtocolResult<U256> {
    if state.total_shares.is_zero() {
        return Ok(U256::zero());
    }
    mul_div_down(shares, state.total_underlying, state.total_shares)
}

/// Underlying per share, 1e18 scaled; 1.0 for an empty vault
pub fn share_price(state: &VaultState) -> ProtocolResult<U256> {
    if state.total_shares.is_zero() {
        return Ok(one());
    }
    mul_div_down(state.total_underlying, one(), state.total_shares)
}
