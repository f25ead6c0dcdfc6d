//! Collateral valuation and solvency rules.
//!
//! All values are expressed in stable-token units. Oracle prices are
//! 1e18-scaled quotes against a common unit; a collateral amount is converted
//! to stable units with `amount * price(asset) / price(stable)`.

use odra::casper_types::U256;
use crate::errors::{ProtocolError, ProtocolResult};
use crate::math::{self, checked_add, mul_div_down, mul_down};
use crate::types::{EngineConfig, Position, Quota};

/// Oracle prices read for one operation.
///
/// `secondary` is zero when no secondary asset is configured or the price
/// was not needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prices {
    pub collateral: U256,
    pub secondary: U256,
    pub stable: U256,
}

/// Collateral to seize in a liquidation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Seizure {
    /// Primary collateral paid to the liquidator
    pub primary: U256,
    /// Secondary collateral paid to the liquidator
    pub secondary: U256,
    /// Primary collateral paid to the fee recipient
    pub penalty_primary: U256,
    /// Secondary collateral paid to the fee recipient
    pub penalty_secondary: U256,
}

impl Seizure {
    pub fn total_primary(&self) -> U256 {
        self.primary + self.penalty_primary
    }

    pub fn total_secondary(&self) -> U256 {
        self.secondary + self.penalty_secondary
    }

    /// Stable value of what the liquidator receives, secondary unweighted
    pub fn liquidator_value(&self, prices: &Prices) -> ProtocolResult<U256> {
        let primary = primary_value(self.primary, prices)?;
        if self.secondary.is_zero() {
            return Ok(primary);
        }
        checked_add(primary, mul_div_down(self.secondary, prices.secondary, prices.stable)?)
    }
}

/// Stable value of a primary collateral amount, rounded down
pub fn primary_value(amount: U256, prices: &Prices) -> ProtocolResult<U256> {
    mul_div_down(amount, prices.collateral, prices.stable)
}

/// Weighted stable value of a secondary collateral amount, rounded down
pub fn secondary_value(amount: U256, prices: &Prices, secondary_ratio: U256) -> ProtocolResult<U256> {
    if amount.is_zero() {
        return Ok(U256::zero());
    }
    let raw = mul_div_down(amount, prices.secondary, prices.stable)?;
    mul_down(raw, secondary_ratio)
}

/// Primary collateral worth `value` stable units, rounded down
pub fn collateral_for_value(value: U256, prices: &Prices) -> ProtocolResult<U256> {
    mul_div_down(value, prices.stable, prices.collateral)
}

/// Total weighted collateral value of a position
pub fn collateral_value(position: &Position, prices: &Prices, config: &EngineConfig) -> ProtocolResult<U256> {
    let primary = primary_value(position.collateral, prices)?;
    let secondary = secondary_value(position.secondary_collateral, prices, config.secondary_ratio)?;
    checked_add(primary, secondary)
}

/// Largest debt a collateral value supports
pub fn max_borrow(value: U256, config: &EngineConfig) -> ProtocolResult<U256> {
    mul_down(value, config.max_loan_to_value)
}

/// Fails with `err` when the owed total exceeds the max loan-to-value
pub fn ensure_within_ltv(
    position: &Position,
    prices: &Prices,
    config: &EngineConfig,
    err: ProtocolError,
) -> ProtocolResult<()> {
    let value = collateral_value(position, prices, config)?;
    if position.owed() > max_borrow(value, config)? {
        return Err(err);
    }
    Ok(())
}

/// Fails with `err` unless `value * liquidation_ratio >= debt + interest`.
///
/// Guards collateral leaving a position: a withdrawal may go past max LTV
/// but never into liquidation territory.
pub fn ensure_above_liquidation_ratio(
    position: &Position,
    prices: &Prices,
    config: &EngineConfig,
    err: ProtocolError,
) -> ProtocolResult<()> {
    if is_liquidatable(position, prices, config)? {
        return Err(err);
    }
    Ok(())
}

/// Fails with `err` when `after` is over max LTV and owes more per unit of
/// collateral value than `before` did.
///
/// Lets a position that interest has pushed past max LTV keep adding
/// collateral at max LTV.
pub fn ensure_no_worse_than(
    before: &Position,
    after: &Position,
    prices: &Prices,
    config: &EngineConfig,
    err: ProtocolError,
) -> ProtocolResult<()> {
    if ensure_within_ltv(after, prices, config, err).is_ok() {
        return Ok(());
    }
    if before.owed().is_zero() {
        return Err(err);
    }
    let value_before = collateral_value(before, prices, config)?;
    let value_after = collateral_value(after, prices, config)?;
    // owed_after / value_after <= owed_before / value_before
    let lhs = after.owed().checked_mul(value_before).ok_or(ProtocolError::MathOverflow)?;
    let rhs = before.owed().checked_mul(value_after).ok_or(ProtocolError::MathOverflow)?;
    if lhs > rhs {
        return Err(err);
    }
    Ok(())
}

/// `value * liquidation_ratio < debt + interest`
pub fn is_liquidatable(position: &Position, prices: &Prices, config: &EngineConfig) -> ProtocolResult<bool> {
    let owed = position.owed();
    if owed.is_zero() {
        return Ok(false);
    }
    let value = collateral_value(position, prices, config)?;
    Ok(mul_down(value, config.liquidation_ratio)? < owed)
}

/// Remaining borrow headroom (max LTV) and withdrawable primary collateral
/// (liquidation ratio)
pub fn quota(position: &Position, prices: &Prices, config: &EngineConfig) -> ProtocolResult<Quota> {
    let value = collateral_value(position, prices, config)?;
    let owed = position.owed();
    let borrowable = max_borrow(value, config)?.saturating_sub(owed);

    let withdrawable = if owed.is_zero() {
        position.collateral
    } else {
        let required = math::div_up(owed, config.liquidation_ratio)?;
        let excess = value.saturating_sub(required);
        collateral_for_value(excess, prices)?.min(position.collateral)
    };

    Ok(Quota { borrowable, withdrawable })
}

/// Stable minted when bonding `amount` of primary collateral
pub fn bond_output(amount: U256, prices: &Prices, config: &EngineConfig) -> ProtocolResult<U256> {
    max_borrow(primary_value(amount, prices)?, config)
}

/// Primary collateral released when unbonding `amount` of stable.
///
/// Inverse of [`bond_output`]: the collateral worth `amount / max_ltv`,
/// capped at what the position holds.
pub fn unbond_release(
    amount: U256,
    position: &Position,
    prices: &Prices,
    config: &EngineConfig,
) -> ProtocolResult<U256> {
    let value = math::div_down(amount, config.max_loan_to_value)?;
    Ok(collateral_for_value(value, prices)?.min(position.collateral))
}

/// Collateral owed to a liquidator repaying `amount` and the penalty on top.
///
/// Primary collateral covers the repaid value first; any remainder is taken
/// from secondary collateral at its unweighted price. The penalty is a
/// fraction of each seized amount, capped by what is left.
pub fn plan_liquidation(
    position: &Position,
    amount: U256,
    prices: &Prices,
    config: &EngineConfig,
) -> ProtocolResult<Seizure> {
    let needed = collateral_for_value(amount, prices)?;
    let mut seizure = Seizure::default();

    if needed <= position.collateral {
        seizure.primary = needed;
    } else {
        seizure.primary = position.collateral;
        let covered = primary_value(position.collateral, prices)?;
        let remaining = amount.saturating_sub(covered);
        if !remaining.is_zero() && !position.secondary_collateral.is_zero() {
            seizure.secondary = mul_div_down(remaining, prices.stable, prices.secondary)?
                .min(position.secondary_collateral);
        }
    }

    seizure.penalty_primary = mul_down(seizure.primary, config.liquidation_penalty)?
        .min(position.collateral - seizure.primary);
    seizure.penalty_secondary = mul_down(seizure.secondary, config.liquidation_penalty)?
        .min(position.secondary_collateral - seizure.secondary);

    Ok(seizure)
}
