//! Common types used across the bonding engine.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::{ProtocolError, ProtocolResult};
use crate::math::{one, ratio};

/// An asset the engine holds or issues: its ledger and its oracle symbol
#[odra::odra_type]
pub struct AssetInfo {
    /// Token ledger contract address
    pub token: Address,
    /// Symbol the oracle prices this asset under (e.g. "ABNB")
    pub symbol: String,
}

/// Lifecycle state of an account position
#[odra::odra_type]
#[derive(Copy)]
pub enum PositionStatus {
    /// Never deposited
    Empty,
    /// Holds collateral, owes nothing
    Collateralized,
    /// Owes principal and/or interest
    Indebted,
    /// Emptied by liquidation
    Liquidated,
    /// Emptied by its owner
    Closed,
}

/// Per-account collateral/debt position
#[odra::odra_type]
#[derive(Default)]
pub struct Position {
    /// Primary collateral held on behalf of the account
    pub collateral: U256,
    /// Secondary collateral held on behalf of the account
    pub secondary_collateral: U256,
    /// Outstanding principal (stable token)
    pub debt: U256,
    /// Interest accrued but not yet paid
    pub interest: U256,
    /// Rate index the interest was last settled at
    pub rate_index: U256,
    /// Logical block of the last interest settlement
    pub checkpoint: u64,
    /// Whether the account ever deposited
    pub opened: bool,
    /// Number of liquidations applied to this position
    pub liquidations: u32,
}

/// Engine configuration. Ratios and rates are scaled by 1e18.
#[odra::odra_type]
pub struct EngineConfig {
    /// Borrowing cap as a fraction of collateral value
    pub max_loan_to_value: U256,
    /// A position is liquidatable when value * liquidation_ratio < owed
    pub liquidation_ratio: U256,
    /// Simple interest charged on principal per logical block
    pub interest_rate_per_block: U256,
    /// Extra share of seized collateral routed to the fee recipient
    pub liquidation_penalty: U256,
    /// Weight applied to secondary collateral value
    pub secondary_ratio: U256,
    /// Receives interest and liquidation penalties
    pub fee_recipient: Address,
}

impl EngineConfig {
    /// 50% max LTV, 80% liquidation ratio, no interest, no penalty and
    /// secondary collateral weighted at 50%
    pub fn with_defaults(fee_recipient: Address) -> Self {
        Self {
            max_loan_to_value: ratio(1, 2),
            liquidation_ratio: ratio(8, 10),
            interest_rate_per_block: U256::zero(),
            liquidation_penalty: U256::zero(),
            secondary_ratio: ratio(1, 2),
            fee_recipient,
        }
    }

    /// `0 < max_loan_to_value <= liquidation_ratio <= 1`,
    /// `secondary_ratio <= 1` and `liquidation_penalty <= 0.5`
    pub fn validate(&self) -> ProtocolResult<()> {
        if self.max_loan_to_value.is_zero()
            || self.max_loan_to_value > self.liquidation_ratio
            || self.liquidation_ratio > one()
            || self.secondary_ratio > one()
            || self.liquidation_penalty > ratio(1, 2)
        {
            return Err(ProtocolError::InvalidConfig);
        }
        Ok(())
    }
}

/// Aggregate counters for solvency reporting
#[odra::odra_type]
#[derive(Default)]
pub struct EngineTotals {
    /// Primary collateral held across all positions
    pub total_collateral: U256,
    /// Secondary collateral held across all positions
    pub total_secondary_collateral: U256,
    /// Outstanding principal across all positions
    pub total_debt: U256,
    /// Interest paid to the fee recipient
    pub total_interest_collected: U256,
    /// Collateral routed to the fee recipient as liquidation penalty
    pub total_penalty_collateral: U256,
    /// Number of liquidations executed
    pub liquidation_count: u64,
}

/// Remaining headroom of a position
#[odra::odra_type]
#[derive(Default)]
pub struct Quota {
    /// Stable amount that can still be borrowed
    pub borrowable: U256,
    /// Primary collateral that can still be withdrawn
    pub withdrawable: U256,
}

/// How a payment was split between interest and principal
#[odra::odra_type]
#[derive(Default)]
pub struct Repayment {
    pub interest_paid: U256,
    pub principal_paid: U256,
}

impl Repayment {
    pub fn total(&self) -> U256 {
        self.interest_paid + self.principal_paid
    }
}

/// Outcome of a liquidation
#[odra::odra_type]
pub struct LiquidationResult {
    /// Liquidated account
    pub account: Address,
    /// Account that repaid the debt
    pub liquidator: Address,
    /// Debt repaid, split into interest and principal
    pub repayment: Repayment,
    /// Primary collateral paid to the liquidator
    pub collateral_to_liquidator: U256,
    /// Secondary collateral paid to the liquidator
    pub secondary_to_liquidator: U256,
    /// Primary collateral paid to the fee recipient
    pub penalty_collateral: U256,
    /// Secondary collateral paid to the fee recipient
    pub penalty_secondary: U256,
}

/// Position query result, projected to the current block
#[odra::odra_type]
pub struct PositionInfo {
    /// Position with pending interest included
    pub position: Position,
    /// Weighted collateral value in stable units
    pub collateral_value: U256,
    /// Maximum debt allowed at the current prices
    pub max_borrow: U256,
    /// Lifecycle state
    pub status: PositionStatus,
    /// Whether the position can be liquidated right now
    pub liquidatable: bool,
}
