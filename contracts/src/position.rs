//! Position bookkeeping independent of prices.

use odra::casper_types::U256;
use crate::errors::{ProtocolError, ProtocolResult};
use crate::interest;
use crate::types::{Position, PositionStatus, Repayment};

impl Position {
    /// Principal plus accrued interest
    pub fn owed(&self) -> U256 {
        self.debt + self.interest
    }

    /// True when the position holds no collateral of either kind
    pub fn holds_nothing(&self) -> bool {
        self.collateral.is_zero() && self.secondary_collateral.is_zero()
    }

    pub fn settle(&mut self, index_now: U256, now: u64) -> ProtocolResult<U256> {
        interest::settle(self, index_now, now)
    }

    pub fn status(&self) -> PositionStatus {
        if !self.opened {
            return PositionStatus::Empty;
        }
        if !self.owed().is_zero() {
            return PositionStatus::Indebted;
        }
        if !self.holds_nothing() {
            return PositionStatus::Collateralized;
        }
        if self.liquidations > 0 {
            PositionStatus::Liquidated
        } else {
            PositionStatus::Closed
        }
    }

    /// Apply a payment of `amount`, interest first, then principal.
    ///
    /// Fails with `OverRepay` when `amount` exceeds what is owed; the
    /// position is left untouched in that case.
    pub fn apply_repayment(&mut self, amount: U256) -> ProtocolResult<Repayment> {
        if amount > self.owed() {
            return Err(ProtocolError::OverRepay);
        }
        let interest_paid = amount.min(self.interest);
        let principal_paid = amount - interest_paid;
        self.interest -= interest_paid;
        self.debt -= principal_paid;
        Ok(Repayment { interest_paid, principal_paid })
    }
}
