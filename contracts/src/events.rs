//! Events emitted by the protocol modules.

use odra::prelude::*;
use odra::casper_types::U256;

// Bonding

#[odra::event]
pub struct Bonded {
    pub account: Address,
    pub collateral: U256,
    pub minted: U256,
}

#[odra::event]
pub struct Unbonded {
    pub account: Address,
    pub repaid: U256,
    pub released: U256,
}

#[odra::event]
pub struct CollateralProvided {
    pub account: Address,
    pub amount: U256,
    pub secondary: bool,
}

#[odra::event]
pub struct CollateralWithdrawn {
    pub account: Address,
    pub amount: U256,
    pub secondary: bool,
}

#[odra::event]
pub struct Borrowed {
    pub account: Address,
    pub amount: U256,
    pub new_debt: U256,
}

#[odra::event]
pub struct Repaid {
    pub account: Address,
    pub interest_paid: U256,
    pub principal_paid: U256,
    pub new_debt: U256,
}

#[odra::event]
pub struct InterestSettled {
    pub account: Address,
    pub accrued: U256,
    pub checkpoint: u64,
}

#[odra::event]
pub struct Liquidated {
    pub account: Address,
    pub liquidator: Address,
    pub repaid: U256,
    pub collateral_seized: U256,
    pub secondary_seized: U256,
    pub penalty_collateral: U256,
    pub penalty_secondary: U256,
}

#[odra::event]
pub struct ConfigUpdated {
    pub max_loan_to_value: U256,
    pub liquidation_ratio: U256,
    pub interest_rate_per_block: U256,
    pub liquidation_penalty: U256,
    pub secondary_ratio: U256,
    pub fee_recipient: Address,
}

#[odra::event]
pub struct ConfiguratorTransferred {
    pub previous: Address,
    pub new: Address,
}

// Earn

#[odra::event]
pub struct Staked {
    pub account: Address,
    pub amount: U256,
    pub shares: U256,
}

#[odra::event]
pub struct Unstaked {
    pub account: Address,
    pub shares: U256,
    pub amount: U256,
}

#[odra::event]
pub struct RewardsAccrued {
    pub reward: U256,
    pub total_underlying: U256,
    pub block: u64,
}

#[odra::event]
pub struct RewardScheduleUpdated {
    pub reward_per_block: U256,
    pub end_block: u64,
}

// Oracle

#[odra::event]
pub struct PriceUpdated {
    pub asset: String,
    pub price: U256,
}

// Token ledgers (token and vault shares)

#[odra::event]
pub struct Transfer {
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub amount: U256,
}

#[odra::event]
pub struct Approval {
    pub owner: Address,
    pub spender: Address,
    pub amount: U256,
}

#[odra::event]
pub struct PermissionChanged {
    pub account: Address,
    pub granted: bool,
}
