//! Bonding Engine Contract
//!
//! Holds collateral on behalf of accounts and issues the stable token
//! against it. Every operation settles the caller's interest first and reads
//! fresh oracle prices before checking solvency.
//!
//! Collateral moves through CEP-18 `transfer_from`/`transfer`; the stable
//! token is minted and burned through a ledger that has granted this
//! contract permission.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::errors::{ProtocolError, ProtocolResult};
use crate::events::{
    Bonded, Borrowed, CollateralProvided, CollateralWithdrawn, ConfigUpdated,
    ConfiguratorTransferred, InterestSettled, Liquidated, Repaid, Unbonded,
};
use crate::health::{self, Prices};
use crate::interest::{self, block_at, RateIndex};
use crate::interfaces::{Cep18TokenContractRef, MintableTokenContractRef, PriceFeedContractRef};
use crate::types::{
    AssetInfo, EngineConfig, EngineTotals, LiquidationResult, Position, PositionInfo,
    PositionStatus, Quota, Repayment,
};

#[odra::module(events = [
    Bonded,
    Unbonded,
    CollateralProvided,
    CollateralWithdrawn,
    Borrowed,
    Repaid,
    InterestSettled,
    Liquidated,
    ConfigUpdated,
    ConfiguratorTransferred
])]
pub struct Bonding {
    /// Primary collateral asset
    collateral: Var<AssetInfo>,
    /// Issued stable asset
    stable: Var<AssetInfo>,
    /// Optional secondary collateral asset
    secondary: Var<Option<AssetInfo>>,
    /// Price feed address
    oracle: Var<Address>,
    /// Risk parameters
    config: Var<EngineConfig>,
    /// Address allowed to change the config
    configurator: Var<Address>,
    /// Per-account positions
    positions: Mapping<Address, Position>,
    /// Aggregate counters
    totals: Var<EngineTotals>,
    /// Cumulative per-block rate, closed at every rate change
    rate_index: Var<RateIndex>,
}

#[odra::module]
impl Bonding {
    pub fn init(
        &mut self,
        collateral: AssetInfo,
        stable: AssetInfo,
        secondary: Option<AssetInfo>,
        oracle: Address,
        fee_recipient: Address,
    ) {
        self.collateral.set(collateral);
        self.stable.set(stable);
        self.secondary.set(secondary);
        self.oracle.set(oracle);
        self.config.set(EngineConfig::with_defaults(fee_recipient));
        self.configurator.set(self.env().caller());
        self.totals.set(EngineTotals::default());
        self.rate_index.set(RateIndex::starting_at(self.now()));
    }

    // ========== Position Operations ==========

    /// Deposit `amount` collateral and mint stable at the max loan-to-value.
    /// Returns the amount minted.
    pub fn bond(&mut self, amount: U256, min_out: U256) -> U256 {
        self.require_non_zero(amount);
        let caller = self.env().caller();
        let config = self.load_config();
        let mut position = self.settled_position(caller, &config);
        let before = position.clone();

        let prices = self.prices_for(&position);
        let minted = self.or_revert(health::bond_output(amount, &prices, &config));
        if minted < min_out {
            self.env().revert(ProtocolError::SlippageExceeded);
        }

        position.collateral += amount;
        position.debt += minted;
        position.opened = true;
        self.or_revert(health::ensure_no_worse_than(
            &before,
            &position,
            &prices,
            &config,
            ProtocolError::ExceedsLoanToValue,
        ));
        self.positions.set(&caller, position);

        let mut totals = self.totals.get_or_default();
        totals.total_collateral += amount;
        totals.total_debt += minted;
        self.totals.set(totals);

        self.pull_collateral(caller, amount);
        if !minted.is_zero() {
            self.stable_ledger().mint(caller, minted);
        }

        self.env().emit_event(Bonded { account: caller, collateral: amount, minted });
        minted
    }

    /// Repay `amount` stable and release the collateral that backed it.
    /// Returns the collateral released.
    pub fn unbond(&mut self, amount: U256, min_out: U256) -> U256 {
        self.require_non_zero(amount);
        let caller = self.env().caller();
        let config = self.load_config();
        let mut position = self.settled_position(caller, &config);

        let repayment = self.or_revert(position.apply_repayment(amount));
        let prices = self.prices_for(&position);
        let released = self.or_revert(health::unbond_release(amount, &position, &prices, &config));
        if released < min_out {
            self.env().revert(ProtocolError::SlippageExceeded);
        }

        position.collateral -= released;
        self.or_revert(health::ensure_above_liquidation_ratio(
            &position,
            &prices,
            &config,
            ProtocolError::InsufficientCollateral,
        ));
        self.positions.set(&caller, position);

        let mut totals = self.totals.get_or_default();
        totals.total_collateral -= released;
        self.record_repayment(&mut totals, &repayment);
        self.totals.set(totals);

        self.collect_payment(caller, &repayment, &config);
        if !released.is_zero() {
            self.collateral_ledger().transfer(caller, released);
        }

        self.env().emit_event(Unbonded { account: caller, repaid: amount, released });
        released
    }

    /// Deposit primary collateral without borrowing
    pub fn provide(&mut self, amount: U256) {
        self.require_non_zero(amount);
        let caller = self.env().caller();
        let config = self.load_config();
        let mut position = self.settled_position(caller, &config);

        position.collateral += amount;
        position.opened = true;
        self.positions.set(&caller, position);

        let mut totals = self.totals.get_or_default();
        totals.total_collateral += amount;
        self.totals.set(totals);

        self.pull_collateral(caller, amount);
        self.env().emit_event(CollateralProvided { account: caller, amount, secondary: false });
    }

    /// Deposit secondary collateral
    pub fn provide_secondary(&mut self, amount: U256) {
        self.require_non_zero(amount);
        let asset = self.secondary_asset();
        let caller = self.env().caller();
        let config = self.load_config();
        let mut position = self.settled_position(caller, &config);

        position.secondary_collateral += amount;
        position.opened = true;
        self.positions.set(&caller, position);

        let mut totals = self.totals.get_or_default();
        totals.total_secondary_collateral += amount;
        self.totals.set(totals);

        let self_address = self.env().self_address();
        Cep18TokenContractRef::new(self.env().clone(), asset.token)
            .transfer_from(caller, self_address, amount);
        self.env().emit_event(CollateralProvided { account: caller, amount, secondary: true });
    }

    /// Return `amount` primary collateral to the caller
    pub fn withdraw(&mut self, amount: U256) {
        self.require_non_zero(amount);
        let caller = self.env().caller();
        let config = self.load_config();
        let mut position = self.settled_position(caller, &config);

        if position.collateral < amount {
            self.env().revert(ProtocolError::InsufficientCollateral);
        }
        position.collateral -= amount;
        self.require_healthy_after_withdraw(&position, &config);
        self.positions.set(&caller, position);

        let mut totals = self.totals.get_or_default();
        totals.total_collateral -= amount;
        self.totals.set(totals);

        self.collateral_ledger().transfer(caller, amount);
        self.env().emit_event(CollateralWithdrawn { account: caller, amount, secondary: false });
    }

    /// Return `amount` secondary collateral to the caller
    pub fn withdraw_secondary(&mut self, amount: U256) {
        self.require_non_zero(amount);
        let asset = self.secondary_asset();
        let caller = self.env().caller();
        let config = self.load_config();
        let mut position = self.settled_position(caller, &config);

        if position.secondary_collateral < amount {
            self.env().revert(ProtocolError::InsufficientCollateral);
        }
        position.secondary_collateral -= amount;
        self.require_healthy_after_withdraw(&position, &config);
        self.positions.set(&caller, position);

        let mut totals = self.totals.get_or_default();
        totals.total_secondary_collateral -= amount;
        self.totals.set(totals);

        Cep18TokenContractRef::new(self.env().clone(), asset.token).transfer(caller, amount);
        self.env().emit_event(CollateralWithdrawn { account: caller, amount, secondary: true });
    }

    /// Mint `amount` stable against the caller's collateral
    pub fn borrow(&mut self, amount: U256) {
        self.require_non_zero(amount);
        let caller = self.env().caller();
        let config = self.load_config();
        let mut position = self.settled_position(caller, &config);

        position.debt += amount;
        let prices = self.prices_for(&position);
        self.or_revert(health::ensure_within_ltv(
            &position,
            &prices,
            &config,
            ProtocolError::ExceedsLoanToValue,
        ));
        let new_debt = position.debt;
        self.positions.set(&caller, position);

        let mut totals = self.totals.get_or_default();
        totals.total_debt += amount;
        self.totals.set(totals);

        self.stable_ledger().mint(caller, amount);
        self.env().emit_event(Borrowed { account: caller, amount, new_debt });
    }

    /// Pay back `amount` stable, interest first
    pub fn repay(&mut self, amount: U256) -> Repayment {
        self.require_non_zero(amount);
        let caller = self.env().caller();
        let config = self.load_config();
        let mut position = self.settled_position(caller, &config);

        let repayment = self.or_revert(position.apply_repayment(amount));
        let new_debt = position.debt;
        self.positions.set(&caller, position);

        let mut totals = self.totals.get_or_default();
        self.record_repayment(&mut totals, &repayment);
        self.totals.set(totals);

        self.collect_payment(caller, &repayment, &config);
        self.env().emit_event(Repaid {
            account: caller,
            interest_paid: repayment.interest_paid,
            principal_paid: repayment.principal_paid,
            new_debt,
        });
        repayment
    }

    /// Repay `amount` of an under-collateralized account's debt in exchange
    /// for its collateral.
    ///
    /// `min_out` is the least stable value, at current oracle prices, of the
    /// primary and secondary collateral the liquidator receives.
    pub fn liquidate(&mut self, account: Address, amount: U256, min_out: U256) -> LiquidationResult {
        self.require_non_zero(amount);
        let liquidator = self.env().caller();
        let config = self.load_config();
        let mut position = self.settled_position(account, &config);

        let prices = self.prices_for(&position);
        if !self.or_revert(health::is_liquidatable(&position, &prices, &config)) {
            self.env().revert(ProtocolError::HealthyPosition);
        }
        if amount > position.owed() {
            self.env().revert(ProtocolError::ExceedsDebt);
        }

        let seizure = self.or_revert(health::plan_liquidation(&position, amount, &prices, &config));
        if self.or_revert(seizure.liquidator_value(&prices)) < min_out {
            self.env().revert(ProtocolError::SlippageExceeded);
        }

        let repayment = self.or_revert(position.apply_repayment(amount));
        position.collateral -= seizure.total_primary();
        position.secondary_collateral -= seizure.total_secondary();
        position.liquidations += 1;
        self.positions.set(&account, position);

        let mut totals = self.totals.get_or_default();
        totals.total_collateral -= seizure.total_primary();
        totals.total_secondary_collateral -= seizure.total_secondary();
        totals.total_penalty_collateral += seizure.penalty_primary;
        totals.liquidation_count += 1;
        self.record_repayment(&mut totals, &repayment);
        self.totals.set(totals);

        self.collect_payment(liquidator, &repayment, &config);

        let mut collateral = self.collateral_ledger();
        if !seizure.primary.is_zero() {
            collateral.transfer(liquidator, seizure.primary);
        }
        if !seizure.penalty_primary.is_zero() {
            collateral.transfer(config.fee_recipient, seizure.penalty_primary);
        }
        if !seizure.total_secondary().is_zero() {
            let asset = self.secondary_asset();
            let mut secondary = Cep18TokenContractRef::new(self.env().clone(), asset.token);
            if !seizure.secondary.is_zero() {
                secondary.transfer(liquidator, seizure.secondary);
            }
            if !seizure.penalty_secondary.is_zero() {
                secondary.transfer(config.fee_recipient, seizure.penalty_secondary);
            }
        }

        self.env().emit_event(Liquidated {
            account,
            liquidator,
            repaid: amount,
            collateral_seized: seizure.primary,
            secondary_seized: seizure.secondary,
            penalty_collateral: seizure.penalty_primary,
            penalty_secondary: seizure.penalty_secondary,
        });

        LiquidationResult {
            account,
            liquidator,
            repayment,
            collateral_to_liquidator: seizure.primary,
            secondary_to_liquidator: seizure.secondary,
            penalty_collateral: seizure.penalty_primary,
            penalty_secondary: seizure.penalty_secondary,
        }
    }

    // ========== Views ==========

    /// Accrued plus pending interest as of the current block
    pub fn calculate_interest(&self, account: Address) -> U256 {
        self.projected_position(account).interest
    }

    /// Remaining borrow headroom and withdrawable collateral as of now
    pub fn calculate_quota(&self, account: Address) -> Quota {
        let config = self.load_config();
        let position = self.projected_position(account);
        let prices = self.prices_for(&position);
        self.or_revert(health::quota(&position, &prices, &config))
    }

    pub fn get_position(&self, account: Address) -> PositionInfo {
        let config = self.load_config();
        let position = self.projected_position(account);
        let prices = self.prices_for(&position);
        let collateral_value = self.or_revert(health::collateral_value(&position, &prices, &config));
        let max_borrow = self.or_revert(health::max_borrow(collateral_value, &config));
        let liquidatable = self.or_revert(health::is_liquidatable(&position, &prices, &config));
        PositionInfo {
            status: position.status(),
            position,
            collateral_value,
            max_borrow,
            liquidatable,
        }
    }

    pub fn get_position_status(&self, account: Address) -> PositionStatus {
        self.positions.get(&account).unwrap_or_default().status()
    }

    pub fn is_liquidatable(&self, account: Address) -> bool {
        let config = self.load_config();
        let position = self.projected_position(account);
        if position.owed().is_zero() {
            return false;
        }
        let prices = self.prices_for(&position);
        self.or_revert(health::is_liquidatable(&position, &prices, &config))
    }

    pub fn get_config(&self) -> EngineConfig {
        self.load_config()
    }

    pub fn get_totals(&self) -> EngineTotals {
        self.totals.get_or_default()
    }

    pub fn get_configurator(&self) -> Option<Address> {
        self.configurator.get()
    }

    pub fn get_oracle(&self) -> Option<Address> {
        self.oracle.get()
    }

    pub fn get_collateral_asset(&self) -> Option<AssetInfo> {
        self.collateral.get()
    }

    pub fn get_stable_asset(&self) -> Option<AssetInfo> {
        self.stable.get()
    }

    pub fn get_secondary_asset(&self) -> Option<AssetInfo> {
        self.secondary.get().flatten()
    }

    // ========== Configuration ==========

    /// Replace all risk parameters
    pub fn set_rate(
        &mut self,
        max_loan_to_value: U256,
        liquidation_penalty: U256,
        interest_rate_per_block: U256,
        liquidation_ratio: U256,
        secondary_ratio: U256,
    ) {
        self.require_configurator();
        let config = EngineConfig {
            max_loan_to_value,
            liquidation_penalty,
            interest_rate_per_block,
            liquidation_ratio,
            secondary_ratio,
            ..self.load_config()
        };
        self.store_config(config);
    }

    /// Change only the loan-to-value and liquidation thresholds
    pub fn set_value(&mut self, max_loan_to_value: U256, liquidation_ratio: U256) {
        self.require_configurator();
        let config = EngineConfig {
            max_loan_to_value,
            liquidation_ratio,
            ..self.load_config()
        };
        self.store_config(config);
    }

    pub fn set_fee_recipient(&mut self, fee_recipient: Address) {
        self.require_configurator();
        let config = EngineConfig { fee_recipient, ..self.load_config() };
        self.store_config(config);
    }

    pub fn transfer_configurator(&mut self, new_configurator: Address) {
        self.require_configurator();
        let previous = self.env().caller();
        self.configurator.set(new_configurator);
        self.env().emit_event(ConfiguratorTransferred { previous, new: new_configurator });
    }

    // ========== Internal Functions ==========

    fn now(&self) -> u64 {
        block_at(self.env().get_block_time())
    }

    fn load_config(&self) -> EngineConfig {
        match self.config.get() {
            Some(config) => config,
            None => self.env().revert(ProtocolError::InvalidConfig),
        }
    }

    fn store_config(&mut self, config: EngineConfig) {
        self.or_revert(config.validate());
        let previous = self.load_config();
        let mut index = self.rate_index.get_or_default();
        self.or_revert(index.advance(previous.interest_rate_per_block, self.now()));
        self.rate_index.set(index);

        self.env().emit_event(ConfigUpdated {
            max_loan_to_value: config.max_loan_to_value,
            liquidation_ratio: config.liquidation_ratio,
            interest_rate_per_block: config.interest_rate_per_block,
            liquidation_penalty: config.liquidation_penalty,
            secondary_ratio: config.secondary_ratio,
            fee_recipient: config.fee_recipient,
        });
        self.config.set(config);
    }

    /// Load `account`'s position with interest settled to the current block
    fn settled_position(&mut self, account: Address, config: &EngineConfig) -> Position {
        let mut position = self.positions.get(&account).unwrap_or_default();
        let now = self.now();
        let index_now = self.current_rate_index(config);
        let accrued = self.or_revert(position.settle(index_now, now));
        if !accrued.is_zero() {
            self.env().emit_event(InterestSettled { account, accrued, checkpoint: now });
        }
        position
    }

    fn projected_position(&self, account: Address) -> Position {
        let config = self.load_config();
        let position = self.positions.get(&account).unwrap_or_default();
        let index_now = self.current_rate_index(&config);
        self.or_revert(interest::project(&position, index_now, self.now()))
    }

    fn current_rate_index(&self, config: &EngineConfig) -> U256 {
        let index = self.rate_index.get_or_default();
        self.or_revert(index.value_at(config.interest_rate_per_block, self.now()))
    }

    /// Current oracle prices. The secondary price is only read when the
    /// position holds secondary collateral.
    fn prices_for(&self, position: &Position) -> Prices {
        let oracle = PriceFeedContractRef::new(self.env().clone(), self.oracle_address());
        let collateral = self.asset(&self.collateral);
        let stable = self.asset(&self.stable);

        let secondary = match self.secondary.get().flatten() {
            Some(asset) if !position.secondary_collateral.is_zero() => oracle.get_price(asset.symbol),
            _ => U256::zero(),
        };

        Prices {
            collateral: oracle.get_price(collateral.symbol),
            secondary,
            stable: oracle.get_price(stable.symbol),
        }
    }

    fn require_healthy_after_withdraw(&self, position: &Position, config: &EngineConfig) {
        if position.owed().is_zero() {
            return;
        }
        let prices = self.prices_for(position);
        self.or_revert(health::ensure_above_liquidation_ratio(
            position,
            &prices,
            config,
            ProtocolError::InsufficientCollateral,
        ));
    }

    fn record_repayment(&self, totals: &mut EngineTotals, repayment: &Repayment) {
        totals.total_debt -= repayment.principal_paid;
        totals.total_interest_collected += repayment.interest_paid;
    }

    /// Burn the full payment from `payer` and re-mint the interest part to
    /// the fee recipient
    fn collect_payment(&self, payer: Address, repayment: &Repayment, config: &EngineConfig) {
        let mut stable = self.stable_ledger();
        stable.burn_from(payer, repayment.total());
        if !repayment.interest_paid.is_zero() {
            stable.mint(config.fee_recipient, repayment.interest_paid);
        }
    }

    fn pull_collateral(&self, from: Address, amount: U256) {
        let self_address = self.env().self_address();
        self.collateral_ledger().transfer_from(from, self_address, amount);
    }

    fn collateral_ledger(&self) -> Cep18TokenContractRef {
        Cep18TokenContractRef::new(self.env().clone(), self.asset(&self.collateral).token)
    }

    fn stable_ledger(&self) -> MintableTokenContractRef {
        MintableTokenContractRef::new(self.env().clone(), self.asset(&self.stable).token)
    }

    fn secondary_asset(&self) -> AssetInfo {
        match self.secondary.get().flatten() {
            Some(asset) => asset,
            None => self.env().revert(ProtocolError::InvalidConfig),
        }
    }

    fn asset(&self, var: &Var<AssetInfo>) -> AssetInfo {
        match var.get() {
            Some(asset) => asset,
            None => self.env().revert(ProtocolError::InvalidConfig),
        }
    }

    fn oracle_address(&self) -> Address {
        match self.oracle.get() {
            Some(oracle) => oracle,
            None => self.env().revert(ProtocolError::InvalidConfig),
        }
    }

    fn require_non_zero(&self, amount: U256) {
        if amount.is_zero() {
            self.env().revert(ProtocolError::ZeroAmount);
        }
    }

    fn require_configurator(&self) {
        if self.configurator.get() != Some(self.env().caller()) {
            self.env().revert(ProtocolError::Unauthorized);
        }
    }
}

impl Bonding {
    fn or_revert<T>(&self, result: ProtocolResult<T>) -> T {
        match result {
            Ok(value) => value,
            Err(error) => self.env().revert(error),
        }
    }
}
