//! Earn Vault Contract
//!
//! Share vault over the stable token. Follows the yield-bearing token model:
//! - shares = vault token balance
//! - underlying = stable held for stakers
//! - price = total_underlying / total_shares
//!
//! Rewards are paid per logical block out of stable sent to the vault
//! outside `stake`, so the share price rises instead of balances rebasing.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::errors::{ProtocolError, ProtocolResult};
use crate::events::{Approval, RewardScheduleUpdated, RewardsAccrued, Staked, Transfer, Unstaked};
use crate::interest::block_at;
use crate::interfaces::Cep18TokenContractRef;
use crate::rewards::{self, RewardSchedule, VaultState};

/// Share token decimals
const DECIMALS: u8 = 18;

#[odra::module(events = [Staked, Unstaked, RewardsAccrued, RewardScheduleUpdated, Transfer, Approval])]
pub struct Earn {
    // ===== CEP-18 Share Ledger =====
    name: Var<String>,
    symbol: Var<String>,
    decimals: Var<u8>,
    /// Balance mapping (owner -> shares)
    balances: Mapping<Address, U256>,
    /// Allowance mapping (owner, spender) -> amount
    allowances: Mapping<(Address, Address), U256>,

    // ===== Vault State =====
    /// Staked token
    underlying: Var<Address>,
    /// Share and underlying totals
    state: Var<VaultState>,
    /// Reward emission
    schedule: Var<RewardSchedule>,
    /// Sets the reward schedule
    admin: Var<Address>,
}

#[odra::module]
impl Earn {
    pub fn init(&mut self, underlying: Address, name: String, symbol: String) {
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(DECIMALS);
        self.underlying.set(underlying);
        self.state.set(VaultState::default());
        self.schedule.set(RewardSchedule::starting_at(self.now(), U256::zero(), 0));
        self.admin.set(self.env().caller());
    }

    // ===== Vault Functions =====

    /// Deposit `amount` underlying and receive shares
    pub fn stake(&mut self, amount: U256) -> U256 {
        if amount.is_zero() {
            self.env().revert(ProtocolError::ZeroAmount);
        }
        let caller = self.env().caller();
        let mut state = self.settle_rewards();

        let shares = self.or_revert(rewards::shares_for_deposit(&state, amount));
        state.total_shares += shares;
        state.total_underlying += amount;
        self.state.set(state);

        let self_address = self.env().self_address();
        self.underlying_ledger().transfer_from(caller, self_address, amount);
        self.mint_internal(caller, shares);

        self.env().emit_event(Staked { account: caller, amount, shares });
        shares
    }

    /// Redeem `shares` for underlying
    pub fn withdraw(&mut self, shares: U256) -> U256 {
        if shares.is_zero() {
            self.env().revert(ProtocolError::ZeroAmount);
        }
        let caller = self.env().caller();
        let mut state = self.settle_rewards();

        if self.balance_of(caller) < shares {
            self.env().revert(ProtocolError::InsufficientShares);
        }
        let amount = self.or_revert(rewards::underlying_for_shares(&state, shares));
        state.total_shares -= shares;
        state.total_underlying -= amount;
        self.state.set(state);

        self.burn_internal(caller, shares);
        if !amount.is_zero() {
            self.underlying_ledger().transfer(caller, amount);
        }

        self.env().emit_event(Unstaked { account: caller, shares, amount });
        amount
    }

    /// Underlying per share (1e18 scaled) as of the current block
    pub fn price(&self) -> U256 {
        let state = self.projected_state();
        self.or_revert(rewards::share_price(&state))
    }

    pub fn preview_stake(&self, amount: U256) -> U256 {
        let state = self.projected_state();
        self.or_revert(rewards::shares_for_deposit(&state, amount))
    }

    pub fn preview_withdraw(&self, shares: U256) -> U256 {
        let state = self.projected_state();
        self.or_revert(rewards::underlying_for_shares(&state, shares))
    }

    pub fn total_shares(&self) -> U256 {
        self.state.get_or_default().total_shares
    }

    /// Underlying owned by stakers, including rewards pending at this block
    pub fn total_underlying(&self) -> U256 {
        self.projected_state().total_underlying
    }

    pub fn get_reward_schedule(&self) -> RewardSchedule {
        self.schedule.get_or_default()
    }

    pub fn get_underlying(&self) -> Option<Address> {
        self.underlying.get()
    }

    pub fn get_admin(&self) -> Option<Address> {
        self.admin.get()
    }

    // ===== Admin Functions =====

    /// Emit `reward_per_block` for the next `blocks` blocks (0 = until changed)
    pub fn set_reward_per_block(&mut self, reward_per_block: U256, blocks: u64) {
        self.require_admin();
        let state = self.settle_rewards();
        self.state.set(state);

        let schedule = RewardSchedule::starting_at(self.now(), reward_per_block, blocks);
        self.env().emit_event(RewardScheduleUpdated {
            reward_per_block,
            end_block: schedule.end_block,
        });
        self.schedule.set(schedule);
    }

    pub fn transfer_admin(&mut self, new_admin: Address) {
        self.require_admin();
        self.admin.set(new_admin);
    }

    // ===== CEP-18 Standard Functions =====

    pub fn name(&self) -> String {
        self.name.get_or_default()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get_or_default()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get().unwrap_or(DECIMALS)
    }

    /// Get total supply (total shares)
    pub fn total_supply(&self) -> U256 {
        self.total_shares()
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or_default()
    }

    /// Transfer shares to recipient
    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.transfer_internal(sender, recipient, amount);
        true
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.allowances.set(&(owner, spender), amount);
        self.env().emit_event(Approval { owner, spender, amount });
        true
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();

        let current_allowance = self.allowance(owner, spender);
        if current_allowance < amount {
            self.env().revert(ProtocolError::InsufficientAllowance);
        }

        self.transfer_internal(owner, recipient, amount);
        self.allowances.set(&(owner, spender), current_allowance - amount);
        true
    }

    // ===== Internal Functions =====

    fn now(&self) -> u64 {
        block_at(self.env().get_block_time())
    }

    /// Underlying held by the vault but not yet owned by stakers
    fn unallocated(&self, state: &VaultState) -> U256 {
        let self_address = self.env().self_address();
        self.underlying_ledger()
            .balance_of(self_address)
            .saturating_sub(state.total_underlying)
    }

    /// Pay pending rewards into the vault totals and advance the schedule.
    /// Returns the settled state; the caller stores it.
    fn settle_rewards(&mut self) -> VaultState {
        let mut state = self.state.get_or_default();
        let mut schedule = self.schedule.get_or_default();
        let now = self.now();
        let available = self.unallocated(&state);

        let reward = self.or_revert(rewards::settle(&mut state, &mut schedule, now, available));
        self.schedule.set(schedule);
        if !reward.is_zero() {
            self.env().emit_event(RewardsAccrued {
                reward,
                total_underlying: state.total_underlying,
                block: now,
            });
        }
        state
    }

    fn projected_state(&self) -> VaultState {
        let mut state = self.state.get_or_default();
        let mut schedule = self.schedule.get_or_default();
        let available = self.unallocated(&state);
        self.or_revert(rewards::settle(&mut state, &mut schedule, self.now(), available));
        state
    }

    fn underlying_ledger(&self) -> Cep18TokenContractRef {
        match self.underlying.get() {
            Some(token) => Cep18TokenContractRef::new(self.env().clone(), token),
            None => self.env().revert(ProtocolError::InvalidConfig),
        }
    }

    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            self.env().revert(ProtocolError::InsufficientShares);
        }

        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.set(&to, to_balance + amount);
        self.env().emit_event(Transfer { from: Some(from), to: Some(to), amount });
    }

    fn mint_internal(&mut self, to: Address, amount: U256) {
        let balance = self.balance_of(to);
        self.balances.set(&to, balance + amount);
        self.env().emit_event(Transfer { from: None, to: Some(to), amount });
    }

    fn burn_internal(&mut self, from: Address, amount: U256) {
        let balance = self.balance_of(from);
        self.balances.set(&from, balance - amount);
        self.env().emit_event(Transfer { from: Some(from), to: None, amount });
    }

    fn require_admin(&self) {
        if self.admin.get() != Some(self.env().caller()) {
            self.env().revert(ProtocolError::Unauthorized);
        }
    }
}

impl Earn {
    fn or_revert<T>(&self, result: ProtocolResult<T>) -> T {
        match result {
            Ok(value) => value,
            Err(error) => self.env().revert(error),
        }
    }
}
