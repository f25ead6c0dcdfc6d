//! Permissioned Token Contract
//!
//! CEP-18 style ledger where only permissioned contracts mint and burn.
//! Used for the stable token issued by the bonding engine and, with no
//! permissions granted, as a plain collateral or reward token.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::ProtocolError;
use crate::events::{Approval, PermissionChanged, Transfer};

#[odra::module(events = [Transfer, Approval, PermissionChanged])]
pub struct PermissionedToken {
    name: Var<String>,
    symbol: Var<String>,
    decimals: Var<u8>,
    total_supply: Var<U256>,
    /// Balance mapping
    balances: Mapping<Address, U256>,
    /// Allowance mapping (owner, spender) -> amount
    allowances: Mapping<(Address, Address), U256>,
    /// Grants and revokes permissions
    owner: Var<Address>,
    /// Contracts allowed to mint and burn
    permissioned: Mapping<Address, bool>,
}

#[odra::module]
impl PermissionedToken {
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(decimals);
        self.total_supply.set(U256::zero());
        self.owner.set(self.env().caller());
    }

    // ========== CEP-18 Standard Functions ==========

    pub fn name(&self) -> String {
        self.name.get_or_default()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get_or_default()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get_or_default()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get_or_default()
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or_default()
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.transfer_internal(sender, recipient, amount);
        true
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.approve_internal(owner, spender, amount);
        true
    }

    /// Transfer tokens from owner to recipient (requires allowance)
    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();

        let current_allowance = self.allowance(owner, spender);
        if current_allowance < amount {
            self.env().revert(ProtocolError::InsufficientAllowance);
        }

        self.transfer_internal(owner, recipient, amount);
        self.approve_internal(owner, spender, current_allowance - amount);
        true
    }

    // ========== Permissioned Functions ==========

    /// Mint new tokens (permissioned callers only)
    pub fn mint(&mut self, to: Address, amount: U256) {
        self.require_permission();

        let balance = self.balance_of(to);
        self.balances.set(&to, balance + amount);
        self.total_supply.set(self.total_supply() + amount);

        self.env().emit_event(Transfer { from: None, to: Some(to), amount });
    }

    /// Burn tokens held by `from` (permissioned callers only, used for repayment)
    pub fn burn_from(&mut self, from: Address, amount: U256) {
        self.require_permission();
        self.burn_internal(from, amount);
    }

    /// Burn tokens from caller
    pub fn burn(&mut self, amount: U256) {
        let caller = self.env().caller();
        self.burn_internal(caller, amount);
    }

    // ========== Owner Functions ==========

    pub fn add_permission(&mut self, account: Address) {
        self.require_owner();
        self.permissioned.set(&account, true);
        self.env().emit_event(PermissionChanged { account, granted: true });
    }

    pub fn remove_permission(&mut self, account: Address) {
        self.require_owner();
        self.permissioned.set(&account, false);
        self.env().emit_event(PermissionChanged { account, granted: false });
    }

    pub fn has_permission(&self, account: Address) -> bool {
        self.permissioned.get(&account).unwrap_or(false)
    }

    pub fn get_owner(&self) -> Option<Address> {
        self.owner.get()
    }

    // ========== Internal Functions ==========

    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            self.env().revert(ProtocolError::InsufficientTokenBalance);
        }

        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.set(&to, to_balance + amount);

        self.env().emit_event(Transfer { from: Some(from), to: Some(to), amount });
    }

    fn approve_internal(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.set(&(owner, spender), amount);
        self.env().emit_event(Approval { owner, spender, amount });
    }

    fn burn_internal(&mut self, from: Address, amount: U256) {
        let balance = self.balance_of(from);
        if balance < amount {
            self.env().revert(ProtocolError::InsufficientTokenBalance);
        }

        self.balances.set(&from, balance - amount);
        self.total_supply.set(self.total_supply() - amount);

        self.env().emit_event(Transfer { from: Some(from), to: None, amount });
    }

    fn require_permission(&self) {
        let caller = self.env().caller();
        if !self.has_permission(caller) {
            self.env().revert(ProtocolError::Unauthorized);
        }
    }

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(ProtocolError::Unauthorized);
        }
    }
}
