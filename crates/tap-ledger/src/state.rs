use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tap_types::{scale_by_decimals, Address, Timestamp};

use crate::account::Account;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::membership::{ListKind, MembershipList};
use crate::tracker::{ChangeTracker, DrainMode};

/// Everything the ledger persists between calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub(crate) name: String,
    pub(crate) symbol: String,
    pub(crate) decimals: u8,
    pub(crate) total_supply: u128,
    pub(crate) owner: Address,
    pub(crate) accounts: BTreeMap<Address, Account>,
    pub(crate) known_addresses: MembershipList,

    pub(crate) balance_changes: ChangeTracker,
    pub(crate) stake_changes: ChangeTracker,

    pub(crate) total_staked: u128,
    pub(crate) minimum_stake: u128,
    /// Unstaking period in microseconds.
    pub(crate) unstaking_period: u64,
    pub(crate) max_loop: usize,
    pub(crate) staking_enabled: bool,
    pub(crate) dividends_on_staked_only: bool,
    pub(crate) paused: bool,
    pub(crate) dividends_address: Option<Address>,

    pub(crate) blacklist: MembershipList,
    pub(crate) locklist: MembershipList,
    pub(crate) whitelist: MembershipList,
}

impl LedgerState {
    /// Build the initial state: the whole supply belongs to the owner.
    pub fn genesis(config: &LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        let total_supply = scale_by_decimals(config.initial_supply.into(), config.decimals)?;
        let minimum_stake = scale_by_decimals(config.minimum_stake.into(), config.decimals)?;

        let mut accounts = BTreeMap::new();
        accounts.insert(
            config.owner,
            Account {
                total_balance: total_supply,
                ..Default::default()
            },
        );
        let mut known_addresses = MembershipList::new();
        known_addresses.insert(config.owner);

        Ok(Self {
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            decimals: config.decimals,
            total_supply,
            owner: config.owner,
            accounts,
            known_addresses,
            balance_changes: ChangeTracker::new(DrainMode::Rolling),
            stake_changes: ChangeTracker::new(DrainMode::PerDay),
            total_staked: 0,
            minimum_stake,
            unstaking_period: Timestamp::from_days(config.unstaking_period_days).as_micros(),
            max_loop: config.max_loop,
            staking_enabled: config.staking_enabled,
            dividends_on_staked_only: config.dividends_on_staked_only,
            paused: config.paused,
            dividends_address: config.dividends_address,
            blacklist: MembershipList::new(),
            locklist: MembershipList::new(),
            whitelist: MembershipList::new(),
        })
    }

    pub(crate) fn account(&self, address: &Address) -> Account {
        self.accounts.get(address).copied().unwrap_or_default()
    }

    /// Copy of the account, migrated and settled at `now`.
    pub(crate) fn prepared_account(&self, address: &Address, now: Timestamp) -> Account {
        let mut account = self.account(address);
        account.prepare(now);
        account
    }

    pub(crate) fn put_account(&mut self, address: Address, account: Account) {
        self.accounts.insert(address, account);
    }

    pub(crate) fn list(&self, kind: ListKind) -> &MembershipList {
        match kind {
            ListKind::Blacklist => &self.blacklist,
            ListKind::Locklist => &self.locklist,
            ListKind::Whitelist => &self.whitelist,
        }
    }

    pub(crate) fn list_mut(&mut self, kind: ListKind) -> &mut MembershipList {
        match kind {
            ListKind::Blacklist => &mut self.blacklist,
            ListKind::Locklist => &mut self.locklist,
            ListKind::Whitelist => &mut self.whitelist,
        }
    }

    /// Sum of all account balances.
    pub fn circulating(&self) -> u128 {
        self.accounts.values().map(|a| a.total_balance).sum()
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Account)> {
        self.accounts.iter()
    }

    pub fn balance_changes(&self) -> &ChangeTracker {
        &self.balance_changes
    }

    pub fn stake_changes(&self) -> &ChangeTracker {
        &self.stake_changes
    }
}
