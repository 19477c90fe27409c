//! Per-account balances and the four-slot staking record.
//!
//! An account holds a `total_balance` plus a [`StakingRecord`] that splits
//! the total into available, staked, and unstaking portions. Accounts that
//! have never taken part in a staking-relevant operation keep an all-zero
//! record and are treated as fully available until they are migrated.

use serde::{Deserialize, Serialize};
use tap_types::Timestamp;

use crate::error::LedgerError;

/// Staking split of an account's balance.
///
/// Once migrated, `available + staked + unstaking == total_balance`.
/// `unstaking_unlock_time` is ignored while `unstaking == 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingRecord {
    pub available: u128,
    pub staked: u128,
    pub unstaking: u128,
    pub unstaking_unlock_time: Timestamp,
}

impl StakingRecord {
    /// Sum of the three balance slots.
    pub fn accounted(&self) -> Option<u128> {
        self.available
            .checked_add(self.staked)?
            .checked_add(self.unstaking)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub total_balance: u128,
    pub staking: StakingRecord,
}

/// Read-only view of an account at a given time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDetails {
    pub total: u128,
    /// Available balance, counting unstaking funds whose deadline has passed.
    pub available: u128,
    pub staked: u128,
    /// Unstaking balance that has not matured yet.
    pub unstaking: u128,
    /// Unlock deadline in microseconds; zero when nothing is unstaking.
    pub unstaking_unlock_time: Timestamp,
}

impl Account {
    /// An account is unmigrated while its staking record is empty but it
    /// holds a balance.
    pub fn is_unmigrated(&self) -> bool {
        self.staking.available == 0
            && self.staking.staked == 0
            && self.staking.unstaking == 0
            && self.total_balance != 0
    }

    /// Copy the total balance into `available` on first touch. No-op once
    /// the account has been migrated.
    pub fn migrate(&mut self) {
        if self.is_unmigrated() {
            self.staking.available = self.total_balance;
        }
    }

    /// Release matured unstaking funds into `available`.
    ///
    /// Returns the amount released.
    pub fn settle_unstaking(&mut self, now: Timestamp) -> u128 {
        if !now.has_reached(self.staking.unstaking_unlock_time) {
            return 0;
        }
        let released = self.staking.unstaking;
        self.staking.unstaking = 0;
        self.staking.available += released;
        released
    }

    /// Migrate and settle in one step. Every operation that reads or
    /// mutates the staking record goes through this first.
    pub fn prepare(&mut self, now: Timestamp) {
        self.migrate();
        self.settle_unstaking(now);
    }

    /// `true` when the staking record accounts for the total balance, or the
    /// account has not been migrated yet.
    pub fn reconciles(&self) -> bool {
        self.is_unmigrated() || self.staking.accounted() == Some(self.total_balance)
    }

    pub fn debit(&mut self, value: u128) -> Result<(), LedgerError> {
        if self.total_balance < value {
            return Err(LedgerError::InsufficientBalance {
                requested: value,
                balance: self.total_balance,
            });
        }
        if self.staking.available < value {
            return Err(LedgerError::InsufficientAvailableBalance {
                requested: value,
                available: self.staking.available,
            });
        }
        self.total_balance -= value;
        self.staking.available -= value;
        Ok(())
    }

    pub fn credit(&mut self, value: u128) -> Result<(), LedgerError> {
        let total = self
            .total_balance
            .checked_add(value)
            .ok_or_else(|| LedgerError::Overflow("recipient balance".into()))?;
        let available = self
            .staking
            .available
            .checked_add(value)
            .ok_or_else(|| LedgerError::Overflow("recipient available balance".into()))?;
        self.total_balance = total;
        self.staking.available = available;
        Ok(())
    }

    /// Set the staked amount to `value`.
    ///
    /// Growing the target draws the difference from `available`; shrinking
    /// it turns the shortfall into the new unstaking amount, replacing any
    /// earlier one. The unlock deadline is reset either way. Returns the
    /// previously staked amount.
    pub fn restake(&mut self, value: u128, unlock_at: Timestamp) -> Result<u128, LedgerError> {
        let previous = self.staking.staked;
        let old_target = self
            .staking
            .staked
            .checked_add(self.staking.unstaking)
            .ok_or_else(|| LedgerError::Overflow("stake target".into()))?;

        let (available, unstaking) = if value > old_target {
            let offset = value - old_target;
            if self.staking.available < offset {
                return Err(LedgerError::InsufficientAvailableBalance {
                    requested: offset,
                    available: self.staking.available,
                });
            }
            (self.staking.available - offset, 0)
        } else {
            (self.staking.available, old_target - value)
        };

        self.staking = StakingRecord {
            available,
            staked: value,
            unstaking,
            unstaking_unlock_time: unlock_at,
        };
        Ok(previous)
    }

    /// Move the whole staked amount into unstaking with a fresh deadline.
    ///
    /// Returns the amount that was staked.
    pub fn force_unstake(&mut self, unlock_at: Timestamp) -> Result<u128, LedgerError> {
        let staked = self.staking.staked;
        if staked == 0 {
            return Ok(0);
        }
        self.staking.unstaking = self
            .staking
            .unstaking
            .checked_add(staked)
            .ok_or_else(|| LedgerError::Overflow("unstaking balance".into()))?;
        self.staking.staked = 0;
        self.staking.unstaking_unlock_time = unlock_at;
        Ok(staked)
    }

    /// Project the account at `now` without mutating it.
    pub fn details(&self, now: Timestamp) -> BalanceDetails {
        let mut view = *self;
        view.prepare(now);
        BalanceDetails {
            total: view.total_balance,
            available: view.staking.available,
            staked: view.staking.staked,
            unstaking: view.staking.unstaking,
            unstaking_unlock_time: if view.staking.unstaking == 0 {
                Timestamp::zero()
            } else {
                view.staking.unstaking_unlock_time
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded(total: u128) -> Account {
        Account {
            total_balance: total,
            ..Default::default()
        }
    }

    #[test]
    fn migration_copies_total_once() {
        let mut account = funded(500);
        assert!(account.is_unmigrated());
        account.migrate();
        assert_eq!(account.staking.available, 500);
        assert!(!account.is_unmigrated());

        account.staking.available = 100;
        account.staking.staked = 400;
        account.migrate();
        assert_eq!(account.staking.available, 100);
    }

    #[test]
    fn empty_account_is_not_unmigrated() {
        let account = Account::default();
        assert!(!account.is_unmigrated());
        assert!(account.reconciles());
    }

    #[test]
    fn settle_releases_only_after_deadline() {
        let mut account = funded(100);
        account.staking = StakingRecord {
            available: 70,
            staked: 0,
            unstaking: 30,
            unstaking_unlock_time: Timestamp::from_micros(1_000),
        };

        assert_eq!(account.settle_unstaking(Timestamp::from_micros(999)), 0);
        assert_eq!(account.staking.unstaking, 30);

        assert_eq!(account.settle_unstaking(Timestamp::from_micros(1_000)), 30);
        assert_eq!(account.staking.available, 100);
        assert_eq!(account.staking.unstaking, 0);
        assert!(account.reconciles());
    }

    #[test]
    fn restake_up_then_down() {
        let mut account = funded(100);
        account.prepare(Timestamp::zero());

        let previous = account.restake(50, Timestamp::from_micros(10)).unwrap();
        assert_eq!(previous, 0);
        assert_eq!(account.staking.staked, 50);
        assert_eq!(account.staking.available, 50);
        assert_eq!(account.staking.unstaking, 0);

        let previous = account.restake(20, Timestamp::from_micros(20)).unwrap();
        assert_eq!(previous, 50);
        assert_eq!(account.staking.staked, 20);
        assert_eq!(account.staking.unstaking, 30);
        assert_eq!(account.staking.available, 50);
        assert_eq!(account.staking.unstaking_unlock_time, Timestamp::from_micros(20));
        assert!(account.reconciles());
    }

    #[test]
    fn restake_replaces_pending_unstaking() {
        let mut account = funded(100);
        account.prepare(Timestamp::zero());
        account.restake(60, Timestamp::from_micros(5)).unwrap();
        account.restake(10, Timestamp::from_micros(5)).unwrap();
        assert_eq!(account.staking.unstaking, 50);

        // Raising the stake again reclaims the unstaking pool before
        // touching available funds.
        account.restake(70, Timestamp::from_micros(9)).unwrap();
        assert_eq!(account.staking.staked, 70);
        assert_eq!(account.staking.unstaking, 0);
        assert_eq!(account.staking.available, 30);
        assert!(account.reconciles());
    }

    #[test]
    fn debit_respects_available() {
        let mut account = funded(100);
        account.prepare(Timestamp::zero());
        account.restake(80, Timestamp::from_micros(1)).unwrap();

        let err = account.debit(30).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientAvailableBalance {
                requested: 30,
                available: 20
            }
        );
        account.debit(20).unwrap();
        assert_eq!(account.total_balance, 80);
        assert!(account.reconciles());
    }

    #[test]
    fn force_unstake_accumulates() {
        let mut account = funded(100);
        account.prepare(Timestamp::zero());
        account.restake(40, Timestamp::from_micros(1)).unwrap();
        account.restake(30, Timestamp::from_micros(50)).unwrap();

        let moved = account.force_unstake(Timestamp::from_micros(90)).unwrap();
        assert_eq!(moved, 30);
        assert_eq!(account.staking.staked, 0);
        assert_eq!(account.staking.unstaking, 40);
        assert_eq!(account.staking.unstaking_unlock_time, Timestamp::from_micros(90));
        assert!(account.reconciles());
    }

    #[test]
    fn details_projects_without_mutation() {
        let account = funded(250);
        let details = account.details(Timestamp::zero());
        assert_eq!(details.available, 250);
        assert_eq!(details.unstaking_unlock_time, Timestamp::zero());
        assert!(account.is_unmigrated());

        let mut staked = funded(100);
        staked.prepare(Timestamp::zero());
        staked.restake(60, Timestamp::from_micros(5)).unwrap();
        staked.restake(0, Timestamp::from_micros(50)).unwrap();

        let pending = staked.details(Timestamp::from_micros(49));
        assert_eq!(pending.unstaking, 60);
        assert_eq!(pending.available, 40);
        assert_eq!(pending.unstaking_unlock_time, Timestamp::from_micros(50));

        let matured = staked.details(Timestamp::from_micros(50));
        assert_eq!(matured.unstaking, 0);
        assert_eq!(matured.available, 100);
        assert_eq!(matured.unstaking_unlock_time, Timestamp::zero());
    }
}
