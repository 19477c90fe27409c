//! Owner-only configuration and list management.

use tap_types::{scale_by_decimals, Address, MICROS_PER_DAY};
use tracing::info;

use crate::error::LedgerError;
use crate::events::{LedgerEvent, ListChange};
use crate::ledger::TokenLedger;
use crate::membership::ListKind;
use crate::traits::CallContext;

impl TokenLedger {
    /// Set the minimum non-zero stake, given in whole tokens.
    pub fn set_minimum_stake(&mut self, ctx: &CallContext, whole_tokens: u128) -> Result<(), LedgerError> {
        self.ensure_owner(ctx)?;
        let amount = scale_by_decimals(whole_tokens, self.state.decimals)?;
        self.state.minimum_stake = amount;
        info!(amount, "minimum stake set");
        Ok(())
    }

    /// Set the unstaking period, given in days.
    pub fn set_unstaking_period(&mut self, ctx: &CallContext, days: u64) -> Result<(), LedgerError> {
        self.ensure_owner(ctx)?;
        let micros = days
            .checked_mul(MICROS_PER_DAY)
            .ok_or_else(|| LedgerError::InvalidAmount(format!("{days} days")))?;
        self.state.unstaking_period = micros;
        info!(days, "unstaking period set");
        Ok(())
    }

    /// Bound the number of entries handled by one drain or clear call.
    pub fn set_max_loop(&mut self, ctx: &CallContext, max_loop: usize) -> Result<(), LedgerError> {
        self.ensure_owner(ctx)?;
        if max_loop == 0 {
            return Err(LedgerError::InvalidAmount("max loop must be at least 1".into()));
        }
        self.state.max_loop = max_loop;
        info!(max_loop, "max loop set");
        Ok(())
    }

    pub fn set_dividends_address(&mut self, ctx: &CallContext, address: Address) -> Result<(), LedgerError> {
        self.ensure_owner(ctx)?;
        self.state.dividends_address = Some(address);
        info!(%address, "dividends address set");
        Ok(())
    }

    pub fn toggle_staking_enabled(&mut self, ctx: &CallContext) -> Result<bool, LedgerError> {
        self.ensure_owner(ctx)?;
        self.state.staking_enabled = !self.state.staking_enabled;
        info!(enabled = self.state.staking_enabled, "staking toggled");
        Ok(self.state.staking_enabled)
    }

    pub fn toggle_dividends_on_staked_only(&mut self, ctx: &CallContext) -> Result<bool, LedgerError> {
        self.ensure_owner(ctx)?;
        self.state.dividends_on_staked_only = !self.state.dividends_on_staked_only;
        info!(
            enabled = self.state.dividends_on_staked_only,
            "dividends on staked balances toggled"
        );
        Ok(self.state.dividends_on_staked_only)
    }

    pub fn toggle_paused(&mut self, ctx: &CallContext) -> Result<bool, LedgerError> {
        self.ensure_owner(ctx)?;
        self.state.paused = !self.state.paused;
        let paused = self.state.paused;
        self.emit(LedgerEvent::PauseToggled { paused });
        Ok(paused)
    }

    pub fn add_to_blacklist(&mut self, ctx: &CallContext, address: Address) -> Result<(), LedgerError> {
        self.ensure_owner(ctx)?;
        self.add_member(ListKind::Blacklist, address);
        Ok(())
    }

    pub fn remove_from_blacklist(&mut self, ctx: &CallContext, address: Address) -> Result<(), LedgerError> {
        self.ensure_owner(ctx)?;
        self.remove_member(ListKind::Blacklist, address)
    }

    pub fn add_to_whitelist(&mut self, ctx: &CallContext, address: Address) -> Result<(), LedgerError> {
        self.ensure_owner(ctx)?;
        self.add_member(ListKind::Whitelist, address);
        Ok(())
    }

    pub fn remove_from_whitelist(&mut self, ctx: &CallContext, address: Address) -> Result<(), LedgerError> {
        self.ensure_owner(ctx)?;
        self.remove_member(ListKind::Whitelist, address)
    }

    /// Lock `address` out of transfers and staking.
    ///
    /// Anything it has staked is moved into unstaking with a fresh unlock
    /// deadline.
    pub fn add_to_locklist(&mut self, ctx: &CallContext, address: Address) -> Result<(), LedgerError> {
        self.ensure_owner(ctx)?;
        self.ensure_staking_enabled()?;

        let mut account = self.state.account(&address);
        let unstaked = if account.staking.staked > 0 {
            account.settle_unstaking(ctx.now);
            let unlock_at = ctx.now.saturating_add_micros(self.state.unstaking_period);
            let moved = account.force_unstake(unlock_at)?;
            let total_staked = self
                .state
                .total_staked
                .checked_sub(moved)
                .ok_or_else(|| LedgerError::Overflow("total staked".into()))?;
            Some((moved, total_staked))
        } else {
            None
        };

        self.add_member(ListKind::Locklist, address);
        if let Some((moved, total_staked)) = unstaked {
            self.state.put_account(address, account);
            self.state.total_staked = total_staked;
            self.state.stake_changes.record(address);
            info!(%address, moved, "locked address unstaked");
        }
        Ok(())
    }

    pub fn remove_from_locklist(&mut self, ctx: &CallContext, address: Address) -> Result<(), LedgerError> {
        self.ensure_owner(ctx)?;
        self.remove_member(ListKind::Locklist, address)
    }

    fn add_member(&mut self, list: ListKind, address: Address) {
        self.emit(LedgerEvent::Membership {
            list,
            address,
            change: ListChange::Added,
        });
        if self.state.list_mut(list).insert(address) {
            info!(%list, %address, "address added");
        }
    }

    fn remove_member(&mut self, list: ListKind, address: Address) -> Result<(), LedgerError> {
        if !self.state.list(list).contains(&address) {
            return Err(LedgerError::AddressNotFound { address, list });
        }
        self.emit(LedgerEvent::Membership {
            list,
            address,
            change: ListChange::Removed,
        });
        self.state.list_mut(list).remove(&address);
        info!(%list, %address, "address removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tap_types::Timestamp;

    use super::*;
    use crate::config::LedgerConfig;
    use crate::error::{Feature, Role};
    use crate::events::RecordingSink;

    fn ledger(staking_enabled: bool) -> (TokenLedger, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let config = LedgerConfig {
            initial_supply: 1000,
            decimals: 2,
            minimum_stake: 1,
            unstaking_period_days: 1,
            staking_enabled,
            ..Default::default()
        };
        (TokenLedger::genesis(&config, sink.clone()).unwrap(), sink)
    }

    fn owner_at(ledger: &TokenLedger, micros: u64) -> CallContext {
        CallContext::new(ledger.owner(), Timestamp::from_micros(micros))
    }

    #[test]
    fn setters_scale_and_validate() {
        let (mut ledger, _) = ledger(false);
        let ctx = owner_at(&ledger, 0);

        ledger.set_minimum_stake(&ctx, 10).unwrap();
        assert_eq!(ledger.minimum_stake(), 1_000);
        ledger.set_unstaking_period(&ctx, 3).unwrap();
        assert_eq!(ledger.unstaking_period_days(), 3);
        assert_eq!(ledger.state().unstaking_period, 3 * MICROS_PER_DAY);
        ledger.set_max_loop(&ctx, 7).unwrap();
        assert_eq!(ledger.max_loop(), 7);

        assert!(matches!(
            ledger.set_max_loop(&ctx, 0),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.set_minimum_stake(&ctx, u128::MAX),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.set_unstaking_period(&ctx, u64::MAX),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(ledger.max_loop(), 7);
    }

    #[test]
    fn only_owner_may_configure() {
        let (mut ledger, sink) = ledger(true);
        let mallory = Address::account("mallory");
        let ctx = CallContext::new(mallory, Timestamp::zero());
        let before = ledger.state().clone();
        let denied = LedgerError::Unauthorized {
            caller: mallory,
            role: Role::Owner,
        };

        assert_eq!(ledger.set_minimum_stake(&ctx, 1), Err(denied.clone()));
        assert_eq!(ledger.set_dividends_address(&ctx, mallory), Err(denied.clone()));
        assert_eq!(ledger.toggle_paused(&ctx), Err(denied.clone()));
        assert_eq!(ledger.add_to_blacklist(&ctx, mallory), Err(denied.clone()));
        assert_eq!(ledger.remove_from_whitelist(&ctx, mallory), Err(denied.clone()));
        assert_eq!(ledger.add_to_locklist(&ctx, mallory), Err(denied));
        assert_eq!(ledger.state(), &before);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn toggles_flip_and_report() {
        let (mut ledger, sink) = ledger(false);
        let ctx = owner_at(&ledger, 0);
        assert!(ledger.toggle_staking_enabled(&ctx).unwrap());
        assert!(!ledger.toggle_staking_enabled(&ctx).unwrap());
        assert!(ledger.toggle_dividends_on_staked_only(&ctx).unwrap());
        assert!(ledger.dividends_on_staked_only());
        assert!(ledger.toggle_paused(&ctx).unwrap());
        assert!(ledger.paused());
        assert_eq!(sink.events(), vec![LedgerEvent::PauseToggled { paused: true }]);
    }

    #[test]
    fn list_membership() {
        let (mut ledger, sink) = ledger(false);
        let ctx = owner_at(&ledger, 0);
        let eve = Address::account("eve");

        ledger.add_to_blacklist(&ctx, eve).unwrap();
        ledger.add_to_blacklist(&ctx, eve).unwrap();
        assert_eq!(ledger.list(ListKind::Blacklist), vec![eve]);
        assert_eq!(sink.events().len(), 2);

        ledger.remove_from_blacklist(&ctx, eve).unwrap();
        assert!(ledger.list(ListKind::Blacklist).is_empty());
        assert_eq!(
            ledger.remove_from_blacklist(&ctx, eve),
            Err(LedgerError::AddressNotFound {
                address: eve,
                list: ListKind::Blacklist
            })
        );
        assert_eq!(
            ledger.remove_from_locklist(&ctx, eve),
            Err(LedgerError::AddressNotFound {
                address: eve,
                list: ListKind::Locklist
            })
        );
        assert_eq!(
            sink.events().last(),
            Some(&LedgerEvent::Membership {
                list: ListKind::Blacklist,
                address: eve,
                change: ListChange::Removed,
            })
        );
    }

    #[test]
    fn locklist_requires_staking() {
        let (mut ledger, _) = ledger(false);
        let ctx = owner_at(&ledger, 0);
        assert_eq!(
            ledger.add_to_locklist(&ctx, Address::account("eve")),
            Err(LedgerError::FeatureDisabled(Feature::Staking))
        );
    }

    #[test]
    fn locking_forces_unstake() {
        let (mut ledger, _) = ledger(true);
        let alice = Address::account("alice");
        ledger
            .transfer(&owner_at(&ledger, 0), alice, 10_000, None)
            .unwrap();
        let alice_at = |micros| CallContext::new(alice, Timestamp::from_micros(micros));

        ledger.stake(&alice_at(0), 5_000).unwrap();
        ledger.stake(&alice_at(10), 4_000).unwrap();
        assert_eq!(ledger.total_staked(), 4_000);
        let staked_before = ledger.total_staked();

        ledger.add_to_locklist(&owner_at(&ledger, 20), alice).unwrap();

        let details = ledger.details_balance_of(&alice, Timestamp::from_micros(20));
        assert_eq!(details.staked, 0);
        assert_eq!(details.unstaking, 5_000);
        assert_eq!(details.available, 5_000);
        assert_eq!(
            details.unstaking_unlock_time,
            Timestamp::from_micros(20 + MICROS_PER_DAY)
        );
        assert_eq!(ledger.total_staked(), staked_before - 4_000);
        assert!(ledger.account(&alice).reconciles());
        assert!(ledger.state().stake_changes().active_entries().contains(&alice));

        assert_eq!(
            ledger.transfer(&alice_at(30), ledger.owner(), 1, None),
            Err(LedgerError::Locked(alice))
        );
        assert_eq!(ledger.stake(&alice_at(30), 100), Err(LedgerError::Locked(alice)));

        ledger.remove_from_locklist(&owner_at(&ledger, 40), alice).unwrap();
        ledger.transfer(&alice_at(50), ledger.owner(), 1, None).unwrap();
    }

    #[test]
    fn locking_without_stake_only_lists() {
        let (mut ledger, _) = ledger(true);
        let bob = Address::account("bob");
        ledger.add_to_locklist(&owner_at(&ledger, 0), bob).unwrap();
        assert_eq!(ledger.list(ListKind::Locklist), vec![bob]);
        assert!(ledger.state().stake_changes().active_entries().is_empty());
        assert_eq!(ledger.total_staked(), 0);
    }
}
