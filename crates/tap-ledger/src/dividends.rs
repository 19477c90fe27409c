//! Entry points for the dividend-distribution caller.
//!
//! The distributor pages through the addresses whose balance (or stake)
//! changed, flips the day, and clears the retired buffer, never doing more
//! than `max_loop` units of work per call.

use std::fmt;

use serde::{Deserialize, Serialize};
use tap_types::Address;
use tracing::info;

use crate::error::LedgerError;
use crate::ledger::TokenLedger;
use crate::traits::CallContext;
use crate::tracker::ChangeTracker;

/// A tracked kind of change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// Plain balance changes; pages carry total balances.
    Balance,
    /// Stake changes; pages carry staked balances.
    Stake,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Balance => write!(f, "balance"),
            Self::Stake => write!(f, "stake"),
        }
    }
}

/// One page of `(address, value)` pairs.
pub type ChangePage = Vec<(Address, u128)>;

impl TokenLedger {
    /// Next page of changed addresses, at most `min(max_items, max_loop)`
    /// long. An empty page means there is nothing more to deliver for now.
    pub fn drain_page(
        &mut self,
        ctx: &CallContext,
        dimension: Dimension,
        max_items: usize,
    ) -> Result<ChangePage, LedgerError> {
        self.ensure_dimension_access(ctx, dimension)?;
        let limit = max_items.min(self.state.max_loop);
        let addresses = self.tracker_mut(dimension).drain_page(limit);
        Ok(addresses
            .into_iter()
            .map(|address| {
                let account = self.state.account(&address);
                let value = match dimension {
                    Dimension::Balance => account.total_balance,
                    Dimension::Stake => account.staking.staked,
                };
                (address, value)
            })
            .collect())
    }

    /// Start a new day for `dimension`.
    pub fn flip_day(&mut self, ctx: &CallContext, dimension: Dimension) -> Result<(), LedgerError> {
        self.ensure_dimension_access(ctx, dimension)?;
        self.tracker_mut(dimension).flip_day();
        info!(%dimension, "day flipped");
        Ok(())
    }

    /// Remove up to `min(max_items, max_loop)` entries of the retired
    /// buffer. Returns `true` once it is empty.
    pub fn clear_previous(
        &mut self,
        ctx: &CallContext,
        dimension: Dimension,
        max_items: usize,
    ) -> Result<bool, LedgerError> {
        self.ensure_dimension_access(ctx, dimension)?;
        let limit = max_items.min(self.state.max_loop);
        Ok(self.tracker_mut(dimension).clear_previous(limit))
    }

    pub fn balance_updates(&mut self, ctx: &CallContext) -> Result<ChangePage, LedgerError> {
        self.drain_page(ctx, Dimension::Balance, usize::MAX)
    }

    pub fn flip_balance_day(&mut self, ctx: &CallContext) -> Result<(), LedgerError> {
        self.flip_day(ctx, Dimension::Balance)
    }

    pub fn clear_previous_balance_changes(&mut self, ctx: &CallContext) -> Result<bool, LedgerError> {
        self.clear_previous(ctx, Dimension::Balance, usize::MAX)
    }

    pub fn stake_updates(&mut self, ctx: &CallContext) -> Result<ChangePage, LedgerError> {
        self.drain_page(ctx, Dimension::Stake, usize::MAX)
    }

    pub fn flip_stake_day(&mut self, ctx: &CallContext) -> Result<(), LedgerError> {
        self.flip_day(ctx, Dimension::Stake)
    }

    pub fn clear_previous_stake_changes(&mut self, ctx: &CallContext) -> Result<bool, LedgerError> {
        self.clear_previous(ctx, Dimension::Stake, usize::MAX)
    }

    /// Read-only view of a dimension's tracker.
    pub fn tracker(&self, dimension: Dimension) -> &ChangeTracker {
        match dimension {
            Dimension::Balance => &self.state.balance_changes,
            Dimension::Stake => &self.state.stake_changes,
        }
    }

    fn tracker_mut(&mut self, dimension: Dimension) -> &mut ChangeTracker {
        match dimension {
            Dimension::Balance => &mut self.state.balance_changes,
            Dimension::Stake => &mut self.state.stake_changes,
        }
    }

    fn ensure_dimension_access(&self, ctx: &CallContext, dimension: Dimension) -> Result<(), LedgerError> {
        self.ensure_dividends_caller(ctx)?;
        if dimension == Dimension::Stake {
            self.ensure_staking_enabled()?;
            self.ensure_dividends_on_staked_only()?;
        }
        Ok(())
    }
}
