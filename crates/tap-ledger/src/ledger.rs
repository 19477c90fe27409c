//! The token ledger: balances, transfers, and staking.
//!
//! [`TokenLedger`] owns the whole [`LedgerState`] and executes one operation
//! at a time through `&mut self`. Each operation validates everything it
//! needs before writing, so a returned error means nothing changed. The one
//! exception is the deposit hook of a contract recipient, which runs after
//! the transfer has been committed; if it fails, the ledger restores the
//! checkpoint taken just before the commit.

use std::collections::HashMap;
use std::sync::Arc;

use tap_types::{Address, Timestamp, MICROS_PER_DAY};
use tracing::debug;

use crate::account::{Account, BalanceDetails};
use crate::config::LedgerConfig;
use crate::error::{Feature, LedgerError, Role};
use crate::events::{EventSink, LedgerEvent};
use crate::membership::ListKind;
use crate::state::LedgerState;
use crate::traits::{CallContext, RecipientHook};

/// Data delivered with a transfer that carries no payload.
pub const DEFAULT_TRANSFER_DATA: &[u8] = b"None";

pub struct TokenLedger {
    pub(crate) state: LedgerState,
    sink: Arc<dyn EventSink>,
    receivers: HashMap<Address, Arc<dyn RecipientHook>>,
    /// Events emitted while a deposit hook runs; published once the
    /// outermost hook succeeds.
    pending_events: Vec<LedgerEvent>,
    hook_depth: usize,
}

struct Checkpoint {
    state: LedgerState,
    pending_len: usize,
}

impl TokenLedger {
    /// Create a ledger from its genesis configuration.
    pub fn genesis(config: &LedgerConfig, sink: Arc<dyn EventSink>) -> Result<Self, LedgerError> {
        let state = LedgerState::genesis(config)?;
        tracing::info!(
            owner = %state.owner,
            total_supply = state.total_supply,
            decimals = state.decimals,
            "ledger created"
        );
        Ok(Self::from_state(state, sink))
    }

    /// Resume a ledger from previously persisted state.
    pub fn from_state(state: LedgerState, sink: Arc<dyn EventSink>) -> Self {
        Self {
            state,
            sink,
            receivers: HashMap::new(),
            pending_events: Vec::new(),
            hook_depth: 0,
        }
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn into_state(self) -> LedgerState {
        self.state
    }

    /// Register the deposit handler of a contract address.
    pub fn register_receiver(&mut self, contract: Address, hook: Arc<dyn RecipientHook>) {
        self.receivers.insert(contract, hook);
    }

    // -- metadata ----------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn symbol(&self) -> &str {
        &self.state.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.state.decimals
    }

    pub fn total_supply(&self) -> u128 {
        self.state.total_supply
    }

    pub fn total_staked(&self) -> u128 {
        self.state.total_staked
    }

    pub fn owner(&self) -> Address {
        self.state.owner
    }

    pub fn minimum_stake(&self) -> u128 {
        self.state.minimum_stake
    }

    pub fn unstaking_period_days(&self) -> u64 {
        self.state.unstaking_period / MICROS_PER_DAY
    }

    pub fn max_loop(&self) -> usize {
        self.state.max_loop
    }

    pub fn dividends_address(&self) -> Option<Address> {
        self.state.dividends_address
    }

    pub fn staking_enabled(&self) -> bool {
        self.state.staking_enabled
    }

    pub fn dividends_on_staked_only(&self) -> bool {
        self.state.dividends_on_staked_only
    }

    pub fn paused(&self) -> bool {
        self.state.paused
    }

    pub fn known_addresses(&self) -> Vec<Address> {
        self.state.known_addresses.to_vec()
    }

    pub fn list(&self, kind: ListKind) -> Vec<Address> {
        self.state.list(kind).to_vec()
    }

    pub fn blacklist(&self) -> Vec<Address> {
        self.list(ListKind::Blacklist)
    }

    pub fn locklist(&self) -> Vec<Address> {
        self.list(ListKind::Locklist)
    }

    pub fn whitelist(&self) -> Vec<Address> {
        self.list(ListKind::Whitelist)
    }

    // -- balances ----------------------------------------------------------

    pub fn account(&self, address: &Address) -> Account {
        self.state.account(address)
    }

    pub fn balance_of(&self, address: &Address) -> u128 {
        self.state.account(address).total_balance
    }

    pub fn available_balance_of(&self, address: &Address, now: Timestamp) -> u128 {
        self.details_balance_of(address, now).available
    }

    pub fn staked_balance_of(&self, address: &Address) -> u128 {
        self.state.account(address).staking.staked
    }

    pub fn unstaking_balance_of(&self, address: &Address, now: Timestamp) -> u128 {
        self.details_balance_of(address, now).unstaking
    }

    pub fn details_balance_of(&self, address: &Address, now: Timestamp) -> BalanceDetails {
        self.state.account(address).details(now)
    }

    // -- transfers ---------------------------------------------------------

    /// Move `value` from the caller to `to`.
    ///
    /// Only available funds move; staked and unstaking funds stay put. When
    /// `to` is a contract its registered deposit hook runs after the
    /// balances are committed.
    pub fn transfer(
        &mut self,
        ctx: &CallContext,
        to: Address,
        value: u128,
        data: Option<&[u8]>,
    ) -> Result<(), LedgerError> {
        let from = ctx.sender;
        if self.state.paused && !self.state.whitelist.contains(&from) {
            return Err(LedgerError::Paused);
        }
        if self.state.locklist.contains(&from) {
            return Err(LedgerError::Locked(from));
        }

        let balance = self.balance_of(&from);
        if balance < value {
            return Err(LedgerError::InsufficientBalance {
                requested: value,
                balance,
            });
        }

        let mut sender = self.state.prepared_account(&from, ctx.now);
        sender.debit(value)?;
        let recipient = if from == to {
            sender.credit(value)?;
            None
        } else {
            let mut recipient = self.state.prepared_account(&to, ctx.now);
            recipient.credit(value)?;
            Some(recipient)
        };

        let hook = if to.is_contract() {
            let hook = self.receivers.get(&to).cloned().ok_or_else(|| {
                LedgerError::HookRejected {
                    recipient: to,
                    reason: "no deposit handler registered".into(),
                }
            })?;
            Some((hook, self.checkpoint()))
        } else {
            None
        };

        self.state.put_account(from, sender);
        if let Some(recipient) = recipient {
            self.state.put_account(to, recipient);
        }
        self.state.known_addresses.insert(to);

        let data = data.unwrap_or(DEFAULT_TRANSFER_DATA);
        if let Some((hook, checkpoint)) = hook {
            self.notify_recipient(hook, checkpoint, from, to, value, data, ctx.now)?;
        }

        self.emit(LedgerEvent::Transfer {
            from,
            to,
            value,
            data: data.to_vec(),
        });

        if !self.state.dividends_on_staked_only {
            for address in [from, to] {
                if !self.state.blacklist.contains(&address) {
                    self.state.balance_changes.record(address);
                }
            }
        }

        debug!(%from, %to, value, "transfer");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn notify_recipient(
        &mut self,
        hook: Arc<dyn RecipientHook>,
        checkpoint: Checkpoint,
        from: Address,
        to: Address,
        value: u128,
        data: &[u8],
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        let hook_ctx = CallContext::new(to, now);
        self.hook_depth += 1;
        let outcome = hook.on_receive(self, &hook_ctx, from, value, data);
        self.hook_depth -= 1;

        match outcome {
            Ok(()) => {
                if self.hook_depth == 0 {
                    for event in std::mem::take(&mut self.pending_events) {
                        self.sink.emit(&event);
                    }
                }
                Ok(())
            }
            Err(err) => {
                debug!(%from, %to, value, error = %err, "deposit hook failed; rolling back");
                self.restore(checkpoint);
                Err(LedgerError::HookRejected {
                    recipient: to,
                    reason: err.to_string(),
                })
            }
        }
    }

    // -- staking -----------------------------------------------------------

    /// Set the caller's staked amount to `value`.
    ///
    /// Lowering the stake starts a new unstaking period for the difference
    /// plus anything still unstaking; raising it takes funds from the
    /// unstaking pool first and then from the available balance.
    pub fn stake(&mut self, ctx: &CallContext, value: u128) -> Result<(), LedgerError> {
        self.ensure_staking_enabled()?;
        let from = ctx.sender;

        let balance = self.balance_of(&from);
        if value > balance {
            return Err(LedgerError::InsufficientBalance {
                requested: value,
                balance,
            });
        }
        if value != 0 && value < self.state.minimum_stake {
            return Err(LedgerError::BelowMinimumStake {
                value,
                minimum: self.state.minimum_stake,
            });
        }
        if self.state.locklist.contains(&from) {
            return Err(LedgerError::Locked(from));
        }

        let mut account = self.state.prepared_account(&from, ctx.now);
        let unlock_at = ctx.now.saturating_add_micros(self.state.unstaking_period);
        let previous = account.restake(value, unlock_at)?;
        let total_staked = self
            .state
            .total_staked
            .checked_sub(previous)
            .and_then(|t| t.checked_add(value))
            .ok_or_else(|| LedgerError::Overflow("total staked".into()))?;

        self.state.put_account(from, account);
        self.state.total_staked = total_staked;
        self.state.stake_changes.record(from);

        debug!(%from, value, previous, total_staked, "stake updated");
        Ok(())
    }

    // -- guards and plumbing -----------------------------------------------

    pub(crate) fn ensure_owner(&self, ctx: &CallContext) -> Result<(), LedgerError> {
        if ctx.sender != self.state.owner {
            return Err(LedgerError::Unauthorized {
                caller: ctx.sender,
                role: Role::Owner,
            });
        }
        Ok(())
    }

    pub(crate) fn ensure_dividends_caller(&self, ctx: &CallContext) -> Result<(), LedgerError> {
        if self.state.dividends_address != Some(ctx.sender) {
            return Err(LedgerError::Unauthorized {
                caller: ctx.sender,
                role: Role::DividendsDistributor,
            });
        }
        Ok(())
    }

    pub(crate) fn ensure_staking_enabled(&self) -> Result<(), LedgerError> {
        if !self.state.staking_enabled {
            return Err(LedgerError::FeatureDisabled(Feature::Staking));
        }
        Ok(())
    }

    pub(crate) fn ensure_dividends_on_staked_only(&self) -> Result<(), LedgerError> {
        if !self.state.dividends_on_staked_only {
            return Err(LedgerError::FeatureDisabled(Feature::DividendsOnStakedOnly));
        }
        Ok(())
    }

    pub(crate) fn emit(&mut self, event: LedgerEvent) {
        if self.hook_depth > 0 {
            self.pending_events.push(event);
        } else {
            self.sink.emit(&event);
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            state: self.state.clone(),
            pending_len: self.pending_events.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.state = checkpoint.state;
        self.pending_events.truncate(checkpoint.pending_len);
    }
}

impl std::fmt::Debug for TokenLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenLedger")
            .field("symbol", &self.state.symbol)
            .field("total_supply", &self.state.total_supply)
            .field("accounts", &self.state.accounts.len())
            .field("receivers", &self.receivers.len())
            .finish()
    }
}
