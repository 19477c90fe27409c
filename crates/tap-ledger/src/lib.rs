//! Token ledger with staking and day-change tracking.
//!
//! This crate provides:
//! - Per-account balances with an available / staked / unstaking split
//! - Lazily settled unstaking periods driven by a caller-supplied clock
//! - Double-buffered "who changed today" logs with bounded, resumable
//!   draining for an external dividend distributor
//! - Blacklist, locklist, and pause-whitelist management
//! - A mutex-serialized [`SharedLedger`] handle and JSON snapshots

pub mod account;
pub mod admin;
pub mod config;
pub mod dividends;
pub mod error;
pub mod events;
pub mod ledger;
pub mod membership;
pub mod shared;
pub mod snapshot;
pub mod state;
pub mod tracker;
pub mod traits;

pub use account::{Account, BalanceDetails, StakingRecord};
pub use config::{LedgerConfig, DEFAULT_MAX_LOOP};
pub use dividends::{ChangePage, Dimension};
pub use error::{Feature, LedgerError, Role};
pub use events::{EventSink, LedgerEvent, ListChange, NullSink, RecordingSink, TracingSink};
pub use ledger::{TokenLedger, DEFAULT_TRANSFER_DATA};
pub use membership::{ListKind, MembershipList};
pub use shared::SharedLedger;
pub use state::LedgerState;
pub use tracker::{BufferSlot, ChangeBuffer, ChangeTracker, DrainCursor, DrainMode};
pub use traits::{CallContext, HookError, RecipientHook};
