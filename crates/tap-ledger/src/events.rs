//! Ledger events and the sinks that receive them.
//!
//! Events are fire-and-forget notifications for off-ledger observers. A
//! sink never influences control flow and cannot fail an operation.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tap_types::Address;

use crate::membership::ListKind;

/// Whether an address entered or left a list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListChange {
    Added,
    Removed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Transfer {
        from: Address,
        to: Address,
        value: u128,
        data: Vec<u8>,
    },
    Membership {
        list: ListKind,
        address: Address,
        change: ListChange,
    },
    PauseToggled {
        paused: bool,
    },
}

/// Receiver of ledger events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LedgerEvent);
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &LedgerEvent) {}
}

/// Logs every event through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::Transfer {
                from,
                to,
                value,
                data,
            } => {
                tracing::info!(%from, %to, value, data_len = data.len(), "Transfer");
            }
            LedgerEvent::Membership {
                list,
                address,
                change,
            } => {
                tracing::info!(%list, %address, ?change, "membership changed");
            }
            LedgerEvent::PauseToggled { paused } => {
                tracing::info!(paused, "pause toggled");
            }
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<LedgerEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &LedgerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
