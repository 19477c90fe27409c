use std::sync::{Arc, Mutex};

use crate::error::LedgerError;
use crate::ledger::TokenLedger;

/// Thread-safe handle that serializes every operation on one ledger.
///
/// The ledger core assumes operations never interleave. `SharedLedger` is
/// the boundary that guarantees it on a multi-threaded host: each call to
/// [`SharedLedger::with`] holds the lock for the whole operation, including
/// any deposit hooks it triggers.
#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<TokenLedger>>,
}

impl SharedLedger {
    pub fn new(ledger: TokenLedger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Run `op` with exclusive access to the ledger.
    pub fn with<T>(
        &self,
        op: impl FnOnce(&mut TokenLedger) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut guard = self.inner.lock().map_err(|_| LedgerError::StatePoisoned)?;
        op(&mut guard)
    }

    /// Recover the ledger once every other handle has been dropped.
    /// Returns `None` while other handles exist or if the lock is poisoned.
    pub fn into_inner(self) -> Option<TokenLedger> {
        Arc::try_unwrap(self.inner).ok()?.into_inner().ok()
    }
}
