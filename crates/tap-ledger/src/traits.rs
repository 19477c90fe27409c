use tap_types::{Address, Timestamp};

use crate::ledger::TokenLedger;

/// Who is calling and when.
///
/// `now` is read once per operation from the execution context and used for
/// every settlement and deadline inside that operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub sender: Address,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(sender: Address, now: Timestamp) -> Self {
        Self { sender, now }
    }
}

/// Error returned by a recipient hook to abort the transfer that invoked it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    #[error("deposit refused: {0}")]
    Refused(String),

    #[error("reentrant call failed: {0}")]
    Reentrant(#[from] crate::error::LedgerError),
}

/// Deposit notification for contract recipients.
///
/// Called after the transfer's balance changes are committed, so the hook
/// observes the post-transfer state and may call back into the ledger with
/// `ctx` (whose sender is the contract itself). Returning an error rolls
/// back the transfer together with everything the hook did.
pub trait RecipientHook: Send + Sync {
    fn on_receive(
        &self,
        ledger: &mut TokenLedger,
        ctx: &CallContext,
        from: Address,
        value: u128,
        data: &[u8],
    ) -> Result<(), HookError>;
}
