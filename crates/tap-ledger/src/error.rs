use tap_types::{Address, TypeError};

use crate::membership::ListKind;

/// Errors produced by ledger operations.
///
/// Every error aborts the whole operation; the ledger state is left exactly
/// as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("out of balance: requested {requested}, balance {balance}")]
    InsufficientBalance { requested: u128, balance: u128 },

    #[error("out of available balance: requested {requested}, available {available}")]
    InsufficientAvailableBalance { requested: u128, available: u128 },

    #[error("stake {value} is below the minimum stake of {minimum}")]
    BelowMinimumStake { value: u128, minimum: u128 },

    #[error("{caller} is not authorized: only the {role} may call this method")]
    Unauthorized { caller: Address, role: Role },

    #[error("{address} not in {list}")]
    AddressNotFound { address: Address, list: ListKind },

    #[error("feature disabled: {0}")]
    FeatureDisabled(Feature),

    #[error("token transfers are paused")]
    Paused,

    #[error("address {0} is locked")]
    Locked(Address),

    #[error("recipient {recipient} rejected the deposit: {reason}")]
    HookRejected { recipient: Address, reason: String },

    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    #[error("ledger state lock poisoned")]
    StatePoisoned,

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<TypeError> for LedgerError {
    fn from(err: TypeError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}

/// Privileged callers checked by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    DividendsDistributor,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::DividendsDistributor => write!(f, "dividends distribution contract"),
        }
    }
}

/// Toggles that gate whole groups of operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Staking,
    DividendsOnStakedOnly,
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Staking => write!(f, "staking must first be enabled"),
            Self::DividendsOnStakedOnly => {
                write!(f, "switching dividends to staked balances must be enabled")
            }
        }
    }
}
