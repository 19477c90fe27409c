use std::path::Path;

use serde::{Deserialize, Serialize};
use tap_types::{scale_by_decimals, Address};

use crate::error::LedgerError;

/// Default bound on entries handled by a single drain or clear call.
pub const DEFAULT_MAX_LOOP: usize = 100;

/// Genesis configuration for a token ledger.
///
/// Amounts are given in whole tokens and scaled by `10^decimals` at genesis.
/// Loadable from TOML; every field has a default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Initial supply in whole tokens, credited to `owner`.
    pub initial_supply: u64,
    pub owner: Address,
    /// Address allowed to drive dividend distribution.
    pub dividends_address: Option<Address>,
    /// Minimum non-zero stake in whole tokens.
    pub minimum_stake: u64,
    pub unstaking_period_days: u64,
    pub max_loop: usize,
    pub staking_enabled: bool,
    /// When set, plain balance changes are no longer tracked.
    pub dividends_on_staked_only: bool,
    pub paused: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            name: "TapToken".into(),
            symbol: "TAP".into(),
            decimals: 18,
            initial_supply: 0,
            owner: Address::account("owner"),
            dividends_address: None,
            minimum_stake: 0,
            unstaking_period_days: 0,
            max_loop: DEFAULT_MAX_LOOP,
            staking_enabled: false,
            dividends_on_staked_only: false,
            paused: false,
        }
    }
}

impl LedgerConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, LedgerError> {
        toml::from_str(source).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Check the configuration can produce a ledger.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.max_loop == 0 {
            return Err(LedgerError::Config("max_loop must be at least 1".into()));
        }
        scale_by_decimals(self.initial_supply.into(), self.decimals)
            .map_err(|e| LedgerError::Config(format!("initial_supply: {e}")))?;
        scale_by_decimals(self.minimum_stake.into(), self.decimals)
            .map_err(|e| LedgerError::Config(format!("minimum_stake: {e}")))?;
        self.unstaking_period_days
            .checked_mul(tap_types::MICROS_PER_DAY)
            .ok_or_else(|| LedgerError::Config("unstaking_period_days is too large".into()))?;
        Ok(())
    }
}
