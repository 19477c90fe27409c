//! JSON snapshots of the ledger state.

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::LedgerError;
use crate::state::LedgerState;

/// Write `state` to `path`, replacing any existing file atomically.
pub fn save(path: impl AsRef<Path>, state: &LedgerState) -> Result<(), LedgerError> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let encoded =
        serde_json::to_vec_pretty(state).map_err(|e| LedgerError::Persistence(e.to_string()))?;

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| LedgerError::Persistence(format!("{}: {e}", dir.display())))?;
    file.write_all(&encoded)
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| LedgerError::Persistence(e.to_string()))?;
    file.persist(path)
        .map_err(|e| LedgerError::Persistence(format!("{}: {e}", path.display())))?;

    debug!(path = %path.display(), bytes = encoded.len(), "snapshot saved");
    Ok(())
}

/// Read a snapshot written by [`save`].
pub fn load(path: impl AsRef<Path>) -> Result<LedgerState, LedgerError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| LedgerError::Persistence(format!("{}: {e}", path.display())))?;
    let state = serde_json::from_slice(&bytes)
        .map_err(|e| LedgerError::Persistence(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), "snapshot loaded");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tap_types::{Address, Timestamp};

    use super::*;
    use crate::config::LedgerConfig;
    use crate::events::NullSink;
    use crate::ledger::TokenLedger;
    use crate::traits::CallContext;

    #[test]
    fn save_and_load_preserve_state() {
        let owner = Address::account("owner");
        let config = LedgerConfig {
            initial_supply: 100,
            decimals: 0,
            owner,
            staking_enabled: true,
            ..Default::default()
        };
        let mut ledger = TokenLedger::genesis(&config, Arc::new(NullSink)).unwrap();
        let ctx = CallContext::new(owner, Timestamp::from_micros(1));
        ledger
            .transfer(&ctx, Address::account("bob"), 40, None)
            .unwrap();
        ledger.stake(&ctx, 30).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        save(&path, ledger.state()).unwrap();
        // Overwrite in place.
        save(&path, ledger.state()).unwrap();

        let restored = load(&path).unwrap();
        assert_eq!(&restored, ledger.state());

        let resumed = TokenLedger::from_state(restored, Arc::new(NullSink));
        assert_eq!(resumed.balance_of(&Address::account("bob")), 40);
        assert_eq!(resumed.staked_balance_of(&owner), 30);
    }

    #[test]
    fn load_reports_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(matches!(load(&missing), Err(LedgerError::Persistence(_))));

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, b"{not json").unwrap();
        assert!(matches!(load(&corrupt), Err(LedgerError::Persistence(_))));
    }
}
