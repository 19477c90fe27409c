use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

const ADDRESS_LEN: usize = 20;

/// Whether an address belongs to an externally owned account or to a
/// contract that must be notified when it receives tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AddressKind {
    /// Externally owned account (`hx` prefix).
    Account,
    /// Contract-like collaborator (`cx` prefix).
    Contract,
}

impl AddressKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Account => "hx",
            Self::Contract => "cx",
        }
    }
}

/// A ledger address.
///
/// Addresses are 20 bytes tagged with an [`AddressKind`]. The textual form
/// is the kind prefix followed by 40 lowercase hex characters, e.g.
/// `hx0123…`. Serde uses the textual form so addresses can key JSON maps.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    kind: AddressKind,
    bytes: [u8; ADDRESS_LEN],
}

impl Address {
    /// Create an address from raw parts.
    pub const fn new(kind: AddressKind, bytes: [u8; ADDRESS_LEN]) -> Self {
        Self { kind, bytes }
    }

    /// Derive an address deterministically from a label.
    ///
    /// The same `(kind, label)` pair always produces the same address.
    pub fn derive(kind: AddressKind, label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"tap-address-v1:");
        hasher.update(kind.prefix().as_bytes());
        hasher.update(b":");
        hasher.update(label.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest.as_bytes()[..ADDRESS_LEN]);
        Self { kind, bytes }
    }

    /// Shorthand for an account address derived from `label`.
    pub fn account(label: &str) -> Self {
        Self::derive(AddressKind::Account, label)
    }

    /// Shorthand for a contract address derived from `label`.
    pub fn contract(label: &str) -> Self {
        Self::derive(AddressKind::Contract, label)
    }

    /// Create a random account address.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self::new(AddressKind::Account, bytes)
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    /// Returns `true` for contract addresses, which receive a deposit
    /// notification on every incoming transfer.
    pub fn is_contract(&self) -> bool {
        self.kind == AddressKind::Contract
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.bytes
    }

    /// Short identifier (prefix plus first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("{}{}", self.kind.prefix(), hex::encode(&self.bytes[..4]))
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = if s.starts_with("hx") {
            AddressKind::Account
        } else if s.starts_with("cx") {
            AddressKind::Contract
        } else {
            return Err(TypeError::InvalidPrefix(s.to_string()));
        };
        let raw = hex::decode(&s[2..]).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if raw.len() != ADDRESS_LEN {
            return Err(TypeError::InvalidLength {
                expected: ADDRESS_LEN,
                actual: raw.len(),
            });
        }
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&raw);
        Ok(Self { kind, bytes })
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short_id())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), hex::encode(self.bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn derive_is_deterministic() {
        assert_eq!(Address::account("alice"), Address::account("alice"));
        assert_ne!(Address::account("alice"), Address::account("bob"));
    }

    #[test]
    fn kind_participates_in_derivation() {
        let eoa = Address::account("vault");
        let contract = Address::contract("vault");
        assert_ne!(eoa.as_bytes(), contract.as_bytes());
        assert!(!eoa.is_contract());
        assert!(contract.is_contract());
    }

    #[test]
    fn display_uses_kind_prefix() {
        let addr = Address::new(AddressKind::Contract, [0xab; 20]);
        assert_eq!(addr.to_string(), format!("cx{}", "ab".repeat(20)));
        assert_eq!(addr.short_id(), "cxabababab");
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            "zz00".parse::<Address>(),
            Err(TypeError::InvalidPrefix(_))
        ));
        assert!(matches!(
            "hxnothex".parse::<Address>(),
            Err(TypeError::InvalidHex(_))
        ));
        assert_eq!(
            "hx0011".parse::<Address>(),
            Err(TypeError::InvalidLength {
                expected: 20,
                actual: 2
            })
        );
    }

    #[test]
    fn serde_uses_textual_form() {
        let addr = Address::account("carol");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn addresses_key_json_maps() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(Address::account("dave"), 7u64);
        let json = serde_json::to_string(&map).unwrap();
        let back: std::collections::BTreeMap<Address, u64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    proptest! {
        #[test]
        fn display_parses_back(bytes in proptest::array::uniform20(any::<u8>()), contract in any::<bool>()) {
            let kind = if contract { AddressKind::Contract } else { AddressKind::Account };
            let addr = Address::new(kind, bytes);
            prop_assert_eq!(addr.to_string().parse::<Address>().unwrap(), addr);
        }
    }
}
