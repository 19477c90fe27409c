//! Address sets used for blacklist, locklist, whitelist, and the
//! known-addresses registry.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tap_types::Address;

/// Which administrative list an operation refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListKind {
    /// Excluded from balance-change tracking (and thus from dividends).
    Blacklist,
    /// Barred from transferring and staking.
    Locklist,
    /// Exempt from the global transfer pause.
    Whitelist,
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blacklist => write!(f, "blacklist"),
            Self::Locklist => write!(f, "locklist"),
            Self::Whitelist => write!(f, "whitelist"),
        }
    }
}

/// Unordered address set with O(1) membership and swap-with-last removal.
///
/// Iteration order is insertion order until the first removal; removing an
/// element moves the last element into its slot, so callers must not rely
/// on ordering.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Address>", into = "Vec<Address>")]
pub struct MembershipList {
    members: Vec<Address>,
    positions: HashMap<Address, usize>,
}

impl MembershipList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.positions.contains_key(address)
    }

    /// Add `address`. Returns `false` if it was already present.
    pub fn insert(&mut self, address: Address) -> bool {
        if self.contains(&address) {
            return false;
        }
        self.positions.insert(address, self.members.len());
        self.members.push(address);
        true
    }

    /// Remove `address` by swapping the last element into its slot.
    /// Returns `false` if it was not present.
    pub fn remove(&mut self, address: &Address) -> bool {
        let Some(index) = self.positions.remove(address) else {
            return false;
        };
        self.members.swap_remove(index);
        if let Some(moved) = self.members.get(index) {
            self.positions.insert(*moved, index);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.members.iter()
    }

    pub fn to_vec(&self) -> Vec<Address> {
        self.members.clone()
    }
}

impl From<Vec<Address>> for MembershipList {
    fn from(addresses: Vec<Address>) -> Self {
        let mut list = Self::new();
        for address in addresses {
            list.insert(address);
        }
        list
    }
}

impl From<MembershipList> for Vec<Address> {
    fn from(list: MembershipList) -> Self {
        list.members
    }
}
