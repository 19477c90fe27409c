//! Foundation types for the TAP token ledger.
//!
//! This crate provides the identity, time, and amount primitives shared by
//! the ledger core and the command-line front end.
//!
//! # Key Types
//!
//! - [`Address`]: 20-byte account or contract address (`hx…` / `cx…`)
//! - [`Timestamp`]: caller-supplied logical clock in microseconds
//! - [`scale_by_decimals`]: whole-token to base-unit conversion

pub mod address;
pub mod amount;
pub mod error;
pub mod temporal;

pub use address::{Address, AddressKind};
pub use amount::scale_by_decimals;
pub use error::TypeError;
pub use temporal::{Timestamp, MICROS_PER_DAY};
