//! dipledger: buy-the-dip candidate ranking and a confirmation-driven
//! portfolio ledger.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
