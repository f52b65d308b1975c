//! Ledger persistence port.
//!
//! Implementations assume a single writer: `save` replaces the whole ledger
//! and there is no concurrency token.

use crate::domain::error::DipledgerError;
use crate::domain::ledger::Ledger;

pub trait LedgerPort {
    /// Current ledger; an absent store yields (and records) an empty one.
    fn load(&self) -> Result<Ledger, DipledgerError>;

    /// Replace the stored ledger. Fails without writing if `ledger` breaks
    /// an invariant.
    fn save(&self, ledger: &Ledger) -> Result<(), DipledgerError>;
}
