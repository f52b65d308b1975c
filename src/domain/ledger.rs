//! The persisted portfolio ledger: cash, positions and last-run stamp.
//!
//! A single writer is assumed per process. Every mutating step of a cycle
//! loads the ledger, changes it in memory and saves the whole object back
//! through [`crate::ports::ledger_port::LedgerPort`].

use serde::{Deserialize, Deserializer, Serialize};

use super::error::DipledgerError;
use super::position::Position;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    /// Available cash in cents.
    #[serde(deserialize_with = "whole_cents")]
    pub cash: i64,
    #[serde(default)]
    pub stocks: Vec<Position>,
    /// Epoch millis of the last completed cycle.
    #[serde(default)]
    pub last_ran: i64,
}

// Older ledgers stored cash as a float after prompt arithmetic.
fn whole_cents<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.round() as i64)
}

impl Ledger {
    pub fn new(cash: i64) -> Self {
        Ledger {
            cash,
            ..Ledger::default()
        }
    }

    pub fn live(&self) -> impl Iterator<Item = &Position> {
        self.stocks.iter().filter(|p| p.is_live())
    }

    pub fn pending(&self) -> impl Iterator<Item = &Position> {
        self.stocks.iter().filter(|p| p.is_pending())
    }

    /// cash + market value of every live position, in cents.
    pub fn total_value(&self) -> f64 {
        self.cash as f64 + self.live().map(Position::market_value).sum::<f64>()
    }

    /// Fraction of `total_value` held in `ticker`.
    pub fn share_of(&self, ticker: &str, total_value: f64) -> f64 {
        if total_value <= 0.0 {
            return 0.0;
        }
        let held: f64 = self
            .live()
            .filter(|p| p.ticker == ticker)
            .map(Position::market_value)
            .sum();
        held / total_value
    }

    /// Collapse live positions sharing a ticker into the first one: amounts
    /// are summed, the highest limit and lowest stop are kept. Pending
    /// instructions are left as distinct orders.
    pub fn merge_duplicates(&mut self) {
        let mut merged: Vec<Position> = Vec::with_capacity(self.stocks.len());
        for position in self.stocks.drain(..) {
            if position.is_live() {
                if let Some(existing) = merged
                    .iter_mut()
                    .find(|p| p.is_live() && p.ticker == position.ticker)
                {
                    existing.amount += position.amount;
                    existing.limit = existing.limit.max(position.limit);
                    existing.stop_loss = existing.stop_loss.min(position.stop_loss);
                    continue;
                }
            }
            merged.push(position);
        }
        self.stocks = merged;
    }

    /// Widen the advisory bands of live positions by one period and refresh
    /// their value from `latest_close`. Positions without a price keep their
    /// old value.
    pub fn decay<F>(&mut self, time_modifier: f64, mut latest_close: F)
    where
        F: FnMut(&Position) -> Option<f64>,
    {
        for position in self.stocks.iter_mut().filter(|p| p.is_live()) {
            position.stop_loss /= time_modifier;
            position.limit *= time_modifier;
            if let Some(close) = latest_close(position) {
                position.value = close;
            }
        }
    }

    /// Append new buy orders. An older pending order for the same instrument
    /// is superseded by the new one.
    pub fn replace_pending(&mut self, planned: Vec<Position>) {
        self.stocks.retain(|p| {
            !(p.is_pending()
                && planned
                    .iter()
                    .any(|n| n.ticker == p.ticker && n.market == p.market))
        });
        self.stocks.extend(planned);
    }

    /// Drop live positions with nothing left in them.
    pub fn remove_empty(&mut self) {
        self.stocks.retain(|p| p.is_pending() || p.amount > 0);
    }

    pub fn stamp(&mut self, epoch_millis: i64) {
        self.last_ran = epoch_millis;
    }

    /// Check the invariants that must hold before a write.
    pub fn validate(&self) -> Result<(), DipledgerError> {
        if self.cash < 0 {
            return Err(DipledgerError::LedgerInvariant {
                reason: format!("cash would be negative ({} cents)", self.cash),
            });
        }
        if let Some(empty) = self.live().find(|p| p.amount <= 0) {
            return Err(DipledgerError::LedgerInvariant {
                reason: format!("live position {} has amount {}", empty.ticker, empty.amount),
            });
        }
        Ok(())
    }
}
