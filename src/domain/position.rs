//! Ledger positions: pending buy instructions and live holdings.
//!
//! Prices are in cents. On disk a position is a flat camelCase record whose
//! `pending` flag selects the interpretation; in memory the two shapes are
//! separated by [`PositionState`].

use serde::{Deserialize, Serialize};

use super::bar::DayRange;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionState {
    /// Unfilled buy instruction with its anticipated fill price.
    Pending { buy_price: f64 },
    /// Owned quantity; `purchase_price` is absent for holdings entered by hand.
    Live { purchase_price: Option<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PositionRecord", into = "PositionRecord")]
pub struct Position {
    pub ticker: String,
    pub market: String,
    pub amount: i64,
    /// Advisory sell-high target.
    pub limit: f64,
    /// Advisory sell-low floor.
    pub stop_loss: f64,
    /// Last known per-unit price.
    pub value: f64,
    pub state: PositionState,
}

impl Position {
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        ticker: &str,
        market: &str,
        amount: i64,
        limit: f64,
        stop_loss: f64,
        value: f64,
        buy_price: f64,
    ) -> Self {
        Position {
            ticker: ticker.to_string(),
            market: market.to_string(),
            amount,
            limit,
            stop_loss,
            value,
            state: PositionState::Pending { buy_price },
        }
    }

    pub fn live(
        ticker: &str,
        market: &str,
        amount: i64,
        limit: f64,
        stop_loss: f64,
        value: f64,
    ) -> Self {
        Position {
            ticker: ticker.to_string(),
            market: market.to_string(),
            amount,
            limit,
            stop_loss,
            value,
            state: PositionState::Live {
                purchase_price: None,
            },
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, PositionState::Pending { .. })
    }

    pub fn is_live(&self) -> bool {
        !self.is_pending()
    }

    pub fn buy_price(&self) -> Option<f64> {
        match self.state {
            PositionState::Pending { buy_price } => Some(buy_price),
            PositionState::Live { .. } => None,
        }
    }

    pub fn purchase_price(&self) -> Option<f64> {
        match self.state {
            PositionState::Live { purchase_price } => purchase_price,
            PositionState::Pending { .. } => None,
        }
    }

    /// value × amount
    pub fn market_value(&self) -> f64 {
        self.value * self.amount as f64
    }

    /// True when the day's range plausibly filled this pending buy.
    pub fn buy_filled_within(&self, range: &DayRange) -> bool {
        self.buy_price().is_some_and(|price| range.contains(price))
    }

    /// True when the day's range reached the limit or fell to the stop.
    pub fn sell_triggered_within(&self, range: &DayRange) -> bool {
        range.high >= self.limit || range.low <= self.stop_loss
    }

    /// Turn a pending instruction into a held position.
    pub fn confirm_purchase(&mut self, purchase_price: f64, amount: i64) {
        self.amount = amount;
        self.state = PositionState::Live {
            purchase_price: Some(purchase_price),
        };
    }
}

/// On-disk shape of a [`Position`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRecord {
    pub ticker: String,
    pub market: String,
    pub amount: i64,
    pub limit: f64,
    pub stop_loss: f64,
    #[serde(default)]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
}

impl TryFrom<PositionRecord> for Position {
    type Error = String;

    fn try_from(record: PositionRecord) -> Result<Self, Self::Error> {
        let state = if record.pending.unwrap_or(false) {
            let buy_price = record
                .buy_price
                .ok_or_else(|| format!("pending position {} has no buyPrice", record.ticker))?;
            PositionState::Pending { buy_price }
        } else {
            PositionState::Live {
                purchase_price: record.purchase_price,
            }
        };
        Ok(Position {
            ticker: record.ticker,
            market: record.market,
            amount: record.amount,
            limit: record.limit,
            stop_loss: record.stop_loss,
            value: record.value,
            state,
        })
    }
}

impl From<Position> for PositionRecord {
    fn from(position: Position) -> Self {
        let (pending, buy_price, purchase_price) = match position.state {
            PositionState::Pending { buy_price } => (Some(true), Some(buy_price), None),
            PositionState::Live { purchase_price } => (None, None, purchase_price),
        };
        PositionRecord {
            ticker: position.ticker,
            market: position.market,
            amount: position.amount,
            limit: position.limit,
            stop_loss: position.stop_loss,
            value: position.value,
            pending,
            buy_price,
            purchase_price,
        }
    }
}
