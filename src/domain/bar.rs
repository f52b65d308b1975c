//! Daily price bar and the latest-day range.

use chrono::NaiveDate;

/// Cents per currency unit.
pub const CENTS: f64 = 100.0;

/// One trading day for one instrument, prices in currency units.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub ticker: String,
    pub market: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    /// (open + high + low + close) / 4
    pub fn mean_price(&self) -> f64 {
        (self.open + self.high + self.low + self.close) / 4.0
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn high_cents(&self) -> f64 {
        self.high * CENTS
    }

    pub fn low_cents(&self) -> f64 {
        self.low * CENTS
    }

    pub fn close_cents(&self) -> f64 {
        self.close * CENTS
    }

    pub fn range(&self) -> DayRange {
        DayRange {
            high: self.high_cents(),
            low: self.low_cents(),
        }
    }
}

/// High and low of a single day, in cents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayRange {
    pub high: f64,
    pub low: f64,
}

impl DayRange {
    /// True when `price` lies within [low, high].
    pub fn contains(&self, price: f64) -> bool {
        self.high >= price && self.low <= price
    }
}
