//! Price history access port.

use crate::domain::bar::{Bar, DayRange};
use crate::domain::error::DipledgerError;

pub trait PriceHistoryPort {
    /// Every bar for the instrument, oldest first.
    fn fetch_bars(&self, market: &str, ticker: &str) -> Result<Vec<Bar>, DipledgerError>;

    /// Tickers available in a market, sorted.
    fn list_tickers(&self, market: &str) -> Result<Vec<String>, DipledgerError>;

    /// High and low of the most recent bar, in cents.
    fn latest_range(&self, market: &str, ticker: &str) -> Result<DayRange, DipledgerError> {
        self.latest_bar(market, ticker).map(|bar| bar.range())
    }

    /// Close of the most recent bar, in cents.
    fn latest_close(&self, market: &str, ticker: &str) -> Result<f64, DipledgerError> {
        self.latest_bar(market, ticker).map(|bar| bar.close_cents())
    }

    fn latest_bar(&self, market: &str, ticker: &str) -> Result<Bar, DipledgerError> {
        self.fetch_bars(market, ticker)?
            .pop()
            .ok_or_else(|| DipledgerError::NoData {
                ticker: ticker.to_string(),
                market: market.to_string(),
            })
    }
}
