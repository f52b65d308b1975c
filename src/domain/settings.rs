//! Run settings assembled from configuration.

use std::path::PathBuf;

/// Parameters of the analysis engine and candidate selection.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Per-period decay constant, strictly between 0 and 1.
    pub time_modifier: f64,
    /// Window length N of a candidate's history.
    pub avg_length: usize,
    /// Markets in evaluation order.
    pub markets: Vec<String>,
    pub trusted_market: String,
    pub trusted_ticker: String,
}

impl AnalysisSettings {
    /// Bars needed per instrument; also the freshness lookback index.
    pub fn lookback(&self) -> usize {
        self.avg_length * 2
    }
}

/// Parameters of buy sizing.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingSettings {
    pub max_portfolio_percent_per_stock: f64,
    /// Minimum latest low, in cents.
    pub min_price: f64,
    /// Buy instructions are only produced when cash exceeds this, in cents.
    pub min_cash: i64,
    pub budget_overshoot: f64,
}

impl Default for TradingSettings {
    fn default() -> Self {
        TradingSettings {
            max_portfolio_percent_per_stock: 0.1,
            min_price: 100.0,
            min_cash: 500,
            budget_overshoot: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub analysis: AnalysisSettings,
    pub trading: TradingSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_is_twice_the_window() {
        let analysis = AnalysisSettings {
            time_modifier: 0.9,
            avg_length: 20,
            markets: vec!["nyse".into()],
            trusted_market: "nyse".into(),
            trusted_ticker: "ibm".into(),
        };
        assert_eq!(analysis.lookback(), 40);
    }

    #[test]
    fn trading_defaults() {
        let trading = TradingSettings::default();
        assert_eq!(trading.min_cash, 500);
        assert!((trading.min_price - 100.0).abs() < f64::EPSILON);
        assert!((trading.budget_overshoot - 1.2).abs() < f64::EPSILON);
    }
}
