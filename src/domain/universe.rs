//! Candidate selection across markets.
//!
//! Every instrument must carry at least `lookback` bars and its bar at
//! `len - lookback` must share a date with the trusted instrument's, which
//! rules out stale or gapped series. Survivors become [`Candidate`]s over
//! the `avg_length` bars preceding their latest bar.

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::domain::analysis::Candidate;
use crate::domain::bar::Bar;
use crate::domain::error::DipledgerError;
use crate::domain::settings::AnalysisSettings;
use crate::ports::price_history_port::PriceHistoryPort;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in market list")]
    EmptyToken,

    #[error("duplicate market: {0}")]
    DuplicateMarket(String),
}

/// Split a comma list of markets, preserving order.
pub fn parse_markets(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut markets = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let market = trimmed.to_string();
        if !seen.insert(market.clone()) {
            return Err(UniverseError::DuplicateMarket(market));
        }
        markets.push(market);
    }

    Ok(markets)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedInstrument {
    pub market: String,
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Unreadable,
    InsufficientBars { bars: usize },
    Stale { start: NaiveDate },
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub candidates: Vec<Candidate>,
    pub skipped: Vec<SkippedInstrument>,
}

/// Date of the trusted instrument's bar at `len - lookback`.
pub fn expected_start_date(
    prices: &dyn PriceHistoryPort,
    analysis: &AnalysisSettings,
) -> Result<NaiveDate, DipledgerError> {
    let bars = prices.fetch_bars(&analysis.trusted_market, &analysis.trusted_ticker)?;
    let lookback = analysis.lookback();
    if bars.len() < lookback {
        return Err(DipledgerError::InsufficientData {
            ticker: analysis.trusted_ticker.clone(),
            market: analysis.trusted_market.clone(),
            bars: bars.len(),
            minimum: lookback,
        });
    }
    Ok(bars[bars.len() - lookback].date)
}

/// Build a candidate from an instrument's full series, or say why not.
pub fn build_candidate(
    market: &str,
    ticker: &str,
    mut bars: Vec<Bar>,
    avg_length: usize,
    expected_start: NaiveDate,
) -> Result<Candidate, SkipReason> {
    let lookback = avg_length * 2;
    if bars.len() < lookback {
        return Err(SkipReason::InsufficientBars { bars: bars.len() });
    }
    let start = bars[bars.len() - lookback].date;
    if start != expected_start {
        return Err(SkipReason::Stale { start });
    }

    let today = bars.pop().ok_or(SkipReason::InsufficientBars { bars: 0 })?;
    let history = bars.split_off(bars.len() - avg_length);
    Ok(Candidate::new(ticker, market, today, history))
}

/// Gather candidates from every configured market, in order.
pub fn select_candidates(
    prices: &dyn PriceHistoryPort,
    analysis: &AnalysisSettings,
) -> Result<Selection, DipledgerError> {
    let expected_start = expected_start_date(prices, analysis)?;
    let mut candidates = Vec::new();
    let mut skipped = Vec::new();

    for (i, market) in analysis.markets.iter().enumerate() {
        info!("Gathering {} ({} of {})", market, i + 1, analysis.markets.len());
        let tickers = match prices.list_tickers(market) {
            Ok(t) => t,
            Err(e) => {
                warn!("skipping market {} ({})", market, e);
                continue;
            }
        };

        for ticker in tickers {
            let bars = match prices.fetch_bars(market, &ticker) {
                Ok(bars) => bars,
                Err(e) => {
                    warn!("skipping {}.{} ({})", ticker, market, e);
                    skipped.push(SkippedInstrument {
                        market: market.clone(),
                        ticker,
                        reason: SkipReason::Unreadable,
                    });
                    continue;
                }
            };

            match build_candidate(market, &ticker, bars, analysis.avg_length, expected_start) {
                Ok(candidate) => candidates.push(candidate),
                Err(reason) => skipped.push(SkippedInstrument {
                    market: market.clone(),
                    ticker,
                    reason,
                }),
            }
        }
    }

    info!(
        "{} candidates, {} instruments skipped",
        candidates.len(),
        skipped.len()
    );
    Ok(Selection {
        candidates,
        skipped,
    })
}
