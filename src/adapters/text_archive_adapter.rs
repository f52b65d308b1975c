//! Price history adapter over the flattened text archive.
//!
//! Layout: `<base>/<market>/<ticker>.<suffix>.txt`, one file per instrument,
//! columns `TICKER,PER,DATE,TIME,OPEN,HIGH,LOW,CLOSE,VOL[,OPENINT]` after a
//! header row, `DATE` as `YYYYMMDD`.

use crate::domain::bar::Bar;
use crate::domain::error::DipledgerError;
use crate::ports::price_history_port::PriceHistoryPort;
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Ticker to file, per market.
type MarketIndex = BTreeMap<String, PathBuf>;

/// Each market directory is listed once per adapter; files added later are
/// not seen.
pub struct TextArchiveAdapter {
    base_path: PathBuf,
    index: RefCell<HashMap<String, MarketIndex>>,
}

impl TextArchiveAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            index: RefCell::new(HashMap::new()),
        }
    }

    fn ticker_of(file_name: &str) -> Option<String> {
        if !file_name.ends_with(".txt") {
            return None;
        }
        let stem = file_name.split('.').next()?;
        if stem.is_empty() {
            return None;
        }
        Some(stem.to_lowercase())
    }

    fn scan_market(&self, market: &str) -> Result<MarketIndex, DipledgerError> {
        let dir = self.base_path.join(market);
        let entries = fs::read_dir(&dir).map_err(|e| DipledgerError::DataParse {
            path: dir.display().to_string(),
            reason: format!("failed to read directory: {}", e),
        })?;

        let mut index = MarketIndex::new();
        for entry in entries {
            let entry = entry?;
            if let Some(ticker) = Self::ticker_of(&entry.file_name().to_string_lossy()) {
                index.entry(ticker).or_insert_with(|| entry.path());
            }
        }
        Ok(index)
    }

    fn with_market<T>(
        &self,
        market: &str,
        f: impl FnOnce(&MarketIndex) -> T,
    ) -> Result<T, DipledgerError> {
        if let Some(index) = self.index.borrow().get(market) {
            return Ok(f(index));
        }
        let index = self.scan_market(market)?;
        let result = f(&index);
        self.index.borrow_mut().insert(market.to_string(), index);
        Ok(result)
    }

    fn instrument_path(&self, market: &str, ticker: &str) -> Result<PathBuf, DipledgerError> {
        let no_data = || DipledgerError::NoData {
            ticker: ticker.to_string(),
            market: market.to_string(),
        };
        self.with_market(market, |index| index.get(&ticker.to_lowercase()).cloned())
            .map_err(|_| no_data())?
            .ok_or_else(no_data)
    }

    fn parse_field<T: std::str::FromStr>(
        record: &csv::StringRecord,
        index: usize,
        column: &str,
        path: &Path,
    ) -> Result<T, DipledgerError>
    where
        T::Err: std::fmt::Display,
    {
        record
            .get(index)
            .ok_or_else(|| DipledgerError::DataParse {
                path: path.display().to_string(),
                reason: format!("missing {} column", column),
            })?
            .trim()
            .parse()
            .map_err(|e| DipledgerError::DataParse {
                path: path.display().to_string(),
                reason: format!("invalid {} value: {}", column, e),
            })
    }
}

impl PriceHistoryPort for TextArchiveAdapter {
    fn fetch_bars(&self, market: &str, ticker: &str) -> Result<Vec<Bar>, DipledgerError> {
        let path = self.instrument_path(market, ticker)?;
        let content = fs::read_to_string(&path)?;

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| DipledgerError::DataParse {
                path: path.display().to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str: String = Self::parse_field(&record, 2, "DATE", &path)?;
            let date = NaiveDate::parse_from_str(&date_str, "%Y%m%d").map_err(|e| {
                DipledgerError::DataParse {
                    path: path.display().to_string(),
                    reason: format!("invalid date {}: {}", date_str, e),
                }
            })?;

            // Volume is occasionally written as a float.
            let volume: f64 = Self::parse_field(&record, 8, "VOL", &path)?;

            bars.push(Bar {
                ticker: ticker.to_lowercase(),
                market: market.to_string(),
                date,
                open: Self::parse_field(&record, 4, "OPEN", &path)?,
                high: Self::parse_field(&record, 5, "HIGH", &path)?,
                low: Self::parse_field(&record, 6, "LOW", &path)?,
                close: Self::parse_field(&record, 7, "CLOSE", &path)?,
                volume: volume as i64,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_tickers(&self, market: &str) -> Result<Vec<String>, DipledgerError> {
        self.with_market(market, |index| index.keys().cloned().collect())
    }
}
