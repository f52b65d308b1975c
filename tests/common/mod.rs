#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
pub use dipledger::domain::bar::Bar;
use dipledger::domain::error::DipledgerError;
use dipledger::domain::ledger::Ledger;
use dipledger::domain::settings::{AnalysisSettings, Settings, TradingSettings};
use dipledger::ports::ledger_port::LedgerPort;
use dipledger::ports::price_history_port::PriceHistoryPort;
use dipledger::ports::prompt_port::{PromptPort, Question};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

pub struct MockPriceHistory {
    pub data: HashMap<(String, String), Vec<Bar>>,
    pub errors: HashMap<(String, String), String>,
}

impl MockPriceHistory {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, market: &str, ticker: &str, bars: Vec<Bar>) -> Self {
        self.data
            .insert((market.to_string(), ticker.to_string()), bars);
        self
    }

    /// A single bar for `ticker` on 2024-03-12 with the given range, in dollars.
    pub fn with_day(self, market: &str, ticker: &str, high: f64, low: f64) -> Self {
        let bar = make_bar(market, ticker, date(2024, 3, 12), low, high, low, high);
        self.with_bars(market, ticker, vec![bar])
    }

    pub fn with_error(mut self, market: &str, ticker: &str, reason: &str) -> Self {
        self.errors
            .insert((market.to_string(), ticker.to_string()), reason.to_string());
        self
    }
}

impl PriceHistoryPort for MockPriceHistory {
    fn fetch_bars(&self, market: &str, ticker: &str) -> Result<Vec<Bar>, DipledgerError> {
        let key = (market.to_string(), ticker.to_string());
        if let Some(reason) = self.errors.get(&key) {
            return Err(DipledgerError::DataParse {
                path: format!("{}/{}", market, ticker),
                reason: reason.clone(),
            });
        }
        self.data
            .get(&key)
            .cloned()
            .ok_or_else(|| DipledgerError::NoData {
                ticker: ticker.to_string(),
                market: market.to_string(),
            })
    }

    fn list_tickers(&self, market: &str) -> Result<Vec<String>, DipledgerError> {
        let mut tickers: Vec<String> = self
            .data
            .keys()
            .chain(self.errors.keys())
            .filter(|(m, _)| m == market)
            .map(|(_, t)| t.clone())
            .collect();
        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }
}

/// Ledger held in memory; counts saves so tests can assert on commits.
pub struct MemoryLedger {
    pub ledger: RefCell<Ledger>,
    pub saves: RefCell<usize>,
}

impl MemoryLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: RefCell::new(ledger),
            saves: RefCell::new(0),
        }
    }

    pub fn current(&self) -> Ledger {
        self.ledger.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl LedgerPort for MemoryLedger {
    fn load(&self) -> Result<Ledger, DipledgerError> {
        Ok(self.ledger.borrow().clone())
    }

    fn save(&self, ledger: &Ledger) -> Result<(), DipledgerError> {
        ledger.validate()?;
        *self.ledger.borrow_mut() = ledger.clone();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

/// Answers questions from a script. `None` behaves like an empty line: the
/// question's default if it has one, otherwise no answer.
pub struct ScriptedPrompt {
    pub answers: VecDeque<Option<i64>>,
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: Vec<Option<i64>>) -> Self {
        Self {
            answers: answers.into(),
            asked: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl PromptPort for ScriptedPrompt {
    fn ask(&mut self, question: &Question) -> Result<Option<i64>, DipledgerError> {
        self.asked.push(question.text.clone());
        let answer = self.answers.pop_front().ok_or_else(|| DipledgerError::Prompt {
            reason: format!("unscripted question: {}", question.text),
        })?;
        Ok(answer.or(question.default))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(
    market: &str,
    ticker: &str,
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
) -> Bar {
    Bar {
        ticker: ticker.to_string(),
        market: market.to_string(),
        date,
        open,
        high,
        low,
        close,
        volume: 10_000,
    }
}

/// Twelve daily bars from 2024-03-01: five quiet days, three round trips
/// between ~12.00 and ~8.00, then a bullish close at 9.00 off a low of 8.50.
///
/// With `avg_length = 6` this rates at confidence 4, limit 1175, risk 100,
/// reward 275.
pub fn dip_series(market: &str, ticker: &str) -> Vec<Bar> {
    let start = date(2024, 3, 1);
    let ohlc = [
        (10.0, 10.5, 9.5, 10.0),
        (10.0, 10.5, 9.5, 10.0),
        (10.0, 10.5, 9.5, 10.0),
        (10.0, 10.5, 9.5, 10.0),
        (10.0, 10.5, 9.5, 10.0),
        (10.0, 12.0, 9.0, 11.0),
        (11.0, 11.5, 8.0, 9.0),
        (9.0, 12.0, 9.0, 11.5),
        (11.5, 11.75, 8.0, 8.5),
        (8.5, 12.0, 9.0, 11.0),
        (11.0, 11.25, 8.0, 9.0),
        (8.8, 9.2, 8.5, 9.0),
    ];
    ohlc.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| {
            make_bar(market, ticker, start + Duration::days(i as i64), o, h, l, c)
        })
        .collect()
}

/// Twelve flat bars from 2024-03-01; never an opportunity.
pub fn flat_series(market: &str, ticker: &str, price: f64) -> Vec<Bar> {
    let start = date(2024, 3, 1);
    (0..12)
        .map(|i| {
            make_bar(
                market,
                ticker,
                start + Duration::days(i),
                price,
                price,
                price,
                price,
            )
        })
        .collect()
}

pub fn sample_settings() -> Settings {
    Settings {
        data_dir: PathBuf::from("data"),
        ledger_path: PathBuf::from("balance.json"),
        analysis: AnalysisSettings {
            time_modifier: 0.9,
            avg_length: 6,
            markets: vec!["nyse".to_string()],
            trusted_market: "nyse".to_string(),
            trusted_ticker: "abc".to_string(),
        },
        trading: TradingSettings::default(),
    }
}
