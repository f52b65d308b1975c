//! Buy and sell instructions from ranked candidates and ledger state.
//!
//! Nothing here places an order. Sell instructions restate the advisory
//! bands of held positions; buy instructions are appended to the ledger as
//! pending positions awaiting confirmation.

use std::fmt;
use tracing::debug;

use super::analysis::Candidate;
use super::ledger::Ledger;
use super::position::Position;
use super::settings::TradingSettings;
use crate::ports::prompt_port::format_cents;

#[derive(Debug, Clone, PartialEq)]
pub struct SellInstruction {
    pub ticker: String,
    pub limit: f64,
    pub stop_loss: f64,
}

impl fmt::Display for SellInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\t{}\t\t{}\t\t{}",
            self.ticker,
            format_cents(self.limit),
            format_cents(self.stop_loss)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuyInstruction {
    pub ticker: String,
    pub market: String,
    pub amount: i64,
    pub buy_price: f64,
}

impl fmt::Display for BuyInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\t{}\t\t{}\t\t{}",
            self.ticker,
            self.amount,
            format_cents(self.buy_price)
        )
    }
}

/// One line per live position.
pub fn sell_instructions(ledger: &Ledger) -> Vec<SellInstruction> {
    ledger
        .live()
        .map(|p| SellInstruction {
            ticker: p.ticker.clone(),
            limit: p.limit,
            stop_loss: p.stop_loss,
        })
        .collect()
}

/// Size pending buys for `ranked` candidates against the ledger's cash.
///
/// Candidates are walked best first while the overshoot budget stays
/// positive. Each buy tops the instrument up to the per-stock cap of total
/// portfolio value at the candidate's latest close.
pub fn plan_purchases(
    ranked: &[Candidate],
    ledger: &Ledger,
    trading: &TradingSettings,
) -> Vec<Position> {
    let cap = trading.max_portfolio_percent_per_stock;
    let total_value = ledger.total_value();
    let mut budget = ledger.cash as f64 * trading.budget_overshoot;
    let mut planned = Vec::new();

    for candidate in ranked {
        if budget <= 0.0 {
            break;
        }
        let today = &candidate.today;
        if today.low_cents() < trading.min_price {
            debug!(ticker = %candidate.ticker, "below minimum price");
            continue;
        }
        let share = ledger.share_of(&candidate.ticker, total_value);
        if share >= cap {
            debug!(ticker = %candidate.ticker, share, "already at cap");
            continue;
        }

        let value = today.close_cents();
        if value <= 0.0 {
            debug!(ticker = %candidate.ticker, "no positive close to size against");
            continue;
        }
        let buy_price = (today.close_cents() + today.low_cents()) / 2.0;
        let amount = (total_value * (cap - share) / value).floor() as i64;
        if amount < 1 {
            continue;
        }

        planned.push(Position::pending(
            &candidate.ticker,
            &candidate.market,
            amount,
            candidate.limit,
            candidate.stop_loss,
            value,
            buy_price,
        ));
        budget -= buy_price * amount as f64;
    }

    planned
}

/// Printable view of planned purchases.
pub fn buy_instructions(planned: &[Position]) -> Vec<BuyInstruction> {
    planned
        .iter()
        .filter_map(|p| {
            p.buy_price().map(|buy_price| BuyInstruction {
                ticker: p.ticker.clone(),
                market: p.market.clone(),
                amount: p.amount,
                buy_price,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use chrono::NaiveDate;

    fn ranked(ticker: &str, close: f64, low: f64) -> Candidate {
        let today = Bar {
            ticker: ticker.into(),
            market: "nyse".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            open: close,
            high: close,
            low,
            close,
            volume: 1,
        };
        let mut c = Candidate::new(ticker, "nyse", today, Vec::new());
        c.limit = close * 150.0;
        c.stop_loss = low * 80.0;
        c.rating = 10.0;
        c
    }

    #[test]
    fn sizes_up_to_cap() {
        let ledger = Ledger::new(100_000);
        let planned = plan_purchases(&[ranked("abc", 10.0, 9.0)], &ledger, &TradingSettings::default());

        // 10% of 100000 cents at 1000 cents per unit
        assert_eq!(planned.len(), 1);
        let p = &planned[0];
        assert!(p.is_pending());
        assert_eq!(p.amount, 10);
        assert_eq!(p.buy_price(), Some(950.0));
        assert!((p.value - 1000.0).abs() < 1e-9);
        assert!((p.limit - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn instrument_at_cap_gets_no_buy() {
        let mut ledger = Ledger::new(90_000);
        // 10 units at 1000 cents = 10000 of 100000 total → exactly 10%
        ledger.stocks = vec![Position::live("abc", "nyse", 10, 1500.0, 800.0, 1000.0)];
        let planned = plan_purchases(&[ranked("abc", 10.0, 9.0)], &ledger, &TradingSettings::default());
        assert!(planned.is_empty());
    }

    #[test]
    fn partial_holding_is_topped_up() {
        let mut ledger = Ledger::new(95_000);
        ledger.stocks = vec![Position::live("abc", "nyse", 5, 1500.0, 800.0, 1000.0)];
        let planned = plan_purchases(&[ranked("abc", 10.0, 9.0)], &ledger, &TradingSettings::default());
        assert_eq!(planned[0].amount, 5);
    }

    #[test]
    fn penny_stocks_are_skipped() {
        let ledger = Ledger::new(100_000);
        let planned = plan_purchases(&[ranked("cheap", 1.2, 0.95)], &ledger, &TradingSettings::default());
        assert!(planned.is_empty());
    }

    #[test]
    fn expensive_instrument_below_one_unit_is_skipped() {
        let ledger = Ledger::new(10_000);
        let planned = plan_purchases(&[ranked("big", 500.0, 490.0)], &ledger, &TradingSettings::default());
        assert!(planned.is_empty());
    }

    #[test]
    fn budget_stops_the_walk() {
        let ledger = Ledger::new(10_000);
        let trading = TradingSettings {
            max_portfolio_percent_per_stock: 1.0,
            ..TradingSettings::default()
        };
        let candidates = vec![ranked("first", 10.0, 10.0), ranked("second", 10.0, 10.0)];
        let planned = plan_purchases(&candidates, &ledger, &trading);

        // first spends 10000 of a 12000 budget; second overshoots it
        assert_eq!(planned.len(), 2);
        let exhausted = plan_purchases(
            &[
                ranked("first", 10.0, 10.0),
                ranked("second", 10.0, 10.0),
                ranked("third", 10.0, 10.0),
            ],
            &ledger,
            &trading,
        );
        assert_eq!(exhausted.len(), 2);
    }

    #[test]
    fn zero_close_is_not_sized() {
        let ledger = Ledger::new(100_000);
        let trading = TradingSettings {
            min_price: 0.0,
            ..TradingSettings::default()
        };
        let planned = plan_purchases(&[ranked("void", 0.0, 0.0)], &ledger, &trading);
        assert!(planned.is_empty());
    }

    #[test]
    fn no_cash_no_buys() {
        let ledger = Ledger::new(0);
        let planned = plan_purchases(&[ranked("abc", 10.0, 9.0)], &ledger, &TradingSettings::default());
        assert!(planned.is_empty());
    }

    #[test]
    fn sell_instructions_cover_live_positions_only() {
        let mut ledger = Ledger::new(0);
        ledger.stocks = vec![
            Position::live("xyz", "nyse", 20, 300.0, 250.0, 280.0),
            Position::pending("abc", "nyse", 10, 620.0, 450.0, 510.0, 500.0),
        ];
        let sells = sell_instructions(&ledger);
        assert_eq!(sells.len(), 1);
        assert_eq!(sells[0].ticker, "xyz");
        assert_eq!(sells[0].to_string(), "\txyz\t\t3.00\t\t2.50");
    }

    #[test]
    fn buy_instruction_display() {
        let planned = vec![Position::pending("abc", "nyse", 10, 620.0, 450.0, 510.0, 500.0)];
        let buys = buy_instructions(&planned);
        assert_eq!(buys[0].to_string(), "\tabc\t\t10\t\t5.00");
    }
}
