//! Sequential reconciliation of intended trades against the market.
//!
//! Each pass walks an ordered list of ledger positions one index at a time,
//! asks about a position only when today's range plausibly crossed its
//! price bound, and commits the aggregate change to the ledger once the
//! index reaches the end of the list. An error before that point leaves the
//! stored ledger untouched.

use tracing::{info, warn};

use super::bar::DayRange;
use super::error::DipledgerError;
use super::ledger::Ledger;
use super::position::Position;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::price_history_port::PriceHistoryPort;
use crate::ports::prompt_port::{format_cents, PromptPort, Question};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedPurchase {
    pub ticker: String,
    pub amount: i64,
    /// Fill price in cents.
    pub price: i64,
}

impl ConfirmedPurchase {
    /// `None` when the answers overflow.
    pub fn cost(&self) -> Option<i64> {
        self.price.checked_mul(self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedSale {
    pub ticker: String,
    pub amount: i64,
    /// Sale price in cents.
    pub price: i64,
}

impl ConfirmedSale {
    /// `None` when the answers overflow.
    pub fn proceeds(&self) -> Option<i64> {
        self.price.checked_mul(self.amount)
    }
}

fn out_of_range(ticker: &str, price: i64, amount: i64) -> DipledgerError {
    DipledgerError::Prompt {
        reason: format!("{} units of {} at {} cents is out of range", amount, ticker, price),
    }
}

fn total<T>(items: &[T], value: impl Fn(&T) -> Option<i64>) -> Result<i64, DipledgerError> {
    items.iter().try_fold(0i64, |sum, item| {
        value(item)
            .and_then(|v| sum.checked_add(v))
            .ok_or_else(|| DipledgerError::Prompt {
                reason: "confirmed amounts overflow the ledger".into(),
            })
    })
}

fn todays_range(prices: &dyn PriceHistoryPort, position: &Position) -> Option<DayRange> {
    match prices.latest_range(&position.market, &position.ticker) {
        Ok(range) => Some(range),
        Err(e) => {
            warn!("not reconciling {} ({})", position.ticker, e);
            None
        }
    }
}

/// Pass A: ask about pending buys whose price fell inside today's range,
/// then debit the cost of everything confirmed.
pub fn confirm_pending_purchases(
    store: &dyn LedgerPort,
    prices: &dyn PriceHistoryPort,
    prompt: &mut dyn PromptPort,
) -> Result<Vec<ConfirmedPurchase>, DipledgerError> {
    let mut ledger = store.load()?;
    let pending: Vec<usize> = pending_indices(&ledger);
    if !pending.is_empty() {
        info!("Confirming {} pending purchases", pending.len());
    }

    let mut confirmed = Vec::new();
    let mut index = 0;
    while index < pending.len() {
        let position = &mut ledger.stocks[pending[index]];
        index += 1;

        let Some(buy_price) = position.buy_price() else {
            continue;
        };
        let Some(range) = todays_range(prices, position) else {
            continue;
        };
        if !position.buy_filled_within(&range) {
            continue;
        }

        let question = Question::currency(format!(
            "Did you purchase {}? If so, at what price? (expected {})",
            position.ticker,
            format_cents(buy_price)
        ));
        let Some(price) = prompt.ask(&question)? else {
            continue;
        };
        let question = Question::quantity("How many did you buy?", None).with_default(position.amount);
        let amount = prompt.ask(&question)?.unwrap_or(position.amount);
        if amount < 1 {
            info!("{} confirmed with no units; leaving it pending", position.ticker);
            continue;
        }

        if price.checked_mul(amount).is_none() {
            return Err(out_of_range(&position.ticker, price, amount));
        }

        position.confirm_purchase(price as f64, amount);
        confirmed.push(ConfirmedPurchase {
            ticker: position.ticker.clone(),
            amount,
            price,
        });
    }

    let total_cost = total(&confirmed, ConfirmedPurchase::cost)?;
    if total_cost > ledger.cash {
        // Planning budgets above cash, so fills can cost more than is held.
        warn!(
            "purchases cost {} cents against {} cents on hand",
            total_cost, ledger.cash
        );
        let question = Question::currency(format!(
            "Purchases cost {} but only {} was available. What capital remains?",
            format_cents(total_cost as f64),
            format_cents(ledger.cash as f64)
        ))
        .required();
        ledger.cash = prompt.ask(&question)?.ok_or_else(|| DipledgerError::Prompt {
            reason: "remaining capital is required".into(),
        })?;
    } else {
        ledger.cash -= total_cost;
    }
    store.save(&ledger)?;
    Ok(confirmed)
}

fn pending_indices(ledger: &Ledger) -> Vec<usize> {
    ledger
        .stocks
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_pending())
        .map(|(i, _)| i)
        .collect()
}

/// Pass B: ask about held positions whose limit or stop was reached, then
/// credit proceeds, shrink sold positions and drop the emptied ones.
pub fn confirm_sales(
    store: &dyn LedgerPort,
    prices: &dyn PriceHistoryPort,
    prompt: &mut dyn PromptPort,
) -> Result<Vec<ConfirmedSale>, DipledgerError> {
    let mut ledger = store.load()?;
    let held: Vec<usize> = ledger
        .stocks
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_live())
        .map(|(i, _)| i)
        .collect();
    if !held.is_empty() {
        info!("Checking {} held positions for sales", held.len());
    }

    // (ledger index, sale) pairs; applied only once every question is answered
    let mut sales: Vec<(usize, ConfirmedSale)> = Vec::new();
    let mut index = 0;
    while index < held.len() {
        let slot = held[index];
        let position = &ledger.stocks[slot];
        index += 1;

        let Some(range) = todays_range(prices, position) else {
            continue;
        };
        if !position.sell_triggered_within(&range) {
            continue;
        }

        let question = Question::currency(format!(
            "Did you sell any {}? If so, at what price?",
            position.ticker
        ));
        let Some(price) = prompt.ask(&question)? else {
            continue;
        };
        let question = Question::quantity("How many did you sell?", Some(position.amount))
            .with_default(position.amount);
        let amount = prompt
            .ask(&question)?
            .unwrap_or(position.amount)
            .min(position.amount);
        if price.checked_mul(amount).is_none() {
            return Err(out_of_range(&position.ticker, price, amount));
        }

        sales.push((
            slot,
            ConfirmedSale {
                ticker: position.ticker.clone(),
                amount,
                price,
            },
        ));
    }

    let proceeds = total(&sales, |(_, sale)| sale.proceeds())?;
    ledger.cash = ledger
        .cash
        .checked_add(proceeds)
        .ok_or_else(|| DipledgerError::Prompt {
            reason: "confirmed amounts overflow the ledger".into(),
        })?;
    for (slot, sale) in &sales {
        ledger.stocks[*slot].amount -= sale.amount;
    }
    ledger.remove_empty();
    store.save(&ledger)?;

    Ok(sales.into_iter().map(|(_, sale)| sale).collect())
}

/// Pass C: have the operator confirm (or correct) available cash.
pub fn confirm_cash(
    store: &dyn LedgerPort,
    prompt: &mut dyn PromptPort,
) -> Result<i64, DipledgerError> {
    let mut ledger = store.load()?;
    let question = Question::currency("Confirm your available capital")
        .required()
        .with_default(ledger.cash);
    if let Some(cash) = prompt.ask(&question)? {
        ledger.cash = cash;
    }
    store.save(&ledger)?;
    Ok(ledger.cash)
}
