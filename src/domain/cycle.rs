//! One daily cycle: reconcile yesterday's instructions, refresh holdings,
//! issue today's instructions and stamp the run.
//!
//! Every step is a load/modify/save round trip through the ledger port, so
//! an aborted cycle leaves the ledger at its last completed step.

use tracing::{info, warn};

use super::analysis::{rank_candidates, Candidate};
use super::confirmation::{
    confirm_cash, confirm_pending_purchases, confirm_sales, ConfirmedPurchase, ConfirmedSale,
};
use super::decision::{
    buy_instructions, plan_purchases, sell_instructions, BuyInstruction, SellInstruction,
};
use super::error::DipledgerError;
use super::ledger::Ledger;
use super::settings::{AnalysisSettings, Settings};
use super::universe::select_candidates;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::price_history_port::PriceHistoryPort;
use crate::ports::prompt_port::PromptPort;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub purchases: Vec<ConfirmedPurchase>,
    pub sales: Vec<ConfirmedSale>,
    pub sell_instructions: Vec<SellInstruction>,
    pub buy_instructions: Vec<BuyInstruction>,
    /// Whether the ledger had enough cash to consider buying.
    pub considered_buying: bool,
    pub cash: i64,
}

/// Rate every eligible instrument and return the opportunities, best first.
pub fn ranked_candidates(
    prices: &dyn PriceHistoryPort,
    analysis: &AnalysisSettings,
) -> Result<Vec<Candidate>, DipledgerError> {
    let selection = select_candidates(prices, analysis)?;
    let ranked = rank_candidates(selection.candidates, analysis.time_modifier);
    info!("{} opportunities", ranked.len());
    Ok(ranked)
}

/// Merge duplicate holdings, then widen their bands and refresh values.
pub fn refresh_holdings(
    store: &dyn LedgerPort,
    prices: &dyn PriceHistoryPort,
    time_modifier: f64,
) -> Result<Ledger, DipledgerError> {
    let mut ledger = store.load()?;
    ledger.merge_duplicates();
    ledger.decay(time_modifier, |position| {
        prices
            .latest_close(&position.market, &position.ticker)
            .inspect_err(|e| warn!("keeping old value for {} ({})", position.ticker, e))
            .ok()
    });
    store.save(&ledger)?;
    Ok(ledger)
}

/// Sell lines for holdings and, with enough cash, pending buys written to
/// the ledger in place of any older order for the same instrument.
pub fn issue_instructions(
    store: &dyn LedgerPort,
    prices: &dyn PriceHistoryPort,
    settings: &Settings,
) -> Result<(Vec<SellInstruction>, Vec<BuyInstruction>, bool), DipledgerError> {
    let mut ledger = store.load()?;
    let sells = sell_instructions(&ledger);

    if ledger.cash <= settings.trading.min_cash {
        info!("Cash {} at or below {}; not buying", ledger.cash, settings.trading.min_cash);
        return Ok((sells, Vec::new(), false));
    }

    let ranked = ranked_candidates(prices, &settings.analysis)?;
    let planned = plan_purchases(&ranked, &ledger, &settings.trading);
    let buys = buy_instructions(&planned);
    ledger.replace_pending(planned);
    store.save(&ledger)?;
    Ok((sells, buys, true))
}

pub fn stamp_last_ran(store: &dyn LedgerPort, epoch_millis: i64) -> Result<(), DipledgerError> {
    let mut ledger = store.load()?;
    ledger.stamp(epoch_millis);
    store.save(&ledger)
}

/// Run one full cycle.
pub fn run_cycle(
    store: &dyn LedgerPort,
    prices: &dyn PriceHistoryPort,
    prompt: &mut dyn PromptPort,
    settings: &Settings,
    epoch_millis: i64,
) -> Result<CycleReport, DipledgerError> {
    let purchases = confirm_pending_purchases(store, prices, prompt)?;
    let sales = confirm_sales(store, prices, prompt)?;
    confirm_cash(store, prompt)?;

    refresh_holdings(store, prices, settings.analysis.time_modifier)?;
    let (sell_instructions, buy_instructions, considered_buying) =
        issue_instructions(store, prices, settings)?;
    stamp_last_ran(store, epoch_millis)?;

    let cash = store.load()?.cash;
    Ok(CycleReport {
        purchases,
        sales,
        sell_instructions,
        buy_instructions,
        considered_buying,
        cash,
    })
}
