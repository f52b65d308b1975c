//! Support/resistance estimation, cycle counting and opportunity rating.
//!
//! All levels are in cents. A candidate is rated against its trailing
//! window: it must sit below the window's mean price, closer to the smoothed
//! support than the floor suggests, have bounced between the bands at least
//! twice, and offer more reward than risk.

use tracing::debug;

use super::bar::{Bar, CENTS};

/// Rating of a candidate that is not an opportunity.
pub const NO_OPPORTUNITY: f64 = -1.0;

/// Upper bound on support/resistance refinement passes.
pub const MAX_REFINEMENT_RUNS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub ticker: String,
    pub market: String,
    pub today: Bar,
    /// The bars preceding `today`, oldest first.
    pub history: Vec<Bar>,
    pub resistance: f64,
    pub support: f64,
    pub confidence: f64,
    pub rating: f64,
    pub risk: f64,
    pub reward: f64,
    pub limit: f64,
    pub stop_loss: f64,
}

impl Candidate {
    pub fn new(ticker: &str, market: &str, today: Bar, history: Vec<Bar>) -> Self {
        Candidate {
            ticker: ticker.to_string(),
            market: market.to_string(),
            today,
            history,
            resistance: 0.0,
            support: 0.0,
            confidence: 0.0,
            rating: NO_OPPORTUNITY,
            risk: 0.0,
            reward: 0.0,
            limit: 0.0,
            stop_loss: 0.0,
        }
    }

    pub fn is_opportunity(&self) -> bool {
        self.rating > 0.0
    }
}

/// Smoothed price bounds and how many passes they took to settle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    pub resistance: f64,
    pub support: f64,
    pub iterations: usize,
}

/// Relax the seed bounds toward the window's highs and lows until neither
/// moves or [`MAX_REFINEMENT_RUNS`] passes have run.
pub fn find_resistance_and_support(history: &[Bar], high: f64, low: f64) -> Levels {
    let n = history.len() as f64;
    let mut resistance = high;
    let mut support = low;
    let mut delta = f64::INFINITY;
    let mut iterations = 0;

    while delta > 0.0 && iterations < MAX_REFINEMENT_RUNS {
        iterations += 1;
        let new_resistance = resistance
            + history
                .iter()
                .map(|bar| (bar.high_cents() - resistance) / n)
                .sum::<f64>();
        let new_support = support
            + history
                .iter()
                .map(|bar| (bar.low_cents() - support) / n)
                .sum::<f64>();
        delta = (new_support - support)
            .abs()
            .max((new_resistance - resistance).abs());
        resistance = new_resistance;
        support = new_support;
    }

    Levels {
        resistance,
        support,
        iterations,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    High,
    Low,
}

/// Half the number of alternating band touches in `history`.
///
/// A high touch only counts after a low touch and vice versa, so a full
/// cycle needs a round trip. The first touch of either band counts.
pub fn count_cycles(history: &[Bar], high_cap: f64, low_cap: f64) -> f64 {
    if high_cap <= low_cap {
        return 0.0;
    }
    let mut last: Option<Band> = None;
    let mut touches = 0u32;

    for bar in history {
        if bar.high_cents() >= high_cap && last != Some(Band::High) {
            touches += 1;
            last = Some(Band::High);
            continue;
        }
        if bar.low_cents() <= low_cap && last != Some(Band::Low) {
            touches += 1;
            last = Some(Band::Low);
        }
    }

    f64::from(touches) / 2.0
}

/// confidence⁴ × reward / risk
pub fn score(confidence: f64, reward: f64, risk: f64) -> f64 {
    confidence.powi(4) * (reward / risk)
}

/// Annotate `candidate` with its levels and rating. Rejected candidates keep
/// [`NO_OPPORTUNITY`].
pub fn rate(candidate: &mut Candidate, time_modifier: f64) {
    candidate.rating = NO_OPPORTUNITY;
    let history = &candidate.history;
    if history.len() < 2 {
        return;
    }

    let close = candidate.today.close_cents();
    let n = history.len() as f64;
    let avg = history.iter().map(Bar::mean_price).sum::<f64>() / n * CENTS;
    if close >= avg {
        debug!(ticker = %candidate.ticker, close, avg, "not below its mean");
        return;
    }

    let high = history
        .iter()
        .map(Bar::high_cents)
        .fold(f64::NEG_INFINITY, f64::max);
    let low = history
        .iter()
        .map(Bar::low_cents)
        .fold(f64::INFINITY, f64::min);

    let levels = find_resistance_and_support(history, high, low);
    candidate.resistance = levels.resistance;
    candidate.support = levels.support;

    if (close - low).abs() < (close - levels.support).abs() {
        debug!(ticker = %candidate.ticker, "support is not a floor");
        return;
    }

    let cycles = count_cycles(history, levels.resistance, levels.support);
    let mut confidence = cycles - 1.0;
    if candidate.today.is_bullish() {
        confidence *= 2.0;
    } else {
        confidence /= 2.0;
    }
    candidate.confidence = confidence;
    if confidence <= 0.0 {
        debug!(ticker = %candidate.ticker, cycles, "too few cycles");
        return;
    }

    candidate.stop_loss = low * time_modifier.powf(confidence);
    candidate.limit = levels.resistance.floor();
    candidate.risk = (close - low).round();
    candidate.reward = (candidate.limit - close).round();

    if candidate.risk <= 0.0 || candidate.risk > candidate.reward {
        debug!(
            ticker = %candidate.ticker,
            risk = candidate.risk,
            reward = candidate.reward,
            "unfavourable risk/reward"
        );
        return;
    }

    candidate.rating = score(confidence, candidate.reward, candidate.risk);
}

/// Rate every candidate, keep the opportunities, best first.
pub fn rank_candidates(mut candidates: Vec<Candidate>, time_modifier: f64) -> Vec<Candidate> {
    for candidate in candidates.iter_mut() {
        rate(candidate, time_modifier);
    }
    let mut ranked: Vec<Candidate> = candidates
        .into_iter()
        .filter(Candidate::is_opportunity)
        .collect();
    ranked.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn bar(day: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            ticker: "abc".into(),
            market: "nyse".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1_000,
        }
    }

    /// Three round trips between ~12.00 and ~8.00.
    fn oscillating_history() -> Vec<Bar> {
        vec![
            bar(1, 10.0, 12.0, 9.0, 11.0),
            bar(2, 11.0, 11.5, 8.0, 9.0),
            bar(3, 9.0, 12.0, 9.0, 11.5),
            bar(4, 11.5, 11.75, 8.0, 8.5),
            bar(5, 8.5, 12.0, 9.0, 11.0),
            bar(6, 11.0, 11.25, 8.0, 9.0),
        ]
    }

    fn candidate(today: Bar, history: Vec<Bar>) -> Candidate {
        Candidate::new("abc", "nyse", today, history)
    }

    #[test]
    fn constant_window_converges_in_one_pass() {
        let history: Vec<Bar> = (1..=5).map(|d| bar(d, 10.0, 12.0, 8.0, 10.0)).collect();
        let levels = find_resistance_and_support(&history, 1200.0, 800.0);
        assert_eq!(levels.resistance, 1200.0);
        assert_eq!(levels.support, 800.0);
        assert_eq!(levels.iterations, 1);
    }

    #[test]
    fn refinement_moves_to_window_means() {
        let history = oscillating_history();
        let levels = find_resistance_and_support(&history, 1200.0, 800.0);
        assert_relative_eq!(levels.resistance, 1175.0, epsilon = 1e-6);
        assert_relative_eq!(levels.support, 850.0, epsilon = 1e-6);
        assert!(levels.resistance <= 1200.0);
        assert!(levels.support >= 800.0);
        assert!(levels.iterations <= MAX_REFINEMENT_RUNS);
    }

    #[test]
    fn cycles_require_alternation() {
        let history = oscillating_history();
        assert_eq!(count_cycles(&history, 1175.0, 850.0), 3.0);

        // Repeated high touches without a low in between count once.
        let highs: Vec<Bar> = (1..=4).map(|d| bar(d, 10.0, 12.0, 9.5, 10.0)).collect();
        assert_eq!(count_cycles(&highs, 1175.0, 850.0), 0.5);
    }

    #[test]
    fn cycles_zero_when_bands_inverted() {
        let history = oscillating_history();
        assert_eq!(count_cycles(&history, 850.0, 1175.0), 0.0);
    }

    #[test]
    fn bullish_dip_is_rated() {
        let mut c = candidate(bar(7, 8.8, 9.2, 8.7, 9.0), oscillating_history());
        rate(&mut c, 0.9);

        // cycles 3 → confidence 2, doubled on a bullish day
        assert_relative_eq!(c.confidence, 4.0);
        assert_eq!(c.risk, 100.0);
        assert!(c.reward >= 274.0 && c.reward <= 275.0);
        assert!((c.rating - 704.0).abs() < 3.0);
        assert_relative_eq!(c.stop_loss, 800.0 * 0.9f64.powi(4), epsilon = 1e-9);
        assert!(c.is_opportunity());
    }

    #[test]
    fn bearish_day_halves_confidence() {
        let mut c = candidate(bar(7, 9.2, 9.3, 8.7, 9.0), oscillating_history());
        rate(&mut c, 0.9);
        assert_relative_eq!(c.confidence, 1.0);
        assert!(c.is_opportunity());
    }

    #[test]
    fn close_above_mean_is_rejected() {
        let mut c = candidate(bar(7, 11.0, 12.5, 11.0, 12.0), oscillating_history());
        rate(&mut c, 0.9);
        assert_eq!(c.rating, NO_OPPORTUNITY);
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn close_hugging_floor_is_rejected() {
        // close 8.10: 10 cents above the floor, 40 below support
        let mut c = candidate(bar(7, 8.0, 8.2, 8.0, 8.1), oscillating_history());
        rate(&mut c, 0.9);
        assert_eq!(c.rating, NO_OPPORTUNITY);
    }

    #[test]
    fn risk_above_reward_is_rejected_despite_confidence() {
        let history = vec![
            bar(1, 9.0, 10.0, 8.5, 9.5),
            bar(2, 9.5, 9.5, 8.0, 8.5),
            bar(3, 9.0, 10.0, 8.5, 9.5),
            bar(4, 9.5, 9.5, 8.0, 8.5),
            bar(5, 9.0, 10.0, 8.5, 9.5),
            bar(6, 9.5, 9.5, 8.0, 8.5),
        ];
        let mut c = candidate(bar(7, 8.8, 9.0, 8.8, 8.9), history);
        rate(&mut c, 0.9);

        assert!(c.confidence > 0.0);
        assert!(c.risk > c.reward);
        assert_eq!(c.rating, NO_OPPORTUNITY);
    }

    #[test]
    fn single_bar_history_is_rejected() {
        let mut c = candidate(bar(7, 8.8, 9.2, 8.7, 9.0), vec![bar(1, 10.0, 12.0, 8.0, 11.0)]);
        rate(&mut c, 0.9);
        assert_eq!(c.rating, NO_OPPORTUNITY);
    }

    #[test]
    fn ranking_drops_rejects_and_sorts_descending() {
        let strong = candidate(bar(7, 8.8, 9.2, 8.7, 9.0), oscillating_history());
        let mut weak = candidate(bar(7, 9.2, 9.3, 8.7, 9.0), oscillating_history());
        weak.ticker = "weak".into();
        let mut rejected = candidate(bar(7, 11.0, 12.5, 11.0, 12.0), oscillating_history());
        rejected.ticker = "rejected".into();

        let ranked = rank_candidates(vec![weak, rejected, strong], 0.9);
        let tickers: Vec<_> = ranked.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["abc", "weak"]);
        assert!(ranked[0].rating > ranked[1].rating);
    }

    proptest! {
        #[test]
        fn higher_confidence_rates_higher(
            low in 0.01f64..50.0,
            step in 0.01f64..50.0,
            reward in 1.0f64..1000.0,
            risk in 1.0f64..1000.0,
        ) {
            let high = low + step;
            prop_assert!(score(high, reward, risk) > score(low, reward, risk));
        }
    }
}
