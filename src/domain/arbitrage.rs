//! Cross-bookmaker arbitrage and middle detection.
//!
//! An arbitrage exists when the best available prices on the two sides of
//! one market imply probabilities summing below 1. Stakes are split in
//! inverse proportion to each leg's decimal odds so every outcome branch
//! pays the same amount; the scanner then *verifies* each branch against
//! the rounded stakes before reporting anything.
//!
//! A middle is a different shape: two total lines far enough apart that a
//! result between them wins both bets. Middles are not guaranteed profit;
//! when a score distribution is supplied, the scanner prices the window
//! and reports expected profit.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::DomainError;
use super::ids::{BookmakerId, GameId};
use super::market::{MarketQuote, MarketType, Selection};
use super::odds::DecimalOdds;
use super::poisson::ScoreDistribution;

/// Scanner thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArbitrageConfig {
    /// Minimum edge (1 minus total implied probability) to report.
    #[serde(default = "default_min_edge")]
    pub min_edge: f64,

    /// Minimum guaranteed profit in currency units to report.
    #[serde(default = "default_min_profit")]
    pub min_profit: Decimal,

    /// Minimum gap between total lines for a middle, in points.
    #[serde(default = "default_min_middle_gap")]
    pub min_middle_gap: Decimal,
}

fn default_min_edge() -> f64 {
    0.001
}

fn default_min_profit() -> Decimal {
    Decimal::new(10, 2) // 0.10
}

fn default_min_middle_gap() -> Decimal {
    Decimal::ONE
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            min_edge: default_min_edge(),
            min_profit: default_min_profit(),
            min_middle_gap: default_min_middle_gap(),
        }
    }
}

/// One side of an arbitrage or middle, with its allocated stake.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageLeg {
    pub bookmaker: BookmakerId,
    pub selection: Selection,
    pub point: Option<Decimal>,
    pub odds: DecimalOdds,
    pub stake: Decimal,
}

/// A guaranteed-profit stake split across two books.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageOpportunity {
    pub game: GameId,
    pub market: MarketType,
    pub legs: Vec<ArbitrageLeg>,
    pub total_stake: Decimal,
    /// Worst-branch profit after stake rounding.
    pub guaranteed_profit: Decimal,
    /// Guaranteed profit over total stake.
    pub roi: f64,
}

/// Scan quotes for two-sided arbitrage across books.
///
/// Quotes are grouped by (game, market, line); within each group the best
/// price per side is taken across books, stakes are split so both branches
/// pay out equally, rounded to cents, and every branch is re-checked
/// against the rounded stakes. Results are deduplicated by construction
/// (one opportunity per grouping key) and ranked by ROI descending, ties
/// broken by larger guaranteed profit.
///
/// # Errors
///
/// Fails on an empty quote list, fewer than two distinct bookmakers, or a
/// non-positive total stake.
pub fn find_arbitrage(
    quotes: &[MarketQuote],
    total_stake: Decimal,
    config: &ArbitrageConfig,
) -> Result<Vec<ArbitrageOpportunity>, DomainError> {
    if quotes.is_empty() {
        return Err(DomainError::EmptyQuotes);
    }
    if total_stake <= Decimal::ZERO {
        return Err(DomainError::NonPositiveStake { stake: total_stake });
    }
    let books: BTreeSet<&BookmakerId> = quotes.iter().map(|q| &q.bookmaker).collect();
    if books.len() < 2 {
        return Err(DomainError::TooFewBookmakers { count: books.len() });
    }

    let mut groups: BTreeMap<(GameId, MarketType, Option<Decimal>), Vec<&MarketQuote>> =
        BTreeMap::new();
    for quote in quotes {
        let key = (quote.game.clone(), quote.market, line_key(quote));
        groups.entry(key).or_default().push(quote);
    }

    let mut opportunities = Vec::new();
    for ((game, market, _), group) in groups {
        let Some(opportunity) = scan_group(&game, market, &group, total_stake, config) else {
            continue;
        };
        info!(
            game = %opportunity.game,
            %market,
            roi = opportunity.roi,
            "arbitrage found"
        );
        opportunities.push(opportunity);
    }

    opportunities.sort_by(|a, b| {
        b.roi
            .partial_cmp(&a.roi)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.guaranteed_profit.abs().cmp(&a.guaranteed_profit.abs()))
    });
    Ok(opportunities)
}

/// Spread points are quoted with opposite signs on the two sides; fold
/// them onto one key so home -3.5 groups with away +3.5.
fn line_key(quote: &MarketQuote) -> Option<Decimal> {
    match quote.market {
        MarketType::Spread => quote.point.map(|p| p.abs()),
        _ => quote.point,
    }
}

fn scan_group(
    game: &GameId,
    market: MarketType,
    group: &[&MarketQuote],
    total_stake: Decimal,
    config: &ArbitrageConfig,
) -> Option<ArbitrageOpportunity> {
    // Best price per side across books.
    let mut best: BTreeMap<Selection, &MarketQuote> = BTreeMap::new();
    for &quote in group {
        match best.get(&quote.selection) {
            Some(current) if current.decimal_odds() >= quote.decimal_odds() => {}
            _ => {
                best.insert(quote.selection, quote);
            }
        }
    }

    // Need a complementary pair (home/away or over/under).
    let (first, second) = [Selection::Home, Selection::Over].into_iter().find_map(|side| {
        let a = best.get(&side)?;
        let b = best.get(&side.opposite())?;
        Some((*a, *b))
    })?;

    if first.bookmaker == second.bookmaker {
        // A single book arbing itself does not happen; skip rather than
        // report an intra-book quirk.
        return None;
    }

    let d1 = first.decimal_odds();
    let d2 = second.decimal_odds();
    let total_implied = d1.implied_probability() + d2.implied_probability();
    let edge = 1.0 - total_implied;
    if edge < config.min_edge {
        debug!(game = %game, total_implied, "no arbitrage in group");
        return None;
    }

    // Split stakes inversely to odds so both branches pay the same.
    let inv1 = Decimal::ONE / d1.value();
    let inv2 = Decimal::ONE / d2.value();
    let inv_sum = inv1 + inv2;
    let stake1 = (total_stake * inv1 / inv_sum).round_dp(2);
    let stake2 = total_stake - stake1;

    // Verification: every outcome branch must return at least the total
    // stake, with the *rounded* stakes.
    let payout1 = stake1 * d1.value();
    let payout2 = stake2 * d2.value();
    let worst = payout1.min(payout2);
    if worst < total_stake {
        warn!(
            game = %game,
            %payout1,
            %payout2,
            %total_stake,
            "arbitrage rejected by branch verification"
        );
        return None;
    }

    let guaranteed_profit = (worst - total_stake).round_dp(2);
    if guaranteed_profit < config.min_profit {
        return None;
    }

    let roi = (guaranteed_profit / total_stake).to_f64().unwrap_or(0.0);
    Some(ArbitrageOpportunity {
        game: game.clone(),
        market,
        legs: vec![
            leg_from(first, stake1),
            leg_from(second, stake2),
        ],
        total_stake,
        guaranteed_profit,
        roi,
    })
}

fn leg_from(quote: &MarketQuote, stake: Decimal) -> ArbitrageLeg {
    ArbitrageLeg {
        bookmaker: quote.bookmaker.clone(),
        selection: quote.selection,
        point: quote.point,
        odds: quote.decimal_odds(),
        stake,
    }
}

/// A divergent-line middle on a totals market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiddleOpportunity {
    pub game: GameId,
    /// Over leg at the lower line.
    pub over: ArbitrageLeg,
    /// Under leg at the higher line.
    pub under: ArbitrageLeg,
    /// Exclusive bounds of the both-win window.
    pub window: (Decimal, Decimal),
    pub total_stake: Decimal,
    /// Profit when the total lands inside the window.
    pub both_win_profit: Decimal,
    /// Worst-case profit when it does not (one leg wins, one loses).
    pub miss_profit: Decimal,
    /// Window probability, when a distribution was supplied.
    pub middle_probability: Option<f64>,
    /// Probability-weighted profit, when a distribution was supplied.
    pub expected_profit: Option<Decimal>,
}

/// Scan totals quotes for middles: Over at line A, Under at line B > A.
///
/// Both legs are staked equally. A total strictly between the lines wins
/// both; a total on either line pushes that leg, which is treated as a
/// miss (single-leg outcome) for expected-profit purposes. With a
/// [`ScoreDistribution`] the window is priced from the model's total-line
/// masses; without one, probability-dependent fields are `None`.
///
/// Results are deduplicated by (game, over book/line, under book/line) and
/// ranked by expected profit when priced, both-win profit otherwise.
///
/// # Errors
///
/// Fails on an empty quote list or non-positive per-leg stake.
pub fn find_middles(
    quotes: &[MarketQuote],
    stake_per_leg: Decimal,
    distribution: Option<&ScoreDistribution>,
    config: &ArbitrageConfig,
) -> Result<Vec<MiddleOpportunity>, DomainError> {
    if quotes.is_empty() {
        return Err(DomainError::EmptyQuotes);
    }
    if stake_per_leg <= Decimal::ZERO {
        return Err(DomainError::NonPositiveStake {
            stake: stake_per_leg,
        });
    }

    let mut by_game: BTreeMap<&GameId, Vec<&MarketQuote>> = BTreeMap::new();
    for quote in quotes {
        if quote.market == MarketType::Total && quote.point.is_some() {
            by_game.entry(&quote.game).or_default().push(quote);
        }
    }

    let mut seen = BTreeSet::new();
    let mut middles = Vec::new();
    for (game, group) in by_game {
        for over in group.iter().copied().filter(|q| q.selection == Selection::Over) {
            for under in group.iter().copied().filter(|q| q.selection == Selection::Under) {
                if over.bookmaker == under.bookmaker {
                    continue;
                }
                let (Some(low), Some(high)) = (over.point, under.point) else {
                    continue;
                };
                if high - low < config.min_middle_gap {
                    continue;
                }
                let key = (
                    game.clone(),
                    over.bookmaker.clone(),
                    low,
                    under.bookmaker.clone(),
                    high,
                );
                if !seen.insert(key) {
                    continue;
                }

                middles.push(build_middle(
                    game,
                    over,
                    under,
                    low,
                    high,
                    stake_per_leg,
                    distribution,
                ));
            }
        }
    }

    middles.sort_by(|a, b| {
        let a_rank = a.expected_profit.unwrap_or(a.both_win_profit);
        let b_rank = b.expected_profit.unwrap_or(b.both_win_profit);
        b_rank.cmp(&a_rank)
    });
    Ok(middles)
}

fn build_middle(
    game: &GameId,
    over: &MarketQuote,
    under: &MarketQuote,
    low: Decimal,
    high: Decimal,
    stake: Decimal,
    distribution: Option<&ScoreDistribution>,
) -> MiddleOpportunity {
    let d_over = over.decimal_odds();
    let d_under = under.decimal_odds();
    let total_stake = stake + stake;

    // Inside the window both legs cash.
    let both_win_profit =
        (stake * d_over.value() + stake * d_under.value() - total_stake).round_dp(2);

    // Outside it exactly one leg cashes; take the worse side.
    let over_only = stake * d_over.value() - total_stake;
    let under_only = stake * d_under.value() - total_stake;
    let miss_profit = over_only.min(under_only).round_dp(2);

    let priced = distribution.and_then(|dist| {
        let low_f = low.to_f64()?;
        let high_f = high.to_f64()?;
        let at_low = dist.total_line(low_f).ok()?;
        let at_high = dist.total_line(high_f).ok()?;
        // Mass strictly between the lines: above A, below B, minus B's
        // push which `over(A)` still counts.
        let p_middle = (at_low.over - at_high.over - at_high.push).max(0.0);

        // Expected payout uses the side that actually wins on each miss
        // branch; pushes are folded into the miss branches conservatively.
        let p_low_or_less = (at_low.under + at_low.push).max(0.0);
        let p_high_or_more = (at_high.over + at_high.push).max(0.0);
        let payout_mid = stake * (d_over.value() + d_under.value());
        let payout_low = stake * d_under.value();
        let payout_high = stake * d_over.value();

        let expected_payout = Decimal::from_f64_retain(p_middle).unwrap_or_default() * payout_mid
            + Decimal::from_f64_retain(p_low_or_less).unwrap_or_default() * payout_low
            + Decimal::from_f64_retain(p_high_or_more).unwrap_or_default() * payout_high;
        Some((p_middle, (expected_payout - total_stake).round_dp(2)))
    });

    MiddleOpportunity {
        game: game.clone(),
        over: leg_from(over, stake),
        under: leg_from(under, stake),
        window: (low, high),
        total_stake,
        both_win_profit,
        miss_profit,
        middle_probability: priced.map(|(p, _)| p),
        expected_profit: priced.map(|(_, ev)| ev),
    }
}
