//! Expected value, Kelly staking, closing-line value, and line shopping.
//!
//! All sizing flows through [`StakingConfig`]: fractional Kelly with a hard
//! cap on the bankroll fraction. Degenerate quotes (decimal odds of exactly
//! 1) produce an explicit no-edge result instead of an error.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::DomainError;
use super::ids::BookmakerId;
use super::market::{MarketQuote, Selection};
use super::odds::DecimalOdds;
use super::vig::remove_vig;

/// Staking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StakingConfig {
    /// Default fractional-Kelly multiplier.
    #[serde(default = "default_kelly_fraction")]
    pub kelly_fraction: f64,

    /// Hard cap on the recommended bankroll fraction.
    #[serde(default = "default_max_stake_fraction")]
    pub max_stake_fraction: f64,

    /// Full-Kelly fraction above which a size-risk warning is attached.
    #[serde(default = "default_high_risk_fraction")]
    pub high_risk_fraction: f64,

    /// Minimum edge for the high stake tier.
    #[serde(default = "default_high_edge")]
    pub high_edge: f64,

    /// Minimum edge for the medium stake tier.
    #[serde(default = "default_medium_edge")]
    pub medium_edge: f64,
}

fn default_kelly_fraction() -> f64 {
    0.25
}

fn default_max_stake_fraction() -> f64 {
    0.05
}

fn default_high_risk_fraction() -> f64 {
    0.10
}

fn default_high_edge() -> f64 {
    0.04
}

fn default_medium_edge() -> f64 {
    0.02
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            kelly_fraction: default_kelly_fraction(),
            max_stake_fraction: default_max_stake_fraction(),
            high_risk_fraction: default_high_risk_fraction(),
            high_edge: default_high_edge(),
            medium_edge: default_medium_edge(),
        }
    }
}

/// Expected value of a single wager.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectedValue {
    /// EV in currency units for the given stake.
    pub expected_value: Decimal,
    /// Profit if the wager wins.
    pub profit_if_win: Decimal,
    /// Implied probability of the offered price; the win rate needed to
    /// break even.
    pub break_even_probability: f64,
    /// Fair probability minus break-even probability.
    pub edge: f64,
    pub is_positive: bool,
}

/// Compute the expected value of a wager at an offered price.
///
/// `EV = p * (d - 1) * stake - (1 - p) * stake`.
///
/// # Errors
///
/// Fails when the fair probability is outside (0, 1) or the stake is not
/// positive.
pub fn expected_value(
    odds: DecimalOdds,
    fair_probability: f64,
    stake: Decimal,
) -> Result<ExpectedValue, DomainError> {
    validate_probability("fair_probability", fair_probability)?;
    if stake <= Decimal::ZERO {
        return Err(DomainError::NonPositiveStake { stake });
    }

    let profit_if_win = odds.profit_multiplier() * stake;
    let p = Decimal::from_f64_retain(fair_probability).unwrap_or_default();
    let expected = p * profit_if_win - (Decimal::ONE - p) * stake;

    let break_even = odds.implied_probability();
    Ok(ExpectedValue {
        expected_value: expected,
        profit_if_win,
        break_even_probability: break_even,
        edge: fair_probability - break_even,
        is_positive: expected > Decimal::ZERO,
    })
}

/// Warnings attached to a Kelly recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KellyWarning {
    /// Edge is zero or negative; the recommendation is not to bet.
    NoEdge,
    /// Full-Kelly fraction exceeds the size-risk threshold.
    HighRisk,
}

/// A Kelly staking recommendation.
///
/// `stake` is zero whenever the full-Kelly fraction is non-positive,
/// including the degenerate `d = 1` quote where the formula's denominator
/// vanishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KellyStake {
    /// Unscaled Kelly fraction `(b*p - q) / b`.
    pub full_fraction: f64,
    /// Fraction actually applied after the fractional multiplier and cap.
    pub applied_fraction: f64,
    /// Recommended stake in currency units.
    pub stake: Decimal,
    pub warnings: Vec<KellyWarning>,
}

impl KellyStake {
    fn no_edge() -> Self {
        Self {
            full_fraction: 0.0,
            applied_fraction: 0.0,
            stake: Decimal::ZERO,
            warnings: vec![KellyWarning::NoEdge],
        }
    }
}

/// Size a wager with the fractional Kelly criterion.
///
/// With `b = d - 1`, `p` the fair win probability and `q = 1 - p`, the full
/// Kelly fraction is `(b*p - q) / b`. The recommendation applies `fraction`
/// of that and never exceeds `config.max_stake_fraction` of the bankroll.
///
/// # Errors
///
/// Fails on out-of-range probability or fraction, or a non-positive
/// bankroll. A no-payout quote (`d = 1`) is *not* an error; it returns a
/// zero-stake recommendation flagged [`KellyWarning::NoEdge`].
pub fn kelly_stake(
    odds: DecimalOdds,
    fair_probability: f64,
    bankroll: Decimal,
    fraction: f64,
    config: &StakingConfig,
) -> Result<KellyStake, DomainError> {
    validate_probability("fair_probability", fair_probability)?;
    if bankroll <= Decimal::ZERO {
        return Err(DomainError::NonPositiveBankroll { bankroll });
    }
    if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
        return Err(DomainError::InvalidKellyFraction { fraction });
    }

    let b = odds.profit_multiplier().to_f64().unwrap_or(0.0);
    if b <= 0.0 {
        // Decimal odds of exactly 1: no payout, nothing to size.
        debug!(?odds, "kelly: no payout at unit odds");
        return Ok(KellyStake::no_edge());
    }

    let p = fair_probability;
    let q = 1.0 - p;
    let full_fraction = (b * p - q) / b;

    if full_fraction <= 0.0 {
        debug!(full_fraction, "kelly: no edge");
        return Ok(KellyStake::no_edge());
    }

    let mut warnings = Vec::new();
    if full_fraction > config.high_risk_fraction {
        warnings.push(KellyWarning::HighRisk);
    }

    let applied_fraction = (full_fraction * fraction).min(config.max_stake_fraction);
    let stake = (bankroll * Decimal::from_f64_retain(applied_fraction).unwrap_or_default())
        .round_dp(2);

    Ok(KellyStake {
        full_fraction,
        applied_fraction,
        stake,
        warnings,
    })
}

/// Quality band for a closing-line-value result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClvQuality {
    /// Beat the close by more than 5%.
    Excellent,
    /// Beat the close by 2-5%.
    Good,
    /// Beat the close by 0-2%.
    Marginal,
    /// Worse than the close.
    Negative,
}

impl ClvQuality {
    fn from_pct(pct: f64) -> Self {
        if pct > 5.0 {
            Self::Excellent
        } else if pct >= 2.0 {
            Self::Good
        } else if pct >= 0.0 {
            Self::Marginal
        } else {
            Self::Negative
        }
    }
}

/// Closing-line value of a settled-price wager.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosingLineValue {
    /// Payout difference at identical stake, in currency units.
    pub clv: Decimal,
    /// Payout difference as a percentage of the closing payout.
    pub clv_pct: f64,
    pub quality: ClvQuality,
}

/// Compare the price a bet was placed at against the closing price.
///
/// Positive CLV means the market moved toward the bet after it was placed,
/// the standard long-run indicator of betting skill.
///
/// # Errors
///
/// Fails when the stake is not positive.
pub fn closing_line_value(
    bet_odds: DecimalOdds,
    closing_odds: DecimalOdds,
    stake: Decimal,
) -> Result<ClosingLineValue, DomainError> {
    if stake <= Decimal::ZERO {
        return Err(DomainError::NonPositiveStake { stake });
    }

    let payout_at_bet = bet_odds.value() * stake;
    let payout_at_close = closing_odds.value() * stake;
    let clv = payout_at_bet - payout_at_close;

    let close = payout_at_close.to_f64().unwrap_or(1.0);
    let clv_pct = if close > 0.0 {
        clv.to_f64().unwrap_or(0.0) / close * 100.0
    } else {
        0.0
    };

    Ok(ClosingLineValue {
        clv,
        clv_pct,
        quality: ClvQuality::from_pct(clv_pct),
    })
}

/// The best available quote for one selection at one point value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestQuote {
    pub selection: Selection,
    pub point: Option<Decimal>,
    pub quote: MarketQuote,
}

/// Line-shopping report across a set of books quoting the same market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestLineReport {
    /// Highest-payout quote per (selection, point).
    pub best: Vec<BestQuote>,
    /// The book with the lowest overround among books quoting every side,
    /// with that overround.
    pub lowest_vig_book: Option<(BookmakerId, f64)>,
}

/// Pick the best price per side and the lowest-vig book for one market.
///
/// Quotes at different point values are never compared against each other;
/// a half point of line is not a price improvement.
///
/// # Errors
///
/// Fails on an empty quote list or when quotes mix games/market types.
pub fn best_line(quotes: &[MarketQuote]) -> Result<BestLineReport, DomainError> {
    let first = quotes.first().ok_or(DomainError::EmptyQuotes)?;
    for quote in quotes {
        if quote.market != first.market || quote.game != first.game {
            return Err(DomainError::MixedMarkets {
                first: first.market,
                second: quote.market,
            });
        }
    }

    let mut best: BTreeMap<(Selection, Option<Decimal>), &MarketQuote> = BTreeMap::new();
    for quote in quotes {
        let key = (quote.selection, point_key(quote));
        match best.get(&key) {
            Some(current) if current.decimal_odds() >= quote.decimal_odds() => {}
            _ => {
                best.insert(key, quote);
            }
        }
    }

    // Lowest-vig book: needs both complementary sides quoted by one book.
    let mut lowest: Option<(BookmakerId, f64)> = None;
    let mut by_book: BTreeMap<&BookmakerId, Vec<&MarketQuote>> = BTreeMap::new();
    for quote in quotes {
        by_book.entry(&quote.bookmaker).or_default().push(quote);
    }
    for (book, book_quotes) in by_book {
        let Some(market) = complete_market(&book_quotes) else {
            continue;
        };
        let Ok(fair) = remove_vig(&market) else {
            continue;
        };
        match &lowest {
            Some((_, current)) if *current <= fair.overround => {}
            _ => lowest = Some((book.clone(), fair.overround)),
        }
    }

    Ok(BestLineReport {
        best: best
            .into_iter()
            .map(|((selection, point), quote)| BestQuote {
                selection,
                point,
                quote: quote.clone(),
            })
            .collect(),
        lowest_vig_book: lowest,
    })
}

/// Normalize spread points so the two sides of one line share a key:
/// home -3.5 and away +3.5 are the same market.
fn point_key(quote: &MarketQuote) -> Option<Decimal> {
    match quote.market {
        super::market::MarketType::Spread => quote.point.map(|p| p.abs()),
        _ => quote.point,
    }
}

fn complete_market(quotes: &[&MarketQuote]) -> Option<Vec<(Selection, DecimalOdds)>> {
    let mut sides: Vec<(Selection, DecimalOdds)> = Vec::new();
    for quote in quotes {
        if sides.iter().any(|(s, _)| *s == quote.selection) {
            continue;
        }
        sides.push((quote.selection, quote.decimal_odds()));
    }
    let has_pair = sides
        .iter()
        .any(|(s, _)| sides.iter().any(|(o, _)| *o == s.opposite()));
    has_pair.then_some(sides)
}

/// Suggested bet size bucket for a value assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeTier {
    High,
    Medium,
    Low,
    None,
}

/// Combined value assessment: edge, EV, and a sized recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueAssessment {
    /// Fair probability minus the price's break-even probability.
    pub edge: f64,
    /// EV in currency units at the recommended stake (zero when no bet is
    /// recommended).
    pub expected_value: Decimal,
    pub break_even_probability: f64,
    /// Bankroll fraction recommended. Zero whenever edge <= 0; never above
    /// the configured cap.
    pub stake_fraction: f64,
    pub stake: Decimal,
    pub tier: StakeTier,
}

/// Assess a price against a fair probability and size the bet.
///
/// # Errors
///
/// Propagates validation failures from the EV and Kelly calculations.
pub fn assess(
    odds: DecimalOdds,
    fair_probability: f64,
    bankroll: Decimal,
    config: &StakingConfig,
) -> Result<ValueAssessment, DomainError> {
    let kelly = kelly_stake(
        odds,
        fair_probability,
        bankroll,
        config.kelly_fraction,
        config,
    )?;

    let break_even = odds.implied_probability();
    let edge = fair_probability - break_even;

    let expected = if kelly.stake > Decimal::ZERO {
        expected_value(odds, fair_probability, kelly.stake)?.expected_value
    } else {
        Decimal::ZERO
    };

    let tier = if kelly.stake <= Decimal::ZERO {
        StakeTier::None
    } else if edge >= config.high_edge {
        StakeTier::High
    } else if edge >= config.medium_edge {
        StakeTier::Medium
    } else {
        StakeTier::Low
    };

    Ok(ValueAssessment {
        edge,
        expected_value: expected,
        break_even_probability: break_even,
        stake_fraction: kelly.applied_fraction,
        stake: kelly.stake,
        tier,
    })
}

fn validate_probability(field: &'static str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(DomainError::ProbabilityOutOfRange { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::GameId;
    use crate::domain::market::MarketType;
    use crate::domain::odds::AmericanOdds;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn odds(american: i32) -> DecimalOdds {
        AmericanOdds::try_new(american).unwrap().to_decimal()
    }

    #[test]
    fn positive_ev_detected() {
        let ev = expected_value(odds(100), 0.55, dec!(100)).unwrap();
        // 0.55 * 100 - 0.45 * 100 = 10
        assert_eq!(ev.expected_value, dec!(10.00));
        assert!(ev.is_positive);
        assert!((ev.break_even_probability - 0.50).abs() < 1e-12);
        assert!((ev.edge - 0.05).abs() < 1e-12);
    }

    #[test]
    fn sixty_percent_at_minus150_is_break_even() {
        // Fair 0.60 at -150 is exactly the implied probability: EV ~ 0.
        let ev = expected_value(odds(-150), 0.60, dec!(100)).unwrap();
        assert!(ev.expected_value.abs() < dec!(0.01));
    }

    #[test]
    fn ev_rejects_bad_inputs() {
        assert!(expected_value(odds(100), 1.5, dec!(100)).is_err());
        assert!(expected_value(odds(100), 0.5, dec!(0)).is_err());
    }

    #[test]
    fn kelly_sizes_a_clear_edge() {
        let config = StakingConfig::default();
        // Even money at 55%: full Kelly = (1*0.55 - 0.45)/1 = 0.10.
        let kelly = kelly_stake(odds(100), 0.55, dec!(10000), 0.25, &config).unwrap();
        assert!((kelly.full_fraction - 0.10).abs() < 1e-12);
        assert!((kelly.applied_fraction - 0.025).abs() < 1e-12);
        assert_eq!(kelly.stake, dec!(250.00));
        assert!(kelly.warnings.is_empty());
    }

    #[test]
    fn kelly_zero_when_probability_at_or_below_break_even() {
        let config = StakingConfig::default();
        for bankroll in [dec!(100), dec!(10000), dec!(1000000)] {
            let kelly = kelly_stake(odds(-110), 0.5238, bankroll, 0.25, &config).unwrap();
            assert_eq!(kelly.stake, Decimal::ZERO);
            assert_eq!(kelly.warnings, vec![KellyWarning::NoEdge]);
        }
    }

    #[test]
    fn kelly_handles_unit_odds_without_dividing() {
        let config = StakingConfig::default();
        let unit = DecimalOdds::try_new(Decimal::ONE).unwrap();
        let kelly = kelly_stake(unit, 0.90, dec!(1000), 0.25, &config).unwrap();
        assert_eq!(kelly.stake, Decimal::ZERO);
        assert_eq!(kelly.warnings, vec![KellyWarning::NoEdge]);
    }

    #[test]
    fn kelly_flags_oversized_edges() {
        let config = StakingConfig::default();
        // Even money at 60%: full Kelly = 0.20, past the 10% risk line.
        let kelly = kelly_stake(odds(100), 0.60, dec!(1000), 0.25, &config).unwrap();
        assert!(kelly.warnings.contains(&KellyWarning::HighRisk));
        // Quarter Kelly 0.05 hits the cap exactly.
        assert!((kelly.applied_fraction - 0.05).abs() < 1e-12);
    }

    #[test]
    fn kelly_cap_binds() {
        let config = StakingConfig {
            max_stake_fraction: 0.02,
            ..StakingConfig::default()
        };
        let kelly = kelly_stake(odds(100), 0.60, dec!(1000), 0.50, &config).unwrap();
        assert!((kelly.applied_fraction - 0.02).abs() < 1e-12);
        assert_eq!(kelly.stake, dec!(20.00));
    }

    #[test]
    fn clv_bands_classify() {
        // Bet +120, closed -110: payout 220 vs 190.91 on 100.
        let report = closing_line_value(odds(120), odds(-110), dec!(100)).unwrap();
        assert!(report.clv > Decimal::ZERO);
        assert_eq!(report.quality, ClvQuality::Excellent);

        let flat = closing_line_value(odds(-110), odds(-110), dec!(100)).unwrap();
        assert_eq!(flat.clv, Decimal::ZERO);
        assert_eq!(flat.quality, ClvQuality::Marginal);

        let worse = closing_line_value(odds(-120), odds(-110), dec!(100)).unwrap();
        assert!(worse.clv < Decimal::ZERO);
        assert_eq!(worse.quality, ClvQuality::Negative);
    }

    fn quote(book: &str, selection: Selection, price: i32, point: Option<Decimal>) -> MarketQuote {
        MarketQuote {
            bookmaker: BookmakerId::from(book),
            game: GameId::from("game-1"),
            market: MarketType::Total,
            selection,
            price: AmericanOdds::try_new(price).unwrap(),
            point,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn best_line_picks_highest_payout_per_side() {
        let quotes = vec![
            quote("book-a", Selection::Over, -110, Some(dec!(47.5))),
            quote("book-b", Selection::Over, -105, Some(dec!(47.5))),
            quote("book-a", Selection::Under, -105, Some(dec!(47.5))),
            quote("book-b", Selection::Under, -115, Some(dec!(47.5))),
        ];

        let report = best_line(&quotes).unwrap();
        let over = report
            .best
            .iter()
            .find(|b| b.selection == Selection::Over)
            .unwrap();
        let under = report
            .best
            .iter()
            .find(|b| b.selection == Selection::Under)
            .unwrap();
        assert_eq!(over.quote.bookmaker.as_str(), "book-b");
        assert_eq!(under.quote.bookmaker.as_str(), "book-a");
    }

    #[test]
    fn best_line_reports_lowest_vig_book() {
        let quotes = vec![
            quote("juicy", Selection::Over, -115, Some(dec!(47.5))),
            quote("juicy", Selection::Under, -115, Some(dec!(47.5))),
            quote("sharp", Selection::Over, -105, Some(dec!(47.5))),
            quote("sharp", Selection::Under, -105, Some(dec!(47.5))),
        ];

        let report = best_line(&quotes).unwrap();
        let (book, overround) = report.lowest_vig_book.unwrap();
        assert_eq!(book.as_str(), "sharp");
        assert!(overround < 0.03);
    }

    #[test]
    fn best_line_keeps_different_points_apart() {
        let quotes = vec![
            quote("book-a", Selection::Over, -110, Some(dec!(47.5))),
            quote("book-b", Selection::Over, 100, Some(dec!(49.5))),
        ];

        let report = best_line(&quotes).unwrap();
        // Two distinct point values, two best quotes; the +100 at 49.5 must
        // not displace the 47.5 line.
        assert_eq!(report.best.len(), 2);
    }

    #[test]
    fn best_line_rejects_empty_input() {
        assert_eq!(best_line(&[]).unwrap_err(), DomainError::EmptyQuotes);
    }

    #[test]
    fn assessment_tiers_follow_edge() {
        let config = StakingConfig::default();

        let high = assess(odds(100), 0.56, dec!(10000), &config).unwrap();
        assert_eq!(high.tier, StakeTier::High);
        assert!(high.stake_fraction > 0.0);
        assert!(high.stake_fraction <= config.max_stake_fraction);

        let medium = assess(odds(100), 0.53, dec!(10000), &config).unwrap();
        assert_eq!(medium.tier, StakeTier::Medium);

        let none = assess(odds(-110), 0.50, dec!(10000), &config).unwrap();
        assert_eq!(none.tier, StakeTier::None);
        assert_eq!(none.stake_fraction, 0.0);
        assert_eq!(none.stake, Decimal::ZERO);
    }
}
