//! Parlay leg correlation classification and adjustment.
//!
//! The adjustment is a deliberate heuristic, not a joint model: each leg
//! pair is classified into a categorical relationship, looked up in a
//! data-driven coefficient table, and the naive product probability is
//! penalized by `c * sqrt(p1*p2)` (half-dampened for negative
//! coefficients). A copula or logistic-link joint model would be the
//! higher-fidelity replacement if one is ever needed; until then the
//! output should be read as a value screen, not ground truth.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::ids::GameId;
use super::market::Selection;

/// What a parlay leg is betting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetType {
    Spread,
    Total,
    Moneyline,
    PlayerProp,
}

/// One leg of a parlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParlayLeg {
    pub game: GameId,
    pub bet_type: BetType,
    pub selection: Selection,
    /// Team (or player, for props) the leg rides on.
    pub team: Option<String>,
    /// Independent win probability supplied by the caller.
    pub probability: f64,
}

/// Categorical relationship between two legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegRelation {
    SameGameSpreadTotal,
    SameGameMoneylineSpread,
    SameGameMoneylineTotal,
    SamePlayerProps,
    SameTeamDifferentGames,
    Unrelated,
}

/// Coefficient lookup, keyed by relationship. Loaded from configuration;
/// relations absent from the table are treated as independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationTable {
    #[serde(default)]
    coefficients: BTreeMap<LegRelation, f64>,
}

impl CorrelationTable {
    /// Build a table from explicit entries.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (LegRelation, f64)>) -> Self {
        Self {
            coefficients: entries.into_iter().collect(),
        }
    }

    /// Coefficient for a relation; 0 (independent) when unconfigured.
    #[must_use]
    pub fn coefficient(&self, relation: LegRelation) -> f64 {
        self.coefficients.get(&relation).copied().unwrap_or(0.0)
    }

    /// Validate that every configured coefficient lies in [-1, 1].
    ///
    /// # Errors
    ///
    /// Returns the offending value in the domain error.
    pub fn validate(&self) -> Result<(), DomainError> {
        for value in self.coefficients.values() {
            if !value.is_finite() || !(-1.0..=1.0).contains(value) {
                return Err(DomainError::CoefficientOutOfRange { value: *value });
            }
        }
        Ok(())
    }
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::from_entries([
            (LegRelation::SameGameSpreadTotal, 0.65),
            (LegRelation::SameGameMoneylineSpread, 0.85),
            (LegRelation::SameGameMoneylineTotal, 0.45),
            (LegRelation::SamePlayerProps, 0.70),
            (LegRelation::SameTeamDifferentGames, 0.20),
        ])
    }
}

/// Classify the relationship between two parlay legs.
#[must_use]
pub fn classify(a: &ParlayLeg, b: &ParlayLeg) -> LegRelation {
    if a.game == b.game {
        let types = (a.bet_type, b.bet_type);
        return match types {
            (BetType::Spread, BetType::Total) | (BetType::Total, BetType::Spread) => {
                LegRelation::SameGameSpreadTotal
            }
            (BetType::Moneyline, BetType::Spread) | (BetType::Spread, BetType::Moneyline) => {
                LegRelation::SameGameMoneylineSpread
            }
            (BetType::Moneyline, BetType::Total) | (BetType::Total, BetType::Moneyline) => {
                LegRelation::SameGameMoneylineTotal
            }
            (BetType::PlayerProp, BetType::PlayerProp)
                if a.team.is_some() && a.team == b.team =>
            {
                LegRelation::SamePlayerProps
            }
            _ => LegRelation::Unrelated,
        };
    }

    if a.team.is_some() && a.team == b.team {
        return LegRelation::SameTeamDifferentGames;
    }

    LegRelation::Unrelated
}

/// Severity band for a correlated pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationSeverity {
    None,
    /// |coefficient| above 0.5.
    High,
    /// |coefficient| above 0.7.
    Critical,
}

impl CorrelationSeverity {
    #[must_use]
    pub fn from_coefficient(c: f64) -> Self {
        let magnitude = c.abs();
        if magnitude > 0.7 {
            Self::Critical
        } else if magnitude > 0.5 {
            Self::High
        } else {
            Self::None
        }
    }

    fn is_flagged(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Adjust a pair's joint probability for correlation.
///
/// Positive coefficients penalize the naive product by
/// `c * sqrt(p1 * p2)`; negative coefficients apply half that reduction.
/// The result is clamped to [0, 1] and is always at or below the naive
/// product.
#[must_use]
pub fn adjusted_pair_probability(p1: f64, p2: f64, coefficient: f64) -> f64 {
    let naive = p1 * p2;
    let root = naive.sqrt();
    let factor = if coefficient >= 0.0 {
        1.0 - coefficient * root
    } else {
        1.0 + 0.5 * coefficient * root
    };
    (naive * factor).clamp(0.0, 1.0)
}

/// Assessment of one leg pair inside a parlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairAssessment {
    /// Indices into the submitted leg list.
    pub first: usize,
    pub second: usize,
    pub relation: LegRelation,
    pub coefficient: f64,
    pub severity: CorrelationSeverity,
}

/// Full-parlay correlation report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParlayCorrelationReport {
    pub pairs: Vec<PairAssessment>,
    /// Product of the independent leg probabilities.
    pub naive_probability: f64,
    /// Naive product after every pairwise correction, clamped to [0, 1].
    pub adjusted_probability: f64,
    /// Percentage of parlay value the corrections removed.
    pub value_reduction_pct: f64,
    /// Leg indices proposed for removal, worst offenders first.
    pub removal_suggestions: Vec<usize>,
}

/// Evaluate every leg pair of a parlay against the coefficient table.
///
/// The aggregate adjustment multiplies the naive product by each pair's
/// correction factor; the removal suggestions greedily target legs that
/// appear in the most high-severity pairs.
///
/// # Errors
///
/// Fails when fewer than two legs are supplied or any leg probability is
/// outside (0, 1).
pub fn analyze_parlay(
    legs: &[ParlayLeg],
    table: &CorrelationTable,
) -> Result<ParlayCorrelationReport, DomainError> {
    if legs.len() < 2 {
        return Err(DomainError::TooFewLegs { count: legs.len() });
    }
    for leg in legs {
        if !leg.probability.is_finite() || leg.probability <= 0.0 || leg.probability >= 1.0 {
            return Err(DomainError::ProbabilityOutOfRange {
                field: "leg probability",
                value: leg.probability,
            });
        }
    }

    let naive: f64 = legs.iter().map(|l| l.probability).product();

    let mut pairs = Vec::new();
    let mut adjusted = naive;
    let mut flagged_counts = vec![0usize; legs.len()];
    for i in 0..legs.len() {
        for j in (i + 1)..legs.len() {
            let relation = classify(&legs[i], &legs[j]);
            let coefficient = table.coefficient(relation);
            let severity = CorrelationSeverity::from_coefficient(coefficient);

            let pair_naive = legs[i].probability * legs[j].probability;
            let pair_adjusted =
                adjusted_pair_probability(legs[i].probability, legs[j].probability, coefficient);
            if pair_naive > 0.0 {
                adjusted *= pair_adjusted / pair_naive;
            }

            if severity.is_flagged() {
                flagged_counts[i] += 1;
                flagged_counts[j] += 1;
            }
            pairs.push(PairAssessment {
                first: i,
                second: j,
                relation,
                coefficient,
                severity,
            });
        }
    }

    let adjusted = adjusted.clamp(0.0, 1.0);
    let value_reduction_pct = if naive > 0.0 {
        (1.0 - adjusted / naive) * 100.0
    } else {
        0.0
    };

    let mut offenders: Vec<usize> = (0..legs.len()).filter(|&i| flagged_counts[i] > 0).collect();
    offenders.sort_by(|&a, &b| flagged_counts[b].cmp(&flagged_counts[a]).then(a.cmp(&b)));

    Ok(ParlayCorrelationReport {
        pairs,
        naive_probability: naive,
        adjusted_probability: adjusted,
        value_reduction_pct,
        removal_suggestions: offenders,
    })
}
