//! Overround measurement and vig removal.
//!
//! A bookmaker's quoted implied probabilities sum to more than 1; the
//! excess is the overround (vig). Fair probabilities are recovered by
//! normalizing each implied probability by the sum, the standard
//! proportional (multiplicative) method.

use super::error::DomainError;
use super::market::Selection;
use super::odds::DecimalOdds;

/// One side of a market after vig removal.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct FairSide {
    pub selection: Selection,
    /// Raw implied probability of the quoted price.
    pub implied: f64,
    /// Vig-free probability. Sums to 1 across the market.
    pub fair: f64,
}

/// A market with the bookmaker margin stripped out.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FairMarket {
    pub sides: Vec<FairSide>,
    /// Total implied probability minus 1.
    pub overround: f64,
    /// The same margin expressed in percent.
    pub overround_pct: f64,
}

impl FairMarket {
    /// Fair probability for a given selection, if it was quoted.
    #[must_use]
    pub fn probability(&self, selection: Selection) -> Option<f64> {
        self.sides
            .iter()
            .find(|s| s.selection == selection)
            .map(|s| s.fair)
    }
}

/// Strip the bookmaker margin from a quoted market.
///
/// Each side's implied probability is divided by the market sum, so the
/// returned fair probabilities always total 1 (within float epsilon).
///
/// # Errors
///
/// Fails when fewer than two sides are supplied, when a selection repeats,
/// or when a quoted price implies a non-positive probability.
pub fn remove_vig(sides: &[(Selection, DecimalOdds)]) -> Result<FairMarket, DomainError> {
    if sides.len() < 2 {
        return Err(DomainError::TooFewSides { count: sides.len() });
    }

    let mut seen: Vec<Selection> = Vec::with_capacity(sides.len());
    let mut implied = Vec::with_capacity(sides.len());
    for (selection, odds) in sides {
        if seen.contains(selection) {
            return Err(DomainError::DuplicateSelection {
                selection: *selection,
            });
        }
        seen.push(*selection);

        let p = odds.implied_probability();
        if !(p > 0.0) {
            return Err(DomainError::ProbabilityOutOfRange {
                field: "implied probability",
                value: p,
            });
        }
        implied.push(p);
    }

    let total: f64 = implied.iter().sum();
    let overround = total - 1.0;

    let fair_sides = sides
        .iter()
        .zip(implied.iter())
        .map(|((selection, _), p)| FairSide {
            selection: *selection,
            implied: *p,
            fair: p / total,
        })
        .collect();

    Ok(FairMarket {
        sides: fair_sides,
        overround,
        overround_pct: overround * 100.0,
    })
}
