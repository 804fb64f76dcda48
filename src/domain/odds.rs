//! Odds representations and conversions.
//!
//! Two quoted forms are supported: American odds (-150, +130) and decimal
//! odds (1.6667, 2.30). Both are validated newtypes; conversions between
//! them and to implied probability are exact where `Decimal` arithmetic
//! allows. Monetary payout math stays in `Decimal`; probabilities cross
//! into `f64` at this boundary and nowhere else.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// American (moneyline-style) odds. Non-zero, magnitude at least 100.
///
/// Positive values quote the profit on a 100 stake; negative values quote
/// the stake required to profit 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmericanOdds(i32);

impl AmericanOdds {
    /// Validate and wrap a raw American odds value.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ZeroAmericanOdds` for 0 and
    /// `DomainError::AmericanOddsBelowMinimum` for magnitudes under 100.
    pub fn try_new(odds: i32) -> Result<Self, DomainError> {
        if odds == 0 {
            return Err(DomainError::ZeroAmericanOdds);
        }
        if odds.abs() < 100 {
            return Err(DomainError::AmericanOddsBelowMinimum { odds });
        }
        Ok(Self(odds))
    }

    /// The raw quoted value.
    #[must_use]
    pub fn value(&self) -> i32 {
        self.0
    }

    /// Convert to decimal odds.
    ///
    /// +A maps to `1 + A/100`; -A maps to `1 + 100/|A|`.
    #[must_use]
    pub fn to_decimal(&self) -> DecimalOdds {
        let hundred = Decimal::ONE_HUNDRED;
        let value = if self.0 > 0 {
            Decimal::ONE + Decimal::from(self.0) / hundred
        } else {
            Decimal::ONE + hundred / Decimal::from(self.0.abs())
        };
        DecimalOdds(value)
    }

    /// Implied win probability of the quoted price.
    #[must_use]
    pub fn implied_probability(&self) -> f64 {
        self.to_decimal().implied_probability()
    }
}

impl fmt::Display for AmericanOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

/// Decimal (European-style) odds: total payout per unit staked.
///
/// Values below 1 are rejected. Exactly 1 is a legitimate degenerate quote
/// (no payout); sizing code must handle it explicitly rather than divide
/// by `d - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecimalOdds(Decimal);

impl DecimalOdds {
    /// Validate and wrap a raw decimal odds value.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DecimalOddsBelowOne` for values under 1.
    pub fn try_new(odds: Decimal) -> Result<Self, DomainError> {
        if odds < Decimal::ONE {
            return Err(DomainError::DecimalOddsBelowOne { odds });
        }
        Ok(Self(odds))
    }

    /// Build from a win probability: `d = 1/p`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ProbabilityOutOfRange` unless `p` is in (0, 1].
    pub fn from_probability(p: f64) -> Result<Self, DomainError> {
        if !p.is_finite() || p <= 0.0 || p > 1.0 {
            return Err(DomainError::ProbabilityOutOfRange {
                field: "probability",
                value: p,
            });
        }
        let odds = Decimal::from_f64_retain(1.0 / p).unwrap_or(Decimal::ONE);
        Ok(Self(odds.max(Decimal::ONE)))
    }

    /// The raw decimal value.
    #[must_use]
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Profit per unit staked: `b = d - 1`.
    #[must_use]
    pub fn profit_multiplier(&self) -> Decimal {
        self.0 - Decimal::ONE
    }

    /// Implied win probability: `1/d`.
    #[must_use]
    pub fn implied_probability(&self) -> f64 {
        1.0 / self.0.to_f64().unwrap_or(1.0)
    }

    /// Convert to American odds, rounded to the nearest whole quote.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NoAmericanEquivalent` for odds of exactly 1,
    /// where the American form is undefined.
    pub fn to_american(&self) -> Result<AmericanOdds, DomainError> {
        if self.0 == Decimal::ONE {
            return Err(DomainError::NoAmericanEquivalent);
        }
        let hundred = Decimal::ONE_HUNDRED;
        let b = self.profit_multiplier();
        let raw = if self.0 >= Decimal::TWO {
            b * hundred
        } else {
            -(hundred / b)
        };
        let value = raw.round().to_i32().unwrap_or(if raw.is_sign_positive() {
            i32::MAX
        } else {
            i32::MIN
        });
        // Quotes just either side of 2.00 round to the +/-100 boundary.
        AmericanOdds::try_new(value)
    }
}

impl fmt::Display for DecimalOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
