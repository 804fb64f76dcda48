//! Domain validation errors for core domain types.
//!
//! These errors are returned by `try_new` constructors and by operations
//! that validate caller-supplied market data. The engine never substitutes
//! a default for invalid input; every variant names the offending value.

use rust_decimal::Decimal;
use thiserror::Error;

use super::market::{MarketType, Selection};

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// American odds of zero are undefined.
    #[error("american odds cannot be zero")]
    ZeroAmericanOdds,

    /// American odds are quoted at magnitudes of 100 or more.
    #[error("american odds magnitude must be at least 100, got {odds}")]
    AmericanOddsBelowMinimum {
        /// The invalid odds that were provided.
        odds: i32,
    },

    /// Decimal odds below 1 would imply a negative payout.
    #[error("decimal odds must be at least 1, got {odds}")]
    DecimalOddsBelowOne { odds: Decimal },

    /// Decimal odds of exactly 1 pay nothing and have no American form.
    #[error("decimal odds of exactly 1 have no american equivalent")]
    NoAmericanEquivalent,

    /// A probability argument fell outside its valid open interval.
    #[error("{field} must be a probability in (0, 1), got {value}")]
    ProbabilityOutOfRange { field: &'static str, value: f64 },

    /// A percentage argument fell outside [0, 100].
    #[error("{field} must be a percentage in [0, 100], got {value}")]
    PercentageOutOfRange { field: &'static str, value: f64 },

    /// Vig removal needs a complete market.
    #[error("market must quote at least two sides, got {count}")]
    TooFewSides { count: usize },

    /// The same selection was quoted twice in one market.
    #[error("duplicate selection in market: {selection}")]
    DuplicateSelection { selection: Selection },

    /// Stakes must be positive for sizing operations.
    #[error("stake must be positive, got {stake}")]
    NonPositiveStake { stake: Decimal },

    /// Bankroll must be positive for sizing operations.
    #[error("bankroll must be positive, got {bankroll}")]
    NonPositiveBankroll { bankroll: Decimal },

    /// Kelly fraction multiplier outside (0, 1].
    #[error("kelly fraction must be in (0, 1], got {fraction}")]
    InvalidKellyFraction { fraction: f64 },

    /// Poisson scoring rates must be finite, positive, and bounded.
    #[error("scoring rate must be finite, positive, and at most {max}, got {lambda}")]
    InvalidScoringRate { lambda: f64, max: f64 },

    /// The score grid needs room for at least one goal/point.
    #[error("score cutoff must be at least 1, got {max_score}")]
    InvalidScoreCutoff { max_score: usize },

    /// Total lines must be finite numbers.
    #[error("total line must be finite, got {line}")]
    InvalidTotalLine { line: f64 },

    /// A line value supplied to the signal detector was not finite.
    #[error("{field} must be finite, got {value}")]
    NonFiniteValue { field: &'static str, value: f64 },

    /// Scans need at least one quote to work with.
    #[error("no quotes supplied")]
    EmptyQuotes,

    /// Cross-book scans need quotes from at least two bookmakers.
    #[error("need quotes from at least two bookmakers, got {count}")]
    TooFewBookmakers { count: usize },

    /// Best-line comparison only makes sense within a single market.
    #[error("quotes mix games or market types ({first} vs {second})")]
    MixedMarkets {
        first: MarketType,
        second: MarketType,
    },

    /// Correlation coefficients live in [-1, 1].
    #[error("correlation coefficient must be in [-1, 1], got {value}")]
    CoefficientOutOfRange { value: f64 },

    /// Parlay analysis needs at least two legs.
    #[error("parlay must contain at least two legs, got {count}")]
    TooFewLegs { count: usize },
}
