//! Exchange-agnostic betting domain logic.

pub mod arbitrage;
pub mod correlation;
pub mod error;
pub mod ids;
pub mod market;
pub mod odds;
pub mod poisson;
pub mod regression;
pub mod signal;
pub mod value;
pub mod vig;

// Core domain types
pub use error::DomainError;
pub use ids::{BookmakerId, GameId};
pub use market::{MarketQuote, MarketType, Selection};
pub use odds::{AmericanOdds, DecimalOdds};

// Vig removal
pub use vig::{remove_vig, FairMarket, FairSide};

// Value calculation
pub use value::{
    assess, best_line, closing_line_value, expected_value, kelly_stake, BestLineReport,
    BestQuote, ClosingLineValue, ClvQuality, ExpectedValue, KellyStake, KellyWarning,
    StakeTier, StakingConfig, ValueAssessment,
};

// Score distribution
pub use poisson::{
    DistributionConfig, OutcomeProbabilities, ScoreDistribution, ScoreProbability, TotalLine,
};

// Signals
pub use signal::{detect_signals, LineMovement, SignalFlags, SignalIndicator, SignalThresholds};

// Arbitrage
pub use arbitrage::{
    find_arbitrage, find_middles, ArbitrageConfig, ArbitrageLeg, ArbitrageOpportunity,
    MiddleOpportunity,
};

// Correlation
pub use correlation::{
    adjusted_pair_probability, analyze_parlay, classify, BetType, CorrelationSeverity,
    CorrelationTable, LegRelation, PairAssessment, ParlayCorrelationReport, ParlayLeg,
};

// Regression
pub use regression::{
    predict, recommend, ConfidenceTier, FactorInputs, FactorWeights, ModelConfig,
    Recommendation, RegressionPrediction,
};
