//! Linesight - quantitative betting-decision engine.
//!
//! This crate turns raw market prices and team/game signals into calibrated
//! probabilities, monetary edge, bet sizing, and market-anomaly flags. It is
//! a pure library: no I/O, no persistence, no network protocol, no CLI. The
//! surrounding application supplies typed input records and stores or
//! displays the typed output records.
//!
//! # Architecture
//!
//! Every operation is a deterministic, synchronous function of its inputs.
//! Components, leaves first:
//!
//! - **`domain::odds`** - American/decimal odds conversion and implied
//!   probability
//! - **`domain::vig`** - overround measurement and proportional vig removal
//! - **`domain::value`** - expected value, fractional-Kelly staking,
//!   closing-line value, line shopping
//! - **`domain::poisson`** - truncated joint Poisson score distributions
//! - **`domain::signal`** - reverse-line-movement and steam-move detection
//! - **`domain::arbitrage`** - cross-book arbitrage and middle discovery
//!   with verified stake splits
//! - **`domain::correlation`** - parlay leg correlation classification and
//!   heuristic joint-probability adjustment
//! - **`domain::regression`** - fixed-weight multi-factor margin model with
//!   staked recommendations
//!
//! Monetary quantities are `rust_decimal::Decimal`; probabilities and
//! statistical factors are `f64`, converting only at the odds boundary.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files with engine
//!   thresholds, model weights, and the correlation table
//! - [`domain`] - The betting-decision components listed above
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```
//! use linesight::domain::{remove_vig, AmericanOdds, Selection};
//!
//! let home = AmericanOdds::try_new(-150)?.to_decimal();
//! let away = AmericanOdds::try_new(130)?.to_decimal();
//!
//! let fair = remove_vig(&[(Selection::Home, home), (Selection::Away, away)])?;
//! assert!(fair.overround > 0.0);
//! # Ok::<(), linesight::domain::DomainError>(())
//! ```

pub mod config;
pub mod domain;
pub mod error;

pub use error::{Error, Result};
