//! Market quote records consumed by the engine.
//!
//! Quotes arrive from the surrounding application (odds feeds are an
//! external collaborator) as immutable value records. The engine never
//! mutates or persists them.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{BookmakerId, GameId};
use super::odds::{AmericanOdds, DecimalOdds};

/// The kind of market a quote belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    Spread,
    Total,
    Moneyline,
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spread => write!(f, "spread"),
            Self::Total => write!(f, "total"),
            Self::Moneyline => write!(f, "moneyline"),
        }
    }
}

/// Which side of a market a quote prices.
///
/// Home/Away apply to spreads and moneylines; Over/Under to totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Home,
    Away,
    Over,
    Under,
}

impl Selection {
    /// The complementary side of a two-way market.
    #[must_use]
    pub fn opposite(&self) -> Self {
        match self {
            Self::Home => Self::Away,
            Self::Away => Self::Home,
            Self::Over => Self::Under,
            Self::Under => Self::Over,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => write!(f, "home"),
            Self::Away => write!(f, "away"),
            Self::Over => write!(f, "over"),
            Self::Under => write!(f, "under"),
        }
    }
}

/// A single bookmaker price for one side of one market.
///
/// `point` carries the spread or total line; moneyline quotes have none.
/// Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub bookmaker: BookmakerId,
    pub game: GameId,
    pub market: MarketType,
    pub selection: Selection,
    pub price: AmericanOdds,
    pub point: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl MarketQuote {
    /// The quote's price in decimal-odds form.
    #[must_use]
    pub fn decimal_odds(&self) -> DecimalOdds {
        self.price.to_decimal()
    }
}
