//! Sharp-money signal detection: reverse line movement and steam moves.
//!
//! All inputs describe one side of one market. The sign convention for
//! line movement is documented on [`LineMovement`]; the detector itself is
//! agnostic to spread-vs-total semantics.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::DomainError;

/// Detection thresholds. Defaults follow standard handicapping practice.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignalThresholds {
    /// Ticket percentage above which a side counts as the public side.
    #[serde(default = "default_rlm_ticket_pct")]
    pub rlm_ticket_pct: f64,

    /// Money-vs-ticket divergence (in points of percentage) that flags
    /// sharp money.
    #[serde(default = "default_divergence_pts")]
    pub divergence_pts: f64,

    /// Absolute line movement that qualifies as steam.
    #[serde(default = "default_steam_points")]
    pub steam_points: f64,

    /// Window (minutes) within which steam movement must occur.
    #[serde(default = "default_steam_window_minutes")]
    pub steam_window_minutes: i64,

    /// Minimum number of books moving together for steam.
    #[serde(default = "default_steam_min_books")]
    pub steam_min_books: usize,
}

fn default_rlm_ticket_pct() -> f64 {
    65.0
}

fn default_divergence_pts() -> f64 {
    10.0
}

fn default_steam_points() -> f64 {
    2.0
}

fn default_steam_window_minutes() -> i64 {
    10
}

fn default_steam_min_books() -> usize {
    3
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            rlm_ticket_pct: default_rlm_ticket_pct(),
            divergence_pts: default_divergence_pts(),
            steam_points: default_steam_points(),
            steam_window_minutes: default_steam_window_minutes(),
            steam_min_books: default_steam_min_books(),
        }
    }
}

/// Observed movement for one side of one market.
///
/// Sign convention: line values are oriented so that *positive movement
/// favors the quoted side* (the side `ticket_pct` and `money_pct` refer
/// to). A line moving toward the opposite side shows up as
/// `current_line < opening_line`.
#[derive(Debug, Clone, PartialEq)]
pub struct LineMovement {
    pub opening_line: f64,
    pub current_line: f64,
    /// Percentage of bet tickets on the quoted side, 0..100.
    pub ticket_pct: f64,
    /// Percentage of money on the quoted side, 0..100.
    pub money_pct: f64,
    /// Time over which the movement occurred.
    pub window: Duration,
    /// Distinct books observed moving.
    pub books_moved: usize,
}

impl LineMovement {
    /// Signed movement; negative means toward the opposite side.
    #[must_use]
    pub fn movement(&self) -> f64 {
        self.current_line - self.opening_line
    }
}

/// Which condition contributed to a flagged signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalIndicator {
    /// Public tickets pile on one side while the line walks the other way.
    TicketsAgainstMove { ticket_pct: f64, movement: f64 },
    /// Money share lags ticket share: the few bets on the other side are
    /// the big ones.
    MoneyDivergence { gap: f64 },
    /// Movement magnitude at or past the steam threshold.
    SteamMagnitude { movement: f64 },
    /// Movement seen across enough books at once.
    SteamBreadth { books: usize },
    /// Movement landed inside a tight window.
    SteamSpeed { minutes: i64 },
}

/// Detector output: flags plus a confidence score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalFlags {
    pub reverse_line_movement: bool,
    pub steam_move: bool,
    /// Weighted indicator score, clamped to [0, 0.95].
    pub confidence: f64,
    pub indicators: Vec<SignalIndicator>,
}

/// Evaluate reverse-line-movement and steam conditions for one market side.
///
/// # Errors
///
/// Fails when percentages leave [0, 100] or line values are not finite.
pub fn detect_signals(
    movement: &LineMovement,
    thresholds: &SignalThresholds,
) -> Result<SignalFlags, DomainError> {
    validate_pct("ticket_pct", movement.ticket_pct)?;
    validate_pct("money_pct", movement.money_pct)?;
    validate_finite("opening_line", movement.opening_line)?;
    validate_finite("current_line", movement.current_line)?;

    let delta = movement.movement();
    let mut indicators = Vec::new();

    // RLM condition 1: the public side loses ground anyway.
    let tickets_against_move =
        movement.ticket_pct >= thresholds.rlm_ticket_pct && delta < 0.0;
    if tickets_against_move {
        indicators.push(SignalIndicator::TicketsAgainstMove {
            ticket_pct: movement.ticket_pct,
            movement: delta,
        });
    }

    // RLM condition 2: money share trails ticket share, so the minority
    // tickets carry the big bets.
    let money_gap = movement.money_pct - movement.ticket_pct;
    let money_divergence = money_gap <= -thresholds.divergence_pts;
    if money_divergence {
        indicators.push(SignalIndicator::MoneyDivergence { gap: money_gap });
    }

    let reverse_line_movement = tickets_against_move || money_divergence;

    // Steam: big move, fast, across books.
    let window_minutes = movement.window.num_minutes();
    let steam_move = delta.abs() >= thresholds.steam_points
        && window_minutes <= thresholds.steam_window_minutes
        && movement.books_moved >= thresholds.steam_min_books;
    if steam_move {
        indicators.push(SignalIndicator::SteamMagnitude { movement: delta });
        indicators.push(SignalIndicator::SteamBreadth {
            books: movement.books_moved,
        });
        indicators.push(SignalIndicator::SteamSpeed {
            minutes: window_minutes,
        });
    }

    let confidence = confidence_score(thresholds, &indicators);

    if reverse_line_movement || steam_move {
        debug!(
            rlm = reverse_line_movement,
            steam = steam_move,
            confidence,
            "signal flagged"
        );
    }

    Ok(SignalFlags {
        reverse_line_movement,
        steam_move,
        confidence,
        indicators,
    })
}

/// Weighted indicator count: each triggered condition contributes a base
/// weight, with bonuses for bigger, faster, broader movement.
fn confidence_score(thresholds: &SignalThresholds, indicators: &[SignalIndicator]) -> f64 {
    let mut score: f64 = 0.0;
    for indicator in indicators {
        score += match indicator {
            SignalIndicator::TicketsAgainstMove { .. } => 0.30,
            SignalIndicator::MoneyDivergence { gap } => {
                // Wider divergence, more conviction.
                0.25 + ((gap.abs() - thresholds.divergence_pts) / 100.0).clamp(0.0, 0.10)
            }
            SignalIndicator::SteamMagnitude { movement } => {
                0.25 + ((movement.abs() - thresholds.steam_points) * 0.05).clamp(0.0, 0.15)
            }
            SignalIndicator::SteamBreadth { books } => {
                0.05 * (books.saturating_sub(thresholds.steam_min_books) + 1).min(3) as f64
            }
            SignalIndicator::SteamSpeed { minutes } => {
                if *minutes * 2 <= thresholds.steam_window_minutes {
                    0.10
                } else {
                    0.05
                }
            }
        };
    }
    score.clamp(0.0, 0.95)
}

fn validate_pct(field: &'static str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(DomainError::PercentageOutOfRange { field, value });
    }
    Ok(())
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() {
        return Err(DomainError::NonFiniteValue { field, value });
    }
    Ok(())
}
