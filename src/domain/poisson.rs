//! Poisson score-distribution model.
//!
//! Two independent Poisson processes (home and away scoring rates) induce a
//! joint distribution over final scores. The grid is truncated at a
//! configurable cutoff; mass beyond the cutoff is *lost*, not folded back,
//! so [`ScoreDistribution::truncation_error`] reports exactly how much the
//! cutoff discards. For typical rates (a cutoff ~3x the larger rate) the
//! error is far below 1e-6; callers modeling unusually high-scoring sports
//! should raise the cutoff accordingly.
//!
//! Probability masses are computed with the multiplicative recurrence
//! `p(0) = e^(-lambda)`, `p(k) = p(k-1) * lambda / k`, never with raw
//! factorials, so no intermediate term can overflow.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Largest accepted scoring rate. `e^(-lambda)` underflows to zero well
/// before this, around lambda = 745, taking the whole recurrence with it.
pub const MAX_SCORING_RATE: f64 = 350.0;

/// Distribution cutoff configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct DistributionConfig {
    /// Highest per-team score in the grid.
    #[serde(default = "default_max_score")]
    pub max_score: usize,
}

fn default_max_score() -> usize {
    70
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            max_score: default_max_score(),
        }
    }
}

/// Win/tie/loss probabilities from the home team's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutcomeProbabilities {
    pub win: f64,
    pub tie: f64,
    pub loss: f64,
}

impl OutcomeProbabilities {
    /// Total captured mass; 1 minus the truncation error.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.win + self.tie + self.loss
    }
}

/// Over/under/push masses for a total line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TotalLine {
    pub line: f64,
    pub over: f64,
    pub under: f64,
    /// Mass exactly on the line; zero for half-point lines.
    pub push: f64,
}

/// One exact score with its probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreProbability {
    pub home: u32,
    pub away: u32,
    pub probability: f64,
}

/// Joint score distribution for two independent scoring rates.
#[derive(Debug, Clone)]
pub struct ScoreDistribution {
    lambda_home: f64,
    lambda_away: f64,
    max_score: usize,
    pmf_home: Vec<f64>,
    pmf_away: Vec<f64>,
}

impl ScoreDistribution {
    /// Build the truncated joint distribution.
    ///
    /// # Errors
    ///
    /// Fails when either rate is non-finite, non-positive, or above
    /// [`MAX_SCORING_RATE`], or when the cutoff is zero.
    pub fn new(lambda_home: f64, lambda_away: f64, max_score: usize) -> Result<Self, DomainError> {
        validate_rate(lambda_home)?;
        validate_rate(lambda_away)?;
        if max_score < 1 {
            return Err(DomainError::InvalidScoreCutoff { max_score });
        }

        Ok(Self {
            lambda_home,
            lambda_away,
            max_score,
            pmf_home: poisson_pmf(lambda_home, max_score),
            pmf_away: poisson_pmf(lambda_away, max_score),
        })
    }

    #[must_use]
    pub fn lambda_home(&self) -> f64 {
        self.lambda_home
    }

    #[must_use]
    pub fn lambda_away(&self) -> f64 {
        self.lambda_away
    }

    #[must_use]
    pub fn max_score(&self) -> usize {
        self.max_score
    }

    /// Probability of an exact final score. Zero beyond the cutoff.
    #[must_use]
    pub fn probability(&self, home: usize, away: usize) -> f64 {
        if home > self.max_score || away > self.max_score {
            return 0.0;
        }
        self.pmf_home[home] * self.pmf_away[away]
    }

    /// Probability that the combined score equals an exact total.
    #[must_use]
    pub fn total_probability(&self, total: usize) -> f64 {
        if total > 2 * self.max_score {
            return 0.0;
        }
        let mut mass = 0.0;
        for home in total.saturating_sub(self.max_score)..=total.min(self.max_score) {
            mass += self.pmf_home[home] * self.pmf_away[total - home];
        }
        mass
    }

    /// Mass the truncated grid actually captures.
    #[must_use]
    pub fn grid_mass(&self) -> f64 {
        let home: f64 = self.pmf_home.iter().sum();
        let away: f64 = self.pmf_away.iter().sum();
        home * away
    }

    /// Mass lost to the score cutoff: `1 - grid_mass()`.
    ///
    /// Clamped at zero; float rounding in the marginal sums can land a
    /// hair past 1 when the cutoff captures effectively everything.
    #[must_use]
    pub fn truncation_error(&self) -> f64 {
        (1.0 - self.grid_mass()).max(0.0)
    }

    /// Win/tie/loss probabilities over the grid.
    ///
    /// The three values sum to [`grid_mass`](Self::grid_mass), i.e. to 1
    /// minus the truncation error.
    #[must_use]
    pub fn outcome_probabilities(&self) -> OutcomeProbabilities {
        // P(home > away) via the away CDF: one pass instead of the full
        // grid product.
        let mut away_cdf = 0.0;
        let mut win = 0.0;
        let mut tie = 0.0;
        for (score, p_home) in self.pmf_home.iter().enumerate() {
            if score > 0 {
                away_cdf += self.pmf_away[score - 1];
            }
            win += p_home * away_cdf;
            tie += p_home * self.pmf_away[score];
        }

        let loss = self.grid_mass() - win - tie;
        OutcomeProbabilities {
            win,
            tie,
            loss: loss.max(0.0),
        }
    }

    /// Over/under/push masses for an arbitrary total line.
    ///
    /// # Errors
    ///
    /// Fails when the line is not finite.
    pub fn total_line(&self, line: f64) -> Result<TotalLine, DomainError> {
        if !line.is_finite() {
            return Err(DomainError::InvalidTotalLine { line });
        }

        let totals = self.total_pmf();
        let mut over = 0.0;
        let mut under = 0.0;
        let mut push = 0.0;
        for (total, mass) in totals.iter().enumerate() {
            let total = total as f64;
            if (total - line).abs() < f64::EPSILON {
                push += mass;
            } else if total > line {
                over += mass;
            } else {
                under += mass;
            }
        }

        Ok(TotalLine {
            line,
            over,
            under,
            push,
        })
    }

    /// The `n` most likely exact scores, ranked by probability descending.
    ///
    /// Ties break toward the smaller combined total, then lexicographically
    /// by home score.
    #[must_use]
    pub fn top_scores(&self, n: usize) -> Vec<ScoreProbability> {
        let mut scores = Vec::with_capacity((self.max_score + 1) * (self.max_score + 1));
        for home in 0..=self.max_score {
            for away in 0..=self.max_score {
                scores.push(ScoreProbability {
                    home: home as u32,
                    away: away as u32,
                    probability: self.pmf_home[home] * self.pmf_away[away],
                });
            }
        }

        scores.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(Ordering::Equal)
                .then_with(|| (a.home + a.away).cmp(&(b.home + b.away)))
                .then_with(|| a.home.cmp(&b.home))
        });
        scores.truncate(n);
        scores
    }

    /// Distribution of the combined total over the grid.
    fn total_pmf(&self) -> Vec<f64> {
        let mut totals = vec![0.0; 2 * self.max_score + 1];
        for (home, p_home) in self.pmf_home.iter().enumerate() {
            for (away, p_away) in self.pmf_away.iter().enumerate() {
                totals[home + away] += p_home * p_away;
            }
        }
        totals
    }
}

fn validate_rate(lambda: f64) -> Result<(), DomainError> {
    if !lambda.is_finite() || lambda <= 0.0 || lambda > MAX_SCORING_RATE {
        return Err(DomainError::InvalidScoringRate {
            lambda,
            max: MAX_SCORING_RATE,
        });
    }
    Ok(())
}

/// Poisson pmf over 0..=max_k by multiplicative recurrence.
fn poisson_pmf(lambda: f64, max_k: usize) -> Vec<f64> {
    let mut out = vec![0.0; max_k + 1];
    out[0] = (-lambda).exp();
    for k in 1..=max_k {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    out
}
