//! Fixed-weight multi-factor margin model.
//!
//! Not a trained model: every weight is externally supplied configuration
//! with a documented default. The output is a projected score margin, a
//! bounded confidence score, and a staking recommendation routed through
//! the fractional-Kelly sizing in [`super::value`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::DomainError;
use super::market::Selection;
use super::odds::DecimalOdds;
use super::value::{kelly_stake, KellyStake, StakingConfig};

/// Raw factor readings for one game, home-relative where signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorInputs {
    /// Offensive efficiency differential, home minus away.
    pub offensive_efficiency_diff: f64,
    /// Defensive efficiency differential, home minus away (positive means
    /// the home defense is better).
    pub defensive_efficiency_diff: f64,
    /// Recent-form differential, home minus away.
    pub recent_form_diff: f64,
    pub home_rest_days: f64,
    pub away_rest_days: f64,
    /// Away team's travel distance in miles.
    pub away_travel_miles: f64,
    pub divisional_game: bool,
    pub home_back_to_back: bool,
    pub away_back_to_back: bool,
    /// Line movement velocity in points per hour, toward home positive.
    pub line_velocity: f64,
    /// Sharp consensus direction and strength in [-1, 1], toward home
    /// positive.
    pub sharp_consensus: f64,
    /// Public-fade signal in [-1, 1], toward home positive.
    pub public_fade: f64,
}

/// Fixed factor weights. Units are points of margin per unit of factor.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FactorWeights {
    #[serde(default = "default_w_offense")]
    pub offensive_efficiency: f64,
    #[serde(default = "default_w_defense")]
    pub defensive_efficiency: f64,
    #[serde(default = "default_w_form")]
    pub recent_form: f64,
    /// Points per effective rest day of advantage.
    #[serde(default = "default_w_rest")]
    pub rest_advantage: f64,
    /// Points per log-unit of away travel.
    #[serde(default = "default_w_travel")]
    pub travel: f64,
    /// Flat home-court points.
    #[serde(default = "default_w_home_court")]
    pub home_court: f64,
    /// Margin shrink applied to divisional games, in points.
    #[serde(default = "default_w_divisional")]
    pub divisional: f64,
    /// Points against a side playing a back-to-back.
    #[serde(default = "default_w_back_to_back")]
    pub back_to_back: f64,
    #[serde(default = "default_w_line_velocity")]
    pub line_velocity: f64,
    #[serde(default = "default_w_sharp")]
    pub sharp_consensus: f64,
    #[serde(default = "default_w_fade")]
    pub public_fade: f64,
}

fn default_w_offense() -> f64 {
    0.32
}

fn default_w_defense() -> f64 {
    0.28
}

fn default_w_form() -> f64 {
    0.18
}

fn default_w_rest() -> f64 {
    0.40
}

fn default_w_travel() -> f64 {
    0.35
}

fn default_w_home_court() -> f64 {
    2.6
}

fn default_w_divisional() -> f64 {
    0.9
}

fn default_w_back_to_back() -> f64 {
    1.8
}

fn default_w_line_velocity() -> f64 {
    0.50
}

fn default_w_sharp() -> f64 {
    1.4
}

fn default_w_fade() -> f64 {
    0.6
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            offensive_efficiency: default_w_offense(),
            defensive_efficiency: default_w_defense(),
            recent_form: default_w_form(),
            rest_advantage: default_w_rest(),
            travel: default_w_travel(),
            home_court: default_w_home_court(),
            divisional: default_w_divisional(),
            back_to_back: default_w_back_to_back(),
            line_velocity: default_w_line_velocity(),
            sharp_consensus: default_w_sharp(),
            public_fade: default_w_fade(),
        }
    }
}

/// Model-level settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Confidence before agreement/variance adjustments.
    #[serde(default = "default_base_confidence")]
    pub base_confidence: f64,

    /// Per-sport confidence shift supplied by the caller's configuration.
    #[serde(default)]
    pub sport_confidence_shift: f64,

    /// Scale of the inter-factor agreement adjustment.
    #[serde(default = "default_agreement_weight")]
    pub agreement_weight: f64,

    /// Confidence penalty when one factor dominates the projection.
    #[serde(default = "default_variance_penalty")]
    pub variance_penalty: f64,

    /// League-average combined score used to split margin into team
    /// projections.
    #[serde(default = "default_league_average_total")]
    pub league_average_total: f64,

    /// Cover probability gained per point of edge against the market line.
    #[serde(default = "default_points_per_probability")]
    pub points_per_probability: f64,
}

fn default_base_confidence() -> f64 {
    0.58
}

fn default_agreement_weight() -> f64 {
    0.25
}

fn default_variance_penalty() -> f64 {
    0.10
}

fn default_league_average_total() -> f64 {
    221.0
}

fn default_points_per_probability() -> f64 {
    0.025
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_confidence: default_base_confidence(),
            sport_confidence_shift: 0.0,
            agreement_weight: default_agreement_weight(),
            variance_penalty: default_variance_penalty(),
            league_average_total: default_league_average_total(),
            points_per_probability: default_points_per_probability(),
        }
    }
}

/// One factor's contribution to the projected margin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorContribution {
    pub name: &'static str,
    /// The raw (possibly transformed) factor value.
    pub value: f64,
    /// Points of margin contributed.
    pub weighted: f64,
}

/// Model output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionPrediction {
    /// Projected scores, rounded to one decimal.
    pub projected_home: f64,
    pub projected_away: f64,
    /// Projected home margin, one decimal; positive favors home.
    pub margin: f64,
    /// Always within [0.50, 0.92].
    pub confidence: f64,
    pub factors: Vec<FactorContribution>,
}

/// Confidence band used to pick the Kelly fraction multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    #[must_use]
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.75 {
            Self::High
        } else if confidence >= 0.62 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Fractional-Kelly multiplier for the band.
    #[must_use]
    pub fn kelly_multiplier(self) -> f64 {
        match self {
            Self::High => 0.25,
            Self::Medium => 0.15,
            Self::Low => 0.10,
        }
    }
}

/// A sized recommendation derived from a prediction and a market line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub side: Selection,
    /// Estimated probability the chosen side covers.
    pub cover_probability: f64,
    pub tier: ConfidenceTier,
    pub kelly: KellyStake,
    /// Points of disagreement with the market line.
    pub edge_points: f64,
}

/// Run the fixed-weight model.
///
/// # Errors
///
/// Fails when any input is non-finite or a signal factor leaves [-1, 1].
pub fn predict(
    inputs: &FactorInputs,
    weights: &FactorWeights,
    config: &ModelConfig,
) -> Result<RegressionPrediction, DomainError> {
    validate_inputs(inputs)?;

    let rest_diff =
        effective_rest(inputs.home_rest_days) - effective_rest(inputs.away_rest_days);
    // Travel only hurts the visitor; log scaling keeps cross-country
    // trips from dominating.
    let travel = (1.0 + inputs.away_travel_miles / 250.0).ln();
    let b2b = f64::from(u8::from(inputs.away_back_to_back))
        - f64::from(u8::from(inputs.home_back_to_back));

    let mut factors = vec![
        contribution(
            "offensive_efficiency",
            inputs.offensive_efficiency_diff,
            weights.offensive_efficiency,
        ),
        contribution(
            "defensive_efficiency",
            inputs.defensive_efficiency_diff,
            weights.defensive_efficiency,
        ),
        contribution("recent_form", inputs.recent_form_diff, weights.recent_form),
        contribution("rest_advantage", rest_diff, weights.rest_advantage),
        contribution("travel", travel, weights.travel),
        contribution("home_court", 1.0, weights.home_court),
        contribution("back_to_back", b2b, weights.back_to_back),
        contribution("line_velocity", inputs.line_velocity, weights.line_velocity),
        contribution("sharp_consensus", inputs.sharp_consensus, weights.sharp_consensus),
        contribution("public_fade", inputs.public_fade, weights.public_fade),
    ];

    let mut margin: f64 = factors.iter().map(|f| f.weighted).sum();

    // Divisional familiarity compresses margins toward zero, never past it.
    if inputs.divisional_game {
        let shrink = margin.signum() * weights.divisional.min(margin.abs());
        factors.push(FactorContribution {
            name: "divisional",
            value: 1.0,
            weighted: -shrink,
        });
        margin -= shrink;
    }

    let projected_home = round1((config.league_average_total + margin) / 2.0);
    let projected_away = round1((config.league_average_total - margin) / 2.0);
    let margin = round1(projected_home - projected_away);

    let confidence = confidence_score(&factors, margin, config);
    debug!(margin, confidence, "regression prediction");

    Ok(RegressionPrediction {
        projected_home,
        projected_away,
        margin,
        confidence,
        factors,
    })
}

/// Derive a staking recommendation against a market line.
///
/// `market_margin` is the home margin the line implies (a home -3.5 spread
/// means a market margin of +3.5). The cover probability uses a flat
/// [`ModelConfig::points_per_probability`] per point of disagreement,
/// clamped to [0.05, 0.95]; the Kelly fraction multiplier follows the
/// confidence tier (0.25/0.15/0.10).
///
/// # Errors
///
/// Fails when the market margin is not finite or sizing inputs are
/// invalid.
pub fn recommend(
    prediction: &RegressionPrediction,
    market_margin: f64,
    odds: DecimalOdds,
    bankroll: Decimal,
    staking: &StakingConfig,
    config: &ModelConfig,
) -> Result<Recommendation, DomainError> {
    if !market_margin.is_finite() {
        return Err(DomainError::NonFiniteValue {
            field: "market_margin",
            value: market_margin,
        });
    }

    let edge_points = prediction.margin - market_margin;
    let side = if edge_points >= 0.0 {
        Selection::Home
    } else {
        Selection::Away
    };
    let cover_probability =
        (0.5 + edge_points.abs() * config.points_per_probability).clamp(0.05, 0.95);

    let tier = ConfidenceTier::from_confidence(prediction.confidence);
    let kelly = kelly_stake(
        odds,
        cover_probability,
        bankroll,
        tier.kelly_multiplier(),
        staking,
    )?;

    Ok(Recommendation {
        side,
        cover_probability,
        tier,
        kelly,
        edge_points,
    })
}

fn contribution(name: &'static str, value: f64, weight: f64) -> FactorContribution {
    FactorContribution {
        name,
        value,
        weighted: weight * value,
    }
}

/// Rest helps linearly up to three days; further days add only a
/// log-shaped tail.
fn effective_rest(days: f64) -> f64 {
    let days = days.max(0.0);
    days.min(3.0) + 0.5 * (1.0 + (days - 3.0).max(0.0)).ln()
}

fn confidence_score(factors: &[FactorContribution], margin: f64, config: &ModelConfig) -> f64 {
    // Agreement: fraction of material contributions pointing the same way
    // as the final margin.
    let material: Vec<&FactorContribution> =
        factors.iter().filter(|f| f.weighted.abs() > 0.05).collect();
    let agreement = if material.is_empty() || margin == 0.0 {
        0.5
    } else {
        let aligned = material
            .iter()
            .filter(|f| f.weighted.signum() == margin.signum())
            .count();
        aligned as f64 / material.len() as f64
    };

    // Variance: a projection carried by one factor is fragile.
    let total_weight: f64 = factors.iter().map(|f| f.weighted.abs()).sum();
    let largest = factors
        .iter()
        .map(|f| f.weighted.abs())
        .fold(0.0, f64::max);
    let dominated = total_weight > 0.0 && largest / total_weight > 0.6;

    let mut confidence = config.base_confidence
        + (agreement - 0.5) * 2.0 * config.agreement_weight
        + config.sport_confidence_shift;
    if dominated {
        confidence -= config.variance_penalty;
    }
    confidence.clamp(0.50, 0.92)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn validate_inputs(inputs: &FactorInputs) -> Result<(), DomainError> {
    let finite = [
        ("offensive_efficiency_diff", inputs.offensive_efficiency_diff),
        ("defensive_efficiency_diff", inputs.defensive_efficiency_diff),
        ("recent_form_diff", inputs.recent_form_diff),
        ("home_rest_days", inputs.home_rest_days),
        ("away_rest_days", inputs.away_rest_days),
        ("away_travel_miles", inputs.away_travel_miles),
        ("line_velocity", inputs.line_velocity),
    ];
    for (field, value) in finite {
        if !value.is_finite() {
            return Err(DomainError::NonFiniteValue { field, value });
        }
    }

    let signals = [
        ("sharp_consensus", inputs.sharp_consensus),
        ("public_fade", inputs.public_fade),
    ];
    for (field, value) in signals {
        if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
            return Err(DomainError::NonFiniteValue { field, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::odds::AmericanOdds;
    use rust_decimal_macros::dec;

    fn neutral_inputs() -> FactorInputs {
        FactorInputs {
            offensive_efficiency_diff: 0.0,
            defensive_efficiency_diff: 0.0,
            recent_form_diff: 0.0,
            home_rest_days: 2.0,
            away_rest_days: 2.0,
            away_travel_miles: 0.0,
            divisional_game: false,
            home_back_to_back: false,
            away_back_to_back: false,
            line_velocity: 0.0,
            sharp_consensus: 0.0,
            public_fade: 0.0,
        }
    }

    fn defaults() -> (FactorWeights, ModelConfig) {
        (FactorWeights::default(), ModelConfig::default())
    }

    #[test]
    fn neutral_game_shows_home_court_only() {
        let (weights, config) = defaults();
        let prediction = predict(&neutral_inputs(), &weights, &config).unwrap();
        assert!((prediction.margin - weights.home_court).abs() < 0.11);
        assert!(prediction.projected_home > prediction.projected_away);
    }

    #[test]
    fn margin_sign_follows_dominant_efficiency() {
        let (weights, config) = defaults();

        let home_strong = FactorInputs {
            offensive_efficiency_diff: 12.0,
            ..neutral_inputs()
        };
        let road_strong = FactorInputs {
            offensive_efficiency_diff: -25.0,
            ..neutral_inputs()
        };

        let home = predict(&home_strong, &weights, &config).unwrap();
        let road = predict(&road_strong, &weights, &config).unwrap();
        assert!(home.margin > 0.0);
        assert!(road.margin < 0.0);
    }

    #[test]
    fn confidence_always_in_bounds() {
        let (weights, config) = defaults();
        let extremes = [
            neutral_inputs(),
            FactorInputs {
                offensive_efficiency_diff: 40.0,
                defensive_efficiency_diff: 30.0,
                recent_form_diff: 20.0,
                sharp_consensus: 1.0,
                public_fade: 1.0,
                line_velocity: 5.0,
                ..neutral_inputs()
            },
            FactorInputs {
                offensive_efficiency_diff: -40.0,
                defensive_efficiency_diff: 35.0,
                recent_form_diff: -15.0,
                sharp_consensus: -1.0,
                public_fade: 1.0,
                away_travel_miles: 2800.0,
                ..neutral_inputs()
            },
        ];

        for inputs in &extremes {
            let prediction = predict(inputs, &weights, &config).unwrap();
            assert!(
                (0.50..=0.92).contains(&prediction.confidence),
                "confidence {} out of bounds",
                prediction.confidence
            );
        }
    }

    #[test]
    fn agreement_raises_confidence() {
        let (weights, config) = defaults();

        let aligned = FactorInputs {
            offensive_efficiency_diff: 10.0,
            defensive_efficiency_diff: 8.0,
            recent_form_diff: 6.0,
            sharp_consensus: 0.8,
            ..neutral_inputs()
        };
        let split = FactorInputs {
            offensive_efficiency_diff: 10.0,
            defensive_efficiency_diff: -8.0,
            recent_form_diff: -6.0,
            sharp_consensus: -0.8,
            ..neutral_inputs()
        };

        let high = predict(&aligned, &weights, &config).unwrap();
        let low = predict(&split, &weights, &config).unwrap();
        assert!(high.confidence > low.confidence);
    }

    #[test]
    fn rest_advantage_diminishes_past_three_days() {
        let near = effective_rest(3.0) - effective_rest(2.0);
        let far = effective_rest(7.0) - effective_rest(6.0);
        assert!(far < near);
        assert!(far > 0.0);
    }

    #[test]
    fn divisional_shrink_never_crosses_zero() {
        let (weights, config) = defaults();
        let slight_road_edge = FactorInputs {
            offensive_efficiency_diff: -9.0,
            divisional_game: true,
            ..neutral_inputs()
        };
        let base = FactorInputs {
            divisional_game: false,
            ..slight_road_edge.clone()
        };

        let with = predict(&slight_road_edge, &weights, &config).unwrap();
        let without = predict(&base, &weights, &config).unwrap();
        assert!(with.margin.abs() <= without.margin.abs());
        // Shrink moves toward zero, never flips the side.
        assert!(with.margin.signum() == without.margin.signum() || with.margin == 0.0);
    }

    #[test]
    fn back_to_back_penalizes_fatigued_side() {
        let (weights, config) = defaults();
        let away_tired = FactorInputs {
            away_back_to_back: true,
            ..neutral_inputs()
        };
        let home_tired = FactorInputs {
            home_back_to_back: true,
            ..neutral_inputs()
        };

        let neutral = predict(&neutral_inputs(), &weights, &config).unwrap();
        let away = predict(&away_tired, &weights, &config).unwrap();
        let home = predict(&home_tired, &weights, &config).unwrap();
        assert!(away.margin > neutral.margin);
        assert!(home.margin < neutral.margin);
    }

    #[test]
    fn projections_are_one_decimal() {
        let (weights, config) = defaults();
        let prediction = predict(&neutral_inputs(), &weights, &config).unwrap();
        for value in [
            prediction.projected_home,
            prediction.projected_away,
            prediction.margin,
        ] {
            assert!(((value * 10.0).round() - value * 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn recommendation_picks_side_and_sizes() {
        let (weights, config) = defaults();
        let strong_home = FactorInputs {
            offensive_efficiency_diff: 15.0,
            defensive_efficiency_diff: 10.0,
            recent_form_diff: 5.0,
            sharp_consensus: 0.6,
            ..neutral_inputs()
        };
        let prediction = predict(&strong_home, &weights, &config).unwrap();
        let odds = AmericanOdds::try_new(-110).unwrap().to_decimal();

        // Market only asks home to win by 2.5; the model sees much more.
        let rec = recommend(
            &prediction,
            2.5,
            odds,
            dec!(10000),
            &StakingConfig::default(),
            &config,
        )
        .unwrap();

        assert_eq!(rec.side, Selection::Home);
        assert!(rec.cover_probability > 0.5);
        assert!(rec.kelly.stake > Decimal::ZERO);

        // Market demanding far more than the projection flips the side.
        let other = recommend(
            &prediction,
            25.0,
            odds,
            dec!(10000),
            &StakingConfig::default(),
            &config,
        )
        .unwrap();
        assert_eq!(other.side, Selection::Away);
    }

    #[test]
    fn tier_multipliers_step_down() {
        assert_eq!(ConfidenceTier::from_confidence(0.80).kelly_multiplier(), 0.25);
        assert_eq!(ConfidenceTier::from_confidence(0.70).kelly_multiplier(), 0.15);
        assert_eq!(ConfidenceTier::from_confidence(0.55).kelly_multiplier(), 0.10);
    }

    #[test]
    fn rejects_non_finite_and_out_of_range_inputs() {
        let (weights, config) = defaults();

        let nan = FactorInputs {
            offensive_efficiency_diff: f64::NAN,
            ..neutral_inputs()
        };
        assert!(predict(&nan, &weights, &config).is_err());

        let oversized_signal = FactorInputs {
            sharp_consensus: 1.8,
            ..neutral_inputs()
        };
        assert!(predict(&oversized_signal, &weights, &config).is_err());
    }
}
