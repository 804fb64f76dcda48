//! Integration tests for the Poisson score-distribution model.

use linesight::domain::ScoreDistribution;

#[test]
fn football_rates_capture_the_grid() {
    let dist = ScoreDistribution::new(24.0, 20.0, 70).unwrap();

    let outcomes = dist.outcome_probabilities();
    assert!((outcomes.win + outcomes.tie + outcomes.loss - 1.0).abs() < 1e-6);
    assert!((dist.grid_mass() - 1.0).abs() < 1e-4);
}

#[test]
fn outcome_probabilities_respect_rate_ordering() {
    let home_favored = ScoreDistribution::new(27.0, 17.0, 70).unwrap();
    let outcomes = home_favored.outcome_probabilities();
    assert!(outcomes.win > 0.8);
    assert!(outcomes.loss < 0.2);

    let mirrored = ScoreDistribution::new(17.0, 27.0, 70).unwrap();
    let flipped = mirrored.outcome_probabilities();
    assert!((outcomes.win - flipped.loss).abs() < 1e-12);
    assert!((outcomes.tie - flipped.tie).abs() < 1e-12);
}

#[test]
fn over_under_brackets_the_mean() {
    let dist = ScoreDistribution::new(24.0, 20.0, 70).unwrap();

    let low = dist.total_line(30.5).unwrap();
    assert!(low.over > 0.95);

    let high = dist.total_line(60.5).unwrap();
    assert!(high.under > 0.95);

    // Over/under must partition the grid mass with a half-point line.
    for line in [30.5, 43.5, 60.5] {
        let split = dist.total_line(line).unwrap();
        assert_eq!(split.push, 0.0);
        assert!((split.over + split.under - dist.grid_mass()).abs() < 1e-9);
    }
}

#[test]
fn top_scores_are_consistent_with_the_grid() {
    let dist = ScoreDistribution::new(24.0, 20.0, 70).unwrap();
    let top = dist.top_scores(10);
    assert_eq!(top.len(), 10);

    // The ranked probabilities must match direct grid lookups.
    for score in &top {
        let direct = dist.probability(score.home as usize, score.away as usize);
        assert!((score.probability - direct).abs() < 1e-15);
    }

    // The most likely score should sit near the modes of the marginals.
    let best = &top[0];
    assert!((best.home as f64 - 24.0).abs() <= 1.0);
    assert!((best.away as f64 - 20.0).abs() <= 1.0);
}

#[test]
fn truncation_error_is_monotone_in_cutoff() {
    let errors: Vec<f64> = [30, 40, 50, 70]
        .iter()
        .map(|&cutoff| {
            ScoreDistribution::new(24.0, 20.0, cutoff)
                .unwrap()
                .truncation_error()
        })
        .collect();
    for pair in errors.windows(2) {
        assert!(pair[0] >= pair[1]);
    }
    assert!(errors[0] > errors[3]);
}

#[test]
fn soccer_rates_work_at_small_cutoffs() {
    // Low-scoring sports need far smaller grids.
    let dist = ScoreDistribution::new(1.4, 1.1, 10).unwrap();
    assert!(dist.truncation_error() < 1e-6);

    let outcomes = dist.outcome_probabilities();
    // Ties are a big slice of soccer outcomes.
    assert!(outcomes.tie > 0.2);
}
