//! Integration tests for parlay correlation analysis.

use linesight::domain::{
    analyze_parlay, BetType, CorrelationSeverity, CorrelationTable, GameId, LegRelation,
    ParlayLeg, Selection,
};

fn leg(game: &str, bet_type: BetType, team: Option<&str>, probability: f64) -> ParlayLeg {
    ParlayLeg {
        game: GameId::from(game),
        bet_type,
        selection: Selection::Home,
        team: team.map(str::to_owned),
        probability,
    }
}

#[test]
fn same_game_spread_total_uses_configured_coefficient() {
    let legs = vec![
        leg("g1", BetType::Spread, Some("BOS"), 0.55),
        leg("g1", BetType::Total, None, 0.52),
    ];
    let report = analyze_parlay(&legs, &CorrelationTable::default()).unwrap();

    let pair = &report.pairs[0];
    assert_eq!(pair.relation, LegRelation::SameGameSpreadTotal);
    assert_eq!(pair.coefficient, 0.65);
    assert_eq!(pair.severity, CorrelationSeverity::High);

    // Positive coefficient: strictly below the naive product, still a
    // probability.
    assert!(report.adjusted_probability < report.naive_probability);
    assert!((0.0..=1.0).contains(&report.adjusted_probability));
}

#[test]
fn custom_table_overrides_defaults() {
    let table = CorrelationTable::from_entries([(LegRelation::SameGameSpreadTotal, 0.30)]);
    let legs = vec![
        leg("g1", BetType::Spread, Some("BOS"), 0.55),
        leg("g1", BetType::Total, None, 0.52),
    ];
    let report = analyze_parlay(&legs, &table).unwrap();
    assert_eq!(report.pairs[0].coefficient, 0.30);
    assert_eq!(report.pairs[0].severity, CorrelationSeverity::None);
    assert!(report.removal_suggestions.is_empty());
}

#[test]
fn four_leg_parlay_aggregates_reductions() {
    let legs = vec![
        leg("g1", BetType::Moneyline, Some("BOS"), 0.62),
        leg("g1", BetType::Spread, Some("BOS"), 0.55),
        leg("g1", BetType::Total, None, 0.52),
        leg("g2", BetType::Spread, Some("DEN"), 0.58),
    ];
    let report = analyze_parlay(&legs, &CorrelationTable::default()).unwrap();
    assert_eq!(report.pairs.len(), 6);

    let flagged: Vec<_> = report
        .pairs
        .iter()
        .filter(|p| p.severity != CorrelationSeverity::None)
        .collect();
    // ML+spread (0.85, critical) and spread+total (0.65, high).
    assert_eq!(flagged.len(), 2);

    assert!(report.value_reduction_pct > 0.0);
    assert!(report.adjusted_probability < report.naive_probability);

    // The spread leg sits in both flagged pairs; it is the first removal
    // suggestion, and the independent game-2 leg is never suggested.
    assert_eq!(report.removal_suggestions[0], 1);
    assert!(!report.removal_suggestions.contains(&3));
}

#[test]
fn reductions_are_monotone_in_coefficient() {
    let legs = vec![
        leg("g1", BetType::Spread, Some("BOS"), 0.55),
        leg("g1", BetType::Total, None, 0.52),
    ];
    let mut last = f64::MAX;
    for c in [0.2, 0.4, 0.6, 0.8] {
        let table = CorrelationTable::from_entries([(LegRelation::SameGameSpreadTotal, c)]);
        let report = analyze_parlay(&legs, &table).unwrap();
        assert!(report.adjusted_probability < last);
        last = report.adjusted_probability;
    }
}

#[test]
fn unconfigured_relations_are_independent() {
    // A table with no entries at all: every parlay passes through intact.
    let table = CorrelationTable::from_entries([]);
    let legs = vec![
        leg("g1", BetType::Moneyline, Some("BOS"), 0.62),
        leg("g1", BetType::Spread, Some("BOS"), 0.55),
    ];
    let report = analyze_parlay(&legs, &table).unwrap();
    assert!((report.adjusted_probability - report.naive_probability).abs() < 1e-15);
    assert_eq!(report.value_reduction_pct, 0.0);
}
