use edgefinder_terminal::state::{
    AppState, GameRow, Severity, classify_discrepancy, classify_volume, parse_volume,
    volume_ranked,
};

fn row(rank: &str, volume: &str) -> GameRow {
    GameRow {
        rank: rank.to_string(),
        volume: volume.to_string(),
        ..GameRow::default()
    }
}

#[test]
fn discrepancy_classes_accept_decimals_and_percentages() {
    assert_eq!(classify_discrepancy("0.12"), Severity::High);
    assert_eq!(classify_discrepancy("12%"), Severity::High);
    assert_eq!(classify_discrepancy("0.07"), Severity::Medium);
    assert_eq!(classify_discrepancy("7%"), Severity::Medium);
    assert_eq!(classify_discrepancy("0.02"), Severity::Low);
    assert_eq!(classify_discrepancy("2%"), Severity::Low);
}

#[test]
fn discrepancy_boundaries_are_inclusive() {
    assert_eq!(classify_discrepancy("0.10"), Severity::High);
    assert_eq!(classify_discrepancy("10%"), Severity::High);
    assert_eq!(classify_discrepancy("0.05"), Severity::Medium);
    assert_eq!(classify_discrepancy("5%"), Severity::Medium);
}

#[test]
fn unparseable_discrepancy_is_low() {
    assert_eq!(classify_discrepancy(""), Severity::Low);
    assert_eq!(classify_discrepancy("n/a"), Severity::Low);
}

#[test]
fn volume_classes_handle_thousands_separators() {
    assert_eq!(classify_volume("2,500"), Severity::High);
    assert_eq!(classify_volume("1,200"), Severity::Medium);
    assert_eq!(classify_volume("500"), Severity::Low);
    assert_eq!(classify_volume("2000"), Severity::High);
    assert_eq!(classify_volume("1000"), Severity::Medium);
}

#[test]
fn unparseable_volume_is_low() {
    assert_eq!(classify_volume(""), Severity::Low);
    assert_eq!(classify_volume("-"), Severity::Low);
}

#[test]
fn volume_parse_takes_leading_integer() {
    assert_eq!(parse_volume("1,200"), Some(1200));
    assert_eq!(parse_volume("1,200 contracts"), Some(1200));
    assert_eq!(parse_volume("none"), None);
}

#[test]
fn volume_ranked_sorts_descending_with_fresh_ranks() {
    let rows = vec![row("1", "500"), row("2", "2,500"), row("3", "1,200")];
    let ranked = volume_ranked(&rows);

    let order: Vec<(usize, &str)> = ranked
        .iter()
        .map(|(rank, row)| (*rank, row.volume.as_str()))
        .collect();
    assert_eq!(order, vec![(1, "2,500"), (2, "1,200"), (3, "500")]);

    // Source rows keep their original ranks and order.
    assert_eq!(rows[0].rank, "1");
    assert_eq!(rows[0].volume, "500");
}

#[test]
fn log_buffer_is_bounded() {
    let mut state = AppState::new();
    for i in 0..500 {
        state.push_log(format!("entry {i}"));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.back().map(String::as_str), Some("entry 499"));
}
