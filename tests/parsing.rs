use std::fs;
use std::path::PathBuf;

use edgefinder_terminal::report_fetch::parse_report_markdown;
use edgefinder_terminal::state::{ReportVariant, SectionKind};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_newsletter_fixture() {
    let raw = read_fixture("newsletter_report.md");
    let report = parse_report_markdown(&raw);

    assert_eq!(report.variant, ReportVariant::Newsletter);
    assert_eq!(report.summary.games, Some(10));
    assert_eq!(report.summary.markets, Some(20));
    assert_eq!(report.summary.books, Some(5));
    assert_eq!(
        report.summary.last_updated.as_deref(),
        Some("2024-01-01T00:00:00Z")
    );

    let discrepancies = report
        .section(SectionKind::BiggestDiscrepancies)
        .expect("section present");
    assert_eq!(discrepancies.rows.len(), 3);

    let first = &discrepancies.rows[0];
    assert_eq!(first.rank, "1");
    assert_eq!(first.sport, "NBA");
    assert_eq!(first.game, "Lakers @ Warriors");
    assert_eq!(first.start_time, "2024-01-01 07:30 PM PST");
    assert_eq!(first.pred_prob.as_deref(), Some("0.565"));
    assert_eq!(first.books.as_deref(), Some("0.610/0.642/0.675"));
    assert_eq!(first.discrepancy, "0.110");
    assert_eq!(first.volume, "2,500");
    assert_eq!(first.payout.as_deref(), Some("1.8x"));

    // Source order preserved.
    assert_eq!(discrepancies.rows[1].rank, "2");
    assert_eq!(discrepancies.rows[2].rank, "3");

    // Empty interior cell survives as an empty string.
    assert_eq!(discrepancies.rows[2].books.as_deref(), Some(""));

    let most_bet = report.section(SectionKind::MostBet).expect("section present");
    assert_eq!(most_bet.rows.len(), 2);
    assert_eq!(most_bet.rows[1].game, "Seahawks @ 49ers");
}

#[test]
fn parses_newsletter_highlight_block() {
    let raw = read_fixture("newsletter_report.md");
    let report = parse_report_markdown(&raw);

    let pick = report.highlight.expect("highlight present");
    assert_eq!(pick.game, "Seahawks @ 49ers");
    assert_eq!(pick.details.len(), 5);
    assert_eq!(pick.details[0].label, "Prediction Market");
    assert_eq!(pick.details[0].value, "41.0%");
    assert_eq!(pick.details[4].label, "Payout Ratio");
    assert_eq!(pick.details[4].value, "2.4x");
}

#[test]
fn parses_comparison_fixture() {
    let raw = read_fixture("comparison_report.md");
    let report = parse_report_markdown(&raw);

    assert_eq!(report.variant, ReportVariant::Comparison);
    assert_eq!(report.summary.games, Some(24));
    assert_eq!(report.summary.markets, None);
    assert_eq!(report.summary.books, None);
    assert_eq!(
        report.summary.last_updated.as_deref(),
        Some("2024-01-02 09:15 AM PST")
    );

    let comparison = report
        .section(SectionKind::Comparison)
        .expect("section present");
    assert_eq!(comparison.rows.len(), 3);

    let first = &comparison.rows[0];
    assert_eq!(first.rank, "1");
    assert_eq!(first.robinhood_away.as_deref(), Some("43.5%"));
    assert_eq!(first.sportsbook_away.as_deref(), Some("+130"));
    assert_eq!(first.away_payout.as_deref(), Some("2.3x"));
    assert_eq!(first.robinhood_home.as_deref(), Some("56.5%"));
    assert_eq!(first.sportsbook_home.as_deref(), Some("-150"));
    assert_eq!(first.home_payout.as_deref(), Some("1.8x"));
    assert_eq!(first.volume, "2,500");
    assert_eq!(first.discrepancy, "11.0%");
}

#[test]
fn comparison_highlight_keeps_last_bolded_game() {
    let raw = read_fixture("comparison_report.md");
    let report = parse_report_markdown(&raw);

    // Two bolded games appear under Seattle Games; the later one replaces
    // the earlier and only its details are kept.
    let pick = report.highlight.expect("highlight present");
    assert_eq!(pick.game, "Seahawks @ 49ers");
    assert_eq!(pick.details.len(), 3);
    assert_eq!(pick.details[0].label, "Robinhood Seahawks");
    assert_eq!(pick.details[0].value, "41.0% (2.4x payout)");
}

#[test]
fn header_and_separator_rows_are_not_data() {
    let raw = read_fixture("newsletter_report.md");
    let report = parse_report_markdown(&raw);

    for section in &report.sections {
        for row in &section.rows {
            assert_ne!(row.rank, "Rank");
            assert!(!row.rank.chars().all(|ch| ch == '-'));
        }
    }
}

#[test]
fn rows_before_any_section_header_are_discarded() {
    let doc = "\
| 1 | NBA | A @ B | t | 0.5 | 0.4/0.5/0.6 | 0.12 | 900 | 2.0x |

## Biggest Discrepancies

| 2 | NFL | C @ D | t | 0.4 | 0.3/0.4/0.5 | 0.08 | 800 | 2.5x |
";
    let report = parse_report_markdown(doc);
    let section = report
        .section(SectionKind::BiggestDiscrepancies)
        .expect("section present");
    assert_eq!(section.rows.len(), 1);
    assert_eq!(section.rows[0].rank, "2");
}

#[test]
fn short_rows_are_skipped() {
    let doc = "\
## Biggest Discrepancies

| 1 | NBA | A @ B | t | 0.5 |
| 2 | NFL | C @ D | t | 0.4 | 0.3/0.4/0.5 | 0.08 | 800 | 2.5x |
";
    let report = parse_report_markdown(doc);
    let section = report
        .section(SectionKind::BiggestDiscrepancies)
        .expect("section present");
    assert_eq!(section.rows.len(), 1);
    assert_eq!(section.rows[0].rank, "2");
}

#[test]
fn highlight_outside_highlight_section_is_ignored() {
    let doc = "\
## Most Bet

**Seahawks @ 49ers**

- **Prediction Market:** 41.0%
";
    let report = parse_report_markdown(doc);
    assert!(report.highlight.is_none());
}

#[test]
fn summary_wording_variations_still_extract() {
    let doc = "**Summary:** 12 matched games, 30 Robinhood markets, 8 sportsbook odds\n";
    let report = parse_report_markdown(doc);
    assert_eq!(report.summary.games, Some(12));
    assert_eq!(report.summary.markets, Some(30));
    assert_eq!(report.summary.books, Some(8));
}

#[test]
fn unparseable_summary_leaves_fields_absent() {
    let doc = "**Summary:** no numbers here\n**Generated:** sometime\n";
    let report = parse_report_markdown(doc);
    assert_eq!(report.summary.games, None);
    assert_eq!(report.summary.markets, None);
    assert_eq!(report.summary.books, None);
    assert_eq!(report.summary.last_updated.as_deref(), Some("sometime"));
}

#[test]
fn document_without_headers_yields_empty_report() {
    let doc = "just some prose\nwith no sections at all\n";
    let report = parse_report_markdown(doc);
    assert!(report.sections.iter().all(|s| s.rows.is_empty()));
    assert!(report.highlight.is_none());
    assert_eq!(report.summary.games, None);
}

#[test]
fn empty_document_yields_empty_report() {
    let report = parse_report_markdown("");
    assert_eq!(report.variant, ReportVariant::Newsletter);
    assert!(report.sections.iter().all(|s| s.rows.is_empty()));
    assert!(report.highlight.is_none());
}
