use anyhow::{Context, Result, bail};
use chrono::Local;

use crate::http_client::{api_url, http_client};
use crate::state::{
    GameRow, HighlightDetail, HighlightPick, Report, ReportVariant, SectionKind,
};

// Section header prefixes emitted by the report generators. Matching is on
// literal prefix, emoji markers included.
const HDR_DISCREPANCIES: &str = "## Biggest Discrepancies";
const HDR_MOST_BET: &str = "## Most Bet";
const HDR_HOMETOWN: &str = "## 🏠 Hometown Favorite: Seattle";
const HDR_SPORTS_SUMMARY: &str = "## 🏆 Sports Summary";
const HDR_SEATTLE_GAMES: &str = "## 🏠 Seattle Games";
const HDR_COMPARISON: &str = "## 📊 Robinhood vs Sportsbooks Comparison";

const MARK_SUMMARY: &str = "**Summary:**";
const MARK_TOTAL_GAMES: &str = "**Total Games:**";
const MARK_GENERATED: &str = "**Generated:**";

// Reserved first cell of a table header row.
const HEADER_KEYWORD: &str = "Rank";

const MIN_CELLS_NEWSLETTER: usize = 9;
const MIN_CELLS_COMPARISON: usize = 12;

pub fn fetch_latest_report() -> Result<String> {
    let client = http_client()?;
    let url = api_url("/api/latest");
    let resp = client.get(&url).send().context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        bail!("http {status}: {body}");
    }
    Ok(body)
}

/// Downloads the CSV export next to the report and writes it to a
/// timestamped file. Returns the path written.
pub fn download_csv() -> Result<String> {
    let client = http_client()?;
    let url = api_url("/api/csv");
    let resp = client.get(&url).send().context("request failed")?;
    let status = resp.status();
    if !status.is_success() {
        bail!("http {status}");
    }
    let bytes = resp.bytes().context("failed reading body")?;

    let dir = std::env::var("CSV_EXPORT_DIR").unwrap_or_else(|_| ".".to_string());
    let name = format!("edgefinder_{}.csv", Local::now().format("%Y%m%d_%H%M%S"));
    let path = std::path::Path::new(&dir).join(name);
    std::fs::write(&path, &bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(path.display().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveSection {
    Rows(SectionKind),
    Highlight,
    Prose,
}

/// Parses a report document. Never fails: malformed or unrecognized lines
/// are skipped and the result degrades to partial or empty contents.
pub fn parse_report_markdown(raw: &str) -> Report {
    let variant = detect_variant(raw);
    let mut report = Report::empty(variant);
    let min_cells = match variant {
        ReportVariant::Newsletter => MIN_CELLS_NEWSLETTER,
        ReportVariant::Comparison => MIN_CELLS_COMPARISON,
    };

    let mut current: Option<ActiveSection> = None;

    for line in raw.lines() {
        if let Some(section) = match_section_header(line, variant) {
            current = Some(section);
            continue;
        }

        if let Some(rest) = line.find(MARK_SUMMARY).map(|idx| &line[idx..]) {
            let numbers = extract_ints(rest);
            report.summary.games = numbers.first().copied();
            report.summary.markets = numbers.get(1).copied();
            report.summary.books = numbers.get(2).copied();
            continue;
        }
        if let Some(rest) = line.strip_prefix(MARK_TOTAL_GAMES) {
            report.summary.games = extract_ints(rest).first().copied();
            continue;
        }
        if let Some(rest) = line.strip_prefix(MARK_GENERATED) {
            let trimmed = rest.trim();
            if !trimmed.is_empty() {
                report.summary.last_updated = Some(trimmed.to_string());
            }
            continue;
        }

        if let Some(cells) = split_table_row(line) {
            let Some(ActiveSection::Rows(kind)) = current else {
                continue;
            };
            if cells.len() < min_cells || cells[0] == HEADER_KEYWORD {
                continue;
            }
            let row = match variant {
                ReportVariant::Newsletter => newsletter_row(&cells),
                ReportVariant::Comparison => comparison_row(&cells),
            };
            if let Some(section) = report.section_mut(kind) {
                section.rows.push(row);
            }
            continue;
        }

        if current == Some(ActiveSection::Highlight) {
            if line.starts_with("**") && line.contains('@') {
                if let Some(game) = bold_inner(line) {
                    report.highlight = Some(HighlightPick {
                        game: game.to_string(),
                        details: Vec::new(),
                    });
                }
                continue;
            }
            if let Some((label, value)) = parse_detail_line(line) {
                if let Some(pick) = report.highlight.as_mut() {
                    pick.details.push(HighlightDetail { label, value });
                }
            }
        }
    }

    report
}

fn detect_variant(raw: &str) -> ReportVariant {
    if raw.contains(MARK_TOTAL_GAMES)
        || raw.contains(HDR_COMPARISON)
        || raw.contains(HDR_SPORTS_SUMMARY)
        || raw.contains(HDR_SEATTLE_GAMES)
    {
        ReportVariant::Comparison
    } else {
        ReportVariant::Newsletter
    }
}

fn match_section_header(line: &str, variant: ReportVariant) -> Option<ActiveSection> {
    match variant {
        ReportVariant::Newsletter => {
            if line.starts_with(HDR_DISCREPANCIES) {
                Some(ActiveSection::Rows(SectionKind::BiggestDiscrepancies))
            } else if line.starts_with(HDR_MOST_BET) {
                Some(ActiveSection::Rows(SectionKind::MostBet))
            } else if line.starts_with(HDR_HOMETOWN) {
                Some(ActiveSection::Highlight)
            } else {
                None
            }
        }
        ReportVariant::Comparison => {
            if line.starts_with(HDR_COMPARISON) {
                Some(ActiveSection::Rows(SectionKind::Comparison))
            } else if line.starts_with(HDR_SEATTLE_GAMES) {
                Some(ActiveSection::Highlight)
            } else if line.starts_with(HDR_SPORTS_SUMMARY) {
                Some(ActiveSection::Prose)
            } else {
                None
            }
        }
    }
}

/// Splits a candidate table row into trimmed cells, dropping the empty
/// leading/trailing cells produced by the outer pipes. Returns None for
/// non-row lines and for header separator filler.
fn split_table_row(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if !trimmed.starts_with('|') {
        return None;
    }
    if trimmed[1..].find('|').is_none() {
        return None;
    }
    if trimmed
        .chars()
        .all(|ch| matches!(ch, '|' | '-' | ':' | ' '))
    {
        return None;
    }

    let mut cells: Vec<String> = trimmed.split('|').map(|cell| cell.trim().to_string()).collect();
    while cells.first().is_some_and(|cell| cell.is_empty()) {
        cells.remove(0);
    }
    while cells.last().is_some_and(|cell| cell.is_empty()) {
        cells.pop();
    }
    if cells.is_empty() {
        return None;
    }
    Some(cells)
}

fn newsletter_row(cells: &[String]) -> GameRow {
    GameRow {
        rank: cells[0].clone(),
        sport: cells[1].clone(),
        game: cells[2].clone(),
        start_time: cells[3].clone(),
        pred_prob: Some(cells[4].clone()),
        books: Some(cells[5].clone()),
        discrepancy: cells[6].clone(),
        volume: cells[7].clone(),
        payout: Some(cells[8].clone()),
        ..GameRow::default()
    }
}

fn comparison_row(cells: &[String]) -> GameRow {
    GameRow {
        rank: cells[0].clone(),
        sport: cells[1].clone(),
        game: cells[2].clone(),
        start_time: cells[3].clone(),
        robinhood_away: Some(cells[4].clone()),
        sportsbook_away: Some(cells[5].clone()),
        away_payout: Some(cells[6].clone()),
        robinhood_home: Some(cells[7].clone()),
        sportsbook_home: Some(cells[8].clone()),
        home_payout: Some(cells[9].clone()),
        volume: cells[10].clone(),
        discrepancy: cells[11].clone(),
        ..GameRow::default()
    }
}

fn extract_ints(text: &str) -> Vec<u32> {
    let mut out = Vec::new();
    let mut digits = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else if !digits.is_empty() {
            if let Ok(value) = digits.parse::<u32>() {
                out.push(value);
            }
            digits.clear();
        }
    }
    if !digits.is_empty() {
        if let Ok(value) = digits.parse::<u32>() {
            out.push(value);
        }
    }
    out
}

fn bold_inner(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("**")?;
    let end = rest.find("**")?;
    let inner = rest[..end].trim();
    if inner.is_empty() { None } else { Some(inner) }
}

fn parse_detail_line(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix("- **")?;
    let split = rest.find(":**")?;
    let label = rest[..split].trim();
    let value = rest[split + 3..].trim();
    if label.is_empty() || value.is_empty() {
        return None;
    }
    Some((label.to_string(), value.to_string()))
}
