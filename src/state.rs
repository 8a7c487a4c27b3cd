use std::collections::VecDeque;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportVariant {
    /// `**Summary:**` triple, Biggest Discrepancies / Most Bet tables,
    /// Hometown Favorite highlight block.
    Newsletter,
    /// `**Total Games:**` count, Sports Summary prose, Seattle Games
    /// highlight blocks, single 12-column comparison table.
    Comparison,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    BiggestDiscrepancies,
    MostBet,
    Comparison,
}

pub fn section_label(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::BiggestDiscrepancies => "Biggest Discrepancies",
        SectionKind::MostBet => "Most Bet",
        SectionKind::Comparison => "Robinhood vs Sportsbooks",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub games: Option<u32>,
    pub markets: Option<u32>,
    pub books: Option<u32>,
    pub last_updated: Option<String>,
}

/// One parsed table row. Cell values are kept verbatim after trimming;
/// which optional fields are present depends on the report variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameRow {
    pub rank: String,
    pub sport: String,
    pub game: String,
    pub start_time: String,
    pub volume: String,
    pub discrepancy: String,

    // Newsletter variant only.
    pub pred_prob: Option<String>,
    pub books: Option<String>,
    pub payout: Option<String>,

    // Comparison variant only.
    pub robinhood_away: Option<String>,
    pub sportsbook_away: Option<String>,
    pub away_payout: Option<String>,
    pub robinhood_home: Option<String>,
    pub sportsbook_home: Option<String>,
    pub home_payout: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub kind: SectionKind,
    pub rows: Vec<GameRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightDetail {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightPick {
    pub game: String,
    pub details: Vec<HighlightDetail>,
}

/// A fully parsed report. Built fresh on every poll and replaced wholesale;
/// nothing mutates it after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub variant: ReportVariant,
    pub summary: Summary,
    pub sections: Vec<ReportSection>,
    pub highlight: Option<HighlightPick>,
}

impl Report {
    pub fn empty(variant: ReportVariant) -> Self {
        let kinds: &[SectionKind] = match variant {
            ReportVariant::Newsletter => {
                &[SectionKind::BiggestDiscrepancies, SectionKind::MostBet]
            }
            ReportVariant::Comparison => &[SectionKind::Comparison],
        };
        Self {
            variant,
            summary: Summary::default(),
            sections: kinds
                .iter()
                .map(|kind| ReportSection {
                    kind: *kind,
                    rows: Vec::new(),
                })
                .collect(),
            highlight: None,
        }
    }

    pub fn section(&self, kind: SectionKind) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn section_mut(&mut self, kind: SectionKind) -> Option<&mut ReportSection> {
        self.sections.iter_mut().find(|s| s.kind == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// Severity band for a discrepancy cell. Accepts a bare decimal ("0.12")
/// or a percentage string ("12%"); anything unparseable lands in Low.
pub fn classify_discrepancy(raw: &str) -> Severity {
    let trimmed = raw.trim();
    let (number, is_percent) = match trimmed.strip_suffix('%') {
        Some(rest) => (rest.trim(), true),
        None => (trimmed, false),
    };
    let Ok(mut value) = number.parse::<f64>() else {
        return Severity::Low;
    };
    if is_percent {
        value /= 100.0;
    }
    if value >= 0.10 {
        Severity::High
    } else if value >= 0.05 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Severity band for a volume cell ("2,500" style thousands separators).
pub fn classify_volume(raw: &str) -> Severity {
    match parse_volume(raw) {
        Some(value) if value >= 2000 => Severity::High,
        Some(value) if value >= 1000 => Severity::Medium,
        _ => Severity::Low,
    }
}

/// Leading integer of a volume cell with thousands separators removed.
pub fn parse_volume(raw: &str) -> Option<u64> {
    let cleaned = raw.trim().replace(',', "");
    let digits: &str = {
        let end = cleaned
            .char_indices()
            .find(|(_, ch)| !ch.is_ascii_digit())
            .map(|(idx, _)| idx)
            .unwrap_or(cleaned.len());
        &cleaned[..end]
    };
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u64>().ok()
}

/// Render-side view of a section re-sorted by numeric volume, descending,
/// with fresh 1-based display ranks. The parsed report is not touched.
pub fn volume_ranked(rows: &[GameRow]) -> Vec<(usize, &GameRow)> {
    let mut ordered: Vec<&GameRow> = rows.iter().collect();
    ordered.sort_by(|a, b| {
        parse_volume(&b.volume)
            .unwrap_or(0)
            .cmp(&parse_volume(&a.volume).unwrap_or(0))
    });
    ordered
        .into_iter()
        .enumerate()
        .map(|(idx, row)| (idx + 1, row))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    Source,
    Volume,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeStatus {
    Success(String),
    Error(String),
}

#[derive(Debug)]
pub struct AppState {
    pub report: Option<Report>,
    /// Generation of the newest report applied; stale fetch results carrying
    /// an older generation are dropped in `apply_delta`.
    pub report_generation: u64,
    /// Raw markdown of the last good report, kept for the disk cache.
    pub raw_report: Option<String>,
    pub fetched_at: Option<SystemTime>,
    pub loading: bool,

    pub active_section: usize,
    pub selected: usize,
    pub row_order: RowOrder,

    pub subscribe_active: bool,
    pub subscribe_input: String,
    pub subscribe_status: Option<SubscribeStatus>,

    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            report: None,
            report_generation: 0,
            raw_report: None,
            fetched_at: None,
            loading: false,
            active_section: 0,
            selected: 0,
            row_order: RowOrder::Source,
            subscribe_active: false,
            subscribe_input: String::new(),
            subscribe_status: None,
            logs: VecDeque::new(),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn active_section_view(&self) -> Option<&ReportSection> {
        self.report
            .as_ref()
            .and_then(|report| report.sections.get(self.active_section))
    }

    pub fn active_row_count(&self) -> usize {
        self.active_section_view()
            .map(|section| section.rows.len())
            .unwrap_or(0)
    }

    pub fn cycle_section(&mut self) {
        let Some(report) = &self.report else {
            return;
        };
        if report.sections.is_empty() {
            return;
        }
        self.active_section = (self.active_section + 1) % report.sections.len();
        self.selected = 0;
    }

    pub fn set_section(&mut self, index: usize) {
        let count = self
            .report
            .as_ref()
            .map(|report| report.sections.len())
            .unwrap_or(0);
        if index < count {
            self.active_section = index;
            self.selected = 0;
        }
    }

    pub fn toggle_row_order(&mut self) {
        self.row_order = match self.row_order {
            RowOrder::Source => RowOrder::Volume,
            RowOrder::Volume => RowOrder::Source,
        };
    }

    pub fn select_next(&mut self) {
        let count = self.active_row_count();
        if count > 0 && self.selected + 1 < count {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

#[derive(Debug)]
pub enum Delta {
    SetReport {
        generation: u64,
        raw: String,
        report: Report,
        fetched_at: SystemTime,
    },
    FetchFailed {
        generation: u64,
        message: String,
    },
    CsvSaved {
        path: String,
    },
    CsvFailed {
        message: String,
    },
    SubscribeResult {
        result: Result<String, String>,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchReport { generation: u64 },
    DownloadCsv,
    Subscribe {
        email: String,
        location: String,
        terms: bool,
    },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetReport {
            generation,
            raw,
            report,
            fetched_at,
        } => {
            state.loading = false;
            if generation <= state.report_generation && state.report.is_some() {
                state.push_log("[INFO] Dropped stale report response");
                return;
            }
            state.report_generation = generation;
            if state.active_section >= report.sections.len() {
                state.active_section = 0;
            }
            if state.selected
                >= report
                    .sections
                    .get(state.active_section)
                    .map(|s| s.rows.len())
                    .unwrap_or(0)
            {
                state.selected = 0;
            }
            state.report = Some(report);
            state.raw_report = Some(raw);
            state.fetched_at = Some(fetched_at);
            state.push_log("[INFO] Report updated");
        }
        Delta::FetchFailed {
            generation,
            message,
        } => {
            state.loading = false;
            if generation < state.report_generation {
                return;
            }
            state.push_log(format!("[WARN] Report fetch failed: {message}"));
        }
        Delta::CsvSaved { path } => {
            state.push_log(format!("[INFO] CSV saved to {path}"));
        }
        Delta::CsvFailed { message } => {
            state.push_log(format!("[WARN] CSV download failed: {message}"));
        }
        Delta::SubscribeResult { result } => match result {
            Ok(message) => {
                state.push_log("[INFO] Newsletter subscription accepted");
                state.subscribe_status = Some(SubscribeStatus::Success(message));
            }
            Err(message) => {
                state.push_log(format!("[WARN] Newsletter subscription failed: {message}"));
                state.subscribe_status = Some(SubscribeStatus::Error(message));
            }
        },
        Delta::Log(message) => state.push_log(message),
    }
}
