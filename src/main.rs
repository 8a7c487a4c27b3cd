use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use edgefinder_terminal::state::{
    AppState, Delta, GameRow, ProviderCommand, ReportVariant, RowOrder, Severity, SubscribeStatus,
    apply_delta, classify_discrepancy, classify_volume, section_label, volume_ranked,
};
use edgefinder_terminal::{fake_feed, feed, persist};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    report_refresh: Duration,
    last_report_refresh: Option<Instant>,
    issued_generation: u64,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        let report_refresh = std::env::var("REPORT_POLL_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(300)
            .max(30);
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
            report_refresh: Duration::from_secs(report_refresh),
            last_report_refresh: None,
            issued_generation: 0,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.subscribe_active {
            self.on_subscribe_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_report(true),
            KeyCode::Char('e') | KeyCode::Char('E') => self.request_csv(),
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.state.subscribe_active = true;
                self.state.subscribe_status = None;
            }
            KeyCode::Char('s') => self.state.toggle_row_order(),
            KeyCode::Tab => self.state.cycle_section(),
            KeyCode::Char('1') => self.state.set_section(0),
            KeyCode::Char('2') => self.state.set_section(1),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn on_subscribe_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.subscribe_active = false;
                self.state.subscribe_input.clear();
            }
            KeyCode::Enter => {
                let email = self.state.subscribe_input.trim().to_string();
                if email.is_empty() {
                    return;
                }
                self.submit_subscription(email);
                self.state.subscribe_active = false;
                self.state.subscribe_input.clear();
            }
            KeyCode::Backspace => {
                self.state.subscribe_input.pop();
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() && self.state.subscribe_input.len() < 120 {
                    self.state.subscribe_input.push(ch);
                }
            }
            _ => {}
        }
    }

    fn request_report(&mut self, announce: bool) {
        let Some(tx) = &self.cmd_tx else {
            if announce {
                self.state.push_log("[INFO] Report fetch unavailable");
            }
            return;
        };
        self.issued_generation += 1;
        self.last_report_refresh = Some(Instant::now());
        if tx
            .send(ProviderCommand::FetchReport {
                generation: self.issued_generation,
            })
            .is_err()
        {
            self.state.push_log("[WARN] Report request failed");
            return;
        }
        self.state.loading = true;
        if announce {
            self.state.push_log("[INFO] Refreshing report");
        }
    }

    fn request_csv(&mut self) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] CSV export unavailable");
            return;
        };
        if tx.send(ProviderCommand::DownloadCsv).is_err() {
            self.state.push_log("[WARN] CSV request failed");
        } else {
            self.state.push_log("[INFO] CSV download requested");
        }
    }

    fn submit_subscription(&mut self, email: String) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Newsletter service unavailable");
            return;
        };
        let location = std::env::var("NEWSLETTER_LOCATION")
            .ok()
            .filter(|val| !val.trim().is_empty())
            .unwrap_or_else(|| "Seattle, WA".to_string());
        if tx
            .send(ProviderCommand::Subscribe {
                email,
                location,
                terms: true,
            })
            .is_err()
        {
            self.state.push_log("[WARN] Subscribe request failed");
        } else {
            self.state.push_log("[INFO] Subscribe request sent");
        }
    }

    fn maybe_refresh_report(&mut self) {
        let due = match self.last_report_refresh {
            Some(last) => last.elapsed() >= self.report_refresh,
            None => true,
        };
        if due {
            self.request_report(false);
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    if demo_feed_enabled() {
        fake_feed::spawn_fake_provider(tx, cmd_rx);
    } else {
        feed::spawn_provider(tx, cmd_rx);
    }

    let mut app = App::new(Some(cmd_tx));
    persist::load_into_state(&mut app.state);
    let res = run_app(&mut terminal, &mut app, rx);
    persist::save_from_state(&app.state);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn demo_feed_enabled() -> bool {
    std::env::var("DEMO_FEED")
        .map(|val| val == "1" || val.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.maybe_refresh_report();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(38)])
        .split(chunks[1]);

    render_table(frame, body[0], &app.state);
    render_side_panel(frame, body[1], &app.state);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }

    if app.state.subscribe_active {
        render_subscribe_overlay(frame, frame.size(), &app.state);
    }
}

fn header_text(state: &AppState) -> String {
    let section = state
        .active_section_view()
        .map(|s| section_label(s.kind))
        .unwrap_or("No data");
    let order = match state.row_order {
        RowOrder::Source => "SOURCE",
        RowOrder::Volume => "VOLUME",
    };
    let refreshing = if state.loading { " | refreshing…" } else { "" };
    let line1 = format!("EDGEFINDER | {section} | Sort: {order}{refreshing}");
    let line2 = summary_text(state);
    format!("{line1}\n{line2}")
}

fn summary_text(state: &AppState) -> String {
    let Some(report) = &state.report else {
        return "Games - | Markets - | Books - | Updated -".to_string();
    };
    let summary = &report.summary;
    format!(
        "Games {} | Markets {} | Books {} | Updated {}",
        dash_or_u32(summary.games),
        dash_or_u32(summary.markets),
        dash_or_u32(summary.books),
        summary.last_updated.as_deref().unwrap_or("-"),
    )
}

fn dash_or_u32(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn footer_text(state: &AppState) -> String {
    if state.subscribe_active {
        "Type email | Enter Submit | Esc Cancel".to_string()
    } else {
        "r Refresh | Tab/1/2 Section | s Sort | j/k Move | e CSV | n Subscribe | ? Help | q Quit"
            .to_string()
    }
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_table(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let Some(report) = &state.report else {
        let empty = Paragraph::new("No report yet — waiting for first fetch")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, sections[1]);
        return;
    };
    let variant = report.variant;
    let widths: &[Constraint] = match variant {
        ReportVariant::Newsletter => &NEWSLETTER_COLUMNS,
        ReportVariant::Comparison => &COMPARISON_COLUMNS,
    };
    render_table_header(frame, sections[0], variant, widths);

    let list_area = sections[1];
    let Some(section) = state.active_section_view() else {
        return;
    };
    if section.rows.is_empty() {
        let empty = Paragraph::new("No rows in this section")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }
    if list_area.height == 0 {
        return;
    }

    // Render-local ordering; the parsed report keeps source order.
    let ordered: Vec<(String, &GameRow)> = match state.row_order {
        RowOrder::Source => section
            .rows
            .iter()
            .map(|row| (row.rank.clone(), row))
            .collect(),
        RowOrder::Volume => volume_ranked(&section.rows)
            .into_iter()
            .map(|(rank, row)| (rank.to_string(), row))
            .collect(),
    };

    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.selected, ordered.len(), visible);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };

        let selected = idx == state.selected;
        let row_style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        let (rank, row) = &ordered[idx];
        match variant {
            ReportVariant::Newsletter => {
                render_cell_text(frame, cols[0], rank, row_style);
                render_cell_text(frame, cols[1], &row.sport, row_style);
                render_cell_text(frame, cols[2], &row.game, row_style);
                render_cell_text(frame, cols[3], &row.start_time, row_style);
                render_cell_text(frame, cols[4], opt_cell(&row.pred_prob), row_style);
                render_cell_text(frame, cols[5], opt_cell(&row.books), row_style);
                render_cell_text(
                    frame,
                    cols[6],
                    &row.discrepancy,
                    severity_style(classify_discrepancy(&row.discrepancy), selected),
                );
                render_cell_text(
                    frame,
                    cols[7],
                    &row.volume,
                    severity_style(classify_volume(&row.volume), selected),
                );
                render_cell_text(frame, cols[8], opt_cell(&row.payout), row_style);
            }
            ReportVariant::Comparison => {
                render_cell_text(frame, cols[0], rank, row_style);
                render_cell_text(frame, cols[1], &row.sport, row_style);
                render_cell_text(frame, cols[2], &row.game, row_style);
                render_cell_text(frame, cols[3], &row.start_time, row_style);
                render_cell_text(frame, cols[4], &side_cell(row, true), row_style);
                render_cell_text(frame, cols[5], &side_cell(row, false), row_style);
                render_cell_text(
                    frame,
                    cols[6],
                    &row.volume,
                    severity_style(classify_volume(&row.volume), selected),
                );
                render_cell_text(
                    frame,
                    cols[7],
                    &row.discrepancy,
                    severity_style(classify_discrepancy(&row.discrepancy), selected),
                );
            }
        }
    }
}

const NEWSLETTER_COLUMNS: [Constraint; 9] = [
    Constraint::Length(5),
    Constraint::Length(6),
    Constraint::Min(18),
    Constraint::Length(20),
    Constraint::Length(8),
    Constraint::Length(19),
    Constraint::Length(8),
    Constraint::Length(8),
    Constraint::Length(7),
];

const COMPARISON_COLUMNS: [Constraint; 8] = [
    Constraint::Length(5),
    Constraint::Length(6),
    Constraint::Min(18),
    Constraint::Length(10),
    Constraint::Length(17),
    Constraint::Length(17),
    Constraint::Length(8),
    Constraint::Length(8),
];

fn render_table_header(
    frame: &mut Frame,
    area: Rect,
    variant: ReportVariant,
    widths: &[Constraint],
) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);
    let style = Style::default().add_modifier(Modifier::BOLD);

    let labels: &[&str] = match variant {
        ReportVariant::Newsletter => &[
            "Rank", "Sport", "Game", "Start", "Pred", "Books m/a/M", "Disc", "Vol", "Payout",
        ],
        ReportVariant::Comparison => &[
            "Rank", "Sport", "Game", "Time", "Away RH/SB/pay", "Home RH/SB/pay", "Vol", "Disc",
        ],
    };
    for (idx, label) in labels.iter().enumerate() {
        render_cell_text(frame, cols[idx], label, style);
    }
}

fn opt_cell(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn side_cell(row: &GameRow, away: bool) -> String {
    let (prob, odds, payout) = if away {
        (&row.robinhood_away, &row.sportsbook_away, &row.away_payout)
    } else {
        (&row.robinhood_home, &row.sportsbook_home, &row.home_payout)
    };
    format!(
        "{} {} {}",
        opt_cell(prob),
        opt_cell(odds),
        opt_cell(payout)
    )
}

fn severity_style(severity: Severity, selected: bool) -> Style {
    let color = match severity {
        Severity::High => Color::Red,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Green,
    };
    let style = Style::default().fg(color);
    if selected {
        style.bg(Color::DarkGray)
    } else {
        style
    }
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, area);
}

fn render_side_panel(frame: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(5)])
        .split(area);

    let pick_text = match state.report.as_ref().and_then(|r| r.highlight.as_ref()) {
        Some(pick) => {
            let mut lines = vec![pick.game.clone(), String::new()];
            for detail in &pick.details {
                lines.push(format!("{}: {}", detail.label, detail.value));
            }
            lines.join("\n")
        }
        None => "No Seattle team games found in current data.".to_string(),
    };
    let pick = Paragraph::new(pick_text)
        .block(Block::default().title("Hometown Pick").borders(Borders::ALL));
    frame.render_widget(pick, chunks[0]);

    let status_text = match &state.subscribe_status {
        Some(SubscribeStatus::Success(msg)) => format!("✔ {msg}"),
        Some(SubscribeStatus::Error(msg)) => format!("✘ {msg}"),
        None => "n to subscribe".to_string(),
    };
    let status_style = match &state.subscribe_status {
        Some(SubscribeStatus::Success(_)) => Style::default().fg(Color::Green),
        Some(SubscribeStatus::Error(_)) => Style::default().fg(Color::Red),
        None => Style::default().fg(Color::DarkGray),
    };
    let status = Paragraph::new(status_text)
        .style(status_style)
        .block(Block::default().title("Newsletter").borders(Borders::ALL));
    frame.render_widget(status, chunks[1]);
}

fn render_subscribe_overlay(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup_area = centered_rect(50, 20, area);
    frame.render_widget(Clear, popup_area);

    let text = format!("Email: {}_", state.subscribe_input);
    let input = Paragraph::new(text).block(
        Block::default()
            .title("Subscribe to newsletter")
            .borders(Borders::ALL),
    );
    frame.render_widget(input, popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "EdgeFinder Terminal - Help",
        "",
        "  r            Refresh report now",
        "  Tab / 1 / 2  Switch section",
        "  s            Toggle source/volume ordering",
        "  j/k or ↑/↓   Move selection",
        "  e            Download CSV export",
        "  n            Subscribe to newsletter",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Reports auto-refresh every REPORT_POLL_SECS (default 300s).",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
