use std::fs;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, SystemTime};

use chrono::Local;
use rand::Rng;
use rand::rngs::ThreadRng;

use crate::report_fetch::parse_report_markdown;
use crate::state::{Delta, ProviderCommand};

/// Demo provider for running without a backend (DEMO_FEED=1). Serves the
/// same commands as the real provider, but answers report fetches with a
/// freshly generated newsletter-variant document.
pub fn spawn_fake_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        let _ = tx.send(Delta::Log("[INFO] Demo feed active".to_string()));

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::FetchReport { generation } => {
                    thread::sleep(Duration::from_millis(rng.gen_range(150..600)));
                    let raw = sample_report(&mut rng);
                    let report = parse_report_markdown(&raw);
                    let _ = tx.send(Delta::SetReport {
                        generation,
                        raw,
                        report,
                        fetched_at: SystemTime::now(),
                    });
                }
                ProviderCommand::DownloadCsv => {
                    let name =
                        format!("edgefinder_demo_{}.csv", Local::now().format("%Y%m%d_%H%M%S"));
                    match fs::write(&name, sample_csv(&mut rng)) {
                        Ok(()) => {
                            let _ = tx.send(Delta::CsvSaved { path: name });
                        }
                        Err(err) => {
                            let _ = tx.send(Delta::CsvFailed {
                                message: err.to_string(),
                            });
                        }
                    }
                }
                ProviderCommand::Subscribe { email, .. } => {
                    thread::sleep(Duration::from_millis(200));
                    let result = if rng.gen_bool(0.85) {
                        Ok(format!("Successfully subscribed {email}"))
                    } else {
                        Err("Email already subscribed".to_string())
                    };
                    let _ = tx.send(Delta::SubscribeResult { result });
                }
            }
        }
    });
}

const SAMPLE_GAMES: &[(&str, &str)] = &[
    ("NBA", "Lakers @ Warriors"),
    ("NBA", "Celtics @ Nuggets"),
    ("NFL", "Seahawks @ 49ers"),
    ("NFL", "Chiefs @ Bills"),
    ("NHL", "Kraken @ Canucks"),
    ("MLB", "Mariners @ Astros"),
];

fn sample_report(rng: &mut ThreadRng) -> String {
    let rows: Vec<String> = SAMPLE_GAMES
        .iter()
        .enumerate()
        .map(|(idx, (sport, game))| sample_row(rng, idx + 1, sport, game))
        .collect();

    let mut doc = Vec::new();
    doc.push("# EdgeFinder: Robinhood vs Sportsbooks".to_string());
    doc.push(String::new());
    doc.push(format!(
        "**Generated:** {}",
        Local::now().format("%Y-%m-%d %I:%M %p")
    ));
    doc.push(String::new());
    doc.push(format!(
        "**Summary:** {} matched games, {} markets, {} book odds",
        SAMPLE_GAMES.len(),
        SAMPLE_GAMES.len() * 2,
        rng.gen_range(3..8)
    ));
    doc.push(String::new());
    doc.push("## Biggest Discrepancies".to_string());
    doc.push(String::new());
    doc.push(TABLE_HEADER.to_string());
    doc.push(TABLE_SEPARATOR.to_string());
    doc.extend(rows.iter().cloned());
    doc.push(String::new());
    doc.push("## Most Bet".to_string());
    doc.push(String::new());
    doc.push(TABLE_HEADER.to_string());
    doc.push(TABLE_SEPARATOR.to_string());
    doc.extend(rows.iter().rev().cloned());
    doc.push(String::new());
    doc.push("## 🏠 Hometown Favorite: Seattle".to_string());
    doc.push(String::new());
    doc.push("**Seahawks @ 49ers**".to_string());
    doc.push(String::new());
    doc.push(format!(
        "- **Prediction Market:** {:.1}%",
        rng.gen_range(35.0..55.0)
    ));
    doc.push(format!(
        "- **Sportsbook Average:** {:.1}%",
        rng.gen_range(40.0..60.0)
    ));
    doc.push(format!(
        "- **Discrepancy:** {:.1}%",
        rng.gen_range(1.0..15.0)
    ));
    doc.push(format!(
        "- **Market Volume:** {}",
        format_thousands(rng.gen_range(200..4000))
    ));
    doc.push(format!("- **Payout Ratio:** {:.1}x", rng.gen_range(1.2..3.5)));
    doc.join("\n")
}

const TABLE_HEADER: &str = "| Rank | Sport | Game | Start Time | Pred Prob | Books (min/avg/max) | Discrepancy | Volume | Payout |";
const TABLE_SEPARATOR: &str = "|------|-------|------|-------------|-----------|---------------------|-------------|--------|--------|";

fn sample_row(rng: &mut ThreadRng, rank: usize, sport: &str, game: &str) -> String {
    let pred: f64 = rng.gen_range(0.25..0.75);
    let avg: f64 = (pred + rng.gen_range(-0.15..0.15)).clamp(0.05, 0.95);
    let spread: f64 = rng.gen_range(0.01..0.05);
    let discrepancy = (pred - avg).abs();
    let volume = rng.gen_range(200..4000);
    let payout = 1.0 / pred.max(0.05);
    let start = Local::now().format("%Y-%m-%d %I:%M %p");
    format!(
        "| {rank} | {sport} | {game} | {start} | {pred:.3} | {:.3}/{avg:.3}/{:.3} | {discrepancy:.3} | {} | {payout:.1}x |",
        (avg - spread).max(0.0),
        avg + spread,
        format_thousands(volume),
    )
}

fn sample_csv(rng: &mut ThreadRng) -> String {
    let mut out = String::from("rank,sport,game,prediction_prob,discrepancy,volume\n");
    for (idx, (sport, game)) in SAMPLE_GAMES.iter().enumerate() {
        out.push_str(&format!(
            "{},{sport},{game},{:.3},{:.3},{}\n",
            idx + 1,
            rng.gen_range(0.25..0.75),
            rng.gen_range(0.0..0.18),
            rng.gen_range(200..4000)
        ));
    }
    out
}

fn format_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::new();
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
