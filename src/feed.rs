use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::SystemTime;

use crate::newsletter;
use crate::report_fetch;
use crate::state::{Delta, ProviderCommand};

/// Spawns the provider thread that owns all network I/O. Commands arrive
/// from the UI thread; results go back as deltas. A failed command never
/// kills the loop.
pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::FetchReport { generation } => {
                    match report_fetch::fetch_latest_report() {
                        Ok(raw) => {
                            let report = report_fetch::parse_report_markdown(&raw);
                            let _ = tx.send(Delta::SetReport {
                                generation,
                                raw,
                                report,
                                fetched_at: SystemTime::now(),
                            });
                        }
                        Err(err) => {
                            let _ = tx.send(Delta::FetchFailed {
                                generation,
                                message: format!("{err:#}"),
                            });
                        }
                    }
                }
                ProviderCommand::DownloadCsv => match report_fetch::download_csv() {
                    Ok(path) => {
                        let _ = tx.send(Delta::CsvSaved { path });
                    }
                    Err(err) => {
                        let _ = tx.send(Delta::CsvFailed {
                            message: format!("{err:#}"),
                        });
                    }
                },
                ProviderCommand::Subscribe {
                    email,
                    location,
                    terms,
                } => {
                    let result = newsletter::subscribe(&email, &location, terms)
                        .map_err(|err| format!("{err:#}"));
                    let _ = tx.send(Delta::SubscribeResult { result });
                }
            }
        }
    });
}
