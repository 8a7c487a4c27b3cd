use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::report_fetch::parse_report_markdown;
use crate::state::AppState;

const CACHE_DIR: &str = "edgefinder_terminal";
const CACHE_FILE: &str = "last_report.json";
const CACHE_VERSION: u32 = 1;

// The cache stores the raw markdown rather than the parsed report, so a
// parser change never invalidates it; the document is re-parsed on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReportCache {
    version: u32,
    raw: String,
    fetched_at: u64,
}

pub fn load_into_state(state: &mut AppState) {
    let Some(path) = cache_path() else {
        return;
    };
    let Ok(raw) = fs::read_to_string(&path) else {
        return;
    };
    let Ok(cache) = serde_json::from_str::<ReportCache>(&raw) else {
        return;
    };
    if cache.version != CACHE_VERSION {
        return;
    }

    state.report = Some(parse_report_markdown(&cache.raw));
    state.raw_report = Some(cache.raw);
    state.fetched_at = system_time_from_secs(cache.fetched_at);
    state.push_log("[INFO] Loaded cached report from disk");
}

pub fn save_from_state(state: &AppState) {
    let Some(raw) = state.raw_report.as_ref() else {
        return;
    };
    let Some(path) = cache_path() else {
        return;
    };
    let Some(dir) = path.parent() else {
        return;
    };
    let _ = fs::create_dir_all(dir);

    let cache = ReportCache {
        version: CACHE_VERSION,
        raw: raw.clone(),
        fetched_at: state
            .fetched_at
            .and_then(system_time_to_secs)
            .unwrap_or_default(),
    };
    if let Ok(json) = serde_json::to_string(&cache) {
        let tmp = path.with_extension("json.tmp");
        if fs::write(&tmp, json).is_ok() {
            let _ = fs::rename(&tmp, &path);
        }
    }
}

fn cache_path() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR).join(CACHE_FILE));
        }
    }
    // Fallback to ~/.cache on linux-like systems.
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(CACHE_DIR)
            .join(CACHE_FILE),
    )
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

fn system_time_from_secs(secs: u64) -> Option<SystemTime> {
    UNIX_EPOCH.checked_add(std::time::Duration::from_secs(secs))
}
