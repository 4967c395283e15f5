// src/config/options.rs
use std::path::PathBuf;
use std::time::Duration;

use super::consts::*;
use crate::errors::{RelayError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayOptions {
    pub source: SourceOptions,
    pub sink: SinkOptions,
    pub state: StateOptions,
    pub window_days: u32,
    pub force_check: bool,
    pub pace: Duration,
    pub http_timeout: Duration,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            source: SourceOptions::default(),
            sink: SinkOptions::default(),
            state: StateOptions::default(),
            window_days: DEFAULT_WINDOW_DAYS,
            force_check: false,
            pace: Duration::from_millis(DELIVERY_PAUSE_MS),
            http_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
        }
    }
}

/* ---------------- Source ---------------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    /// Service-account JSON given inline (GOOGLE_SHEETS_CREDENTIALS).
    Inline(String),
    /// Service-account JSON file on disk.
    File(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Google(Credentials),
    /// `<dir>/<sheet name>.csv`, header row first.
    CsvDir(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceOptions {
    pub kind: SourceKind,
    pub sheet_name: String,
    /// Open by spreadsheet key instead of by title.
    pub sheet_id: Option<String>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            kind: SourceKind::Google(Credentials::File(PathBuf::from(CREDENTIALS_FILE))),
            sheet_name: s!(DEFAULT_SHEET_NAME),
            sheet_id: None,
        }
    }
}

impl SourceOptions {
    /// Identifier handed to `SpreadsheetClient::open`.
    pub fn identifier(&self) -> &str {
        self.sheet_id.as_deref().unwrap_or(&self.sheet_name)
    }
}

/* ---------------- Sink ---------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkKind {
    Form,
    Sheet,
    /// Form POST, form GET, then sheet append as the last fallback.
    FormThenSheet,
}

impl SinkKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "form" => Some(SinkKind::Form),
            "sheet" => Some(SinkKind::Sheet),
            "form+sheet" | "both" => Some(SinkKind::FormThenSheet),
            _ => None,
        }
    }
    pub fn uses_form(self) -> bool { matches!(self, SinkKind::Form | SinkKind::FormThenSheet) }
    pub fn uses_sheet(self) -> bool { matches!(self, SinkKind::Sheet | SinkKind::FormThenSheet) }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkOptions {
    pub kind: SinkKind,
    pub form_url: String,
    pub name_entry: String,
    pub amount_entry: String,
    pub target_sheet: String,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            kind: SinkKind::Form,
            form_url: s!(DEFAULT_FORM_URL),
            name_entry: s!(DEFAULT_NAME_ENTRY),
            amount_entry: s!(DEFAULT_AMOUNT_ENTRY),
            target_sheet: s!(DEFAULT_TARGET_SHEET),
        }
    }
}

/* ---------------- State ---------------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateOptions {
    pub dir: PathBuf,
}

impl Default for StateOptions {
    fn default() -> Self { Self { dir: PathBuf::from(DEFAULT_STATE_DIR) } }
}

impl StateOptions {
    pub fn ledger_path(&self) -> PathBuf { self.dir.join(SENT_DATA_FILE) }
    pub fn snapshot_path(&self) -> PathBuf { self.dir.join(LAST_DATA_FILE) }
}

/* ---------------- Environment ---------------- */

impl RelayOptions {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build options from any key lookup (the process environment in production).
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut opts = RelayOptions::default();

        opts.source.kind = match get("TYFCB_SOURCE_DIR") {
            Some(dir) => SourceKind::CsvDir(PathBuf::from(dir)),
            None => match get("GOOGLE_SHEETS_CREDENTIALS") {
                Some(json) => SourceKind::Google(Credentials::Inline(json)),
                None => SourceKind::Google(Credentials::File(PathBuf::from(CREDENTIALS_FILE))),
            },
        };
        if let Some(name) = get("GOOGLE_SHEET_NAME") { opts.source.sheet_name = name; }
        opts.source.sheet_id = get("GOOGLE_SHEET_ID");

        if let Some(v) = get("FORCE_CHECK") { opts.force_check = parse_flag(&v); }
        if let Some(v) = get("TYFCB_STATE_DIR") { opts.state.dir = PathBuf::from(v); }
        if let Some(v) = get("TYFCB_WINDOW_DAYS") { opts.window_days = parse_num("TYFCB_WINDOW_DAYS", &v)?; }
        if let Some(v) = get("TYFCB_PACE_MS") {
            opts.pace = Duration::from_millis(parse_num("TYFCB_PACE_MS", &v)?);
        }
        if let Some(v) = get("TYFCB_HTTP_TIMEOUT_SECS") {
            opts.http_timeout = Duration::from_secs(parse_num("TYFCB_HTTP_TIMEOUT_SECS", &v)?);
        }

        if let Some(v) = get("TYFCB_SINK") {
            opts.sink.kind = SinkKind::parse(&v)
                .ok_or_else(|| RelayError::Configuration(format!("TYFCB_SINK: unknown sink '{v}'")))?;
        }
        if let Some(v) = get("GOOGLE_FORM_URL") { opts.sink.form_url = v; }
        if let Some(v) = get("GOOGLE_FORM_NAME_ENTRY") { opts.sink.name_entry = v; }
        if let Some(v) = get("GOOGLE_FORM_AMOUNT_ENTRY") { opts.sink.amount_entry = v; }
        if let Some(v) = get("TYFCB_TARGET_SHEET") { opts.sink.target_sheet = v; }

        Ok(opts)
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

fn parse_num<T: std::str::FromStr>(key: &str, v: &str) -> Result<T> {
    v.parse::<T>()
        .map_err(|_| RelayError::Configuration(format!("{key}: expected a non-negative integer, got '{v}'")))
}
