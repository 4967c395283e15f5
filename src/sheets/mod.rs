// src/sheets/mod.rs
//! # Spreadsheet collaborators
//!
//! The relay only needs three capabilities from a spreadsheet backend:
//!
//! ```text
//! SpreadsheetClient::open(identifier) → Workbook
//! Workbook::first_sheet()             → Worksheet
//! Worksheet::all_records()            → Vec<Row>   (header → cell)
//! Worksheet::append_row(cells)                     (sheet sink only)
//! ```
//!
//! Two backends implement them:
//! - `google` – Google Sheets over HTTPS, authenticated with a service account.
//! - `csv_dir` – a directory of `<title>.csv` files; used for offline runs and
//!   as the fixture backend in tests.
//!
//! Everything returned is owned (`Box<dyn …>`), so a workbook or worksheet can
//! outlive the call that opened it. Failures to reach or read a backend are
//! `RelayError::SourceUnavailable`.

pub mod auth;
pub mod csv_dir;
pub mod google;

use serde::Serialize;

use crate::config::options::{SourceKind, SourceOptions};
use crate::errors::Result;
use crate::record::Row;

pub use csv_dir::CsvDirClient;
pub use google::GoogleSheetsClient;

/// A cell value to append. Numbers stay numbers in backends that type cells.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn to_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self { Cell::Text(s.to_string()) }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self { Cell::Number(n) }
}

pub trait SpreadsheetClient {
    fn open(&self, identifier: &str) -> Result<Box<dyn Workbook>>;

    /// Open a workbook to write into, creating it with `headers` where the
    /// backend can. The default only opens.
    fn open_or_create(&self, title: &str, _headers: &[&str]) -> Result<Box<dyn Workbook>> {
        self.open(title)
    }
}

pub trait Workbook {
    fn title(&self) -> &str;
    fn first_sheet(&self) -> Result<Box<dyn Worksheet>>;
}

pub trait Worksheet {
    /// Every row below the header, keyed by header text.
    fn all_records(&self) -> Result<Vec<Row>>;
    /// Row 1 as displayed; empty when the sheet is empty.
    fn header_row(&self) -> Result<Vec<String>>;
    fn append_row(&mut self, cells: &[Cell]) -> Result<()>;
}

/// Build the client selected by the source options.
pub fn client_for(source: &SourceOptions, timeout: std::time::Duration) -> Result<Box<dyn SpreadsheetClient>> {
    Ok(match &source.kind {
        SourceKind::CsvDir(dir) => Box::new(CsvDirClient::new(dir)),
        SourceKind::Google(creds) => Box::new(GoogleSheetsClient::connect(creds, timeout)?),
    })
}

/// `open(identifier).first_sheet().all_records()` in one call.
pub fn fetch_records(client: &dyn SpreadsheetClient, identifier: &str) -> Result<Vec<Row>> {
    client.open(identifier)?.first_sheet()?.all_records()
}
