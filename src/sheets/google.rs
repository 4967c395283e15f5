// src/sheets/google.rs
// Google Sheets (v4 values API) + Drive lookup by title.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::auth::ServiceAccountKey;
use super::{Cell, SpreadsheetClient, Workbook, Worksheet};
use crate::config::consts::{DRIVE_FILES_API, SHEETS_API, USER_AGENT};
use crate::config::options::Credentials;
use crate::errors::{RelayError, Result};
use crate::record::Row;

const SOURCE_ID: &str = "google-sheets";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Authorized session. Cloning shares the connection pool.
#[derive(Clone)]
pub struct GoogleSheetsClient {
    http: Client,
    token: String,
}

fn unavailable(reason: impl ToString) -> RelayError {
    RelayError::source_unavailable(SOURCE_ID, reason)
}

impl GoogleSheetsClient {
    /// Load the service account, exchange it for a token.
    pub fn connect(creds: &Credentials, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(unavailable)?;
        let key = ServiceAccountKey::from_credentials(creds)?;
        let token = key.fetch_access_token(&http)?;
        Ok(Self { http, token })
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.token)
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET");
        self.authed(self.http.get(url))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<T>())
            .map_err(unavailable)
    }

    fn find_by_title(&self, title: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct Files { #[serde(default)] files: Vec<FileRef> }
        #[derive(Deserialize)]
        struct FileRef { id: String }

        let q = format!("name = '{}' and mimeType = '{}' and trashed = false", title.replace('\'', "\\'"), SPREADSHEET_MIME);
        let mut url = Url::parse(DRIVE_FILES_API).map_err(unavailable)?;
        url.query_pairs_mut()
            .append_pair("q", &q)
            .append_pair("fields", "files(id)")
            .append_pair("pageSize", "1");
        let found: Files = self.get_json(url)?;
        found
            .files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| unavailable(format!("spreadsheet '{title}' not found or not shared with the service account")))
    }
}

/// Spreadsheet keys are long URL-safe tokens without spaces.
fn looks_like_key(identifier: &str) -> bool {
    identifier.len() >= 30 && identifier.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl SpreadsheetClient for GoogleSheetsClient {
    fn open(&self, identifier: &str) -> Result<Box<dyn Workbook>> {
        let id = if looks_like_key(identifier) { identifier.to_string() } else { self.find_by_title(identifier)? };
        info!(spreadsheet = %identifier, "opened spreadsheet");
        Ok(Box::new(GoogleWorkbook { client: self.clone(), id, title: identifier.to_string() }))
    }
}

struct GoogleWorkbook {
    client: GoogleSheetsClient,
    id: String,
    title: String,
}

fn sheets_url(id: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(SHEETS_API).map_err(unavailable)?;
    url.path_segments_mut()
        .map_err(|_| unavailable("sheets endpoint cannot take a path"))?
        .push(id)
        .extend(segments);
    Ok(url)
}

impl Workbook for GoogleWorkbook {
    fn title(&self) -> &str { &self.title }

    fn first_sheet(&self) -> Result<Box<dyn Worksheet>> {
        #[derive(Deserialize)]
        struct Meta { #[serde(default)] sheets: Vec<SheetMeta> }
        #[derive(Deserialize)]
        struct SheetMeta { properties: SheetProps }
        #[derive(Deserialize)]
        struct SheetProps { title: String }

        let mut url = sheets_url(&self.id, &[])?;
        url.query_pairs_mut().append_pair("fields", "sheets.properties.title");
        let meta: Meta = self.client.get_json(url)?;
        let first = meta
            .sheets
            .into_iter()
            .next()
            .ok_or_else(|| unavailable(format!("spreadsheet '{}' has no worksheets", self.title)))?;

        Ok(Box::new(GoogleWorksheet {
            client: self.client.clone(),
            id: self.id.clone(),
            sheet: first.properties.title,
        }))
    }
}

struct GoogleWorksheet {
    client: GoogleSheetsClient,
    id: String,
    sheet: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => s!(),
        other => other.to_string(),
    }
}

impl GoogleWorksheet {
    /// A1 range for the whole sheet, or a sub-range of it.
    fn range(&self, a1: Option<&str>) -> String {
        let quoted = join!("'", &self.sheet.replace('\'', "''"), "'");
        match a1 {
            Some(r) => join!(&quoted, "!", r),
            None => quoted,
        }
    }

    fn values(&self, a1: Option<&str>) -> Result<Vec<Vec<String>>> {
        let url = sheets_url(&self.id, &["values", &self.range(a1)])?;
        let vr: ValueRange = self.client.get_json(url)?;
        Ok(vr.values.iter().map(|row| row.iter().map(cell_text).collect()).collect())
    }
}

impl Worksheet for GoogleWorksheet {
    fn all_records(&self) -> Result<Vec<Row>> {
        let rows = self.values(None)?;
        debug!(sheet = %self.sheet, rows = rows.len(), "fetched values");
        Ok(crate::csv::rows_to_records(rows))
    }

    fn header_row(&self) -> Result<Vec<String>> {
        Ok(self.values(Some("1:1"))?.into_iter().next().unwrap_or_default())
    }

    fn append_row(&mut self, cells: &[Cell]) -> Result<()> {
        let target = join!(&self.range(None), ":append");
        let mut url = sheets_url(&self.id, &["values", &target])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        self.client
            .authed(self.client.http.post(url))
            .json(&json!({ "values": [cells] }))
            .send()
            .and_then(|r| r.error_for_status())
            .map(|_| ())
            .map_err(|e| RelayError::transport("sheet-append", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_detection() {
        assert!(looks_like_key("1MmuiQ2gRNbaA84YTXB2HvDR7MDIyW_buwELkkVm95Qs"));
        assert!(!looks_like_key("BNI TYFCB Data"));
        assert!(!looks_like_key("short"));
    }

    #[test]
    fn sheet_urls_encode_ranges() {
        let url = sheets_url("abc", &["values", "'My Sheet'!1:1"]).unwrap();
        assert_eq!(url.as_str(), "https://sheets.googleapis.com/v4/spreadsheets/abc/values/'My%20Sheet'!1:1");
    }

    #[test]
    fn cells_render_as_text() {
        assert_eq!(cell_text(&json!("x")), "x");
        assert_eq!(cell_text(&json!(12)), "12");
        assert_eq!(cell_text(&Value::Null), "");
    }

    #[test]
    fn append_body_keeps_numbers_numeric() {
        let cells = vec![Cell::from(45306.5), Cell::from("Alice")];
        assert_eq!(json!({ "values": [cells] }).to_string(), r#"{"values":[[45306.5,"Alice"]]}"#);
    }
}
