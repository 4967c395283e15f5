// src/sink/sheet.rs
// Append-row sink: `[serial timestamp, amount, identity, chapter, total given,
// records count]`, header written once.

use chrono::Local;
use tracing::info;

use super::Transport;
use crate::config::consts::{COL_CHAPTER, COL_RECORDS_COUNT, COL_TOTAL_GIVEN, TARGET_HEADERS};
use crate::core::amount::{normalize, parse_amount};
use crate::core::recency::to_sheets_serial;
use crate::errors::Result;
use crate::record::Metadata;
use crate::sheets::{Cell, Worksheet};

pub struct SheetAppendTransport {
    sheet: Box<dyn Worksheet>,
    header_checked: bool,
}

impl SheetAppendTransport {
    pub fn new(sheet: Box<dyn Worksheet>) -> Self {
        Self { sheet, header_checked: false }
    }

    fn ensure_header(&mut self) -> Result<()> {
        if self.header_checked { return Ok(()); }
        if self.sheet.header_row()?.iter().all(|h| h.trim().is_empty()) {
            let header: Vec<Cell> = TARGET_HEADERS.iter().map(|h| Cell::from(*h)).collect();
            self.sheet.append_row(&header)?;
            info!("wrote header row to empty target sheet");
        }
        self.header_checked = true;
        Ok(())
    }
}

impl Transport for SheetAppendTransport {
    fn name(&self) -> &str { "sheet-append" }

    fn submit(&mut self, identity: &str, amount: &str, metadata: &Metadata) -> Result<bool> {
        self.ensure_header()?;
        let field = |col: &str| metadata.get(col).map(|v| v.trim()).filter(|v| !v.is_empty());
        let row = [
            Cell::Number(to_sheets_serial(Local::now().naive_local())),
            numeric_cell(amount),
            Cell::from(identity),
            Cell::from(field(COL_CHAPTER).unwrap_or_default()),
            field(COL_TOTAL_GIVEN).map(numeric_cell).unwrap_or_else(|| Cell::from("")),
            field(COL_RECORDS_COUNT).map(numeric_cell).unwrap_or(Cell::Number(0.0)),
        ];
        self.sheet.append_row(&row)?;
        Ok(true)
    }
}

/// Numeric when possible, so the sheet stores a number and not text.
fn numeric_cell(raw: &str) -> Cell {
    match parse_amount(raw) {
        Some(n) => Cell::Number(n),
        None => Cell::Text(normalize(raw)),
    }
}
