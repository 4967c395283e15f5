// src/sheets/csv_dir.rs
// Directory-backed workbooks: `<dir>/<title>.csv` is a one-sheet workbook.

use std::fs;
use std::path::PathBuf;

use super::{Cell, SpreadsheetClient, Workbook, Worksheet};
use crate::csv::{parse_rows, rows_to_records};
use crate::errors::{RelayError, Result};
use crate::file::{append_rows, write_rows_start};
use crate::record::Row;

const SEP: char = ',';

pub struct CsvDirClient {
    dir: PathBuf,
}

impl CsvDirClient {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    pub fn path_for(&self, title: &str) -> PathBuf {
        self.dir.join(join!(title, ".csv"))
    }
}

impl SpreadsheetClient for CsvDirClient {
    fn open(&self, identifier: &str) -> Result<Box<dyn Workbook>> {
        let path = self.path_for(identifier);
        if !path.is_file() {
            return Err(RelayError::source_unavailable(identifier, format!("{} not found", path.display())));
        }
        Ok(Box::new(CsvWorkbook { title: identifier.to_string(), path }))
    }

    fn open_or_create(&self, title: &str, headers: &[&str]) -> Result<Box<dyn Workbook>> {
        let path = self.path_for(title);
        if !path.is_file() {
            let headers: Vec<String> = headers.iter().map(|h| s!(*h)).collect();
            write_rows_start(&path, Some(&headers), SEP)?;
        }
        self.open(title)
    }
}

struct CsvWorkbook {
    title: String,
    path: PathBuf,
}

impl Workbook for CsvWorkbook {
    fn title(&self) -> &str { &self.title }

    fn first_sheet(&self) -> Result<Box<dyn Worksheet>> {
        Ok(Box::new(CsvWorksheet { title: self.title.clone(), path: self.path.clone() }))
    }
}

pub struct CsvWorksheet {
    title: String,
    path: PathBuf,
}

impl CsvWorksheet {
    fn read(&self) -> Result<Vec<Vec<String>>> {
        fs::read_to_string(&self.path)
            .map(|text| parse_rows(&text, SEP))
            .map_err(|e| RelayError::source_unavailable(&self.title, e))
    }
}

impl Worksheet for CsvWorksheet {
    fn all_records(&self) -> Result<Vec<Row>> {
        Ok(rows_to_records(self.read()?))
    }

    fn header_row(&self) -> Result<Vec<String>> {
        Ok(self.read()?.into_iter().next().unwrap_or_default())
    }

    fn append_row(&mut self, cells: &[Cell]) -> Result<()> {
        let row: Vec<String> = cells.iter().map(Cell::to_text).collect();
        append_rows(&self.path, &[row], SEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_dir(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("tyfcb_csvdir_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&p);
        fs::create_dir_all(&p).unwrap();
        p
    }

    #[test]
    fn open_missing_workbook_is_source_unavailable() {
        let client = CsvDirClient::new(tmp_dir("missing"));
        let err = client.open("Nope").err().unwrap();
        assert!(matches!(err, RelayError::SourceUnavailable { .. }));
    }

    #[test]
    fn open_or_create_writes_header_once() {
        let dir = tmp_dir("create");
        let client = CsvDirClient::new(&dir);
        let sheet = client.open_or_create("Relay", &["A", "B"]).unwrap().first_sheet().unwrap();
        assert_eq!(sheet.header_row().unwrap(), vec!["A", "B"]);
        assert!(sheet.all_records().unwrap().is_empty());

        fs::write(dir.join("Relay.csv"), "A,B\n1,2\n").unwrap();
        let sheet = client.open_or_create("Relay", &["X"]).unwrap().first_sheet().unwrap();
        assert_eq!(sheet.all_records().unwrap().len(), 1);
    }

    #[test]
    fn reads_records_and_appends() {
        let dir = tmp_dir("rw");
        fs::write(
            dir.join("BNI TYFCB Data.csv"),
            "Timestamp,TYFCB Received,Running User\n2024-01-15 10:00:00,\"1,234.50\",Alice\n",
        )
        .unwrap();
        let client = CsvDirClient::new(&dir);
        let book = client.open("BNI TYFCB Data").unwrap();
        assert_eq!(book.title(), "BNI TYFCB Data");
        let mut sheet = book.first_sheet().unwrap();

        let recs = sheet.all_records().unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].get("TYFCB Received").map(String::as_str), Some("1,234.50"));
        assert_eq!(sheet.header_row().unwrap(), vec!["Timestamp", "TYFCB Received", "Running User"]);

        sheet.append_row(&[Cell::from(45306.5), Cell::from("500"), Cell::from("Bob")]).unwrap();
        let recs = sheet.all_records().unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].get("Timestamp").map(String::as_str), Some("45306.5"));
        assert_eq!(recs[1].get("Running User").map(String::as_str), Some("Bob"));
    }
}
