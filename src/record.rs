// src/record.rs
//
// SourceRecord: one sheet row reduced to identity / amount / timestamp + the
// remaining columns as metadata.
// Snapshot: composite key (`<identity>_<timestamp>`) -> record, remembering the
// order rows came out of the source so diffs emit in that order.

use std::collections::{BTreeMap, HashMap};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::config::consts::{AMOUNT_ALIASES, COL_TIMESTAMP, IDENTITY_ALIASES};
use crate::core::amount::parse_amount;
use crate::core::sanitize::normalize_ws;
use crate::errors::{RelayError, Result};

/// One sheet row as returned by `Worksheet::all_records`: header -> cell.
pub type Row = BTreeMap<String, String>;

/// Non-core columns of a row, carried through to sinks that can use them.
pub type Metadata = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub identity_key: String,
    pub raw_amount: String,
    pub timestamp: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl SourceRecord {
    pub fn new(identity_key: impl Into<String>, raw_amount: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            identity_key: identity_key.into(),
            raw_amount: raw_amount.into(),
            timestamp: timestamp.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Snapshot key: identity + timestamp.
    pub fn composite_key(&self) -> String {
        join!(&self.identity_key, "_", &self.timestamp)
    }

    /// Reduce a raw row. The first non-empty column among the aliases wins for
    /// identity and amount; rows missing either, or whose amount holds no
    /// number, are unparseable.
    pub fn from_row(row: &Row) -> Result<Self> {
        let identity = pick(row, IDENTITY_ALIASES);
        let amount = pick(row, AMOUNT_ALIASES);
        let (Some((id_col, identity)), Some((amount_col, amount))) = (identity, amount) else {
            return Err(RelayError::RecordUnparseable {
                key: row.get(IDENTITY_ALIASES[0]).cloned().unwrap_or_default(),
                reason: s!("missing identity or amount"),
            });
        };
        if !amount.chars().any(|c| c.is_ascii_digit()) || parse_amount(&amount).is_none() {
            return Err(RelayError::RecordUnparseable {
                key: identity,
                reason: format!("amount '{amount}' is not a number"),
            });
        }
        let timestamp = row.get(COL_TIMESTAMP).map(|t| t.trim().to_string()).unwrap_or_default();

        let metadata = row
            .iter()
            .filter(|(k, _)| k.as_str() != id_col && k.as_str() != amount_col && k.as_str() != COL_TIMESTAMP)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self { identity_key: identity, raw_amount: amount, timestamp, metadata })
    }
}

fn pick<'a>(row: &Row, aliases: &[&'a str]) -> Option<(&'a str, String)> {
    aliases.iter().find_map(|col| {
        let v = normalize_ws(row.get(*col)?);
        if v.is_empty() { None } else { Some((*col, v)) }
    })
}

/* ---------------- Snapshot ---------------- */

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, SourceRecord>")]
pub struct Snapshot {
    order: Vec<String>,
    records: HashMap<String, SourceRecord>,
}

impl Snapshot {
    pub fn new() -> Self { Self::default() }

    /// Build from raw rows, skipping (and logging) the unparseable ones.
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut snap = Snapshot::new();
        for (i, row) in rows.iter().enumerate() {
            match SourceRecord::from_row(row) {
                Ok(rec) => snap.insert(rec),
                Err(e) => debug!(row = i + 2, "skipping row: {e}"),
            }
        }
        snap
    }

    /// Insert or replace by composite key; a replaced record keeps its position.
    pub fn insert(&mut self, record: SourceRecord) {
        let key = record.composite_key();
        if self.records.insert(key.clone(), record).is_none() {
            self.order.push(key);
        }
    }

    pub fn contains_key(&self, key: &str) -> bool { self.records.contains_key(key) }
    pub fn get(&self, key: &str) -> Option<&SourceRecord> { self.records.get(key) }
    pub fn len(&self) -> usize { self.order.len() }
    pub fn is_empty(&self) -> bool { self.order.is_empty() }

    /// Records in source order.
    pub fn iter(&self) -> impl Iterator<Item = &SourceRecord> {
        self.order.iter().filter_map(|k| self.records.get(k))
    }

    /// Keep only records matching `pred`, preserving order.
    pub fn filtered<F: Fn(&SourceRecord) -> bool>(&self, pred: F) -> Snapshot {
        let mut out = Snapshot::new();
        for rec in self.iter().filter(|r| pred(r)) {
            out.insert(rec.clone());
        }
        out
    }
}

impl FromIterator<SourceRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = SourceRecord>>(iter: I) -> Self {
        let mut snap = Snapshot::new();
        for rec in iter { snap.insert(rec); }
        snap
    }
}

impl From<HashMap<String, SourceRecord>> for Snapshot {
    /// Reloaded snapshots are only used for membership; order is by key.
    fn from(map: HashMap<String, SourceRecord>) -> Self {
        let mut order: Vec<String> = map.keys().cloned().collect();
        order.sort();
        Snapshot { order, records: map }
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.order.len()))?;
        for key in &self.order {
            if let Some(rec) = self.records.get(key) {
                map.serialize_entry(key, rec)?;
            }
        }
        map.end()
    }
}
