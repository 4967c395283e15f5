// src/ledger.rs
//
// Sent-record ledger: delivery key -> ISO-8601 time it was delivered.
// Presence of a key means "already delivered, never retry".
// Stored as one JSON object, rewritten whole on every persist.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::file;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl Ledger {
    /// In-memory ledger with nowhere to persist.
    pub fn in_memory() -> Self { Self::default() }

    /// Load from `path`. A missing file is an empty ledger; an unreadable or
    /// corrupt one is logged and also treated as empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match file::read_json::<BTreeMap<String, String>>(&path) {
            Ok(Some(map)) => map,
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), "could not load sent ledger, starting empty: {e}");
                BTreeMap::new()
            }
        };
        debug!(path = %path.display(), entries = entries.len(), "ledger loaded");
        Self { path: Some(path), entries }
    }

    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    pub fn has_sent(&self, delivery_key: &str) -> bool {
        self.entries.contains_key(delivery_key)
    }

    /// Idempotent; re-marking overwrites the timestamp.
    pub fn mark_sent(&mut self, delivery_key: &str, at: NaiveDateTime) {
        self.entries.insert(delivery_key.to_string(), at.format(ISO_FORMAT).to_string());
    }

    pub fn delivered_at(&self, delivery_key: &str) -> Option<&str> {
        self.entries.get(delivery_key).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Replace the file's contents with the full ledger. No-op for in-memory ledgers.
    pub fn persist(&self) -> Result<()> {
        match &self.path {
            Some(path) => file::write_json_atomic(path, &self.entries),
            None => Ok(()),
        }
    }
}
