// src/store.rs
// Last-observed snapshot on disk (`last_bni_data.json`).

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::Result;
use crate::file;
use crate::record::Snapshot;

pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }

    /// Previous run's snapshot. Missing or corrupt files read as empty, so the
    /// worst case is re-offering records that the ledger then skips.
    pub fn load(&self) -> Snapshot {
        match file::read_json::<Snapshot>(&self.path) {
            Ok(Some(snap)) => {
                debug!(path = %self.path.display(), records = snap.len(), "snapshot loaded");
                snap
            }
            Ok(None) => Snapshot::new(),
            Err(e) => {
                warn!(path = %self.path.display(), "could not load last snapshot, starting empty: {e}");
                Snapshot::new()
            }
        }
    }

    /// Replace the stored snapshot.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        file::write_json_atomic(&self.path, snapshot)
    }
}
