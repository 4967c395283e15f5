// src/diff.rs
use crate::record::{Snapshot, SourceRecord};

/// Records of `current` whose composite key is absent from `previous`, in
/// `current`'s source order. The key embeds the timestamp, so a re-stamped row
/// is new rather than "changed".
pub fn diff(current: &Snapshot, previous: &Snapshot) -> Vec<SourceRecord> {
    current
        .iter()
        .filter(|rec| !previous.contains_key(&rec.composite_key()))
        .cloned()
        .collect()
}
