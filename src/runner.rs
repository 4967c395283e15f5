// src/runner.rs
//
// One relay pass:
//   load ledger + last snapshot → fetch source → keep recent → diff
//   → deliver each (paced) → flush ledger → persist snapshot.
//
// A source failure aborts before any delivery and leaves both state files as
// they were. Everything after the fetch is best-effort: delivery failures and
// persistence failures are logged and counted, never raised.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, error, info, warn};

use crate::config::options::RelayOptions;
use crate::core::recency::is_recent_at;
use crate::diff::diff;
use crate::errors::Result;
use crate::ledger::Ledger;
use crate::progress::Progress;
use crate::record::Snapshot;
use crate::sheets::{fetch_records, SpreadsheetClient};
use crate::sink::{DeliveryOutcome, DeliverySink, Transport};
use crate::store::SnapshotStore;

/// Counts for one pass. `new` is the number of delivery attempts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub recent: usize,
    pub new: usize,
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    fn count(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered => self.delivered += 1,
            DeliveryOutcome::Skipped => self.skipped += 1,
            DeliveryOutcome::Failed => self.failed += 1,
        }
    }
}

/// Collaborators for one run; built once, consumed by `run`.
pub struct Relay<'a> {
    options: &'a RelayOptions,
    source: &'a dyn SpreadsheetClient,
    transports: Vec<Box<dyn Transport>>,
}

impl<'a> Relay<'a> {
    pub fn new(options: &'a RelayOptions, source: &'a dyn SpreadsheetClient, transports: Vec<Box<dyn Transport>>) -> Self {
        Self { options, source, transports }
    }

    pub fn run(self, progress: Option<&mut dyn Progress>) -> Result<RunSummary> {
        self.run_at(Local::now().naive_local(), progress)
    }

    /// `run` against an explicit clock (recency window and ledger timestamps).
    pub fn run_at(self, now: NaiveDateTime, mut progress: Option<&mut dyn Progress>) -> Result<RunSummary> {
        let opts = self.options;
        let identifier = opts.source.identifier();

        // LOAD_LEDGER_AND_SNAPSHOT
        let ledger = Ledger::load(opts.state.ledger_path());
        let snapshots = SnapshotStore::new(opts.state.snapshot_path());
        let previous = if opts.force_check {
            info!("FORCE_CHECK set, ignoring last snapshot");
            if let Some(p) = progress.as_deref_mut() { p.log("Force check: treating every recent record as new"); }
            Snapshot::new()
        } else {
            snapshots.load()
        };

        // FETCH_SOURCE
        let rows = match fetch_records(self.source, identifier) {
            Ok(rows) => rows,
            Err(e) => {
                error!(source = identifier, "fetch failed, aborting run: {e}");
                if let Some(p) = progress.as_deref_mut() { p.log(&format!("Source unavailable: {e}")); }
                return Err(e);
            }
        };
        let current = Snapshot::from_rows(&rows);
        info!(rows = rows.len(), records = current.len(), "source fetched");

        // FILTER_RECENT
        let window = opts.window_days;
        let recent = current.filtered(|r| {
            let keep = is_recent_at(&r.timestamp, window, now);
            if !keep { debug!(key = %r.composite_key(), "outside {window}-day window or unparseable timestamp"); }
            keep
        });

        // DIFF
        let fresh = diff(&recent, &previous);
        let mut summary = RunSummary {
            fetched: current.len(),
            recent: recent.len(),
            new: fresh.len(),
            ..RunSummary::default()
        };
        info!(recent = summary.recent, new = summary.new, "diffed against last snapshot");

        // DELIVER_EACH
        if let Some(p) = progress.as_deref_mut() { p.begin(fresh.len()); }
        let mut sink = DeliverySink::new(ledger, self.transports);
        let mut failed_keys = HashSet::new();
        let mut last_hit_network = false;

        for rec in &fresh {
            if last_hit_network { pause(opts.pace); }
            let outcome = sink.deliver_with(&rec.identity_key, &rec.raw_amount, &rec.metadata, now);
            last_hit_network = outcome != DeliveryOutcome::Skipped;
            if outcome == DeliveryOutcome::Failed {
                failed_keys.insert(rec.composite_key());
            }
            summary.count(outcome);
            if let Some(p) = progress.as_deref_mut() { p.item_done(rec, outcome); }
        }

        // End-of-run flush; per-delivery flushes already happened on success.
        if let Err(e) = sink.ledger().persist() {
            error!("ledger flush failed, progress from this run may be lost: {e}");
        }

        // PERSIST_SNAPSHOT: failed records are left out so the next run offers them again.
        // An empty fetch never replaces the stored snapshot.
        let current_is_empty = current.is_empty();
        let to_save = if failed_keys.is_empty() {
            current
        } else {
            current.filtered(|r| !failed_keys.contains(&r.composite_key()))
        };
        if current_is_empty {
            info!("source returned no records, keeping last snapshot");
        } else if let Err(e) = snapshots.save(&to_save) {
            error!("snapshot not persisted, next run will re-diff: {e}");
        }

        if summary.failed > 0 {
            warn!(failed = summary.failed, "some deliveries failed; they will be retried next run");
        }
        if let Some(p) = progress.as_deref_mut() { p.finish(&summary); }
        Ok(summary)
    }
}

fn pause(pace: Duration) {
    if !pace.is_zero() { thread::sleep(pace); }
}
