// tests/relay_scenarios.rs
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;

use tyfcb_relay::config::options::{RelayOptions, SourceKind};
use tyfcb_relay::errors::{RelayError, Result};
use tyfcb_relay::ledger::Ledger;
use tyfcb_relay::progress::Progress;
use tyfcb_relay::record::{Metadata, SourceRecord};
use tyfcb_relay::runner::Relay;
use tyfcb_relay::sheets::csv_dir::CsvDirClient;
use tyfcb_relay::sink::{DeliveryOutcome, Transport};
use tyfcb_relay::store::SnapshotStore;

const HEADER: &str = "Timestamp,Running User,TYFCB Received,Chapter\n";

fn tmp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("tyfcb_relay_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&p);
    fs::create_dir_all(&p).unwrap();
    p
}

fn now() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2024-01-16 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
}

/// Source sheet "BNI TYFCB Data" as `<dir>/src/BNI TYFCB Data.csv`, state in `<dir>/state`.
fn setup(name: &str, body: &str) -> (PathBuf, RelayOptions) {
    let dir = tmp_dir(name);
    let src = dir.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("BNI TYFCB Data.csv"), format!("{HEADER}{body}")).unwrap();

    let mut opts = RelayOptions::default();
    opts.source.kind = SourceKind::CsvDir(src);
    opts.state.dir = dir.join("state");
    opts.pace = Duration::ZERO;
    (dir, opts)
}

type Calls = Rc<RefCell<Vec<(String, String)>>>;

/// Accepts (or refuses) everything and records what it was given.
struct Recording {
    accept: bool,
    calls: Calls,
}

impl Transport for Recording {
    fn name(&self) -> &str { "recording" }
    fn submit(&mut self, identity: &str, amount: &str, _metadata: &Metadata) -> Result<bool> {
        self.calls.borrow_mut().push((identity.to_string(), amount.to_string()));
        Ok(self.accept)
    }
}

fn recording(accept: bool) -> (Vec<Box<dyn Transport>>, Calls) {
    let calls: Calls = Rc::new(RefCell::new(Vec::new()));
    (vec![Box::new(Recording { accept, calls: calls.clone() })], calls)
}

fn run(opts: &RelayOptions, accept: bool) -> (Result<tyfcb_relay::RunSummary>, Calls) {
    let SourceKind::CsvDir(dir) = &opts.source.kind else { unreachable!() };
    let client = CsvDirClient::new(dir.clone());
    let (transports, calls) = recording(accept);
    let out = Relay::new(opts, &client, transports).run_at(now(), None);
    (out, calls)
}

fn read(path: &Path) -> Option<Vec<u8>> { fs::read(path).ok() }

#[test]
fn new_record_is_normalized_delivered_and_ledgered() {
    let (_dir, opts) = setup("scenario_a", "2024-01-15 10:00:00,Alice,\"1,234.50\",Central\n");
    let (summary, calls) = run(&opts, true);
    let summary = summary.unwrap();

    assert_eq!((summary.fetched, summary.recent, summary.new, summary.delivered), (1, 1, 1, 1));
    assert_eq!(calls.borrow().as_slice(), &[("Alice".to_string(), "1234.50".to_string())]);

    let ledger = Ledger::load(opts.state.ledger_path());
    assert!(ledger.has_sent("Alice_1234.50"));

    let snap = SnapshotStore::new(opts.state.snapshot_path()).load();
    let rec = snap.get("Alice_2024-01-15 10:00:00").unwrap();
    assert_eq!(rec.metadata.get("Chapter").map(String::as_str), Some("Central"));
}

#[test]
fn already_delivered_amount_is_skipped_without_transport_call() {
    let (_dir, mut opts) = setup("scenario_b", "2024-01-15 10:00:00,Alice,\"1,234.50\",\n");
    run(&opts, true).0.unwrap();
    let ledger_before = read(&opts.state.ledger_path());

    // Same record offered again even though the snapshot already has it.
    opts.force_check = true;
    let (summary, calls) = run(&opts, true);
    let summary = summary.unwrap();

    assert_eq!((summary.new, summary.skipped, summary.delivered), (1, 1, 0));
    assert!(calls.borrow().is_empty());
    assert_eq!(read(&opts.state.ledger_path()), ledger_before);
}

#[test]
fn unchanged_snapshot_offers_nothing_on_repeat_run() {
    let (_dir, opts) = setup("repeat", "2024-01-15 10:00:00,Alice,100,\n");
    run(&opts, true).0.unwrap();
    let (summary, calls) = run(&opts, true);
    assert_eq!(summary.unwrap().new, 0);
    assert!(calls.borrow().is_empty());
}

#[test]
fn stale_and_unparseable_timestamps_never_reach_delivery() {
    let body = "2024-01-06 10:00:00,Old,500,\nnot a date,Garbled,600,\n2024-01-09 00:00:00,Edge,700,\n";
    let (_dir, opts) = setup("scenario_c", body);
    let (summary, calls) = run(&opts, true);
    let summary = summary.unwrap();

    assert_eq!((summary.fetched, summary.recent), (3, 1));
    // Exactly 7 days old is still inside the window.
    assert_eq!(calls.borrow().as_slice(), &[("Edge".to_string(), "700".to_string())]);
}

#[test]
fn unreachable_source_leaves_state_files_untouched() {
    let (dir, opts) = setup("scenario_d", "2024-01-15 10:00:00,Alice,100,\n");
    run(&opts, true).0.unwrap();
    let snap_before = read(&opts.state.snapshot_path());
    let ledger_before = read(&opts.state.ledger_path());
    assert!(snap_before.is_some());

    fs::remove_file(dir.join("src").join("BNI TYFCB Data.csv")).unwrap();
    let (out, calls) = run(&opts, true);

    assert!(matches!(out, Err(RelayError::SourceUnavailable { .. })));
    assert!(calls.borrow().is_empty());
    assert_eq!(read(&opts.state.snapshot_path()), snap_before);
    assert_eq!(read(&opts.state.ledger_path()), ledger_before);
}

#[test]
fn failed_delivery_is_retried_next_run() {
    let (_dir, opts) = setup("retry", "2024-01-15 10:00:00,Bob,42,\n2024-01-15 11:00:00,Carol,7,\n");
    let (summary, calls) = run(&opts, false);
    assert_eq!(summary.unwrap().failed, 2);
    assert_eq!(calls.borrow().len(), 2);
    assert!(Ledger::load(opts.state.ledger_path()).is_empty());

    let (summary, calls) = run(&opts, true);
    let summary = summary.unwrap();
    assert_eq!((summary.new, summary.delivered), (2, 2));
    assert_eq!(calls.borrow().len(), 2);
}

#[test]
fn same_amount_under_new_timestamp_is_not_sent_twice() {
    let (dir, opts) = setup("amount_dedup", "2024-01-15 10:00:00,Alice,250,\n");
    run(&opts, true).0.unwrap();

    // A fresh row (new snapshot key) carrying the same identity and amount.
    fs::write(
        dir.join("src").join("BNI TYFCB Data.csv"),
        format!("{HEADER}2024-01-15 10:00:00,Alice,250,\n2024-01-15 18:30:00,Alice,$250,\n"),
    )
    .unwrap();
    let (summary, calls) = run(&opts, true);
    let summary = summary.unwrap();
    assert_eq!((summary.new, summary.skipped), (1, 1));
    assert!(calls.borrow().is_empty());
}

#[test]
fn unreadable_amounts_never_reach_the_transport() {
    let body = "2024-01-15 10:00:00,Alice,N/A,\n2024-01-15 10:01:00,Bob,1.2.3,\n2024-01-15 10:02:00,Carol,500,\n";
    let (_dir, opts) = setup("bad_amounts", body);
    let (summary, calls) = run(&opts, true);
    let summary = summary.unwrap();

    assert_eq!((summary.fetched, summary.new, summary.delivered), (1, 1, 1));
    assert_eq!(calls.borrow().as_slice(), &[(s("Carol"), s("500"))]);
    assert!(!Ledger::load(opts.state.ledger_path()).has_sent("Alice_0"));
}

#[test]
fn deliveries_are_spaced_by_pace() {
    let body = "2024-01-15 10:00:00,Alice,1,\n2024-01-15 10:01:00,Bob,2,\n2024-01-15 10:02:00,Carol,3,\n";
    let (_dir, mut opts) = setup("pace", body);
    opts.pace = Duration::from_millis(60);

    let started = Instant::now();
    let (summary, calls) = run(&opts, true);
    let elapsed = started.elapsed();

    assert_eq!(summary.unwrap().delivered, 3);
    assert_eq!(calls.borrow().len(), 3);
    // Two gaps between three network attempts.
    assert!(elapsed >= Duration::from_millis(120), "took {elapsed:?}");
}

#[test]
fn ledger_skips_do_not_pause() {
    let body = "2024-01-15 10:00:00,Alice,1,\n2024-01-15 10:01:00,Bob,2,\n2024-01-15 10:02:00,Carol,3,\n";
    let (_dir, mut opts) = setup("skip_pace", body);
    run(&opts, true).0.unwrap();

    opts.force_check = true;
    opts.pace = Duration::from_secs(2);
    let started = Instant::now();
    let (summary, calls) = run(&opts, true);
    let elapsed = started.elapsed();

    assert_eq!(summary.unwrap().skipped, 3);
    assert!(calls.borrow().is_empty());
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
}

#[test]
fn unwritable_state_is_logged_and_delivery_stands() {
    let (dir, mut opts) = setup("unwritable", "2024-01-15 10:00:00,Alice,100,\n");
    let blocker = dir.join("state_is_a_file");
    fs::write(&blocker, "not a directory").unwrap();
    opts.state.dir = blocker.clone();

    let (summary, calls) = run(&opts, true);
    let summary = summary.unwrap();

    assert_eq!((summary.delivered, summary.failed), (1, 0));
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "not a directory");
}

#[test]
fn empty_fetch_keeps_last_snapshot() {
    let (dir, opts) = setup("empty_fetch", "2024-01-15 10:00:00,Alice,100,\n");
    run(&opts, true).0.unwrap();
    let snap_before = read(&opts.state.snapshot_path());
    assert_eq!(SnapshotStore::new(opts.state.snapshot_path()).load().len(), 1);

    fs::write(dir.join("src").join("BNI TYFCB Data.csv"), HEADER).unwrap();
    let (summary, calls) = run(&opts, true);

    assert_eq!(summary.unwrap().fetched, 0);
    assert!(calls.borrow().is_empty());
    assert_eq!(read(&opts.state.snapshot_path()), snap_before);
}

#[test]
fn progress_sees_every_attempt() {
    #[derive(Default)]
    struct Tally {
        begun: Option<usize>,
        seen: Vec<(String, DeliveryOutcome)>,
        finished: bool,
    }
    impl Progress for Tally {
        fn begin(&mut self, total: usize) { self.begun = Some(total); }
        fn item_done(&mut self, record: &SourceRecord, outcome: DeliveryOutcome) {
            self.seen.push((record.identity_key.clone(), outcome));
        }
        fn finish(&mut self, _summary: &tyfcb_relay::RunSummary) { self.finished = true; }
    }

    let (_dir, opts) = setup("progress", "2024-01-15 10:00:00,Alice,1,\n2024-01-15 10:05:00,Bob,2,\n");
    let SourceKind::CsvDir(src) = &opts.source.kind else { unreachable!() };
    let client = CsvDirClient::new(src.clone());
    let (transports, _) = recording(true);
    let mut tally = Tally::default();
    Relay::new(&opts, &client, transports).run_at(now(), Some(&mut tally)).unwrap();

    assert_eq!(tally.begun, Some(2));
    assert_eq!(
        tally.seen,
        vec![(s("Alice"), DeliveryOutcome::Delivered), (s("Bob"), DeliveryOutcome::Delivered)]
    );
    assert!(tally.finished);
}

fn s(v: &str) -> String { v.to_string() }
