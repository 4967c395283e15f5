// src/cli.rs
use std::env;

use color_eyre::eyre::{bail, WrapErr};
use tracing::info;

use crate::config::RelayOptions;
use crate::log;
use crate::progress::Progress;
use crate::record::SourceRecord;
use crate::runner::{Relay, RunSummary};
use crate::sheets::client_for;
use crate::sink::{transports_for, DeliveryOutcome};

const HELP: &str = "\
tyfcb_relay: forward new TYFCB rows from a Google Sheet to a Google Form

USAGE:
    tyfcb_relay [--force]

OPTIONS:
    -f, --force     Ignore the last snapshot and re-check every recent record
    -h, --help      Print this help

ENVIRONMENT:
    GOOGLE_SHEETS_CREDENTIALS   Service account JSON (else google-sheets-credentials.json)
    GOOGLE_SHEET_NAME           Source sheet title (default \"BNI TYFCB Data\")
    GOOGLE_SHEET_ID             Source sheet key, takes precedence over the title
    GOOGLE_FORM_URL             Form formResponse URL
    FORCE_CHECK                 Same as --force when true/1/yes/on
    TYFCB_SOURCE_DIR            Read <dir>/<sheet name>.csv instead of Google Sheets
    TYFCB_STATE_DIR             Where the ledger, snapshot and .store/ live (default .)
    TYFCB_WINDOW_DAYS           Recency window in days (default 7)
    TYFCB_PACE_MS               Pause between deliveries (default 2000)
    TYFCB_SINK                  form | sheet | form+sheet (default form)
    RUST_LOG                    Log level for .store/debug.log (default info)
";

/// Console reporter: one line per delivery attempt, then a tally.
#[derive(Default)]
pub struct ConsoleProgress {
    total: usize,
    done: usize,
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        if total == 0 {
            println!("No new TYFCB records.");
        } else {
            println!("{total} new TYFCB record(s) to deliver");
        }
    }

    fn log(&mut self, msg: &str) {
        println!("{msg}");
    }

    fn item_done(&mut self, record: &SourceRecord, outcome: DeliveryOutcome) {
        self.done += 1;
        let verdict = match outcome {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Skipped => "already sent",
            DeliveryOutcome::Failed => "FAILED",
        };
        println!("[{}/{}] {}: {} -> {verdict}", self.done, self.total, record.identity_key, record.raw_amount);
    }

    fn finish(&mut self, summary: &RunSummary) {
        println!(
            "Delivered {}/{} (skipped {}, failed {})",
            summary.delivered, summary.new, summary.skipped, summary.failed
        );
    }
}

pub fn run() -> color_eyre::Result<()> {
    let mut opts = RelayOptions::from_env().wrap_err("reading configuration")?;
    parse_cli(&mut opts)?;

    let log_path = log::init(&opts.state.dir).wrap_err("opening debug log")?;
    info!(log = %log_path.display(), source = opts.source.identifier(), "relay starting");

    let source = client_for(&opts.source, opts.http_timeout).wrap_err("connecting to source")?;
    let transports = transports_for(&opts, source.as_ref()).wrap_err("building delivery transports")?;

    let mut console = ConsoleProgress::default();
    let summary = Relay::new(&opts, source.as_ref(), transports)
        .run(Some(&mut console))
        .wrap_err("relay run aborted")?;
    info!(?summary, "relay finished");
    Ok(())
}

fn parse_cli(opts: &mut RelayOptions) -> color_eyre::Result<()> {
    for a in env::args().skip(1) {
        match a.as_str() {
            "-f" | "--force" => opts.force_check = true,
            "-h" | "--help" => {
                eprintln!("{HELP}");
                std::process::exit(0);
            }
            _ => bail!("Unknown arg: {a}"),
        }
    }
    Ok(())
}
