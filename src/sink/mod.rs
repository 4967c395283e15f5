// src/sink/mod.rs
//
// Delivery sink: normalize → ledger check → transports in order → mark + persist.
//
// A transport "succeeds" only when it returns Ok(true), i.e. the far side gave
// a recognized success indicator. Ok(false) and Err(_) both move on to the next
// transport. The ledger is only touched on success, so failures are retried
// by the next run.

pub mod form;
pub mod sheet;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, error, info, warn};

use crate::config::consts::TARGET_HEADERS;
use crate::config::options::RelayOptions;
use crate::core::amount::{delivery_key, normalize};
use crate::errors::{RelayError, Result};
use crate::ledger::Ledger;
use crate::record::Metadata;
use crate::sheets::SpreadsheetClient;

pub use form::{FormMethod, FormTransport};
pub use sheet::SheetAppendTransport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Already in the ledger; no transport was called.
    Skipped,
    /// Every transport refused or errored.
    Failed,
}

pub trait Transport {
    fn name(&self) -> &str;

    /// Hand one (identity, normalized amount) pair to the far side, with the
    /// row's remaining columns for transports that record them.
    /// `Ok(true)` only on a recognized success indicator.
    fn submit(&mut self, identity: &str, amount: &str, metadata: &Metadata) -> Result<bool>;
}

pub struct DeliverySink {
    ledger: Ledger,
    transports: Vec<Box<dyn Transport>>,
}

impl DeliverySink {
    pub fn new(ledger: Ledger, transports: Vec<Box<dyn Transport>>) -> Self {
        Self { ledger, transports }
    }

    pub fn ledger(&self) -> &Ledger { &self.ledger }
    pub fn into_ledger(self) -> Ledger { self.ledger }

    pub fn deliver(&mut self, identity: &str, raw_amount: &str) -> DeliveryOutcome {
        self.deliver_at(identity, raw_amount, Local::now().naive_local())
    }

    /// `deliver` with an explicit "now" for the ledger timestamp.
    pub fn deliver_at(&mut self, identity: &str, raw_amount: &str, now: NaiveDateTime) -> DeliveryOutcome {
        self.deliver_with(identity, raw_amount, &Metadata::new(), now)
    }

    /// `deliver_at` carrying the row's metadata to the transports.
    pub fn deliver_with(
        &mut self,
        identity: &str,
        raw_amount: &str,
        metadata: &Metadata,
        now: NaiveDateTime,
    ) -> DeliveryOutcome {
        let amount = normalize(raw_amount);
        let key = delivery_key(identity, &amount);

        if let Some(when) = self.ledger.delivered_at(&key) {
            info!(%key, sent_at = when, "already delivered, skipping");
            return DeliveryOutcome::Skipped;
        }

        for transport in self.transports.iter_mut() {
            match transport.submit(identity, &amount, metadata) {
                Ok(true) => {
                    info!(%key, transport = transport.name(), "delivered");
                    self.ledger.mark_sent(&key, now);
                    if let Err(e) = self.ledger.persist() {
                        error!(%key, "delivered but ledger not persisted: {e}");
                    }
                    return DeliveryOutcome::Delivered;
                }
                Ok(false) => warn!(%key, transport = transport.name(), "no success indicator in response"),
                Err(e) => warn!(%key, transport = transport.name(), "transport error: {e}"),
            }
        }

        debug!(%key, tried = self.transports.len(), "all transports exhausted");
        DeliveryOutcome::Failed
    }
}

/// Transports in fallback order for the configured sink kind:
/// form POST, form GET, then sheet append. A target sheet that cannot be
/// opened is logged and left out; having no transport at all is an error.
pub fn transports_for(opts: &RelayOptions, sheets: &dyn SpreadsheetClient) -> Result<Vec<Box<dyn Transport>>> {
    let mut out: Vec<Box<dyn Transport>> = Vec::new();
    if opts.sink.kind.uses_form() {
        out.push(Box::new(FormTransport::new(&opts.sink, FormMethod::Post, opts.http_timeout)?));
        out.push(Box::new(FormTransport::new(&opts.sink, FormMethod::Get, opts.http_timeout)?));
    }
    if opts.sink.kind.uses_sheet() {
        match sheets.open_or_create(&opts.sink.target_sheet, TARGET_HEADERS).and_then(|book| book.first_sheet()) {
            Ok(sheet) => out.push(Box::new(SheetAppendTransport::new(sheet))),
            Err(e) => error!(target_sheet = %opts.sink.target_sheet, "sheet sink unavailable: {e}"),
        }
    }
    if out.is_empty() {
        return Err(RelayError::Configuration(s!("no usable delivery transport")));
    }
    Ok(out)
}
