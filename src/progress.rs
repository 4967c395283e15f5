// src/progress.rs
use crate::record::SourceRecord;
use crate::runner::RunSummary;
use crate::sink::DeliveryOutcome;

/// Progress reporting for a relay pass. The CLI implements this to print
/// status lines; tests use it to observe outcomes.
pub trait Progress {
    /// Called once the new records are known.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// Called after each delivery attempt.
    fn item_done(&mut self, _record: &SourceRecord, _outcome: DeliveryOutcome) {}

    /// Called at the end of a pass that got past the fetch.
    fn finish(&mut self, _summary: &RunSummary) {}
}
