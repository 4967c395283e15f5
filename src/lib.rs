// src/lib.rs

#[macro_use]
pub mod macros;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod csv;
pub mod diff;
pub mod errors;
pub mod file;
pub mod ledger;
#[cfg(feature = "cli")]
pub mod log;
pub mod progress;
pub mod record;
pub mod runner;
pub mod sheets;
pub mod sink;
pub mod store;

pub use errors::{RelayError, Result};
pub use runner::{Relay, RunSummary};
