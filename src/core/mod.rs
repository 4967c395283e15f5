// src/core/mod.rs

pub mod amount;
pub mod recency;
pub mod sanitize;
