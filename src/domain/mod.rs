//! Core domain types and logic.

pub mod raw_series;
pub mod calendar;
pub mod normalize;
pub mod analysis;
pub mod stats;
pub mod table;
pub mod sources;
pub mod batch;
pub mod config_validation;
pub mod error;
