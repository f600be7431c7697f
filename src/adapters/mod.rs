//! Concrete adapter implementations for ports.

pub mod csv_series_adapter;
pub mod csv_result_adapter;
pub mod file_config_adapter;
pub mod yahoo_json_adapter;
