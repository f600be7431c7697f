//! Port traits between the domain and its adapters.

pub mod series_port;
pub mod result_port;
pub mod config_port;
