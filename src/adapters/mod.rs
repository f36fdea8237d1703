//! Concrete adapter implementations for ports.

pub mod csv_market_adapter;
pub mod file_config_adapter;
pub mod file_reference_adapter;
#[cfg(feature = "http")]
pub mod http_reference_adapter;
