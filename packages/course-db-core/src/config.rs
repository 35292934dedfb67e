//! Service configuration.

use std::path::PathBuf;

/// Service configuration shared by the runtime, persistence and API layers.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Runtime ticks per second
    pub tickrate: u32,
    /// Ticks between flush checks
    pub persistence_interval_ticks: u32,
    pub max_api_requests_per_tick: u32,
    /// Holds one `<table>.json` snapshot per table
    pub data_dir: PathBuf,
    /// Write snapshots to `data_dir`; when false the store is memory only
    pub persistence_enabled: bool,
    /// Limit on reading a request body (ms)
    pub request_timeout_ms: u64,
    /// Limit on waiting for the runtime to answer (ms)
    pub response_timeout_ms: u64,
    /// Retries for transient snapshot write failures
    pub persistence_max_retries: u32,
    pub persistence_retry_delay_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            tickrate: 60,
            persistence_interval_ticks: 10,
            max_api_requests_per_tick: 600,
            data_dir: PathBuf::from("./data"),
            persistence_enabled: true,
            request_timeout_ms: 5000,
            response_timeout_ms: 10000,
            persistence_max_retries: 3,
            persistence_retry_delay_ms: 100,
        }
    }
}

impl DbConfig {
    /// Configuration for a memory-only store, used by tests and `--in-memory`.
    pub fn in_memory() -> Self {
        Self {
            persistence_enabled: false,
            ..Default::default()
        }
    }
}
