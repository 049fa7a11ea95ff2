//! Configuration for the history indexer.
//!
//! Provides [`HistoryConfig`] with defaults for the data directory and
//! logging. The binary overrides fields from command-line flags.

use std::path::PathBuf;

/// Configuration for a history indexer instance.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Root directory for all persistent data.
    pub data_dir: PathBuf,
    /// Log level filter string (e.g. "info", "debug", "rill_history_lib=trace").
    pub log_level: String,
    /// Log output format: "text" or "json".
    pub log_format: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rill");

        Self {
            data_dir,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl HistoryConfig {
    /// Path to the RocksDB history database directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("history")
    }
}
