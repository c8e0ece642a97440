//! Structured error types for the runner.
//!
//! Provider failures are per-symbol and never abort a batch; they surface in
//! the batch report counts. `RunError` is for failures of a whole operation.

use std::path::PathBuf;

use thiserror::Error;

use surgelab_core::dna::DnaError;
use surgelab_core::patterns::MiningError;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("provider does not support {0}")]
    Unsupported(&'static str),

    #[error("circuit breaker open ({remaining_secs}s cooldown remaining)")]
    CircuitOpen { remaining_secs: u64 },

    #[error("malformed data for {symbol}: {reason}")]
    Malformed { symbol: String, reason: String },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProviderError {
    /// Failures that say something about the provider's health rather than
    /// about one symbol. Only these count toward tripping the breaker.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited { .. })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store record at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize store record: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mining(#[from] MiningError),

    #[error(transparent)]
    Dna(#[from] DnaError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to build fetch pool: {0}")]
    ThreadPool(String),

    #[error("no symbols provided")]
    NoSymbols,
}
