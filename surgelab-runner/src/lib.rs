//! SurgeLab Runner — fetching, mining, DNA scanning, backtests, screening.
//!
//! This crate builds on `surgelab-core` to provide:
//! - A market-data provider trait with in-memory and CSV implementations
//! - A bounded, rate-limited fetch pool with a circuit breaker
//! - Surge corpus collection and pattern publishing (standard and smart)
//! - DNA extraction from exemplars and scanning of live symbols
//! - Historical backtests over entry rules
//! - Live screening with pattern, DNA and sentiment feedback
//! - TTL caches, JSON stores, export, config and logging

pub mod backtest;
pub mod cache;
pub mod config;
pub mod dna;
pub mod error;
pub mod export;
pub mod fetch;
pub mod mining;
pub mod provider;
pub mod screener;
pub mod store;
pub mod telemetry;

pub use backtest::{BacktestReport, EntryRule, HistoricalBacktest};
pub use cache::TtlCache;
pub use config::{
    BacktestConfig, CacheConfig, ConfigError, DnaConfig, FetchConfig, MiningConfig,
    SmartMiningConfig, SurgeLabConfig,
};
pub use dna::{DnaExtractor, DnaScanReport, DnaScanner, PublishedProfile};
pub use error::{ProviderError, RunError, StoreError};
pub use fetch::{CircuitBreaker, FetchPool, Fetched, RateLimiter};
pub use mining::{
    find_surge_event, MiningReport, MiningRun, PatternMiner, PublishedPatterns, ScanBudget,
    SmartMiningReport, SmartMiningRun, SmartPatternMiner,
};
pub use provider::{
    CsvBarProvider, InMemoryProvider, MarketDataProvider, Quote, RankedSymbol, RankingKind,
};
pub use screener::{DnaFeedback, ScreenContext, ScreenHit, ScreenResult, Screener, SentimentSource};
pub use store::{DnaStore, JsonFileStore, PatternStore};
pub use telemetry::init_logging;
