//! Market-data provider trait and the two bundled implementations.
//!
//! The runner never talks to a data source directly: every call goes through
//! [`crate::fetch::FetchPool`], which adds rate limiting and the circuit
//! breaker. Providers may return bars in any order; the pool normalizes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use surgelab_core::domain::{normalize_bars, Bar, InvestorFlow};

use crate::error::ProviderError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    pub volume: u64,
    pub change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedSymbol {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingKind {
    VolumeSurge,
    PriceChange,
    TradingValue,
}

/// A source of daily bars, quotes, rankings and (optionally) investor flows.
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `count` most recent daily bars.
    fn daily_bars(&self, symbol: &str, count: usize) -> Result<Vec<Bar>, ProviderError>;

    fn current_quote(&self, symbol: &str) -> Result<Quote, ProviderError>;

    fn ranked_symbols(
        &self,
        market: &str,
        kind: RankingKind,
        limit: usize,
    ) -> Result<Vec<RankedSymbol>, ProviderError>;

    /// `Ok(None)` means the provider has no flow data at all.
    fn investor_flows(
        &self,
        _symbol: &str,
        _count: usize,
    ) -> Result<Option<Vec<InvestorFlow>>, ProviderError> {
        Ok(None)
    }
}

fn last_n<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    items[items.len().saturating_sub(n)..].to_vec()
}

fn quote_from_bars(symbol: &str, bars: &[Bar]) -> Result<Quote, ProviderError> {
    let last = bars.last().ok_or_else(|| ProviderError::SymbolNotFound {
        symbol: symbol.to_string(),
    })?;
    let change_pct = match bars.len() {
        0 | 1 => 0.0,
        n => surgelab_core::domain::pct_change(bars[n - 2].close, last.close),
    };
    Ok(Quote {
        price: last.close,
        volume: last.volume,
        change_pct,
    })
}

// ─── In-memory provider ─────────────────────────────────────────────

/// Map-backed provider for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    bars: HashMap<String, Vec<Bar>>,
    flows: HashMap<String, Vec<InvestorFlow>>,
    rankings: HashMap<(String, RankingKind), Vec<RankedSymbol>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.bars.insert(symbol.into(), normalize_bars(bars));
        self
    }

    pub fn with_flows(mut self, symbol: impl Into<String>, flows: Vec<InvestorFlow>) -> Self {
        self.flows.insert(symbol.into(), flows);
        self
    }

    pub fn with_ranking(
        mut self,
        market: impl Into<String>,
        kind: RankingKind,
        symbols: Vec<RankedSymbol>,
    ) -> Self {
        self.rankings.insert((market.into(), kind), symbols);
        self
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.bars.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

impl MarketDataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn daily_bars(&self, symbol: &str, count: usize) -> Result<Vec<Bar>, ProviderError> {
        self.bars
            .get(symbol)
            .map(|bars| last_n(bars, count))
            .ok_or_else(|| ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }

    fn current_quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        quote_from_bars(symbol, &self.daily_bars(symbol, 2)?)
    }

    fn ranked_symbols(
        &self,
        market: &str,
        kind: RankingKind,
        limit: usize,
    ) -> Result<Vec<RankedSymbol>, ProviderError> {
        Ok(self
            .rankings
            .get(&(market.to_string(), kind))
            .map(|r| r.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn investor_flows(
        &self,
        symbol: &str,
        count: usize,
    ) -> Result<Option<Vec<InvestorFlow>>, ProviderError> {
        if self.flows.is_empty() {
            return Ok(None);
        }
        let mut flows = self.flows.get(symbol).cloned().unwrap_or_default();
        flows.sort_by_key(|f| f.date);
        Ok(Some(last_n(&flows, count)))
    }
}

// ─── CSV provider ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CsvBarRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

/// Reads `{dir}/{SYMBOL}.csv` with a `date,open,high,low,close,volume` header.
/// Rows with inconsistent OHLC are rejected. Rankings are unsupported.
#[derive(Debug, Clone)]
pub struct CsvBarProvider {
    dir: PathBuf,
}

impl CsvBarProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<Bar>, ProviderError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let file = std::fs::File::open(&path).map_err(|source| ProviderError::Io {
            path: path.clone(),
            source,
        })?;

        let mut reader = csv::Reader::from_reader(file);
        let mut bars = Vec::new();
        for row in reader.deserialize::<CsvBarRow>() {
            let row = row.map_err(|e| ProviderError::Malformed {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;
            let bar = Bar {
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            };
            if !bar.is_sane() {
                return Err(ProviderError::Malformed {
                    symbol: symbol.to_string(),
                    reason: format!("inconsistent OHLC on {}", bar.date),
                });
            }
            bars.push(bar);
        }
        Ok(normalize_bars(bars))
    }
}

impl MarketDataProvider for CsvBarProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn daily_bars(&self, symbol: &str, count: usize) -> Result<Vec<Bar>, ProviderError> {
        Ok(last_n(&self.read_all(symbol)?, count))
    }

    fn current_quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        quote_from_bars(symbol, &self.daily_bars(symbol, 2)?)
    }

    fn ranked_symbols(
        &self,
        _market: &str,
        _kind: RankingKind,
        _limit: usize,
    ) -> Result<Vec<RankedSymbol>, ProviderError> {
        Err(ProviderError::Unsupported("symbol rankings"))
    }
}
