//! Bar — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar for a single symbol.
///
/// Bars are immutable once fetched. Analysis always runs over sequences
/// ordered oldest → newest; providers that hand back newest-first data are
/// normalized with [`normalize_bars`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any price field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// OHLC sanity check: high bounds open/close/low, low bounds open/close/high.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Typical price `(H + L + C) / 3`.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Intraday range relative to close, `(H − L) / C`.
    pub fn range_pct(&self) -> f64 {
        if self.close == 0.0 {
            return 0.0;
        }
        (self.high - self.low) / self.close
    }

    pub fn volume_f64(&self) -> f64 {
        self.volume as f64
    }
}

/// Sort bars oldest → newest and drop repeated dates (first occurrence wins).
pub fn normalize_bars(mut bars: Vec<Bar>) -> Vec<Bar> {
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    bars
}

/// Percent change from `from` to `to`; 0.0 when `from` is not positive.
pub fn pct_change(from: f64, to: f64) -> f64 {
    if from <= 0.0 || !from.is_finite() || !to.is_finite() {
        return 0.0;
    }
    (to - from) / from * 100.0
}
