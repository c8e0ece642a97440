//! Indicator extraction.
//!
//! Series indicators implement [`Indicator`]: full bar history in, a series of
//! the same length out, NaN during warmup. Creative detectors in [`creative`]
//! are boolean/strength composites evaluated on the most recent window.
//! [`snapshot::extract_snapshot`] bundles everything as of the last bar.

pub mod ad_line;
pub mod creative;
pub mod decay;
pub mod mfi;
pub mod obv;
pub mod sma;
pub mod snapshot;
pub mod vwap;

pub use ad_line::AdLine;
pub use creative::{
    AsymmetricVolume, EscapeVelocity, LiquidityDrain, SilentAccumulation, WhaleActivity,
};
pub use decay::decay_weighted_mean;
pub use mfi::Mfi;
pub use obv::Obv;
pub use sma::{Sma, VolumeMa};
pub use snapshot::{extract_snapshot, Extraction, IndicatorSnapshot, MIN_SNAPSHOT_BARS};
pub use vwap::Vwap;

use crate::domain::Bar;

/// Trait for series indicators.
///
/// # Look-ahead guard
/// No value at bar t may depend on bar t+1 or later: computing on a truncated
/// series must reproduce the prefix of the full-series output.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "obv", "mfi_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Last value of a series, if it is finite.
pub fn last_valid(series: &[f64]) -> Option<f64> {
    series.last().copied().filter(|v| v.is_finite())
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub(crate) fn pop_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

pub(crate) fn mean_volume(bars: &[Bar]) -> f64 {
    if bars.is_empty() {
        return 0.0;
    }
    bars.iter().map(|b| b.volume_f64()).sum::<f64>() / bars.len() as f64
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Synthetic bars with explicit `(close, volume)` pairs; open = previous close.
#[cfg(test)]
pub fn make_bars_with_volume(rows: &[(f64, u64)]) -> Vec<Bar> {
    let closes: Vec<f64> = rows.iter().map(|r| r.0).collect();
    let mut bars = make_bars(&closes);
    for (bar, &(_, volume)) in bars.iter_mut().zip(rows) {
        bar.volume = volume;
    }
    bars
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
