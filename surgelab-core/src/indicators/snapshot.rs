//! IndicatorSnapshot — everything the scorer, miner and DNA matcher need,
//! evaluated as of the last supplied bar.
//!
//! Snapshots are derived data: recomputed on demand from bars, never stored
//! as a source of truth.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::creative::{
    detect_asymmetric_volume, detect_escape_velocity, detect_liquidity_drain,
    detect_silent_accumulation, detect_whale, AsymmetricVolume, EscapeVelocity, LiquidityDrain,
    SilentAccumulation, WhaleActivity,
};
use super::obv::obv_trend_pct;
use super::{last_valid, mean_volume, AdLine, Indicator, Mfi, Obv, Sma, VolumeMa, Vwap};
use crate::domain::{pct_change, Bar};

/// Bars required before a snapshot can be extracted (the widest detector window).
pub const MIN_SNAPSHOT_BARS: usize = 30;

/// Window for the volume ratio baseline and the volume MA.
pub const VOLUME_BASELINE_BARS: usize = 20;

/// Bars over which the OBV trend is measured.
pub const OBV_TREND_BARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    /// Last bar's close vs the previous close, in percent.
    pub change_pct: f64,

    // ── Series indicators ──
    pub obv: f64,
    pub obv_trend_pct: f64,
    pub mfi: f64,
    pub vwap: f64,
    pub ad_line: f64,
    pub sma_5: f64,
    pub sma_20: f64,
    pub volume_ma_20: f64,
    /// Last bar's volume over the mean volume of the 20 bars before it.
    pub volume_ratio: f64,

    // ── Creative detectors ──
    pub whale: WhaleActivity,
    pub accumulation: SilentAccumulation,
    pub escape: EscapeVelocity,
    pub drain: LiquidityDrain,
    pub asymmetric: AsymmetricVolume,
}

impl IndicatorSnapshot {
    /// A snapshot with neutral readings and no detector firing.
    pub fn neutral(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            change_pct: 0.0,
            obv: 0.0,
            obv_trend_pct: 0.0,
            mfi: 50.0,
            vwap: close,
            ad_line: 0.0,
            sma_5: close,
            sma_20: close,
            volume_ma_20: 0.0,
            volume_ratio: 1.0,
            whale: WhaleActivity::default(),
            accumulation: SilentAccumulation::default(),
            escape: EscapeVelocity::default(),
            drain: LiquidityDrain::default(),
            asymmetric: AsymmetricVolume::default(),
        }
    }

    /// Close above VWAP, in percent.
    pub fn vwap_gap_pct(&self) -> f64 {
        pct_change(self.vwap, self.close)
    }

    /// Close above the 20-bar SMA, in percent.
    pub fn sma_20_gap_pct(&self) -> f64 {
        pct_change(self.sma_20, self.close)
    }
}

/// Outcome of snapshot extraction. Too little history is a skip, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Ready(IndicatorSnapshot),
    InsufficientData { required: usize, available: usize },
}

impl Extraction {
    pub fn into_snapshot(self) -> Option<IndicatorSnapshot> {
        match self {
            Self::Ready(snapshot) => Some(snapshot),
            Self::InsufficientData { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Extract an [`IndicatorSnapshot`] as of the last bar of `bars` (ascending).
pub fn extract_snapshot(bars: &[Bar]) -> Extraction {
    let n = bars.len();
    if n < MIN_SNAPSHOT_BARS {
        return Extraction::InsufficientData {
            required: MIN_SNAPSHOT_BARS,
            available: n,
        };
    }

    let last = &bars[n - 1];
    let obv_series = Obv::new().compute(bars);
    let baseline = mean_volume(&bars[n - 1 - VOLUME_BASELINE_BARS..n - 1]);

    Extraction::Ready(IndicatorSnapshot {
        date: last.date,
        close: last.close,
        change_pct: pct_change(bars[n - 2].close, last.close),
        obv: last_valid(&obv_series).unwrap_or(0.0),
        obv_trend_pct: obv_trend_pct(&obv_series, OBV_TREND_BARS),
        mfi: last_valid(&Mfi::default().compute(bars)).unwrap_or(50.0),
        vwap: last_valid(&Vwap::new().compute(bars)).unwrap_or(last.close),
        ad_line: last_valid(&AdLine::new().compute(bars)).unwrap_or(0.0),
        sma_5: last_valid(&Sma::new(5).compute(bars)).unwrap_or(last.close),
        sma_20: last_valid(&Sma::new(20).compute(bars)).unwrap_or(last.close),
        volume_ma_20: last_valid(&VolumeMa::new(VOLUME_BASELINE_BARS).compute(bars)).unwrap_or(0.0),
        volume_ratio: if baseline > 0.0 {
            last.volume_f64() / baseline
        } else {
            0.0
        },
        whale: detect_whale(bars),
        accumulation: detect_silent_accumulation(bars),
        escape: detect_escape_velocity(bars),
        drain: detect_liquidity_drain(bars),
        asymmetric: detect_asymmetric_volume(bars),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, make_bars_with_volume};

    #[test]
    fn short_history_is_tagged_not_failed() {
        let bars = make_bars(&[100.0; 12]);
        assert_eq!(
            extract_snapshot(&bars),
            Extraction::InsufficientData {
                required: MIN_SNAPSHOT_BARS,
                available: 12
            }
        );
    }

    #[test]
    fn snapshot_reads_last_bar() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let snap = extract_snapshot(&bars).into_snapshot().unwrap();
        assert_eq!(snap.date, bars[39].date);
        assert_eq!(snap.close, 139.0);
        assert_approx(snap.sma_5, 137.0, 1e-9);
        assert_approx(snap.volume_ratio, 1.0, 1e-9);
        assert_approx(snap.mfi, 100.0, 1e-9);
        assert!(snap.obv_trend_pct > 0.0);
        assert!(snap.asymmetric.bullish);
    }

    #[test]
    fn volume_ratio_uses_prior_bars() {
        let mut rows: Vec<(f64, u64)> = (0..30).map(|_| (100.0, 1000)).collect();
        rows[29] = (104.0, 3000);
        let snap = extract_snapshot(&make_bars_with_volume(&rows))
            .into_snapshot()
            .unwrap();
        assert_approx(snap.volume_ratio, 3.0, 1e-9);
        assert_approx(snap.change_pct, 4.0, 1e-9);
    }

    #[test]
    fn truncated_series_matches_prefix() {
        let closes: Vec<f64> = (0..45).map(|i| 100.0 + ((i * 7) % 11) as f64).collect();
        let bars = make_bars(&closes);
        let full = Obv::new().compute(&bars);
        let truncated = Obv::new().compute(&bars[..35]);
        assert_eq!(&full[..35], &truncated[..]);
    }
}
