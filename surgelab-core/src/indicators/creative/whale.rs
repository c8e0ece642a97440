//! Whale activity: a single bar with outsized volume and a large body.
//!
//! Scans the last 10 bars. A bar qualifies when its volume is at least 2.5×
//! the mean volume of the 20 bars before it and |close − open| / open ≥ 3%.
//! Intensity = volume_ratio × price_change_pct / 10.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::indicators::mean_volume;

pub const WHALE_SCAN_BARS: usize = 10;
pub const WHALE_BASELINE_BARS: usize = 20;
pub const WHALE_VOLUME_RATIO: f64 = 2.5;
pub const WHALE_PRICE_CHANGE_PCT: f64 = 3.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhaleActivity {
    pub detected: bool,
    /// Qualifying bars within the scan window.
    pub count: usize,
    /// Intensity of the strongest qualifying bar.
    pub intensity: f64,
    pub volume_ratio: f64,
    pub price_change_pct: f64,
    /// Bars between the latest qualifying bar and the last bar (0 = last bar).
    pub bars_ago: Option<usize>,
}

pub fn detect_whale(bars: &[Bar]) -> WhaleActivity {
    let n = bars.len();
    let mut out = WhaleActivity::default();
    if n <= WHALE_BASELINE_BARS {
        return out;
    }

    let first = n.saturating_sub(WHALE_SCAN_BARS).max(WHALE_BASELINE_BARS);
    for i in first..n {
        let baseline = mean_volume(&bars[i - WHALE_BASELINE_BARS..i]);
        if baseline <= 0.0 || bars[i].open <= 0.0 {
            continue;
        }
        let volume_ratio = bars[i].volume_f64() / baseline;
        let price_change_pct = (bars[i].close - bars[i].open).abs() / bars[i].open * 100.0;
        if volume_ratio < WHALE_VOLUME_RATIO || price_change_pct < WHALE_PRICE_CHANGE_PCT {
            continue;
        }

        let intensity = volume_ratio * price_change_pct / 10.0;
        out.detected = true;
        out.count += 1;
        out.bars_ago = Some(n - 1 - i);
        if intensity > out.intensity {
            out.intensity = intensity;
            out.volume_ratio = volume_ratio;
            out.price_change_pct = price_change_pct;
        }
    }
    out
}
