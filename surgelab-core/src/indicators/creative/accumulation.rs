//! Silent accumulation: flat price, rising volume.
//!
//! Over the last 20 bars: stdev(close) / mean(close) < 3% and the newer half's
//! mean volume exceeds the older half's by at least 20%.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::indicators::{mean, mean_volume, pop_std_dev};

pub const ACCUMULATION_WINDOW: usize = 20;
pub const ACCUMULATION_MAX_CV_PCT: f64 = 3.0;
pub const ACCUMULATION_MIN_VOLUME_INCREASE_PCT: f64 = 20.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SilentAccumulation {
    pub detected: bool,
    /// Coefficient of variation of close, in percent.
    pub price_cv_pct: f64,
    /// Newer-half vs older-half volume change, in percent.
    pub volume_increase_pct: f64,
}

pub fn detect_silent_accumulation(bars: &[Bar]) -> SilentAccumulation {
    if bars.len() < ACCUMULATION_WINDOW {
        return SilentAccumulation::default();
    }
    let window = &bars[bars.len() - ACCUMULATION_WINDOW..];
    let closes: Vec<f64> = window.iter().map(|b| b.close).collect();
    let mean_close = mean(&closes);
    if mean_close <= 0.0 {
        return SilentAccumulation::default();
    }
    let price_cv_pct = pop_std_dev(&closes) / mean_close * 100.0;

    let half = ACCUMULATION_WINDOW / 2;
    let older = mean_volume(&window[..half]);
    let newer = mean_volume(&window[half..]);
    let volume_increase_pct = if older > 0.0 {
        (newer / older - 1.0) * 100.0
    } else {
        0.0
    };

    SilentAccumulation {
        detected: price_cv_pct < ACCUMULATION_MAX_CV_PCT
            && volume_increase_pct >= ACCUMULATION_MIN_VOLUME_INCREASE_PCT,
        price_cv_pct,
        volume_increase_pct,
    }
}
