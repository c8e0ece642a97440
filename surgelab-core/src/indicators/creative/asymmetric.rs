//! Asymmetric volume: how lopsided up-day vs down-day volume is.
//!
//! Over the last 20 bars, each bar is an up day or a down day relative to the
//! previous close. ratio = up_volume / down_volume (100 when there is no
//! down volume), score = |ratio − 1| × 50.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

pub const ASYMMETRIC_WINDOW: usize = 20;
pub const ASYMMETRIC_NO_DOWN_RATIO: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsymmetricVolume {
    pub up_volume: f64,
    pub down_volume: f64,
    pub ratio: f64,
    pub score: f64,
    /// Up-day volume dominates.
    pub bullish: bool,
}

impl Default for AsymmetricVolume {
    fn default() -> Self {
        Self {
            up_volume: 0.0,
            down_volume: 0.0,
            ratio: 1.0,
            score: 0.0,
            bullish: false,
        }
    }
}

pub fn detect_asymmetric_volume(bars: &[Bar]) -> AsymmetricVolume {
    let n = bars.len();
    if n < ASYMMETRIC_WINDOW + 1 {
        return AsymmetricVolume::default();
    }

    let mut up_volume = 0.0;
    let mut down_volume = 0.0;
    for i in n - ASYMMETRIC_WINDOW..n {
        let (prev, curr) = (&bars[i - 1], &bars[i]);
        if curr.close > prev.close {
            up_volume += curr.volume_f64();
        } else if curr.close < prev.close {
            down_volume += curr.volume_f64();
        }
    }

    let ratio = if down_volume > 0.0 {
        up_volume / down_volume
    } else if up_volume > 0.0 {
        ASYMMETRIC_NO_DOWN_RATIO
    } else {
        1.0
    };

    AsymmetricVolume {
        up_volume,
        down_volume,
        ratio,
        score: (ratio - 1.0).abs() * 50.0,
        bullish: ratio > 1.0,
    }
}
