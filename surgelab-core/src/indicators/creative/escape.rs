//! Escape velocity: a high-volume up bar closing above recent resistance.
//!
//! Reference window = the 25 bars before the most recent 5 (last 30 bars
//! minus the last 5). Detected when close[last] > max(high of window),
//! volume[last] / mean(volume of window) ≥ 2 and close[last] > open[last].

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::indicators::mean_volume;

pub const ESCAPE_WINDOW: usize = 30;
pub const ESCAPE_EXCLUDE_RECENT: usize = 5;
pub const ESCAPE_MIN_VOLUME_RATIO: f64 = 2.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EscapeVelocity {
    pub detected: bool,
    /// Highest high of the reference window.
    pub resistance: f64,
    /// Close above resistance, in percent (negative when below).
    pub breakout_pct: f64,
    pub volume_ratio: f64,
}

pub fn detect_escape_velocity(bars: &[Bar]) -> EscapeVelocity {
    let n = bars.len();
    if n < ESCAPE_WINDOW {
        return EscapeVelocity::default();
    }
    let reference = &bars[n - ESCAPE_WINDOW..n - ESCAPE_EXCLUDE_RECENT];
    let last = &bars[n - 1];

    let resistance = reference
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let avg_volume = mean_volume(reference);
    let volume_ratio = if avg_volume > 0.0 {
        last.volume_f64() / avg_volume
    } else {
        0.0
    };
    let breakout_pct = if resistance > 0.0 {
        (last.close - resistance) / resistance * 100.0
    } else {
        0.0
    };

    EscapeVelocity {
        detected: last.close > resistance
            && volume_ratio >= ESCAPE_MIN_VOLUME_RATIO
            && last.close > last.open,
        resistance,
        breakout_pct,
        volume_ratio,
    }
}
