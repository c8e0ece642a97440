//! Liquidity drain: volume and volatility drying up together.
//!
//! Compares the last 10 bars to the 20 before them. Detected when mean
//! volume fell by at least 30% and mean per-bar volatility (high − low) / close
//! fell by at least 20%.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::indicators::{mean, mean_volume};

pub const DRAIN_RECENT_BARS: usize = 10;
pub const DRAIN_PRIOR_BARS: usize = 20;
pub const DRAIN_VOLUME_DECLINE_PCT: f64 = -30.0;
pub const DRAIN_VOLATILITY_DECLINE_PCT: f64 = -20.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidityDrain {
    pub detected: bool,
    pub volume_decline_pct: f64,
    pub volatility_decline_pct: f64,
}

pub fn detect_liquidity_drain(bars: &[Bar]) -> LiquidityDrain {
    let n = bars.len();
    if n < DRAIN_RECENT_BARS + DRAIN_PRIOR_BARS {
        return LiquidityDrain::default();
    }
    let recent = &bars[n - DRAIN_RECENT_BARS..];
    let prior = &bars[n - DRAIN_RECENT_BARS - DRAIN_PRIOR_BARS..n - DRAIN_RECENT_BARS];

    let volume_decline_pct = change_pct(mean_volume(prior), mean_volume(recent));
    let volatility = |w: &[Bar]| mean(&w.iter().map(Bar::range_pct).collect::<Vec<_>>());
    let volatility_decline_pct = change_pct(volatility(prior), volatility(recent));

    LiquidityDrain {
        detected: volume_decline_pct <= DRAIN_VOLUME_DECLINE_PCT
            && volatility_decline_pct <= DRAIN_VOLATILITY_DECLINE_PCT,
        volume_decline_pct,
        volatility_decline_pct,
    }
}

fn change_pct(before: f64, after: f64) -> f64 {
    if before <= 0.0 {
        return 0.0;
    }
    (after / before - 1.0) * 100.0
}
