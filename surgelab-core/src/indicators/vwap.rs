//! Volume-Weighted Average Price, anchored at the first supplied bar.
//!
//! VWAP[t] = Σ(tp × volume) / Σ volume over bars 0..=t (not a rolling
//! window). NaN while cumulative volume is zero.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct Vwap;

impl Vwap {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut cum_pv = 0.0;
        let mut cum_vol = 0.0;
        bars.iter()
            .map(|bar| {
                cum_pv += bar.typical_price() * bar.volume_f64();
                cum_vol += bar.volume_f64();
                if cum_vol > 0.0 {
                    cum_pv / cum_vol
                } else {
                    f64::NAN
                }
            })
            .collect()
    }
}
