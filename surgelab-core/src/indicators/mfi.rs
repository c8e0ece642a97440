//! Money Flow Index (MFI).
//!
//! Typical price tp = (H + L + C) / 3, raw flow = tp × volume. A flow is
//! positive when tp rises vs the previous bar, negative when it falls, and
//! ignored on a tie. Over the last `period` flows:
//! MFI = 100 − 100 / (1 + Σpositive / Σnegative).
//! Σnegative = 0 is treated as an infinite ratio (MFI = 100).
//! Lookback: period.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Mfi {
    period: usize,
    name: String,
}

impl Mfi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "MFI period must be >= 1");
        Self {
            period,
            name: format!("mfi_{period}"),
        }
    }
}

impl Default for Mfi {
    fn default() -> Self {
        Self::new(14)
    }
}

impl Indicator for Mfi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period + 1 {
            return result;
        }

        // Signed flow per bar (index 0 has no predecessor).
        let mut positive = vec![0.0; n];
        let mut negative = vec![0.0; n];
        for i in 1..n {
            let tp = bars[i].typical_price();
            let prev_tp = bars[i - 1].typical_price();
            let flow = tp * bars[i].volume_f64();
            if tp > prev_tp {
                positive[i] = flow;
            } else if tp < prev_tp {
                negative[i] = flow;
            }
        }

        for i in self.period..n {
            let window = (i + 1 - self.period)..=i;
            let pos: f64 = positive[window.clone()].iter().sum();
            let neg: f64 = negative[window].iter().sum();
            result[i] = money_flow_index(pos, neg);
        }
        result
    }
}

fn money_flow_index(positive: f64, negative: f64) -> f64 {
    if negative == 0.0 {
        return 100.0;
    }
    let ratio = positive / negative;
    100.0 - 100.0 / (1.0 + ratio)
}
