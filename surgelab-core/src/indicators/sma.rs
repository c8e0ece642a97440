//! Simple moving averages of close (`Sma`) and of volume (`VolumeMa`).
//!
//! Trailing mean over `period` bars; first valid value at index `period - 1`.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rolling_mean(&closes, self.period)
    }
}

/// Volume MA(k): trailing mean of `volume` over the last k bars.
#[derive(Debug, Clone)]
pub struct VolumeMa {
    period: usize,
    name: String,
}

impl VolumeMa {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume MA period must be >= 1");
        Self {
            period,
            name: format!("volume_ma_{period}"),
        }
    }
}

impl Indicator for VolumeMa {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume_f64()).collect();
        rolling_mean(&volumes, self.period)
    }
}

/// Trailing mean with NaN propagation: any NaN inside the window yields NaN.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut nan_count = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            nan_count += 1;
        } else {
            sum += v;
        }
        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                nan_count -= 1;
            } else {
                sum -= leaving;
            }
        }
        if i + 1 >= period && nan_count == 0 {
            result[i] = sum / period as f64;
        }
    }
    result
}
