//! On-Balance Volume (OBV).
//!
//! Seeded with the first bar's volume, then adds volume on an up close,
//! subtracts it on a down close and carries the previous value on a tie.
//! Lookback: 0.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct Obv;

impl Obv {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Obv {
    fn name(&self) -> &str {
        "obv"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = Vec::with_capacity(bars.len());
        let Some(first) = bars.first() else {
            return result;
        };
        let mut obv = first.volume_f64();
        result.push(obv);
        for w in bars.windows(2) {
            let (prev, curr) = (&w[0], &w[1]);
            if curr.close > prev.close {
                obv += curr.volume_f64();
            } else if curr.close < prev.close {
                obv -= curr.volume_f64();
            }
            result.push(obv);
        }
        result
    }
}

/// Percent change of OBV over the last `period` bars, relative to the
/// magnitude of the starting value. 0.0 when history is too short or the
/// starting value is zero.
pub fn obv_trend_pct(obv: &[f64], period: usize) -> f64 {
    if obv.len() <= period || period == 0 {
        return 0.0;
    }
    let end = obv[obv.len() - 1];
    let start = obv[obv.len() - 1 - period];
    if start == 0.0 || !start.is_finite() || !end.is_finite() {
        return 0.0;
    }
    (end - start) / start.abs() * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars_with_volume, DEFAULT_EPSILON};

    #[test]
    fn obv_seeded_with_first_volume() {
        let bars = make_bars_with_volume(&[(10.0, 500), (11.0, 100)]);
        let result = Obv::new().compute(&bars);
        assert_approx(result[0], 500.0, DEFAULT_EPSILON);
        assert_approx(result[1], 600.0, DEFAULT_EPSILON);
    }

    #[test]
    fn obv_direction_follows_close() {
        let rows = [(10.0, 100), (11.0, 200), (9.0, 50), (9.0, 999), (12.0, 10)];
        let bars = make_bars_with_volume(&rows);
        let result = Obv::new().compute(&bars);
        assert_eq!(result, vec![100.0, 300.0, 250.0, 250.0, 260.0]);
    }

    #[test]
    fn obv_empty_input() {
        assert!(Obv::new().compute(&[]).is_empty());
    }

    #[test]
    fn obv_trend_pct_over_window() {
        let obv = [100.0, 120.0, 150.0];
        assert_approx(obv_trend_pct(&obv, 2), 50.0, DEFAULT_EPSILON);
        assert_eq!(obv_trend_pct(&obv, 3), 0.0);
    }
}
