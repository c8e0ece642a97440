//! Accumulation/Distribution line.
//!
//! Money flow multiplier ((C − L) − (H − C)) / (H − L), times volume,
//! accumulated from the first bar. Bars with H = L contribute nothing.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct AdLine;

impl AdLine {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for AdLine {
    fn name(&self) -> &str {
        "ad_line"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut ad = 0.0;
        bars.iter()
            .map(|bar| {
                let range = bar.high - bar.low;
                if range > 0.0 {
                    let mfm = ((bar.close - bar.low) - (bar.high - bar.close)) / range;
                    ad += mfm * bar.volume_f64();
                }
                ad
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn bar(high: f64, low: f64, close: f64, volume: u64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            open: close,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn close_at_high_adds_full_volume() {
        let result = AdLine::new().compute(&[bar(11.0, 9.0, 11.0, 500)]);
        assert_approx(result[0], 500.0, DEFAULT_EPSILON);
    }

    #[test]
    fn close_at_low_subtracts_full_volume() {
        let result = AdLine::new().compute(&[bar(11.0, 9.0, 11.0, 500), bar(11.0, 9.0, 9.0, 200)]);
        assert_approx(result[1], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_range_bar_is_neutral() {
        let result = AdLine::new().compute(&[bar(10.0, 10.0, 10.0, 1_000)]);
        assert_eq!(result[0], 0.0);
    }
}
