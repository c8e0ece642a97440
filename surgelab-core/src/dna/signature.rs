//! Per-window signature computation shared by exemplars and candidates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{DnaError, DnaIndicator, Exemplar};
use crate::domain::{longest_positive_streak, Bar, InvestorFlow};
use crate::indicators::{decay_weighted_mean, mean_volume};

pub const DNA_HALF_LIFE: f64 = 5.0;
pub const BASELINE_BARS: usize = 20;
pub const RECENT_BARS: usize = 5;

/// Indicator values for one window.
pub type Signature = BTreeMap<DnaIndicator, f64>;

/// Compute the signature of `window`.
///
/// Per-bar volume ratios are taken against the mean volume of the last
/// [`BASELINE_BARS`] of `baseline`, falling back to the window's own mean when
/// no usable baseline exists. Streak indicators appear only when `flows`
/// is `Some` and non-empty.
pub fn compute_signature(
    window: &[Bar],
    baseline: &[Bar],
    flows: Option<&[InvestorFlow]>,
) -> Result<Signature, DnaError> {
    if window.is_empty() {
        return Err(DnaError::EmptyWindow);
    }

    let tail = &baseline[baseline.len().saturating_sub(BASELINE_BARS)..];
    let mut reference = mean_volume(tail);
    if reference <= 0.0 {
        reference = mean_volume(window);
    }
    if reference <= 0.0 {
        return Err(DnaError::NoVolume);
    }

    let ratios: Vec<f64> = window.iter().map(|b| b.volume_f64() / reference).collect();

    let mut signature = Signature::new();
    signature.insert(
        DnaIndicator::VolumeWeighted,
        decay_weighted_mean(&ratios, DNA_HALF_LIFE),
    );
    signature.insert(DnaIndicator::VolumeTrend, segment_trend(&ratios));
    signature.insert(
        DnaIndicator::VolumeRecent,
        crate::indicators::mean(&ratios[ratios.len().saturating_sub(RECENT_BARS)..]),
    );

    if let Some(flows) = flows.filter(|f| !f.is_empty()) {
        signature.insert(
            DnaIndicator::InstitutionStreak,
            longest_positive_streak(flows, |f| f.institution_net_buy) as f64,
        );
        signature.insert(
            DnaIndicator::ForeignStreak,
            longest_positive_streak(flows, |f| f.foreign_net_buy) as f64,
        );
    }

    Ok(signature)
}

/// `0.2·early + 0.3·mid + 0.5·late` over a 40/30/30 split. Segments that
/// come out empty on very short windows use the overall mean.
fn segment_trend(ratios: &[f64]) -> f64 {
    let n = ratios.len();
    let overall = crate::indicators::mean(ratios);
    let early_end = ((n as f64 * 0.4).floor() as usize).max(1).min(n);
    let mid_end = ((n as f64 * 0.7).floor() as usize).max(early_end).min(n);

    let segment = |s: &[f64]| {
        if s.is_empty() {
            overall
        } else {
            crate::indicators::mean(s)
        }
    };
    0.2 * segment(&ratios[..early_end])
        + 0.3 * segment(&ratios[early_end..mid_end])
        + 0.5 * segment(&ratios[mid_end..])
}

/// Signature of one exemplar window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExemplarPattern {
    pub exemplar: Exemplar,
    pub values: Signature,
}

impl ExemplarPattern {
    /// `bars` may extend beyond the exemplar range; only bars inside it form
    /// the window, and bars before it form the baseline. Flows outside the
    /// range are ignored.
    pub fn from_window(
        exemplar: Exemplar,
        bars: &[Bar],
        flows: Option<&[InvestorFlow]>,
    ) -> Result<Self, DnaError> {
        let start = bars.partition_point(|b| b.date < exemplar.start_date);
        let end = bars.partition_point(|b| b.date <= exemplar.end_date);
        let window = if start < end { &bars[start..end] } else { &[][..] };
        let baseline = &bars[..start];

        let in_range: Option<Vec<InvestorFlow>> = flows.map(|f| {
            f.iter()
                .filter(|flow| exemplar.contains(flow.date))
                .cloned()
                .collect()
        });

        let values = compute_signature(window, baseline, in_range.as_deref())?;
        Ok(Self { exemplar, values })
    }
}

/// Signature of a live symbol, computed on its most recent window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnaCandidate {
    pub symbol: String,
    pub values: Signature,
}

impl DnaCandidate {
    /// The last `window_len` bars form the window; the bars before them the baseline.
    pub fn from_recent(
        symbol: impl Into<String>,
        bars: &[Bar],
        window_len: usize,
        flows: Option<&[InvestorFlow]>,
    ) -> Result<Self, DnaError> {
        let split = bars.len().saturating_sub(window_len.max(1));
        let window = &bars[split..];
        let recent_flows: Option<Vec<InvestorFlow>> = match (flows, window.first()) {
            (Some(f), Some(first)) => Some(
                f.iter()
                    .filter(|flow| flow.date >= first.date)
                    .cloned()
                    .collect(),
            ),
            _ => None,
        };
        let values = compute_signature(window, &bars[..split], recent_flows.as_deref())?;
        Ok(Self {
            symbol: symbol.into(),
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars_with_volume, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    #[test]
    fn ratios_against_baseline_mean() {
        // 20 baseline bars at 1000, window volumes 2000.
        let mut rows = vec![(100.0, 1000u64); 20];
        rows.extend(vec![(101.0, 2000u64); 10]);
        let bars = make_bars_with_volume(&rows);
        let sig = compute_signature(&bars[20..], &bars[..20], None).unwrap();
        assert_approx(sig[&DnaIndicator::VolumeWeighted], 2.0, DEFAULT_EPSILON);
        assert_approx(sig[&DnaIndicator::VolumeTrend], 2.0, DEFAULT_EPSILON);
        assert_approx(sig[&DnaIndicator::VolumeRecent], 2.0, DEFAULT_EPSILON);
        assert!(!sig.contains_key(&DnaIndicator::InstitutionStreak));
    }

    #[test]
    fn falls_back_to_window_mean_without_baseline() {
        let bars = make_bars_with_volume(&[(10.0, 100), (10.0, 300)]);
        let sig = compute_signature(&bars, &[], None).unwrap();
        // ratios 0.5 and 1.5
        assert_approx(sig[&DnaIndicator::VolumeRecent], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn trend_weights_late_segment() {
        // 10 bars: early 4 at 1.0, mid 3 at 2.0, late 3 at 4.0
        let mut rows = vec![(10.0, 1000u64); 20];
        rows.extend(vec![(10.0, 1000u64); 4]);
        rows.extend(vec![(10.0, 2000u64); 3]);
        rows.extend(vec![(10.0, 4000u64); 3]);
        let bars = make_bars_with_volume(&rows);
        let sig = compute_signature(&bars[20..], &bars[..20], None).unwrap();
        assert_approx(
            sig[&DnaIndicator::VolumeTrend],
            0.2 * 1.0 + 0.3 * 2.0 + 0.5 * 4.0,
            DEFAULT_EPSILON,
        );
    }

    #[test]
    fn empty_and_silent_windows_fail() {
        assert_eq!(compute_signature(&[], &[], None), Err(DnaError::EmptyWindow));
        let bars = make_bars_with_volume(&[(10.0, 0), (10.0, 0)]);
        assert_eq!(compute_signature(&bars, &[], None), Err(DnaError::NoVolume));
    }

    #[test]
    fn from_window_selects_range_and_flows() {
        let rows: Vec<(f64, u64)> = (0..40).map(|i| (100.0 + i as f64, 1000)).collect();
        let bars = make_bars_with_volume(&rows);
        let exemplar = Exemplar::new("AAA", bars[25].date, bars[34].date);
        let flows: Vec<InvestorFlow> = bars
            .iter()
            .map(|b| InvestorFlow {
                date: b.date,
                institution_net_buy: 1.0,
                foreign_net_buy: if b.date == bars[30].date { -1.0 } else { 1.0 },
            })
            .collect();
        let pattern = ExemplarPattern::from_window(exemplar, &bars, Some(&flows)).unwrap();
        assert_approx(pattern.values[&DnaIndicator::InstitutionStreak], 10.0, DEFAULT_EPSILON);
        assert_approx(pattern.values[&DnaIndicator::ForeignStreak], 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn exemplar_outside_history_is_empty() {
        let bars = make_bars_with_volume(&[(10.0, 100); 5]);
        let far = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let exemplar = Exemplar::new("AAA", far, far);
        assert_eq!(
            ExemplarPattern::from_window(exemplar, &bars, None),
            Err(DnaError::EmptyWindow)
        );
    }

    #[test]
    fn candidate_uses_recent_window() {
        let mut rows = vec![(10.0, 1000u64); 30];
        rows.extend(vec![(10.0, 3000u64); 5]);
        let bars = make_bars_with_volume(&rows);
        let cand = DnaCandidate::from_recent("BBB", &bars, 5, None).unwrap();
        assert_approx(cand.values[&DnaIndicator::VolumeRecent], 3.0, DEFAULT_EPSILON);
    }
}
