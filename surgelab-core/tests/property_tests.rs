//! Property tests for indicator, scoring, mining, DNA and statistics invariants.
//!
//! Uses proptest to verify:
//! 1. OBV direction follows the close-to-close move
//! 2. Final score stays in [0, 100]; grade is a function of the final score alone
//! 3. Pattern win rate stays in [0, 100]; sample count equals the matched subset
//! 4. DNA matching is idempotent and exactly-at-threshold scores 100
//! 5. Trade statistics stay bounded

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::BTreeMap;
use surgelab_core::backtest::compute_statistics;
use surgelab_core::dna::{
    extract_profile_at, match_score, DnaCandidate, DnaIndicator, Exemplar, ExemplarPattern,
};
use surgelab_core::domain::{Bar, SimulatedTrade, SurgeEvent};
use surgelab_core::indicators::{Indicator, IndicatorSnapshot, Obv};
use surgelab_core::patterns::{backtest_pattern, PatternKind};
use surgelab_core::scoring::{score, term_catalog, Grade, GradeThresholds, ScoreInputs};

fn date(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap() + chrono::Duration::days(i as i64)
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_bars() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((1u32..50, 0u64..100_000), 2..60).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (c, v))| {
                let close = c as f64;
                Bar {
                    date: date(i),
                    open: close,
                    high: close + 1.0,
                    low: close - 0.5,
                    close,
                    volume: v,
                }
            })
            .collect()
    })
}

fn arb_snapshot() -> impl Strategy<Value = IndicatorSnapshot> {
    (
        (-50.0..50.0_f64, 0.0..100.0_f64, 1.0..200.0_f64, 0.0..10.0_f64),
        (any::<bool>(), 0.0..20.0_f64, any::<bool>(), any::<bool>()),
        (any::<bool>(), any::<bool>(), 0.0..100.0_f64, 0.1..5.0_f64),
    )
        .prop_map(
            |(
                (obv_trend, mfi, vwap, volume_ratio),
                (whale, intensity, accumulation, escape),
                (drain, bullish, asym_score, asym_ratio),
            )| {
                let mut s = IndicatorSnapshot::neutral(date(0), 100.0);
                s.obv_trend_pct = obv_trend;
                s.mfi = mfi;
                s.vwap = vwap;
                s.volume_ratio = volume_ratio;
                s.whale.detected = whale;
                s.whale.intensity = if whale { intensity } else { 0.0 };
                s.accumulation.detected = accumulation;
                s.escape.detected = escape;
                s.drain.detected = drain;
                s.asymmetric.bullish = bullish;
                s.asymmetric.score = asym_score;
                s.asymmetric.ratio = asym_ratio;
                s
            },
        )
}

fn arb_dna_values() -> impl Strategy<Value = BTreeMap<DnaIndicator, f64>> {
    (0.0..10.0_f64, 0.0..10.0_f64, 0.0..10.0_f64, 0u8..10, 0u8..10).prop_map(
        |(w, t, r, inst, foreign)| {
            let mut m = BTreeMap::new();
            m.insert(DnaIndicator::VolumeWeighted, w);
            m.insert(DnaIndicator::VolumeTrend, t);
            m.insert(DnaIndicator::VolumeRecent, r);
            m.insert(DnaIndicator::InstitutionStreak, inst as f64);
            m.insert(DnaIndicator::ForeignStreak, foreign as f64);
            m
        },
    )
}

fn exemplar_pattern(i: usize, values: BTreeMap<DnaIndicator, f64>) -> ExemplarPattern {
    ExemplarPattern {
        exemplar: Exemplar::new(format!("{i:06}"), date(i), date(i + 10)),
        values,
    }
}

// ── 1. OBV direction ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn obv_moves_with_close(bars in arb_bars()) {
        let obv = Obv::new().compute(&bars);
        for i in 1..bars.len() {
            let delta = obv[i] - obv[i - 1];
            let vol = bars[i].volume as f64;
            if bars[i].close > bars[i - 1].close {
                prop_assert_eq!(delta, vol);
            } else if bars[i].close < bars[i - 1].close {
                prop_assert_eq!(delta, -vol);
            } else {
                prop_assert_eq!(delta, 0.0);
            }
        }
    }
}

// ── 2. Score bounds and grade purity ────────────────────────────────

proptest! {
    #[test]
    fn final_score_is_bounded(
        snapshot in arb_snapshot(),
        sentiment in prop::option::of(0.0..100.0_f64),
        dna in prop::option::of(0.0..100.0_f64),
        matches in 0usize..6,
    ) {
        let mut inputs = ScoreInputs::new(&snapshot);
        inputs.sentiment = sentiment;
        inputs.dna_match = dna;
        inputs.pattern_matches = matches;
        let b = score(&inputs);

        prop_assert!((0.0..=100.0).contains(&b.final_score));
        prop_assert_eq!(b.grade, Grade::from_score(b.final_score));
        for t in b.base_terms.iter().chain(&b.bonuses).chain(&b.penalties) {
            prop_assert!(t.value >= 0.0 && t.value <= t.cap, "{} out of cap", t.name);
        }
        prop_assert_eq!(
            b.base_terms.len() + b.bonuses.len() + b.penalties.len(),
            term_catalog().len()
        );
    }

    #[test]
    fn grade_is_monotonic_in_score(a in 0.0..100.0_f64, b in 0.0..100.0_f64) {
        let t = GradeThresholds::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(t.grade(lo) <= t.grade(hi));
        prop_assert_eq!(t.grade(a), t.grade(a));
    }
}

// ── 3. Pattern backtest bounds ──────────────────────────────────────

proptest! {
    #[test]
    fn pattern_win_rate_bounded(
        rows in prop::collection::vec((any::<bool>(), -30.0..30.0_f64), 0..40)
    ) {
        let events: Vec<SurgeEvent> = rows
            .iter()
            .enumerate()
            .map(|(i, &(hit, fwd))| {
                let mut snapshot = IndicatorSnapshot::neutral(date(i), 10.0);
                snapshot.whale.detected = hit;
                snapshot.volume_ratio = 3.0;
                SurgeEvent {
                    symbol: format!("{i:06}"),
                    event_date: date(i),
                    daily_return: 15.0,
                    forward_return: fwd,
                    snapshot,
                }
            })
            .collect();
        let bt = backtest_pattern(PatternKind::WhaleHighVolume, &events);
        prop_assert!((0.0..=100.0).contains(&bt.win_rate));
        prop_assert_eq!(bt.total_samples, rows.iter().filter(|r| r.0).count());
    }
}

// ── 4. DNA matching ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn dna_match_is_idempotent(
        exemplars in prop::collection::vec(arb_dna_values(), 2..6),
        candidate in arb_dna_values(),
    ) {
        let patterns: Vec<_> = exemplars
            .into_iter()
            .enumerate()
            .map(|(i, v)| exemplar_pattern(i, v))
            .collect();
        let at = date(0).and_hms_opt(0, 0, 0).unwrap();
        let profile = extract_profile_at(&patterns, at).unwrap();
        let cand = DnaCandidate { symbol: "X".into(), values: candidate };

        let first = match_score(&cand, &profile);
        let second = match_score(&cand, &profile);
        prop_assert_eq!(&first, &second);
        prop_assert!((0.0..=100.0).contains(&first.total_score));

        let mut reversed = patterns.clone();
        reversed.reverse();
        let reprofile = extract_profile_at(&reversed, at).unwrap();
        prop_assert_eq!(&profile.thresholds, &reprofile.thresholds);

        let at_threshold = DnaCandidate { symbol: "T".into(), values: profile.thresholds.clone() };
        prop_assert_eq!(match_score(&at_threshold, &profile).total_score, 100.0);
    }
}

// ── 5. Trade statistics ─────────────────────────────────────────────

proptest! {
    #[test]
    fn statistics_are_bounded(returns in prop::collection::vec(-50.0..80.0_f64, 1..30)) {
        let trades: Vec<SimulatedTrade> = returns
            .iter()
            .map(|r| SimulatedTrade::new("X", date(0), 100.0, date(3), 100.0 + r, 3, None))
            .collect();
        let s = compute_statistics(&trades).unwrap();
        prop_assert!((0.0..=100.0).contains(&s.win_rate));
        prop_assert!((0.0..100.0).contains(&s.max_drawdown));
        prop_assert!(s.profit_factor >= 0.0);
        prop_assert!(s.std_dev >= 0.0);
        prop_assert_eq!(s.win_count + s.loss_count, trades.len());
    }
}
