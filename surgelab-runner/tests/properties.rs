//! Property tests for the runner's pure pieces.
//!
//! Uses proptest to verify:
//! - A found surge event always meets the return threshold and precedes no
//!   snapshot data from its own day
//! - Ranked-symbol filtering never returns an excluded name or a duplicate
//! - The rate limiter hands out strictly increasing slots

use std::collections::HashSet;
use std::time::Duration;

use chrono::{Duration as Days, NaiveDate};
use proptest::prelude::*;
use surgelab_core::domain::Bar;
use surgelab_runner::mining::{filter_ranked, find_surge_event, SurgeScan};
use surgelab_runner::{RankedSymbol, RateLimiter};

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar {
            date: start + Days::days(i as i64),
            open: c,
            high: c * 1.02,
            low: c * 0.98,
            close: c,
            volume: 10_000 + i as u64 * 10,
        })
        .collect()
}

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.25f64..0.25, 31..90).prop_map(|moves| {
        let mut price = 100.0;
        moves
            .into_iter()
            .map(|m| {
                price *= 1.0 + m;
                price
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn surge_event_meets_threshold(
        closes in arb_closes(),
        min_return in 5.0f64..30.0,
        lookback in 1usize..60,
        holding in 1usize..10,
    ) {
        let bars = bars_from_closes(&closes);
        let scan = find_surge_event("AAA", &bars, min_return, lookback, holding);
        if let SurgeScan::Found(event) = scan {
            prop_assert!(event.daily_return >= min_return);
            prop_assert!(event.snapshot.date < event.event_date);
            let cutoff = bars[bars.len() - lookback.min(bars.len())].date;
            prop_assert!(event.event_date >= cutoff);
        }
    }

    #[test]
    fn ranked_filter_is_clean(
        entries in prop::collection::vec((0u8..20, prop::bool::ANY), 0..40),
    ) {
        let ranked: Vec<RankedSymbol> = entries
            .iter()
            .map(|&(code, is_fund)| RankedSymbol {
                code: format!("{code:03}"),
                name: if is_fund { format!("Fund {code} etf") } else { format!("Corp {code}") },
            })
            .collect();
        let (codes, excluded) = filter_ranked(ranked, &["ETF".to_string()]);

        let unique: HashSet<&String> = codes.iter().collect();
        prop_assert_eq!(unique.len(), codes.len());
        prop_assert_eq!(excluded, entries.iter().filter(|(_, f)| *f).count());
        prop_assert!(codes.len() + excluded <= entries.len());
    }

    #[test]
    fn limiter_slots_are_spaced(interval_ms in 10u64..50, calls in 2usize..8) {
        let limiter = RateLimiter::new(Duration::from_millis(interval_ms));
        let waits: Vec<Duration> = (0..calls).map(|_| limiter.reserve()).collect();
        for pair in waits.windows(2) {
            prop_assert!(pair[1] > pair[0]);
        }
    }
}
