//! Surge corpus collection and pattern publishing.
//!
//! `PatternMiner::run` walks `CollectCorpus → ExtractPredicateOccurrences →
//! Backtest → Rank/Filter → Publish`. The middle three stages are the pure
//! `surgelab_core::patterns::mine_patterns`; this module owns the I/O ends.
//! `SmartPatternMiner` replaces CollectCorpus with a ranking-driven
//! three-phase filter and otherwise publishes the same way.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use surgelab_core::domain::{pct_change, Bar, SurgeEvent};
use surgelab_core::fingerprint::corpus_hash;
use surgelab_core::indicators::{extract_snapshot, Extraction, MIN_SNAPSHOT_BARS};
use surgelab_core::patterns::{mine_patterns, MiningError, MiningMode, MiningParams, PatternSet};
use surgelab_core::rng::SeedHierarchy;

use crate::cache::TtlCache;
use crate::config::{MiningConfig, SmartMiningConfig};
use crate::error::ProviderError;
use crate::fetch::{FetchPool, Fetched};
use crate::provider::{RankedSymbol, RankingKind};
use crate::store::PatternStore;

// ─── Pure scan ──────────────────────────────────────────────────────

/// Result of scanning one symbol's history for a qualifying move.
#[derive(Debug, Clone)]
pub enum SurgeScan {
    Found(SurgeEvent),
    NoSurge,
    /// Not enough history for a snapshot before any day in the lookback.
    Insufficient { available: usize },
}

/// Scan the last `lookback_days` bars, oldest first, for the first day whose
/// close-to-close return reaches `min_return` percent.
///
/// The snapshot is taken on the bars strictly before the surge day. The
/// forward return runs from the prior close over `holding_days` bars, capped
/// at the last bar.
pub fn find_surge_event(
    symbol: &str,
    bars: &[Bar],
    min_return: f64,
    lookback_days: usize,
    holding_days: usize,
) -> SurgeScan {
    let n = bars.len();
    if n <= MIN_SNAPSHOT_BARS {
        return SurgeScan::Insufficient { available: n };
    }
    let start = n.saturating_sub(lookback_days).max(MIN_SNAPSHOT_BARS);

    for i in start..n {
        let daily_return = pct_change(bars[i - 1].close, bars[i].close);
        if daily_return < min_return {
            continue;
        }
        let snapshot = match extract_snapshot(&bars[..i]) {
            Extraction::Ready(snapshot) => snapshot,
            Extraction::InsufficientData { .. } => continue,
        };
        let exit = (i - 1).saturating_add(holding_days.max(1)).min(n - 1);
        return SurgeScan::Found(SurgeEvent {
            symbol: symbol.to_string(),
            event_date: bars[i].date,
            daily_return,
            forward_return: pct_change(bars[i - 1].close, bars[exit].close),
            snapshot,
        });
    }
    SurgeScan::NoSurge
}

// ─── Reports and budgets ────────────────────────────────────────────

/// Early-termination limits for corpus collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanBudget {
    pub max_events: Option<usize>,
    pub time_budget: Option<Duration>,
}

impl ScanBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn from_config(config: &MiningConfig) -> Self {
        Self {
            max_events: config.max_events,
            time_budget: config.time_budget_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MiningReport {
    /// Symbols whose history was fetched and scanned.
    pub analyzed: usize,
    /// Surge events in the corpus.
    pub found: usize,
    /// Symbols whose fetch failed.
    pub failed: usize,
    pub skipped_insufficient: usize,
    /// Cancelled or budget exhausted before every symbol was scanned.
    pub stopped_early: bool,
}

/// Outcome of a mining run. The report is always filled in, even when
/// the corpus turned out too small to mine.
#[derive(Debug)]
pub struct MiningRun {
    pub report: MiningReport,
    pub outcome: Result<Arc<PatternSet>, MiningError>,
}

impl MiningRun {
    pub fn patterns(&self) -> Option<&Arc<PatternSet>> {
        self.outcome.as_ref().ok()
    }
}

enum SymbolScan {
    Scanned(SurgeScan),
    Failed(ProviderError),
    Stopped,
}

fn tally(
    results: Vec<(String, Fetched<SymbolScan>)>,
    report: &mut MiningReport,
) -> Vec<SurgeEvent> {
    let mut events = Vec::new();
    for (symbol, fetched) in results {
        match fetched {
            Fetched::Cancelled | Fetched::Done(SymbolScan::Stopped) => report.stopped_early = true,
            Fetched::Done(SymbolScan::Failed(error)) => {
                warn!(%symbol, %error, "skipping symbol");
                report.failed += 1;
            }
            Fetched::Done(SymbolScan::Scanned(scan)) => {
                report.analyzed += 1;
                match scan {
                    SurgeScan::Found(event) => events.push(event),
                    SurgeScan::NoSurge => {}
                    SurgeScan::Insufficient { available } => {
                        debug!(%symbol, available, "insufficient history");
                        report.skipped_insufficient += 1;
                    }
                }
            }
        }
    }
    events
}

// ─── Publishing ─────────────────────────────────────────────────────

/// The live pattern set: a TTL cache in front of an optional store.
#[derive(Clone)]
pub struct PublishedPatterns {
    cache: Arc<TtlCache<PatternSet>>,
    store: Option<Arc<dyn PatternStore>>,
}

impl PublishedPatterns {
    pub fn new(cache: Arc<TtlCache<PatternSet>>, store: Option<Arc<dyn PatternStore>>) -> Self {
        Self { cache, store }
    }

    /// Replace the cached and persisted set. A store failure is logged; the
    /// cache still holds the new set.
    pub fn publish(&self, set: PatternSet) -> Arc<PatternSet> {
        if let Some(store) = &self.store {
            if let Err(error) = store.save_patterns(&set) {
                warn!(%error, "failed to persist pattern set");
            }
        }
        let published = self.cache.set(set);
        info!(
            patterns = published.patterns.len(),
            corpus_size = published.corpus_size,
            corpus_hash = %published.corpus_hash,
            "pattern set published"
        );
        published
    }

    /// Fresh cache entry, else the persisted set, else a stale cache entry.
    /// `None` means nothing has been published yet.
    pub fn current(&self) -> Option<Arc<PatternSet>> {
        if let Some(fresh) = self.cache.get() {
            return Some(fresh);
        }
        if let Some(store) = &self.store {
            match store.load_patterns() {
                Ok(Some(set)) => {
                    debug!("pattern cache refreshed from store");
                    return Some(self.cache.set(set));
                }
                Ok(None) => {}
                Err(error) => warn!(%error, "failed to load pattern set"),
            }
        }
        self.cache.get_stale()
    }
}

fn build_set(
    events: &[SurgeEvent],
    params: &MiningParams,
    mode: MiningMode,
) -> Result<PatternSet, MiningError> {
    let patterns = mine_patterns(events, params)?;
    Ok(PatternSet {
        patterns,
        corpus_size: events.len(),
        corpus_hash: corpus_hash(events),
        mined_at: Utc::now().naive_utc(),
        mode,
    })
}

// ─── Standard miner ─────────────────────────────────────────────────

pub struct PatternMiner {
    fetch: Arc<FetchPool>,
    config: MiningConfig,
    published: PublishedPatterns,
}

impl PatternMiner {
    pub fn new(fetch: Arc<FetchPool>, config: MiningConfig, published: PublishedPatterns) -> Self {
        Self {
            fetch,
            config,
            published,
        }
    }

    pub fn current(&self) -> Option<Arc<PatternSet>> {
        self.published.current()
    }

    /// Collect a corpus from a deterministic sample of `universe`, mine it,
    /// and publish the result.
    ///
    /// An insufficient corpus leaves the previously published set in place.
    pub fn run(&self, universe: &[String], budget: &ScanBudget, cancel: &AtomicBool) -> MiningRun {
        let seeds = SeedHierarchy::new(self.config.seed);
        let sample = seeds.sample(universe, self.config.sample_size, "mining.universe");
        info!(
            universe = universe.len(),
            sampled = sample.len(),
            provider = self.fetch.provider_name(),
            "collecting surge corpus"
        );

        let (events, report) = self.collect_corpus(&sample, budget, cancel);
        info!(
            analyzed = report.analyzed,
            found = report.found,
            failed = report.failed,
            stopped_early = report.stopped_early,
            "corpus collected"
        );

        let outcome = build_set(&events, &self.config.params, MiningMode::Standard)
            .map(|set| self.published.publish(set));
        if let Err(error) = &outcome {
            warn!(%error, "pattern mining skipped");
        }
        MiningRun { report, outcome }
    }

    fn collect_corpus(
        &self,
        symbols: &[String],
        budget: &ScanBudget,
        cancel: &AtomicBool,
    ) -> (Vec<SurgeEvent>, MiningReport) {
        let started = Instant::now();
        let stop = AtomicBool::new(false);
        let found = AtomicUsize::new(0);
        let cfg = &self.config;

        let results = self.fetch.map_symbols(symbols, &stop, |symbol| {
            let exhausted = cancel.load(Ordering::Relaxed)
                || budget.time_budget.is_some_and(|t| started.elapsed() >= t)
                || budget
                    .max_events
                    .is_some_and(|max| found.load(Ordering::Relaxed) >= max);
            if exhausted {
                stop.store(true, Ordering::Relaxed);
                return SymbolScan::Stopped;
            }

            let bars = match self.fetch.daily_bars(symbol, cfg.history_days) {
                Ok(bars) => bars,
                Err(error) => return SymbolScan::Failed(error),
            };
            let scan = find_surge_event(
                symbol,
                &bars,
                cfg.min_return,
                cfg.lookback_days,
                cfg.holding_days,
            );
            if matches!(scan, SurgeScan::Found(_)) {
                found.fetch_add(1, Ordering::Relaxed);
            }
            SymbolScan::Scanned(scan)
        });

        let mut report = MiningReport::default();
        let mut events = tally(results, &mut report);
        if let Some(max) = budget.max_events {
            if events.len() > max {
                events.truncate(max);
                report.stopped_early = true;
            }
        }
        report.found = events.len();
        (events, report)
    }
}

// ─── Smart miner ────────────────────────────────────────────────────

/// Per-phase counts for a smart mining run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmartMiningReport {
    /// Symbols returned by the rankings before exclusions.
    pub ranked: usize,
    /// Dropped by name keyword.
    pub excluded: usize,
    /// Window return under the surge threshold.
    pub below_threshold: usize,
    /// Gave back too much from the interim high.
    pub pulled_back: usize,
    pub scan: MiningReport,
}

#[derive(Debug)]
pub struct SmartMiningRun {
    pub report: SmartMiningReport,
    pub outcome: Result<Arc<PatternSet>, MiningError>,
}

/// Phase 2 and 3 verdict for one symbol.
#[derive(Debug, Clone)]
pub enum WindowScan {
    Surged(SurgeEvent),
    BelowThreshold { window_return: f64 },
    PulledBack { pullback: f64 },
    Insufficient { available: usize },
}

/// Check the last `window_days` bars for a sustained surge that has not
/// faded. The event is dated at the first bar of the window and its
/// snapshot is taken on the bars before it.
pub fn scan_surge_window(
    symbol: &str,
    bars: &[Bar],
    window_days: usize,
    surge_threshold: f64,
    pullback_threshold: f64,
) -> WindowScan {
    let n = bars.len();
    let window_days = window_days.max(1);
    if n < MIN_SNAPSHOT_BARS + window_days {
        return WindowScan::Insufficient { available: n };
    }
    let start = n - window_days;
    let base_close = bars[start - 1].close;
    let current = bars[n - 1].close;

    let window_return = pct_change(base_close, current);
    if window_return < surge_threshold {
        return WindowScan::BelowThreshold { window_return };
    }

    let interim_high = bars[start..].iter().map(|b| b.high).fold(f64::MIN, f64::max);
    if interim_high > 0.0 {
        let pullback = (interim_high - current) / interim_high * 100.0;
        if pullback >= pullback_threshold {
            return WindowScan::PulledBack { pullback };
        }
    }

    match extract_snapshot(&bars[..start]) {
        Extraction::Ready(snapshot) => WindowScan::Surged(SurgeEvent {
            symbol: symbol.to_string(),
            event_date: bars[start].date,
            daily_return: window_return,
            forward_return: window_return,
            snapshot,
        }),
        Extraction::InsufficientData { available, .. } => WindowScan::Insufficient { available },
    }
}

/// Drop excluded names (case-insensitive substring) and duplicate codes,
/// keeping first-seen order. Returns the survivors and the excluded count.
pub fn filter_ranked(
    ranked: Vec<RankedSymbol>,
    excluded_keywords: &[String],
) -> (Vec<String>, usize) {
    let keywords: Vec<String> = excluded_keywords.iter().map(|k| k.to_uppercase()).collect();
    let mut seen = HashSet::new();
    let mut excluded = 0;
    let mut codes = Vec::new();
    for symbol in ranked {
        let name = symbol.name.to_uppercase();
        if keywords.iter().any(|k| name.contains(k.as_str())) {
            excluded += 1;
            continue;
        }
        if seen.insert(symbol.code.clone()) {
            codes.push(symbol.code);
        }
    }
    (codes, excluded)
}

pub struct SmartPatternMiner {
    fetch: Arc<FetchPool>,
    config: SmartMiningConfig,
    published: PublishedPatterns,
}

impl SmartPatternMiner {
    pub fn new(
        fetch: Arc<FetchPool>,
        config: SmartMiningConfig,
        published: PublishedPatterns,
    ) -> Self {
        Self {
            fetch,
            config,
            published,
        }
    }

    pub fn current(&self) -> Option<Arc<PatternSet>> {
        self.published.current()
    }

    pub fn run(&self, cancel: &AtomicBool) -> SmartMiningRun {
        let cfg = &self.config;
        let mut report = SmartMiningReport::default();

        let mut ranked = Vec::new();
        for market in &cfg.markets {
            match self
                .fetch
                .ranked_symbols(market, RankingKind::VolumeSurge, cfg.ranking_limit)
            {
                Ok(symbols) => ranked.extend(symbols),
                Err(error) => warn!(%market, %error, "ranking unavailable"),
            }
        }
        report.ranked = ranked.len();
        let (candidates, excluded) = filter_ranked(ranked, &cfg.excluded_name_keywords);
        report.excluded = excluded;
        info!(
            ranked = report.ranked,
            excluded,
            candidates = candidates.len(),
            "smart mining candidates"
        );

        let results = self.fetch.map_symbols(&candidates, cancel, |symbol| {
            self.fetch.daily_bars(symbol, cfg.history_days).map(|bars| {
                scan_surge_window(
                    symbol,
                    &bars,
                    cfg.surge_window_days,
                    cfg.surge_threshold,
                    cfg.pullback_threshold,
                )
            })
        });

        let mut events = Vec::new();
        for (symbol, fetched) in results {
            match fetched {
                Fetched::Cancelled => report.scan.stopped_early = true,
                Fetched::Done(Err(error)) => {
                    warn!(%symbol, %error, "skipping symbol");
                    report.scan.failed += 1;
                }
                Fetched::Done(Ok(scan)) => {
                    report.scan.analyzed += 1;
                    match scan {
                        WindowScan::Surged(event) => events.push(event),
                        WindowScan::BelowThreshold { window_return } => {
                            debug!(%symbol, window_return, "below surge threshold");
                            report.below_threshold += 1;
                        }
                        WindowScan::PulledBack { pullback } => {
                            debug!(%symbol, pullback, "pulled back from high");
                            report.pulled_back += 1;
                        }
                        WindowScan::Insufficient { available } => {
                            debug!(%symbol, available, "insufficient history");
                            report.scan.skipped_insufficient += 1;
                        }
                    }
                }
            }
        }
        report.scan.found = events.len();
        info!(
            found = events.len(),
            below_threshold = report.below_threshold,
            pulled_back = report.pulled_back,
            "smart corpus collected"
        );

        let outcome = build_set(&events, &cfg.params, MiningMode::Smart)
            .map(|set| self.published.publish(set));
        if let Err(error) = &outcome {
            warn!(%error, "smart pattern mining skipped");
        }
        SmartMiningRun { report, outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as Days, NaiveDate};

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: start + Days::days(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1_000,
            })
            .collect()
    }

    fn flat_then(tail: &[f64]) -> Vec<f64> {
        let mut closes = vec![100.0; 40];
        closes.extend_from_slice(tail);
        closes
    }

    #[test]
    fn finds_first_qualifying_day() {
        let bars = bars_from_closes(&flat_then(&[120.0, 150.0, 150.0]));
        let SurgeScan::Found(event) = find_surge_event("AAA", &bars, 15.0, 60, 1) else {
            panic!("expected a surge");
        };
        assert_eq!(event.event_date, bars[40].date);
        assert!((event.daily_return - 20.0).abs() < 1e-9);
        assert!((event.forward_return - 20.0).abs() < 1e-9);
        assert_eq!(event.snapshot.date, bars[39].date);
    }

    #[test]
    fn forward_return_caps_at_last_bar() {
        let bars = bars_from_closes(&flat_then(&[120.0, 130.0]));
        let SurgeScan::Found(event) = find_surge_event("AAA", &bars, 15.0, 60, 10) else {
            panic!("expected a surge");
        };
        assert!((event.forward_return - 30.0).abs() < 1e-9);
    }

    #[test]
    fn unbounded_holding_caps_at_last_bar() {
        let bars = bars_from_closes(&flat_then(&[120.0, 130.0]));
        let SurgeScan::Found(event) = find_surge_event("AAA", &bars, 15.0, 60, usize::MAX) else {
            panic!("expected a surge");
        };
        assert!((event.forward_return - 30.0).abs() < 1e-9);
    }

    #[test]
    fn quiet_history_has_no_surge() {
        let bars = bars_from_closes(&flat_then(&[101.0, 102.0]));
        assert!(matches!(
            find_surge_event("AAA", &bars, 15.0, 60, 1),
            SurgeScan::NoSurge
        ));
    }

    #[test]
    fn surge_outside_lookback_is_ignored() {
        let bars = bars_from_closes(&flat_then(&[130.0, 130.0, 130.0, 130.0, 130.0]));
        assert!(matches!(
            find_surge_event("AAA", &bars, 15.0, 3, 1),
            SurgeScan::NoSurge
        ));
    }

    #[test]
    fn short_history_is_insufficient() {
        let bars = bars_from_closes(&[100.0; 20]);
        assert!(matches!(
            find_surge_event("AAA", &bars, 15.0, 60, 1),
            SurgeScan::Insufficient { available: 20 }
        ));
    }

    #[test]
    fn window_scan_phases() {
        let surged = bars_from_closes(&flat_then(&[110.0, 120.0, 130.0, 135.0]));
        let WindowScan::Surged(event) = scan_surge_window("AAA", &surged, 4, 30.0, 20.0) else {
            panic!("expected a surge");
        };
        assert_eq!(event.event_date, surged[40].date);
        assert_eq!(event.snapshot.date, surged[39].date);
        assert!((event.forward_return - 35.0).abs() < 1e-9);

        let weak = bars_from_closes(&flat_then(&[105.0, 110.0, 112.0, 115.0]));
        assert!(matches!(
            scan_surge_window("AAA", &weak, 4, 30.0, 20.0),
            WindowScan::BelowThreshold { .. }
        ));

        // Peak 200, now 140: up 40% on the window but 30% off the high.
        let faded = bars_from_closes(&flat_then(&[150.0, 200.0, 160.0, 140.0]));
        assert!(matches!(
            scan_surge_window("AAA", &faded, 4, 30.0, 20.0),
            WindowScan::PulledBack { .. }
        ));
    }

    #[test]
    fn ranked_filter_excludes_and_dedupes() {
        let ranked = vec![
            RankedSymbol { code: "001".into(), name: "Alpha Corp".into() },
            RankedSymbol { code: "002".into(), name: "Kodex etf 200".into() },
            RankedSymbol { code: "001".into(), name: "Alpha Corp".into() },
            RankedSymbol { code: "003".into(), name: "Beta SPAC No.3".into() },
            RankedSymbol { code: "004".into(), name: "Gamma".into() },
        ];
        let keywords = vec!["ETF".to_string(), "SPAC".to_string()];
        let (codes, excluded) = filter_ranked(ranked, &keywords);
        assert_eq!(codes, vec!["001", "004"]);
        assert_eq!(excluded, 2);
    }

    #[test]
    fn budget_from_config() {
        let config = MiningConfig {
            max_events: Some(7),
            time_budget_secs: Some(30),
            ..MiningConfig::default()
        };
        let budget = ScanBudget::from_config(&config);
        assert_eq!(budget.max_events, Some(7));
        assert_eq!(budget.time_budget, Some(Duration::from_secs(30)));
        assert_eq!(ScanBudget::unlimited().max_events, None);
    }
}
