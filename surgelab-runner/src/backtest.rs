//! Historical backtest: apply an entry rule `days_ago` bars in the past and
//! simulate what would have happened since.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::{debug, info, warn};

use surgelab_core::backtest::{
    compute_statistics, compute_stop_loss_statistics, simulate_trade,
    simulate_trade_with_stop_loss, PerformanceStatistics, StopLossStatistics,
};
use surgelab_core::dna::{match_score, DnaCandidate, DnaCategory, DnaProfile};
use surgelab_core::domain::{Bar, InvestorFlow, SimulatedTrade};
use surgelab_core::indicators::{extract_snapshot, Extraction, IndicatorSnapshot};
use surgelab_core::patterns::{matching_patterns, PatternSet};
use surgelab_core::scoring::{CompositeScorer, Grade, ScoreInputs};

use crate::config::BacktestConfig;
use crate::dna::optional_flows;
use crate::error::ProviderError;
use crate::fetch::{FetchPool, Fetched};

/// When a historical snapshot counts as a buy signal.
#[derive(Debug, Clone)]
pub enum EntryRule {
    MinScore(f64),
    MinGrade(Grade),
    /// Any pattern of the set matches the snapshot.
    AnyPattern(Arc<PatternSet>),
    /// DNA match on the `window_bars` ending at the entry bar.
    DnaMatch {
        profile: Arc<DnaProfile>,
        min_score: f64,
        window_bars: usize,
    },
}

impl EntryRule {
    fn wants_flows(&self) -> bool {
        match self {
            Self::DnaMatch { profile, .. } => {
                profile.has_category(DnaCategory::Institution)
                    || profile.has_category(DnaCategory::Foreign)
            }
            _ => false,
        }
    }

    /// `bars` ends at the entry bar; `flows` are already cut at the entry date.
    fn accepts(
        &self,
        scorer: &CompositeScorer,
        symbol: &str,
        snapshot: &IndicatorSnapshot,
        bars: &[Bar],
        flows: Option<&[InvestorFlow]>,
    ) -> bool {
        match self {
            Self::MinScore(min) => scorer.score(&ScoreInputs::new(snapshot)).final_score >= *min,
            Self::MinGrade(min) => scorer.score(&ScoreInputs::new(snapshot)).grade >= *min,
            Self::AnyPattern(set) => !matching_patterns(snapshot, &set.patterns).is_empty(),
            Self::DnaMatch {
                profile,
                min_score,
                window_bars,
            } => match DnaCandidate::from_recent(symbol, bars, *window_bars, flows) {
                Ok(candidate) => match_score(&candidate, profile).total_score >= *min_score,
                Err(error) => {
                    debug!(%symbol, %error, "no DNA signature at entry");
                    false
                }
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BacktestReport {
    /// In the order the symbols were supplied.
    pub trades: Vec<SimulatedTrade>,
    pub statistics: Option<PerformanceStatistics>,
    /// Present only when a stop loss was configured.
    pub stop_loss: Option<StopLossStatistics>,
    pub analyzed: usize,
    pub matched: usize,
    pub failed: usize,
    pub skipped_insufficient: usize,
}

enum SymbolOutcome {
    Traded(SimulatedTrade),
    NoSignal,
    Insufficient,
}

pub struct HistoricalBacktest {
    fetch: Arc<FetchPool>,
    config: BacktestConfig,
    scorer: CompositeScorer,
}

impl HistoricalBacktest {
    pub fn new(fetch: Arc<FetchPool>, config: BacktestConfig, scorer: CompositeScorer) -> Self {
        Self {
            fetch,
            config,
            scorer,
        }
    }

    pub fn run(&self, symbols: &[String], rule: &EntryRule, cancel: &AtomicBool) -> BacktestReport {
        let wants_flows = rule.wants_flows();
        let results = self.fetch.map_symbols(symbols, cancel, |symbol| {
            let bars = self.fetch.daily_bars(symbol, self.config.history_days)?;
            let flows = if wants_flows {
                optional_flows(&self.fetch, symbol, self.config.history_days)
            } else {
                None
            };
            Ok::<_, ProviderError>(self.evaluate(symbol, &bars, flows.as_deref(), rule))
        });

        let mut report = BacktestReport::default();
        for (symbol, fetched) in results {
            match fetched {
                Fetched::Done(Ok(outcome)) => {
                    report.analyzed += 1;
                    match outcome {
                        SymbolOutcome::Traded(trade) => {
                            report.matched += 1;
                            report.trades.push(trade);
                        }
                        SymbolOutcome::NoSignal => {}
                        SymbolOutcome::Insufficient => report.skipped_insufficient += 1,
                    }
                }
                Fetched::Done(Err(error)) => {
                    warn!(%symbol, %error, "skipping symbol");
                    report.failed += 1;
                }
                Fetched::Cancelled => {}
            }
        }

        report.statistics = compute_statistics(&report.trades);
        if self.config.stop_loss_rate.is_some() {
            report.stop_loss = compute_stop_loss_statistics(&report.trades);
        }
        info!(
            analyzed = report.analyzed,
            matched = report.matched,
            failed = report.failed,
            win_rate = report.statistics.as_ref().map_or(0.0, |s| s.win_rate),
            "backtest complete"
        );
        report
    }

    fn evaluate(
        &self,
        symbol: &str,
        bars: &[Bar],
        flows: Option<&[InvestorFlow]>,
        rule: &EntryRule,
    ) -> SymbolOutcome {
        let Some(entry_index) = bars.len().checked_sub(self.config.days_ago + 1) else {
            return SymbolOutcome::Insufficient;
        };
        let history = &bars[..=entry_index];
        let snapshot = match extract_snapshot(history) {
            Extraction::Ready(snapshot) => snapshot,
            Extraction::InsufficientData { .. } => return SymbolOutcome::Insufficient,
        };

        let entry_date = bars[entry_index].date;
        let past_flows: Option<Vec<InvestorFlow>> =
            flows.map(|f| f.iter().filter(|fl| fl.date <= entry_date).cloned().collect());
        if !rule.accepts(&self.scorer, symbol, &snapshot, history, past_flows.as_deref()) {
            return SymbolOutcome::NoSignal;
        }

        let holding = self.config.holding_days;
        let trade = match self.config.stop_loss_rate {
            Some(rate) => simulate_trade_with_stop_loss(symbol, bars, entry_index, holding, rate),
            None => simulate_trade(symbol, bars, entry_index, holding),
        };
        trade.map_or(SymbolOutcome::NoSignal, SymbolOutcome::Traded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::provider::InMemoryProvider;
    use chrono::{Duration as Days, NaiveDate, Utc};
    use surgelab_core::patterns::{MiningMode, Pattern, PatternBacktest, PatternKind};

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: start + Days::days(i as i64),
                open: c,
                high: c * 1.01,
                low: c * 0.99,
                close: c,
                volume: 1_000,
            })
            .collect()
    }

    fn with_tail(tail: &[f64]) -> Vec<Bar> {
        let mut closes = vec![100.0; 50];
        closes.extend_from_slice(tail);
        bars_from_closes(&closes)
    }

    fn backtest(provider: InMemoryProvider, config: BacktestConfig) -> HistoricalBacktest {
        let fetch = FetchConfig {
            interval_ms: 0,
            max_in_flight: 2,
            breaker_cooldown_secs: 60,
        };
        let pool = Arc::new(FetchPool::new(Arc::new(provider), &fetch).unwrap());
        HistoricalBacktest::new(pool, config, CompositeScorer::default())
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn trades_every_symbol_under_permissive_rule() {
        let provider = InMemoryProvider::new()
            .with_bars("UP", with_tail(&[100.0, 104.0, 108.0, 110.0]))
            .with_bars("DOWN", with_tail(&[100.0, 98.0, 96.0, 95.0]))
            .with_bars("SHORT", bars_from_closes(&[100.0; 10]));
        let config = BacktestConfig {
            days_ago: 3,
            holding_days: 3,
            stop_loss_rate: None,
            ..BacktestConfig::default()
        };
        let report = backtest(provider, config).run(
            &symbols(&["UP", "DOWN", "SHORT", "GONE"]),
            &EntryRule::MinScore(0.0),
            &AtomicBool::new(false),
        );

        assert_eq!(report.analyzed, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped_insufficient, 1);
        assert_eq!(report.matched, 2);
        assert_eq!(report.trades[0].symbol, "UP");
        assert!((report.trades[0].return_rate - 10.0).abs() < 1e-9);
        assert!((report.trades[1].return_rate + 5.0).abs() < 1e-9);

        let stats = report.statistics.unwrap();
        assert_eq!(stats.total_trades, 2);
        assert!((stats.win_rate - 50.0).abs() < 1e-9);
        assert!(report.stop_loss.is_none());
    }

    #[test]
    fn stop_loss_statistics_when_configured() {
        let provider = InMemoryProvider::new()
            .with_bars("CRASH", with_tail(&[100.0, 96.0, 90.0, 120.0]));
        let config = BacktestConfig {
            days_ago: 3,
            holding_days: 3,
            stop_loss_rate: Some(-7.0),
            ..BacktestConfig::default()
        };
        let report = backtest(provider, config).run(
            &symbols(&["CRASH"]),
            &EntryRule::MinScore(0.0),
            &AtomicBool::new(false),
        );
        let trade = &report.trades[0];
        assert_eq!(trade.stop_loss_day, Some(2));
        assert!(!trade.is_win);
        let stop = report.stop_loss.unwrap();
        assert_eq!(stop.triggered_count, 1);
        assert!((stop.avg_day_to_stop_loss - 2.0).abs() < 1e-9);
    }

    #[test]
    fn unmatched_rules_produce_no_trades() {
        let provider = InMemoryProvider::new().with_bars("FLAT", with_tail(&[100.0; 4]));
        let config = BacktestConfig {
            days_ago: 3,
            ..BacktestConfig::default()
        };
        let bt = backtest(provider, config);
        let cancel = AtomicBool::new(false);

        let report = bt.run(&symbols(&["FLAT"]), &EntryRule::MinGrade(Grade::SPlus), &cancel);
        assert_eq!(report.analyzed, 1);
        assert_eq!(report.matched, 0);
        assert!(report.statistics.is_none());

        let whale_only = PatternSet {
            patterns: vec![Pattern {
                key: PatternKind::WhaleAccumulation.key().into(),
                name: PatternKind::WhaleAccumulation.name().into(),
                predicate: PatternKind::WhaleAccumulation,
                occurrence_count: 3,
                frequency: 50.0,
                sample_symbols: vec![],
                backtest: PatternBacktest::default(),
            }],
            corpus_size: 6,
            corpus_hash: String::new(),
            mined_at: Utc::now().naive_utc(),
            mode: MiningMode::Standard,
        };
        let report = bt.run(
            &symbols(&["FLAT"]),
            &EntryRule::AnyPattern(Arc::new(whale_only)),
            &cancel,
        );
        assert_eq!(report.matched, 0);
    }
}
