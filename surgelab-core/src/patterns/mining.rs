//! Pure mining stages: occurrence counting, per-pattern outcome backtest,
//! ranking and top-K selection. Corpus collection lives in the runner.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Pattern, PatternBacktest, PatternKind};
use crate::domain::SurgeEvent;
use crate::indicators::IndicatorSnapshot;

/// Maximum number of example symbols recorded per pattern.
pub const MAX_SAMPLE_SYMBOLS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningParams {
    /// Patterns backed by fewer matched events are dropped.
    pub min_samples: usize,
    /// Number of ranked patterns retained.
    pub top_k: usize,
    /// Corpora smaller than this abort mining.
    pub min_corpus_size: usize,
}

impl Default for MiningParams {
    fn default() -> Self {
        Self {
            min_samples: 2,
            top_k: 5,
            min_corpus_size: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MiningError {
    #[error("insufficient surge corpus: need {required} events, have {available}")]
    InsufficientCorpus { required: usize, available: usize },
}

/// Count how many corpus events each catalog predicate matches.
/// Predicates with zero matches are included with a count of 0.
pub fn count_occurrences(events: &[SurgeEvent]) -> BTreeMap<PatternKind, usize> {
    PatternKind::ALL
        .into_iter()
        .map(|kind| {
            let n = events.iter().filter(|e| kind.matches(&e.snapshot)).count();
            (kind, n)
        })
        .collect()
}

/// Outcome statistics over the forward returns of every event `kind` matches.
pub fn backtest_pattern(kind: PatternKind, events: &[SurgeEvent]) -> PatternBacktest {
    let returns: Vec<f64> = events
        .iter()
        .filter(|e| kind.matches(&e.snapshot))
        .map(|e| e.forward_return)
        .filter(|r| r.is_finite())
        .collect();

    if returns.is_empty() {
        return PatternBacktest::default();
    }

    let n = returns.len();
    let wins = returns.iter().filter(|&&r| r > 0.0).count();
    PatternBacktest {
        win_rate: wins as f64 / n as f64 * 100.0,
        avg_return: returns.iter().sum::<f64>() / n as f64,
        max_return: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        min_return: returns.iter().copied().fold(f64::INFINITY, f64::min),
        total_samples: n,
    }
}

/// Mine the catalog against a surge corpus.
///
/// Returns the top-K patterns ranked by win rate, then average return,
/// then occurrence count. An empty vector is a valid result: the corpus was
/// large enough but no predicate reached `min_samples`.
pub fn mine_patterns(
    events: &[SurgeEvent],
    params: &MiningParams,
) -> Result<Vec<Pattern>, MiningError> {
    let required = params.min_corpus_size.max(1);
    if events.len() < required {
        return Err(MiningError::InsufficientCorpus {
            required,
            available: events.len(),
        });
    }

    let corpus_size = events.len() as f64;
    let mut patterns: Vec<Pattern> = count_occurrences(events)
        .into_iter()
        .filter(|&(_, count)| count > 0)
        .map(|(kind, count)| {
            let mut sample_symbols: Vec<String> = Vec::new();
            for event in events.iter().filter(|e| kind.matches(&e.snapshot)) {
                if sample_symbols.len() == MAX_SAMPLE_SYMBOLS {
                    break;
                }
                if !sample_symbols.contains(&event.symbol) {
                    sample_symbols.push(event.symbol.clone());
                }
            }
            Pattern {
                key: kind.key().to_string(),
                name: kind.name().to_string(),
                predicate: kind,
                occurrence_count: count,
                frequency: count as f64 / corpus_size * 100.0,
                sample_symbols,
                backtest: backtest_pattern(kind, events),
            }
        })
        .filter(|p| p.backtest.total_samples >= params.min_samples)
        .collect();

    patterns.sort_by(rank_order);
    patterns.truncate(params.top_k);
    Ok(patterns)
}

fn rank_order(a: &Pattern, b: &Pattern) -> Ordering {
    b.backtest
        .win_rate
        .partial_cmp(&a.backtest.win_rate)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            b.backtest
                .avg_return
                .partial_cmp(&a.backtest.avg_return)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| b.occurrence_count.cmp(&a.occurrence_count))
        .then_with(|| a.predicate.cmp(&b.predicate))
}

/// Patterns from a published set that the snapshot satisfies.
pub fn matching_patterns<'a>(
    snapshot: &IndicatorSnapshot,
    patterns: &'a [Pattern],
) -> Vec<&'a Pattern> {
    patterns.iter().filter(|p| p.matches(snapshot)).collect()
}
