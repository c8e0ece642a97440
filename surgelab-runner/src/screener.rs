//! Live screening: fetch, extract, score with pattern and DNA feedback, rank.

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use surgelab_core::dna::{match_score, DnaCandidate, DnaCategory, DnaProfile};
use surgelab_core::domain::{Bar, InvestorFlow};
use surgelab_core::indicators::{extract_snapshot, Extraction, IndicatorSnapshot};
use surgelab_core::patterns::{matching_patterns, PatternSet};
use surgelab_core::scoring::{CompositeScorer, Grade, ScoreInputs, Scored};

use crate::config::DnaConfig;
use crate::dna::optional_flows;
use crate::error::ProviderError;
use crate::fetch::{FetchPool, Fetched};

/// External trend/sentiment feed, scored `[0, 100]`. `None` means no reading.
pub trait SentimentSource: Send + Sync {
    fn sentiment(&self, symbol: &str) -> Option<f64>;
}

/// A DNA profile plus the candidate window it is compared over.
#[derive(Debug, Clone)]
pub struct DnaFeedback {
    pub profile: Arc<DnaProfile>,
    window_bars: usize,
}

impl DnaFeedback {
    /// Candidates use the same window length as [`DnaScanner`](crate::DnaScanner).
    pub fn new(profile: Arc<DnaProfile>, config: &DnaConfig) -> Self {
        Self {
            profile,
            window_bars: config.window_bars.max(1),
        }
    }

    pub fn window_bars(&self) -> usize {
        self.window_bars
    }

    fn wants_flows(&self) -> bool {
        self.profile.has_category(DnaCategory::Institution)
            || self.profile.has_category(DnaCategory::Foreign)
    }
}

/// Feedback and filters for one screening pass. Everything is optional; an
/// empty context scores on indicators alone.
#[derive(Clone, Default)]
pub struct ScreenContext {
    pub patterns: Option<Arc<PatternSet>>,
    pub dna: Option<DnaFeedback>,
    pub sentiment: Option<Arc<dyn SentimentSource>>,
    pub hot_issues: HashSet<String>,
    pub min_grade: Option<Grade>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenHit {
    pub symbol: String,
    pub snapshot: IndicatorSnapshot,
    /// Keys of the published patterns the snapshot matches.
    pub matched_patterns: Vec<String>,
    pub dna_score: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ScreenResult {
    /// Best first, at or above `min_grade`.
    pub ranked: Vec<Scored<ScreenHit>>,
    pub analyzed: usize,
    pub found: usize,
    pub failed: usize,
    pub skipped_insufficient: usize,
}

pub struct Screener {
    fetch: Arc<FetchPool>,
    scorer: CompositeScorer,
    history_days: usize,
}

impl Screener {
    pub fn new(fetch: Arc<FetchPool>, scorer: CompositeScorer, history_days: usize) -> Self {
        Self {
            fetch,
            scorer,
            history_days,
        }
    }

    pub fn screen(
        &self,
        symbols: &[String],
        ctx: &ScreenContext,
        cancel: &AtomicBool,
    ) -> ScreenResult {
        let results = self.fetch.map_symbols(symbols, cancel, |symbol| {
            let bars = self.fetch.daily_bars(symbol, self.history_days)?;
            let flows = match &ctx.dna {
                Some(dna) if dna.wants_flows() => {
                    optional_flows(&self.fetch, symbol, dna.window_bars)
                }
                _ => None,
            };
            Ok::<_, ProviderError>(self.score_symbol(symbol, &bars, flows.as_deref(), ctx))
        });

        let mut out = ScreenResult::default();
        for (symbol, fetched) in results {
            match fetched {
                Fetched::Done(Ok(Some(scored))) => {
                    out.analyzed += 1;
                    let passes = ctx.min_grade.map_or(true, |g| scored.breakdown.grade >= g);
                    if passes {
                        out.ranked.push(scored);
                    }
                }
                Fetched::Done(Ok(None)) => {
                    out.analyzed += 1;
                    out.skipped_insufficient += 1;
                }
                Fetched::Done(Err(error)) => {
                    warn!(%symbol, %error, "skipping symbol");
                    out.failed += 1;
                }
                Fetched::Cancelled => {}
            }
        }
        CompositeScorer::rank_candidates(&mut out.ranked);
        out.found = out.ranked.len();
        info!(
            analyzed = out.analyzed,
            found = out.found,
            failed = out.failed,
            "screen complete"
        );
        out
    }

    fn score_symbol(
        &self,
        symbol: &str,
        bars: &[Bar],
        flows: Option<&[InvestorFlow]>,
        ctx: &ScreenContext,
    ) -> Option<Scored<ScreenHit>> {
        let snapshot = match extract_snapshot(bars) {
            Extraction::Ready(snapshot) => snapshot,
            Extraction::InsufficientData { available, .. } => {
                debug!(%symbol, available, "insufficient history");
                return None;
            }
        };

        let matched_patterns: Vec<String> = ctx
            .patterns
            .as_ref()
            .map(|set| {
                matching_patterns(&snapshot, &set.patterns)
                    .into_iter()
                    .map(|p| p.key.clone())
                    .collect()
            })
            .unwrap_or_default();

        let dna_score = ctx.dna.as_ref().and_then(|dna| {
            match DnaCandidate::from_recent(symbol, bars, dna.window_bars, flows) {
                Ok(candidate) => Some(match_score(&candidate, &dna.profile).total_score),
                Err(error) => {
                    debug!(%symbol, %error, "no DNA signature");
                    None
                }
            }
        });

        let inputs = ScoreInputs {
            snapshot: &snapshot,
            sentiment: ctx.sentiment.as_ref().and_then(|s| s.sentiment(symbol)),
            pattern_matches: matched_patterns.len(),
            dna_match: dna_score,
            hot_issue: ctx.hot_issues.contains(symbol),
        };
        let breakdown = self.scorer.score(&inputs);

        Some(Scored {
            item: ScreenHit {
                symbol: symbol.to_string(),
                snapshot,
                matched_patterns,
                dna_score,
            },
            breakdown,
        })
    }
}
