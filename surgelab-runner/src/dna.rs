//! DNA extraction from exemplar surges and scanning of live symbols.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::{debug, info, warn};

use surgelab_core::dna::{
    extract_profile, match_score, DnaCandidate, DnaCategory, DnaError, DnaMatch, DnaProfile,
    Exemplar, ExemplarPattern, BASELINE_BARS, MIN_EXEMPLARS,
};
use surgelab_core::domain::InvestorFlow;

use crate::cache::TtlCache;
use crate::config::DnaConfig;
use crate::error::{ProviderError, RunError};
use crate::fetch::{FetchPool, Fetched};
use crate::store::DnaStore;

/// Flows are optional input: a provider error degrades to "no flows".
pub(crate) fn optional_flows(
    fetch: &FetchPool,
    symbol: &str,
    count: usize,
) -> Option<Vec<InvestorFlow>> {
    match fetch.investor_flows(symbol, count) {
        Ok(flows) => flows,
        Err(error) => {
            debug!(%symbol, %error, "investor flows unavailable");
            None
        }
    }
}

/// The live DNA profile: a TTL cache in front of an optional store.
#[derive(Clone)]
pub struct PublishedProfile {
    cache: Arc<TtlCache<DnaProfile>>,
    store: Option<Arc<dyn DnaStore>>,
}

impl PublishedProfile {
    pub fn new(cache: Arc<TtlCache<DnaProfile>>, store: Option<Arc<dyn DnaStore>>) -> Self {
        Self { cache, store }
    }

    pub fn publish(&self, profile: DnaProfile) -> Arc<DnaProfile> {
        if let Some(store) = &self.store {
            if let Err(error) = store.save_profile(&profile) {
                warn!(%error, "failed to persist DNA profile");
            }
        }
        let published = self.cache.set(profile);
        info!(
            indicators = published.averages.len(),
            strength = published.strength_score,
            exemplars = published.based_on_exemplar_count,
            "DNA profile published"
        );
        published
    }

    pub fn current(&self) -> Option<Arc<DnaProfile>> {
        if let Some(fresh) = self.cache.get() {
            return Some(fresh);
        }
        if let Some(store) = &self.store {
            match store.load_profile() {
                Ok(Some(profile)) => return Some(self.cache.set(profile)),
                Ok(None) => {}
                Err(error) => warn!(%error, "failed to load DNA profile"),
            }
        }
        self.cache.get_stale()
    }
}

pub struct DnaExtractor {
    fetch: Arc<FetchPool>,
    config: DnaConfig,
    published: PublishedProfile,
}

impl DnaExtractor {
    pub fn new(fetch: Arc<FetchPool>, config: DnaConfig, published: PublishedProfile) -> Self {
        Self {
            fetch,
            config,
            published,
        }
    }

    pub fn current(&self) -> Option<Arc<DnaProfile>> {
        self.published.current()
    }

    /// Compute a signature per exemplar, aggregate them into a profile and
    /// publish it.
    ///
    /// Exemplars whose bars cannot be fetched or whose window is empty are
    /// logged and dropped; fewer than two survivors is an error and leaves
    /// the previous profile in place.
    pub fn extract(&self, exemplars: &[Exemplar]) -> Result<Arc<DnaProfile>, RunError> {
        if exemplars.len() < MIN_EXEMPLARS {
            return Err(DnaError::TooFewExemplars {
                required: MIN_EXEMPLARS,
                available: exemplars.len(),
            }
            .into());
        }

        let never = AtomicBool::new(false);
        let cfg = &self.config;
        let signature = |exemplar: &Exemplar| -> Result<ExemplarPattern, SymbolFailure> {
            let bars = self
                .fetch
                .daily_bars(&exemplar.symbol, cfg.history_days)
                .map_err(SymbolFailure::Fetch)?;
            let flows = if cfg.use_investor_flows {
                optional_flows(&self.fetch, &exemplar.symbol, cfg.history_days)
            } else {
                None
            };
            ExemplarPattern::from_window(exemplar.clone(), &bars, flows.as_deref())
                .map_err(SymbolFailure::Signature)
        };
        let outcomes = self.fetch.map_each(exemplars, &never, signature);

        let mut patterns = Vec::with_capacity(exemplars.len());
        for (exemplar, outcome) in exemplars.iter().zip(outcomes) {
            match outcome {
                Fetched::Done(Ok(pattern)) => patterns.push(pattern),
                Fetched::Done(Err(failure)) => {
                    warn!(symbol = %exemplar.symbol, %failure, "exemplar dropped");
                }
                Fetched::Cancelled => {}
            }
        }
        info!(
            requested = exemplars.len(),
            computed = patterns.len(),
            "exemplar signatures computed"
        );

        let profile = extract_profile(&patterns)?;
        Ok(self.published.publish(profile))
    }
}

#[derive(Debug, thiserror::Error)]
enum SymbolFailure {
    #[error(transparent)]
    Fetch(ProviderError),
    #[error(transparent)]
    Signature(DnaError),
}

#[derive(Debug, Clone, Default)]
pub struct DnaScanReport {
    /// Matches at or above `min_score`, best first.
    pub matches: Vec<DnaMatch>,
    pub analyzed: usize,
    pub matched: usize,
    pub failed: usize,
}

pub struct DnaScanner {
    fetch: Arc<FetchPool>,
    config: DnaConfig,
}

impl DnaScanner {
    pub fn new(fetch: Arc<FetchPool>, config: DnaConfig) -> Self {
        Self { fetch, config }
    }

    /// Score each symbol's recent window against `profile` and keep those
    /// scoring at least `min_score`.
    pub fn scan(
        &self,
        symbols: &[String],
        profile: &DnaProfile,
        min_score: f64,
        cancel: &AtomicBool,
    ) -> DnaScanReport {
        let cfg = &self.config;
        let wants_flows = cfg.use_investor_flows
            && (profile.has_category(DnaCategory::Institution)
                || profile.has_category(DnaCategory::Foreign));
        let bar_count = cfg.window_bars + BASELINE_BARS;

        let score_symbol = |symbol: &str| -> Result<DnaMatch, SymbolFailure> {
            let bars = self
                .fetch
                .daily_bars(symbol, bar_count)
                .map_err(SymbolFailure::Fetch)?;
            let flows = if wants_flows {
                optional_flows(&self.fetch, symbol, cfg.window_bars)
            } else {
                None
            };
            let candidate =
                DnaCandidate::from_recent(symbol, &bars, cfg.window_bars, flows.as_deref())
                    .map_err(SymbolFailure::Signature)?;
            Ok(match_score(&candidate, profile))
        };
        let results = self.fetch.map_symbols(symbols, cancel, score_symbol);

        let mut report = DnaScanReport::default();
        for (symbol, fetched) in results {
            match fetched {
                Fetched::Done(Ok(m)) => {
                    report.analyzed += 1;
                    if m.total_score >= min_score {
                        report.matches.push(m);
                    }
                }
                Fetched::Done(Err(failure)) => {
                    warn!(%symbol, %failure, "skipping symbol");
                    report.failed += 1;
                }
                Fetched::Cancelled => {}
            }
        }
        report.matches.sort_by(|a, b| {
            b.total_score
                .partial_cmp(&a.total_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        report.matched = report.matches.len();
        info!(
            analyzed = report.analyzed,
            matched = report.matched,
            failed = report.failed,
            min_score,
            "DNA scan complete"
        );
        report
    }
}
