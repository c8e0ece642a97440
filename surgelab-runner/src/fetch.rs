//! Bounded, rate-limited access to the market-data provider.
//!
//! - [`RateLimiter`]: hands out call slots at a fixed interval.
//! - [`CircuitBreaker`]: refuses calls for a cooldown after repeated
//!   transient failures.
//! - [`FetchPool`]: a rayon pool of `max_in_flight` workers; every provider
//!   call made through it passes the breaker and waits for a limiter slot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, warn};

use surgelab_core::domain::{normalize_bars, Bar, InvestorFlow};

use crate::config::FetchConfig;
use crate::error::{ProviderError, RunError};
use crate::provider::{MarketDataProvider, Quote, RankedSymbol, RankingKind};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─── Rate limiter ───────────────────────────────────────────────────

/// Fixed-interval slot allocator. Each caller reserves the next free slot
/// under the lock, then sleeps outside it until the slot arrives.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Reserve a slot and return how long the caller must wait for it.
    pub fn reserve(&self) -> Duration {
        let now = Instant::now();
        let mut next = lock(&self.next_slot);
        let slot = (*next).max(now);
        *next = slot.checked_add(self.interval).unwrap_or(slot);
        slot.saturating_duration_since(now)
    }

    /// Block until this caller's slot.
    pub fn acquire(&self) {
        let wait = self.reserve();
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
    }
}

// ─── Circuit breaker ────────────────────────────────────────────────

/// Shields a failing upstream from further calls.
///
/// Transient failures in a row are counted; once the count reaches the trip
/// point every call is refused until `cooldown` has run out, then counting
/// starts over from zero.
#[derive(Debug)]
pub struct CircuitBreaker {
    tripwire: Mutex<Tripwire>,
    cooldown: Duration,
    trip_after: u32,
}

#[derive(Debug, Default)]
struct Tripwire {
    streak: u32,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    pub const TRIP_AFTER: u32 = 3;

    pub fn new(cooldown: Duration) -> Self {
        Self {
            tripwire: Mutex::new(Tripwire::default()),
            cooldown,
            trip_after: Self::TRIP_AFTER,
        }
    }

    /// `Err` carries the wait left while the circuit is open.
    pub fn admit(&self) -> Result<(), Duration> {
        let mut wire = lock(&self.tripwire);
        if let Some(opened_at) = wire.opened_at {
            let elapsed = opened_at.elapsed();
            if elapsed < self.cooldown {
                return Err(self.cooldown - elapsed);
            }
            debug!("provider circuit closed");
            *wire = Tripwire::default();
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.admit().is_err()
    }

    pub fn on_success(&self) {
        lock(&self.tripwire).streak = 0;
    }

    pub fn on_transient_failure(&self) {
        let mut wire = lock(&self.tripwire);
        wire.streak = wire.streak.saturating_add(1);
        if wire.streak < self.trip_after {
            return;
        }
        if wire.opened_at.is_none() {
            warn!(
                failures = wire.streak,
                cooldown_secs = self.cooldown.as_secs(),
                "provider circuit opened"
            );
        }
        wire.opened_at = Some(Instant::now());
    }
}

// ─── Fetch pool ─────────────────────────────────────────────────────

/// Per-symbol outcome of a pooled batch. `Cancelled` marks symbols never
/// started because the batch was told to stop.
#[derive(Debug)]
pub enum Fetched<T> {
    Done(T),
    Cancelled,
}

pub struct FetchPool {
    provider: Arc<dyn MarketDataProvider>,
    limiter: RateLimiter,
    breaker: CircuitBreaker,
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for FetchPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchPool")
            .field("provider", &self.provider.name())
            .field("interval", &self.limiter.interval())
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl FetchPool {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        config: &FetchConfig,
    ) -> Result<Self, RunError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_in_flight.max(1))
            .thread_name(|i| format!("surgelab-fetch-{i}"))
            .build()
            .map_err(|e| RunError::ThreadPool(e.to_string()))?;
        Ok(Self {
            provider,
            limiter: RateLimiter::new(config.interval()),
            breaker: CircuitBreaker::new(config.breaker_cooldown()),
            pool,
        })
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Run one provider call through the breaker and the limiter.
    pub fn call<T>(
        &self,
        op: impl FnOnce(&dyn MarketDataProvider) -> Result<T, ProviderError>,
    ) -> Result<T, ProviderError> {
        if let Err(wait) = self.breaker.admit() {
            return Err(ProviderError::CircuitOpen {
                remaining_secs: wait.as_secs(),
            });
        }
        self.limiter.acquire();
        let result = op(self.provider.as_ref());
        match &result {
            Ok(_) => self.breaker.on_success(),
            Err(e) if e.is_transient() => self.breaker.on_transient_failure(),
            Err(_) => {}
        }
        result
    }

    /// Daily bars, ascending with duplicate dates removed.
    pub fn daily_bars(&self, symbol: &str, count: usize) -> Result<Vec<Bar>, ProviderError> {
        self.call(|p| p.daily_bars(symbol, count)).map(normalize_bars)
    }

    pub fn current_quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        self.call(|p| p.current_quote(symbol))
    }

    pub fn ranked_symbols(
        &self,
        market: &str,
        kind: RankingKind,
        limit: usize,
    ) -> Result<Vec<RankedSymbol>, ProviderError> {
        self.call(|p| p.ranked_symbols(market, kind, limit))
    }

    pub fn investor_flows(
        &self,
        symbol: &str,
        count: usize,
    ) -> Result<Option<Vec<InvestorFlow>>, ProviderError> {
        self.call(|p| p.investor_flows(symbol, count))
    }

    /// Apply `task` to every item on the pool.
    ///
    /// Output order follows `items`. Once `cancel` is set, items not yet
    /// started come back as [`Fetched::Cancelled`].
    pub fn map_each<I, T, F>(&self, items: &[I], cancel: &AtomicBool, task: F) -> Vec<Fetched<T>>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> T + Sync + Send,
    {
        debug!(items = items.len(), "dispatching batch");
        self.pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    if cancel.load(Ordering::Relaxed) {
                        Fetched::Cancelled
                    } else {
                        Fetched::Done(task(item))
                    }
                })
                .collect()
        })
    }

    /// [`Self::map_each`] over symbols, pairing each outcome with its symbol.
    pub fn map_symbols<T, F>(
        &self,
        symbols: &[String],
        cancel: &AtomicBool,
        task: F,
    ) -> Vec<(String, Fetched<T>)>
    where
        T: Send,
        F: Fn(&str) -> T + Sync + Send,
    {
        let outcomes = self.map_each(symbols, cancel, |symbol| task(symbol));
        symbols.iter().cloned().zip(outcomes).collect()
    }
}
