//! SimulatedTrade — a completed hypothetical round trip: entry → exit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One simulated trade produced by applying an entry rule at a historical date.
///
/// `return_rate` is in percent. A stop-loss exit is never a win, regardless
/// of the sign of its return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTrade {
    pub symbol: String,

    // ── Entry ──
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    pub holding_days: usize,
    pub return_rate: f64,
    pub is_win: bool,

    // ── Stop loss ──
    pub stop_loss_triggered: bool,
    /// Trading day (1-based, counted from entry) on which the stop fired.
    pub stop_loss_day: Option<usize>,
}

impl SimulatedTrade {
    /// Build a trade from entry/exit, deriving `return_rate` and `is_win`.
    pub fn new(
        symbol: impl Into<String>,
        entry_date: NaiveDate,
        entry_price: f64,
        exit_date: NaiveDate,
        exit_price: f64,
        holding_days: usize,
        stop_loss_day: Option<usize>,
    ) -> Self {
        let return_rate = trade_return(entry_price, exit_price);
        let stop_loss_triggered = stop_loss_day.is_some();
        Self {
            symbol: symbol.into(),
            entry_date,
            entry_price,
            exit_date,
            exit_price,
            holding_days,
            return_rate,
            is_win: return_rate > 0.0 && !stop_loss_triggered,
            stop_loss_triggered,
            stop_loss_day,
        }
    }
}

/// `(exit − entry) / entry × 100`; 0.0 for a non-positive entry.
pub fn trade_return(entry_price: f64, exit_price: f64) -> f64 {
    if entry_price <= 0.0 {
        return 0.0;
    }
    (exit_price - entry_price) / entry_price * 100.0
}
