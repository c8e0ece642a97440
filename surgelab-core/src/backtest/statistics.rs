//! Performance statistics over a trade list.
//!
//! Pure functions: trades in, numbers out. `max_drawdown` compounds the
//! trades in the order supplied, so reordering the input changes it.

use serde::{Deserialize, Serialize};

use crate::domain::SimulatedTrade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStatistics {
    pub total_trades: usize,
    pub win_count: usize,
    pub loss_count: usize,
    pub win_rate: f64,
    pub avg_return: f64,
    pub std_dev: f64,
    pub sharpe_ratio: f64,
    /// Percent, from a unit portfolio compounded trade by trade.
    pub max_drawdown: f64,
    pub final_portfolio_value: f64,
    pub total_profit: f64,
    pub total_loss: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub avg_holding_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopLossStatistics {
    pub base: PerformanceStatistics,
    pub triggered_count: usize,
    pub triggered_rate: f64,
    /// Mean stop day over triggered trades; 0 when none triggered.
    pub avg_day_to_stop_loss: f64,
}

/// `None` on an empty trade list.
pub fn compute_statistics(trades: &[SimulatedTrade]) -> Option<PerformanceStatistics> {
    if trades.is_empty() {
        return None;
    }
    let n = trades.len() as f64;
    let returns: Vec<f64> = trades.iter().map(|t| t.return_rate).collect();
    let wins: Vec<f64> = trades.iter().filter(|t| t.is_win).map(|t| t.return_rate).collect();
    let losses: Vec<f64> = trades.iter().filter(|t| !t.is_win).map(|t| t.return_rate).collect();

    let avg_return = mean(&returns);
    let std_dev = population_std_dev(&returns, avg_return);
    let total_profit: f64 = wins.iter().sum();
    let total_loss = losses.iter().sum::<f64>().abs();
    let (max_drawdown, final_portfolio_value) = compound(&returns);

    Some(PerformanceStatistics {
        total_trades: trades.len(),
        win_count: wins.len(),
        loss_count: losses.len(),
        win_rate: wins.len() as f64 / n * 100.0,
        avg_return,
        std_dev,
        sharpe_ratio: if std_dev == 0.0 { 0.0 } else { avg_return / std_dev },
        max_drawdown,
        final_portfolio_value,
        total_profit,
        total_loss,
        profit_factor: profit_factor(total_profit, total_loss),
        avg_win: mean(&wins),
        avg_loss: mean(&losses),
        best_trade: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        worst_trade: returns.iter().copied().fold(f64::INFINITY, f64::min),
        avg_holding_days: trades.iter().map(|t| t.holding_days as f64).sum::<f64>() / n,
    })
}

/// Base statistics plus stop-loss trigger counts. `None` on an empty list.
pub fn compute_stop_loss_statistics(trades: &[SimulatedTrade]) -> Option<StopLossStatistics> {
    let base = compute_statistics(trades)?;
    let stop_days: Vec<f64> = trades
        .iter()
        .filter(|t| t.stop_loss_triggered)
        .map(|t| t.stop_loss_day.unwrap_or(t.holding_days) as f64)
        .collect();

    Some(StopLossStatistics {
        triggered_count: stop_days.len(),
        triggered_rate: stop_days.len() as f64 / trades.len() as f64 * 100.0,
        avg_day_to_stop_loss: mean(&stop_days),
        base,
    })
}

// ─── Individual metric functions ────────────────────────────────────

/// Maximum peak-to-trough decline (percent) of a unit portfolio compounded
/// by `returns` in order.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    compound(returns).0
}

fn compound(returns: &[f64]) -> (f64, f64) {
    let mut value = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;
    for r in returns {
        value *= 1.0 + r / 100.0;
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.max((peak - value) / peak * 100.0);
        }
    }
    (worst, value)
}

/// Gross profit over gross loss; gross profit itself when nothing was lost.
fn profit_factor(total_profit: f64, total_loss: f64) -> f64 {
    if total_loss == 0.0 {
        total_profit
    } else {
        total_profit / total_loss
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}
