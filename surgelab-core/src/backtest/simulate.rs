//! Close-to-close trade simulation.
//!
//! Entry is at the close of `bars[entry_index]`. Bars must be ascending by date.

use crate::domain::{trade_return, Bar, SimulatedTrade};

/// Hold for `holding_days` bars, or until the last available bar.
///
/// Returns `None` when the entry index is out of range, the entry close is
/// not positive, or there is no bar after the entry.
pub fn simulate_trade(
    symbol: &str,
    bars: &[Bar],
    entry_index: usize,
    holding_days: usize,
) -> Option<SimulatedTrade> {
    let (entry, exit_index) = bounds(bars, entry_index, holding_days)?;
    let exit = &bars[exit_index];
    Some(SimulatedTrade::new(
        symbol,
        entry.date,
        entry.close,
        exit.date,
        exit.close,
        exit_index - entry_index,
        None,
    ))
}

/// As [`simulate_trade`], but exits on the first day whose close puts the
/// cumulative return at or below `stop_loss_rate` (percent, e.g. `-7.0`).
pub fn simulate_trade_with_stop_loss(
    symbol: &str,
    bars: &[Bar],
    entry_index: usize,
    holding_days: usize,
    stop_loss_rate: f64,
) -> Option<SimulatedTrade> {
    let (entry, exit_index) = bounds(bars, entry_index, holding_days)?;

    for day in 1..=(exit_index - entry_index) {
        let bar = &bars[entry_index + day];
        if trade_return(entry.close, bar.close) <= stop_loss_rate {
            return Some(SimulatedTrade::new(
                symbol,
                entry.date,
                entry.close,
                bar.date,
                bar.close,
                day,
                Some(day),
            ));
        }
    }

    let exit = &bars[exit_index];
    Some(SimulatedTrade::new(
        symbol,
        entry.date,
        entry.close,
        exit.date,
        exit.close,
        exit_index - entry_index,
        None,
    ))
}

fn bounds(bars: &[Bar], entry_index: usize, holding_days: usize) -> Option<(&Bar, usize)> {
    let entry = bars.get(entry_index)?;
    if entry.close <= 0.0 || holding_days == 0 {
        return None;
    }
    let exit_index = entry_index.saturating_add(holding_days).min(bars.len() - 1);
    if exit_index == entry_index {
        return None;
    }
    Some((entry, exit_index))
}
