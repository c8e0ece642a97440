//! Trade simulation over historical bars and the statistics derived from a
//! trade list.

pub mod simulate;
pub mod statistics;

pub use simulate::{simulate_trade, simulate_trade_with_stop_loss};
pub use statistics::{
    compute_statistics, compute_stop_loss_statistics, max_drawdown, PerformanceStatistics,
    StopLossStatistics,
};
