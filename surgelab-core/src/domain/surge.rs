//! SurgeEvent — a historical (symbol, date) pair whose return crossed the
//! surge threshold, with the indicator snapshot taken the bar before.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSnapshot;

/// Ground-truth record for pattern mining. Immutable once recorded; a mining
/// run rebuilds its corpus from scratch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurgeEvent {
    pub symbol: String,
    pub event_date: NaiveDate,
    /// Return of the qualifying move, in percent.
    pub daily_return: f64,
    /// Return from the signal bar's close over the holding horizon, in percent.
    pub forward_return: f64,
    /// Indicators as of the bar before `event_date`.
    pub snapshot: IndicatorSnapshot,
}
