//! Domain types for SurgeLab

pub mod bar;
pub mod flow;
pub mod surge;
pub mod trade;

pub use bar::{normalize_bars, pct_change, Bar};
pub use flow::{longest_positive_streak, InvestorFlow};
pub use surge::SurgeEvent;
pub use trade::{trade_return, SimulatedTrade};

/// Symbol type alias
pub type Symbol = String;
