//! Pattern catalog: a closed set of named two-condition predicates over an
//! [`IndicatorSnapshot`], and the records produced when mining them against
//! a surge corpus.

pub mod mining;

pub use mining::{
    backtest_pattern, count_occurrences, matching_patterns, mine_patterns, MiningError,
    MiningParams,
};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::indicators::IndicatorSnapshot;

/// Volume ratio treated as "high volume" by the catalog.
pub const HIGH_VOLUME_RATIO: f64 = 2.5;

/// Minimum up/down volume ratio for the asymmetric conditions.
pub const ASYMMETRIC_MIN_RATIO: f64 = 1.5;

/// Every predicate the miner knows about. Each is an AND of two conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    WhaleAccumulation,
    DrainEscape,
    WhaleHighVolume,
    AccumulationAsymmetric,
    EscapeWhale,
    DrainAccumulation,
    MfiObvMomentum,
    VwapAsymmetric,
}

impl PatternKind {
    pub const ALL: [PatternKind; 8] = [
        Self::WhaleAccumulation,
        Self::DrainEscape,
        Self::WhaleHighVolume,
        Self::AccumulationAsymmetric,
        Self::EscapeWhale,
        Self::DrainAccumulation,
        Self::MfiObvMomentum,
        Self::VwapAsymmetric,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::WhaleAccumulation => "whale_accumulation",
            Self::DrainEscape => "drain_escape",
            Self::WhaleHighVolume => "whale_high_volume",
            Self::AccumulationAsymmetric => "accumulation_asymmetric",
            Self::EscapeWhale => "escape_whale",
            Self::DrainAccumulation => "drain_accumulation",
            Self::MfiObvMomentum => "mfi_obv_momentum",
            Self::VwapAsymmetric => "vwap_asymmetric",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::WhaleAccumulation => "Whale + silent accumulation",
            Self::DrainEscape => "Liquidity drain + escape velocity",
            Self::WhaleHighVolume => "Whale + volume ratio ≥ 2.5",
            Self::AccumulationAsymmetric => "Silent accumulation + up-volume dominance",
            Self::EscapeWhale => "Escape velocity + whale",
            Self::DrainAccumulation => "Liquidity drain + silent accumulation",
            Self::MfiObvMomentum => "MFI 50–80 + rising OBV",
            Self::VwapAsymmetric => "Above VWAP + up-volume dominance",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }

    pub fn matches(&self, s: &IndicatorSnapshot) -> bool {
        let asymmetric_up = s.asymmetric.bullish && s.asymmetric.ratio >= ASYMMETRIC_MIN_RATIO;
        match self {
            Self::WhaleAccumulation => s.whale.detected && s.accumulation.detected,
            Self::DrainEscape => s.drain.detected && s.escape.detected,
            Self::WhaleHighVolume => s.whale.detected && s.volume_ratio >= HIGH_VOLUME_RATIO,
            Self::AccumulationAsymmetric => s.accumulation.detected && asymmetric_up,
            Self::EscapeWhale => s.escape.detected && s.whale.detected,
            Self::DrainAccumulation => s.drain.detected && s.accumulation.detected,
            Self::MfiObvMomentum => (50.0..=80.0).contains(&s.mfi) && s.obv_trend_pct > 0.0,
            Self::VwapAsymmetric => s.close > s.vwap && asymmetric_up,
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Outcome statistics over the surge events a pattern matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternBacktest {
    pub win_rate: f64,
    pub avg_return: f64,
    pub max_return: f64,
    pub min_return: f64,
    pub total_samples: usize,
}

/// A mined pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub key: String,
    pub name: String,
    pub predicate: PatternKind,
    pub occurrence_count: usize,
    /// Occurrences as a percentage of the corpus size.
    pub frequency: f64,
    pub sample_symbols: Vec<String>,
    pub backtest: PatternBacktest,
}

impl Pattern {
    pub fn matches(&self, snapshot: &IndicatorSnapshot) -> bool {
        self.predicate.matches(snapshot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiningMode {
    Standard,
    Smart,
}

/// The published unit: a ranked pattern list plus provenance. A new set
/// replaces the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSet {
    pub patterns: Vec<Pattern>,
    pub corpus_size: usize,
    pub corpus_hash: String,
    pub mined_at: NaiveDateTime,
    pub mode: MiningMode,
}
