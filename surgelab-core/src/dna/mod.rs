//! Surge DNA: volume and investor-flow signatures learned from user-chosen
//! exemplar windows, aggregated into a profile and matched against candidates.

pub mod profile;
pub mod signature;

pub use profile::{extract_profile, extract_profile_at, match_score, DnaMatch, DnaProfile};
pub use signature::{compute_signature, DnaCandidate, ExemplarPattern, Signature, BASELINE_BARS};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fewest exemplars a profile may be built from.
pub const MIN_EXEMPLARS: usize = 2;

/// A user-chosen historical surge window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exemplar {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Exemplar {
    pub fn new(symbol: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            start_date,
            end_date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnaCategory {
    Volume,
    Institution,
    Foreign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnaIndicator {
    /// Half-life weighted mean of per-bar volume ratios.
    VolumeWeighted,
    /// 40/30/30 segment means blended 0.2/0.3/0.5.
    VolumeTrend,
    /// Mean of the last five per-bar volume ratios.
    VolumeRecent,
    InstitutionStreak,
    ForeignStreak,
}

impl DnaIndicator {
    pub const ALL: [DnaIndicator; 5] = [
        Self::VolumeWeighted,
        Self::VolumeTrend,
        Self::VolumeRecent,
        Self::InstitutionStreak,
        Self::ForeignStreak,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::VolumeWeighted => "volume_weighted",
            Self::VolumeTrend => "volume_trend",
            Self::VolumeRecent => "volume_recent",
            Self::InstitutionStreak => "institution_streak",
            Self::ForeignStreak => "foreign_streak",
        }
    }

    pub fn category(&self) -> DnaCategory {
        match self {
            Self::VolumeWeighted | Self::VolumeTrend | Self::VolumeRecent => DnaCategory::Volume,
            Self::InstitutionStreak => DnaCategory::Institution,
            Self::ForeignStreak => DnaCategory::Foreign,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DnaError {
    #[error("need at least {required} exemplars with computable signatures, have {available}")]
    TooFewExemplars { required: usize, available: usize },

    #[error("no bars inside the exemplar window")]
    EmptyWindow,

    #[error("exemplar window has no traded volume")]
    NoVolume,
}
