//! Profile aggregation and candidate matching.

use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    DnaCandidate, DnaCategory, DnaError, DnaIndicator, Exemplar, ExemplarPattern, MIN_EXEMPLARS,
};

/// Thresholds sit at this fraction of the weakest exemplar's value.
pub const THRESHOLD_FACTOR: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnaProfile {
    pub averages: BTreeMap<DnaIndicator, f64>,
    pub thresholds: BTreeMap<DnaIndicator, f64>,
    pub strength_score: f64,
    pub based_on_exemplar_count: usize,
    pub exemplars: Vec<Exemplar>,
    pub extracted_at: NaiveDateTime,
}

impl DnaProfile {
    pub fn has_category(&self, category: DnaCategory) -> bool {
        self.averages.keys().any(|k| k.category() == category)
    }
}

/// Aggregate exemplar signatures into a profile stamped with the current time.
pub fn extract_profile(patterns: &[ExemplarPattern]) -> Result<DnaProfile, DnaError> {
    extract_profile_at(patterns, Utc::now().naive_utc())
}

/// As [`extract_profile`], with an explicit timestamp.
///
/// An indicator enters the profile only if every exemplar carries it, so a
/// single exemplar without flow data reduces the profile to volume only.
pub fn extract_profile_at(
    patterns: &[ExemplarPattern],
    extracted_at: NaiveDateTime,
) -> Result<DnaProfile, DnaError> {
    if patterns.len() < MIN_EXEMPLARS {
        return Err(DnaError::TooFewExemplars {
            required: MIN_EXEMPLARS,
            available: patterns.len(),
        });
    }

    let mut averages = BTreeMap::new();
    let mut thresholds = BTreeMap::new();
    for indicator in DnaIndicator::ALL {
        let values: Option<Vec<f64>> = patterns
            .iter()
            .map(|p| p.values.get(&indicator).copied())
            .collect();
        let Some(values) = values else { continue };

        let avg = values.iter().sum::<f64>() / values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        averages.insert(indicator, avg);
        thresholds.insert(indicator, THRESHOLD_FACTOR * min);
    }

    let categories: HashSet<DnaCategory> = averages.keys().map(|k| k.category()).collect();
    let mut strength = 0.0;
    if categories.contains(&DnaCategory::Volume) {
        strength += 40.0;
    }
    if categories.contains(&DnaCategory::Institution) {
        strength += 30.0;
    }
    if categories.contains(&DnaCategory::Foreign) {
        strength += 30.0;
    }
    if patterns.len() >= 3 {
        strength += 10.0;
    }
    if patterns.len() >= 5 {
        strength += 10.0;
    }

    Ok(DnaProfile {
        averages,
        thresholds,
        strength_score: f64::min(strength, 100.0),
        based_on_exemplar_count: patterns.len(),
        exemplars: patterns.iter().map(|p| p.exemplar.clone()).collect(),
        extracted_at,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnaMatch {
    pub symbol: String,
    pub total_score: f64,
    pub per_indicator: BTreeMap<DnaIndicator, f64>,
}

/// Score a candidate against every indicator in the profile.
///
/// An indicator scores 100 at or above its threshold, otherwise
/// `100 × value / threshold` clamped to `[0, 100]`. A candidate missing an
/// indicator scores 0 on it. The total is the mean across the profile.
pub fn match_score(candidate: &DnaCandidate, profile: &DnaProfile) -> DnaMatch {
    let per_indicator: BTreeMap<DnaIndicator, f64> = profile
        .thresholds
        .iter()
        .map(|(&indicator, &threshold)| {
            let score = match candidate.values.get(&indicator) {
                Some(&value) => indicator_match(value, threshold),
                None => 0.0,
            };
            (indicator, score)
        })
        .collect();

    let total_score = if per_indicator.is_empty() {
        0.0
    } else {
        per_indicator.values().sum::<f64>() / per_indicator.len() as f64
    };

    DnaMatch {
        symbol: candidate.symbol.clone(),
        total_score,
        per_indicator,
    }
}

fn indicator_match(value: f64, threshold: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    if value >= threshold {
        return 100.0;
    }
    if threshold <= 0.0 {
        return 0.0;
    }
    (100.0 * value / threshold).clamp(0.0, 100.0)
}
