//! Composite scorer.
//!
//! A pure function from an [`IndicatorSnapshot`] (plus optional feedback
//! terms) to a [`ScoreBreakdown`]. The term catalog is folded left to
//! right; every term is capped on its own raw value, then
//! `final = clamp(base + Σbonuses − Σpenalties, 0, 100)`.

pub mod grade;
pub mod terms;

pub use grade::{grade_with_hot_issue, Grade, GradeThresholds};
pub use terms::{term_catalog, ScoreTerm, TermKind, TermResult};

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSnapshot;

/// Everything a score is a function of.
#[derive(Debug, Clone)]
pub struct ScoreInputs<'a> {
    pub snapshot: &'a IndicatorSnapshot,
    /// External trend/sentiment score in `[0, 100]`; `None` contributes 0.
    pub sentiment: Option<f64>,
    /// Number of validated mined patterns the snapshot matches.
    pub pattern_matches: usize,
    /// DNA match score in `[0, 100]`.
    pub dna_match: Option<f64>,
    /// External hot-issue flag (S → S+ only).
    pub hot_issue: bool,
}

impl<'a> ScoreInputs<'a> {
    pub fn new(snapshot: &'a IndicatorSnapshot) -> Self {
        Self {
            snapshot,
            sentiment: None,
            pattern_matches: 0,
            dna_match: None,
            hot_issue: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base_score: f64,
    pub base_terms: Vec<TermResult>,
    pub bonuses: Vec<TermResult>,
    pub penalties: Vec<TermResult>,
    pub final_score: f64,
    pub grade: Grade,
}

impl ScoreBreakdown {
    pub fn bonus_total(&self) -> f64 {
        self.bonuses.iter().map(|t| t.value).sum()
    }

    pub fn penalty_total(&self) -> f64 {
        self.penalties.iter().map(|t| t.value).sum()
    }

    /// Names of the bonus terms that contributed.
    pub fn active_bonuses(&self) -> Vec<&str> {
        self.bonuses
            .iter()
            .filter(|t| t.active)
            .map(|t| t.name.as_str())
            .collect()
    }
}

/// Score with the default grade thresholds.
pub fn score(inputs: &ScoreInputs) -> ScoreBreakdown {
    CompositeScorer::default().score(inputs)
}

/// Composite scorer bound to a set of grade thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeScorer {
    pub thresholds: GradeThresholds,
}

impl CompositeScorer {
    pub fn new(thresholds: GradeThresholds) -> Self {
        Self { thresholds }
    }

    pub fn score(&self, inputs: &ScoreInputs) -> ScoreBreakdown {
        let mut base_terms = Vec::new();
        let mut bonuses = Vec::new();
        let mut penalties = Vec::new();

        for term in term_catalog() {
            let result = term.evaluate(inputs);
            match term.kind {
                TermKind::Base => base_terms.push(result),
                TermKind::Bonus => bonuses.push(result),
                TermKind::Penalty => penalties.push(result),
            }
        }

        let base_score: f64 = base_terms.iter().map(|t| t.value).sum();
        let bonus: f64 = bonuses.iter().map(|t| t.value).sum();
        let penalty: f64 = penalties.iter().map(|t| t.value).sum();
        let final_score = (base_score + bonus - penalty).clamp(0.0, 100.0);
        let grade = self
            .thresholds
            .grade(final_score)
            .with_hot_issue(inputs.hot_issue);

        ScoreBreakdown {
            base_score,
            base_terms,
            bonuses,
            penalties,
            final_score,
            grade,
        }
    }

    /// Score every candidate and return them best first.
    pub fn score_candidates<'a, T>(
        &self,
        candidates: impl IntoIterator<Item = (T, ScoreInputs<'a>)>,
    ) -> Vec<Scored<T>> {
        let mut scored: Vec<Scored<T>> = candidates
            .into_iter()
            .map(|(item, inputs)| Scored {
                breakdown: self.score(&inputs),
                item,
            })
            .collect();
        Self::rank_candidates(&mut scored);
        scored
    }

    /// Sort descending by final score (stable for ties).
    pub fn rank_candidates<T>(candidates: &mut [Scored<T>]) {
        candidates.sort_by(|a, b| {
            b.breakdown
                .final_score
                .partial_cmp(&a.breakdown.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

/// A scored item, ranked by final score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scored<T> {
    pub item: T,
    pub breakdown: ScoreBreakdown,
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn neutral() -> IndicatorSnapshot {
        IndicatorSnapshot::neutral(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(), 100.0)
    }

    #[test]
    fn neutral_snapshot_scores_mfi_zone_only() {
        let snap = neutral();
        let b = score(&ScoreInputs::new(&snap));
        assert_eq!(b.base_score, 10.0);
        assert_eq!(b.bonus_total(), 0.0);
        assert_eq!(b.penalty_total(), 0.0);
        assert_eq!(b.final_score, 10.0);
        assert_eq!(b.grade, Grade::D);
    }

    #[test]
    fn final_score_identity_holds() {
        let mut snap = neutral();
        snap.whale.detected = true;
        snap.whale.intensity = 2.0;
        snap.mfi = 90.0;
        snap.volume_ratio = 2.0;
        let b = score(&ScoreInputs {
            sentiment: Some(70.0),
            ..ScoreInputs::new(&snap)
        });
        let expected = (b.base_score + b.bonus_total() - b.penalty_total()).clamp(0.0, 100.0);
        assert_eq!(b.final_score, expected);
        assert_eq!(b.active_bonuses(), vec!["whale", "sentiment"]);
    }

    #[test]
    fn stacked_bonuses_clamp_to_100() {
        let mut snap = neutral();
        snap.close = 110.0;
        snap.mfi = 70.0;
        snap.obv_trend_pct = 80.0;
        snap.volume_ratio = 5.0;
        snap.whale.detected = true;
        snap.whale.intensity = 10.0;
        snap.accumulation.detected = true;
        snap.escape.detected = true;
        snap.escape.volume_ratio = 4.0;
        snap.drain.detected = true;
        snap.asymmetric.bullish = true;
        snap.asymmetric.score = 200.0;
        let b = score(&ScoreInputs {
            sentiment: Some(100.0),
            pattern_matches: 3,
            dna_match: Some(100.0),
            hot_issue: true,
            ..ScoreInputs::new(&snap)
        });
        assert_eq!(b.final_score, 100.0);
        assert_eq!(b.grade, Grade::SPlus);
    }

    #[test]
    fn custom_thresholds_change_only_the_grade() {
        let snap = neutral();
        let strict = CompositeScorer::new(GradeThresholds {
            s: 95.0,
            a: 90.0,
            b: 85.0,
            c: 80.0,
        });
        let lenient = CompositeScorer::new(GradeThresholds {
            s: 9.0,
            a: 7.0,
            b: 5.0,
            c: 3.0,
        });
        let inputs = ScoreInputs::new(&snap);
        assert_eq!(strict.score(&inputs).final_score, lenient.score(&inputs).final_score);
        assert_eq!(strict.score(&inputs).grade, Grade::D);
        assert_eq!(lenient.score(&inputs).grade, Grade::S);
    }

    #[test]
    fn rank_sorts_descending() {
        let snap = neutral();
        let low = score(&ScoreInputs::new(&snap));
        let high = score(&ScoreInputs {
            sentiment: Some(100.0),
            ..ScoreInputs::new(&snap)
        });
        let mut list = vec![
            Scored { item: "low", breakdown: low },
            Scored { item: "high", breakdown: high },
        ];
        CompositeScorer::rank_candidates(&mut list);
        assert_eq!(list[0].item, "high");
    }

    #[test]
    fn score_candidates_ranks_whole_list() {
        let snap = neutral();
        let scorer = CompositeScorer::default();
        let ranked = scorer.score_candidates(vec![
            ("plain", ScoreInputs::new(&snap)),
            (
                "patterned",
                ScoreInputs {
                    pattern_matches: 2,
                    ..ScoreInputs::new(&snap)
                },
            ),
        ]);
        assert_eq!(ranked[0].item, "patterned");
        let gap = ranked[0].breakdown.final_score - ranked[1].breakdown.final_score;
        assert!((gap - 10.0).abs() < 1e-9);
    }
}
