//! Grade — ordinal label looked up from a final score.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal grade, worst to best. `SPlus` is only reachable through the
/// external hot-issue flag on top of an `S`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    D,
    C,
    B,
    A,
    S,
    #[serde(rename = "S+")]
    SPlus,
}

impl Grade {
    /// Grade under the default thresholds.
    pub fn from_score(score: f64) -> Self {
        GradeThresholds::default().grade(score)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::D => "D",
            Self::C => "C",
            Self::B => "B",
            Self::A => "A",
            Self::S => "S",
            Self::SPlus => "S+",
        }
    }

    /// Upgrade S → S+ when flagged as a hot issue; any other grade is unchanged.
    pub fn with_hot_issue(self, hot_issue: bool) -> Self {
        match self {
            Self::S if hot_issue => Self::SPlus,
            other => other,
        }
    }
}

/// Default-threshold grade for `score`, upgraded to S+ on a hot issue.
pub fn grade_with_hot_issue(score: f64, hot_issue: bool) -> Grade {
    Grade::from_score(score).with_hot_issue(hot_issue)
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower bounds (inclusive) for each grade. Anything below `c` is `D`.
///
/// Thresholds must be strictly descending inside `(0, 100]` so the grades
/// partition `[0, 100]` without gaps or overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeThresholds {
    pub s: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            s: 75.0,
            a: 58.0,
            b: 42.0,
            c: 25.0,
        }
    }
}

impl GradeThresholds {
    pub fn is_valid(&self) -> bool {
        self.s <= 100.0 && self.s > self.a && self.a > self.b && self.b > self.c && self.c > 0.0
    }

    pub fn grade(&self, score: f64) -> Grade {
        if score >= self.s {
            Grade::S
        } else if score >= self.a {
            Grade::A
        } else if score >= self.b {
            Grade::B
        } else if score >= self.c {
            Grade::C
        } else {
            Grade::D
        }
    }
}
