//! Score term catalog.
//!
//! Every contribution to the composite score is a named descriptor with its
//! own cap. Raw values are clamped to `[0, cap]` term by term before any
//! summation; no term sees another term's output.

use serde::{Deserialize, Serialize};

use super::ScoreInputs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    Base,
    Bonus,
    Penalty,
}

/// One named, capped term.
#[derive(Clone, Copy)]
pub struct ScoreTerm {
    pub name: &'static str,
    pub kind: TermKind,
    pub cap: f64,
    pub compute: fn(&ScoreInputs) -> f64,
}

impl ScoreTerm {
    /// Raw value clamped into `[0, cap]`; non-finite raws count as 0.
    pub fn evaluate(&self, inputs: &ScoreInputs) -> TermResult {
        let raw = (self.compute)(inputs);
        let value = if raw.is_finite() {
            raw.clamp(0.0, self.cap)
        } else {
            0.0
        };
        TermResult {
            name: self.name.to_string(),
            raw,
            value,
            cap: self.cap,
            active: value > 0.0,
        }
    }
}

impl std::fmt::Debug for ScoreTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreTerm")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("cap", &self.cap)
            .finish()
    }
}

/// Evaluated term as reported in a score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermResult {
    pub name: String,
    pub raw: f64,
    pub value: f64,
    pub cap: f64,
    pub active: bool,
}

/// The fixed term catalog, in fold order.
pub fn term_catalog() -> &'static [ScoreTerm] {
    &CATALOG
}

static CATALOG: [ScoreTerm; 15] = [
    // ── Base ──
    ScoreTerm {
        name: "obv_trend",
        kind: TermKind::Base,
        cap: 10.0,
        compute: obv_trend,
    },
    ScoreTerm {
        name: "mfi_zone",
        kind: TermKind::Base,
        cap: 10.0,
        compute: mfi_zone,
    },
    ScoreTerm {
        name: "vwap_position",
        kind: TermKind::Base,
        cap: 10.0,
        compute: vwap_position,
    },
    ScoreTerm {
        name: "volume_surge",
        kind: TermKind::Base,
        cap: 10.0,
        compute: volume_surge,
    },
    // ── Bonuses ──
    ScoreTerm {
        name: "whale",
        kind: TermKind::Bonus,
        cap: 15.0,
        compute: whale,
    },
    ScoreTerm {
        name: "silent_accumulation",
        kind: TermKind::Bonus,
        cap: 15.0,
        compute: silent_accumulation,
    },
    ScoreTerm {
        name: "escape_velocity",
        kind: TermKind::Bonus,
        cap: 15.0,
        compute: escape_velocity,
    },
    ScoreTerm {
        name: "liquidity_drain",
        kind: TermKind::Bonus,
        cap: 10.0,
        compute: liquidity_drain,
    },
    ScoreTerm {
        name: "asymmetric_volume",
        kind: TermKind::Bonus,
        cap: 10.0,
        compute: asymmetric_volume,
    },
    ScoreTerm {
        name: "sentiment",
        kind: TermKind::Bonus,
        cap: 10.0,
        compute: sentiment,
    },
    ScoreTerm {
        name: "pattern_match",
        kind: TermKind::Bonus,
        cap: 10.0,
        compute: pattern_match,
    },
    ScoreTerm {
        name: "dna_match",
        kind: TermKind::Bonus,
        cap: 10.0,
        compute: dna_match,
    },
    // ── Penalties ──
    ScoreTerm {
        name: "mfi_overbought",
        kind: TermKind::Penalty,
        cap: 10.0,
        compute: mfi_overbought,
    },
    ScoreTerm {
        name: "overextended",
        kind: TermKind::Penalty,
        cap: 10.0,
        compute: overextended,
    },
    ScoreTerm {
        name: "distribution",
        kind: TermKind::Penalty,
        cap: 10.0,
        compute: distribution,
    },
];

// ─── Term functions ─────────────────────────────────────────────────

/// +50% OBV over the trend window earns the full 10.
fn obv_trend(i: &ScoreInputs) -> f64 {
    i.snapshot.obv_trend_pct / 5.0
}

fn mfi_zone(i: &ScoreInputs) -> f64 {
    match i.snapshot.mfi {
        m if (50.0..=80.0).contains(&m) => 10.0,
        m if (40.0..50.0).contains(&m) => 5.0,
        _ => 0.0,
    }
}

/// 2 points per percent above VWAP.
fn vwap_position(i: &ScoreInputs) -> f64 {
    i.snapshot.vwap_gap_pct() * 2.0
}

fn volume_surge(i: &ScoreInputs) -> f64 {
    (i.snapshot.volume_ratio - 1.0) * 5.0
}

fn whale(i: &ScoreInputs) -> f64 {
    let w = &i.snapshot.whale;
    if w.detected {
        w.intensity * 5.0
    } else {
        0.0
    }
}

fn silent_accumulation(i: &ScoreInputs) -> f64 {
    let a = &i.snapshot.accumulation;
    if a.detected {
        10.0 + a.volume_increase_pct / 10.0
    } else {
        0.0
    }
}

fn escape_velocity(i: &ScoreInputs) -> f64 {
    let e = &i.snapshot.escape;
    if e.detected {
        e.volume_ratio * 5.0
    } else {
        0.0
    }
}

fn liquidity_drain(i: &ScoreInputs) -> f64 {
    if i.snapshot.drain.detected {
        10.0
    } else {
        0.0
    }
}

fn asymmetric_volume(i: &ScoreInputs) -> f64 {
    let a = &i.snapshot.asymmetric;
    if a.bullish {
        a.score / 10.0
    } else {
        0.0
    }
}

fn sentiment(i: &ScoreInputs) -> f64 {
    i.sentiment.unwrap_or(0.0) / 10.0
}

fn pattern_match(i: &ScoreInputs) -> f64 {
    i.pattern_matches as f64 * 5.0
}

fn dna_match(i: &ScoreInputs) -> f64 {
    i.dna_match.unwrap_or(0.0) / 10.0
}

fn mfi_overbought(i: &ScoreInputs) -> f64 {
    (i.snapshot.mfi - 80.0) / 2.0
}

/// Points per percent beyond 15% above the 20-bar SMA.
fn overextended(i: &ScoreInputs) -> f64 {
    i.snapshot.sma_20_gap_pct() - 15.0
}

fn distribution(i: &ScoreInputs) -> f64 {
    let a = &i.snapshot.asymmetric;
    if a.ratio < 1.0 {
        a.score / 5.0
    } else {
        0.0
    }
}
