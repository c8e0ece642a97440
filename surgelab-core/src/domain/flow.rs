//! Daily investor net-buy flows, used by DNA streak signatures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorFlow {
    pub date: NaiveDate,
    pub institution_net_buy: f64,
    pub foreign_net_buy: f64,
}

/// Longest run of consecutive entries (in date order) whose value is positive.
pub fn longest_positive_streak(
    flows: &[InvestorFlow],
    value: impl Fn(&InvestorFlow) -> f64,
) -> usize {
    let mut sorted: Vec<&InvestorFlow> = flows.iter().collect();
    sorted.sort_by_key(|f| f.date);

    let mut best = 0;
    let mut current = 0;
    for flow in sorted {
        if value(flow) > 0.0 {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}
