//! Corpus fingerprinting.
//!
//! `corpus_hash` identifies the surge corpus a pattern set was mined from:
//! BLAKE3 over the events sorted by `(symbol, event_date)`, so collection
//! order does not change it.

use crate::domain::SurgeEvent;

pub fn corpus_hash(events: &[SurgeEvent]) -> String {
    let mut keyed: Vec<&SurgeEvent> = events.iter().collect();
    keyed.sort_by(|a, b| {
        a.symbol
            .cmp(&b.symbol)
            .then_with(|| a.event_date.cmp(&b.event_date))
    });

    let mut hasher = blake3::Hasher::new();
    for event in keyed {
        hasher.update(event.symbol.as_bytes());
        hasher.update(&[0]);
        hasher.update(event.event_date.to_string().as_bytes());
        hasher.update(&event.daily_return.to_le_bytes());
        hasher.update(&event.forward_return.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
