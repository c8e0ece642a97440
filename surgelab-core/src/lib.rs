//! SurgeLab Core — pure computation for pre-surge screening.
//!
//! - Domain types (bars, surge events, investor flows, simulated trades)
//! - Volume/flow indicators and creative detectors, bundled into a snapshot
//! - Composite scorer over a named, capped term catalog
//! - Pattern catalog and mining stages over a surge corpus
//! - DNA signatures, profiles and candidate matching
//! - Trade simulation and performance statistics
//!
//! Nothing here performs I/O; fetching, caching and persistence live in
//! `surgelab-runner`.

pub mod backtest;
pub mod dna;
pub mod domain;
pub mod fingerprint;
pub mod indicators;
pub mod patterns;
pub mod rng;
pub mod scoring;
