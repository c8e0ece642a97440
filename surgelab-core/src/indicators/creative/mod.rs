//! Creative composite detectors.
//!
//! Each detector is a pure function of the most recent window of bars and
//! returns a small record: a `detected` flag plus the strengths that went
//! into the decision. Too little history yields the `Default` record
//! (nothing detected), never a panic.

pub mod accumulation;
pub mod asymmetric;
pub mod drain;
pub mod escape;
pub mod whale;

pub use accumulation::{detect_silent_accumulation, SilentAccumulation};
pub use asymmetric::{detect_asymmetric_volume, AsymmetricVolume};
pub use drain::{detect_liquidity_drain, LiquidityDrain};
pub use escape::{detect_escape_velocity, EscapeVelocity};
pub use whale::{detect_whale, WhaleActivity};
