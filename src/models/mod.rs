//! Domain models for on-chain activity and derived signals

mod signal;
mod transaction;

pub use signal::{OnChainSignal, Severity, SignalKind};
pub use transaction::{Direction, TokenInfo, WhaleTransaction};
