use thiserror::Error;

/// Errors surfaced by caller-facing operations (frame assembly, SIGNAL
/// validation helpers). Internal per-sample synchronizer failures are
/// never modeled this way -- they are silent resets, per the state
/// machine's own error handling.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WlanError {
    #[error("payload length {0} out of range [1, 4095]")]
    InvalidLength(usize),
    #[error("txpwr_level {0} out of range [1, 8]")]
    InvalidTxPower(u8),
}
