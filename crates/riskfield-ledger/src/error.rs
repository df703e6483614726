use thiserror::Error;

/// Ledger failures. `TamperDetected` is fatal to trust in the affected
/// chain segment; everything else is per-request.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("tamper detected at sequence {sequence_no}")]
    TamperDetected { sequence_no: u64 },

    #[error("sequence {sequence_no} is out of range (ledger length {len})")]
    OutOfRange { sequence_no: u64, len: u64 },

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("replay failed at sequence {sequence_no}: {reason}")]
    Replay { sequence_no: u64, reason: String },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("lock poisoned")]
    Lock,
}
