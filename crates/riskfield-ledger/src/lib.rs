//! Audit ledger — append-only, hash-chained record of every state-affecting
//! action, with range verification and deterministic replay.
//!
//! Appends are linearized through a single path that assigns sequence
//! numbers and hashes internally; callers can never supply either. `verify`
//! recomputes the chain and reports the first mismatching sequence number,
//! never repairing anything. `replay` folds the payloads back through the
//! pure decision physics and is the canonical recovery mechanism.

pub mod chain;
pub mod error;
pub mod record;
pub mod replay;

pub use chain::{AuditLedger, Verifier};
pub use error::LedgerError;
pub use record::{genesis_hash, LedgerPayload, LedgerRecord};
pub use replay::{ReplayedEntity, Replayer};
