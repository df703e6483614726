use std::sync::RwLock;

use chrono::Utc;
use tracing::debug;

use crate::error::LedgerError;
use crate::record::{genesis_hash, LedgerPayload, LedgerRecord};
use riskfield_types::Hash32;

/// The append-only hash chain.
///
/// All appends go through the write lock, which is the single linearized
/// append path: sequence numbers and hashes are assigned inside it, so a
/// caller can neither race the counter nor supply either value. There is no
/// update or delete anywhere in the public contract.
pub struct AuditLedger {
    records: RwLock<Vec<LedgerRecord>>,
}

impl AuditLedger {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> u64 {
        self.records.read().map(|r| r.len() as u64).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hash the next append will chain from.
    pub fn head_hash(&self) -> Result<Hash32, LedgerError> {
        let records = self.records.read().map_err(|_| LedgerError::Lock)?;
        Ok(records
            .last()
            .map(|r| r.record_hash())
            .unwrap_or_else(genesis_hash))
    }

    /// Append a payload, assigning the next sequence number atomically.
    pub fn append(&self, payload: LedgerPayload) -> Result<u64, LedgerError> {
        let payload_hash = payload.content_hash()?;
        let mut records = self.records.write().map_err(|_| LedgerError::Lock)?;
        let sequence_no = records.len() as u64 + 1;
        let prev_hash = records
            .last()
            .map(|r| r.record_hash())
            .unwrap_or_else(genesis_hash);
        records.push(LedgerRecord {
            sequence_no,
            prev_hash,
            payload_hash,
            payload,
            timestamp: Utc::now(),
        });
        debug!(sequence_no, "Ledger append");
        Ok(sequence_no)
    }

    pub fn record(&self, sequence_no: u64) -> Result<LedgerRecord, LedgerError> {
        let records = self.records.read().map_err(|_| LedgerError::Lock)?;
        if sequence_no == 0 || sequence_no > records.len() as u64 {
            return Err(LedgerError::OutOfRange {
                sequence_no,
                len: records.len() as u64,
            });
        }
        Ok(records[(sequence_no - 1) as usize].clone())
    }

    /// Clone of the records in `[from, to]` inclusive.
    pub fn records(&self, from: u64, to: u64) -> Result<Vec<LedgerRecord>, LedgerError> {
        if from == 0 || from > to {
            return Err(LedgerError::InvalidRange(format!("[{}, {}]", from, to)));
        }
        let records = self.records.read().map_err(|_| LedgerError::Lock)?;
        if to > records.len() as u64 {
            return Err(LedgerError::OutOfRange {
                sequence_no: to,
                len: records.len() as u64,
            });
        }
        Ok(records[(from - 1) as usize..to as usize].to_vec())
    }

    /// Verify the chain across `[from, to]`, reporting the first mismatching
    /// sequence number. Mismatches are surfaced, never repaired.
    pub fn verify(&self, from: u64, to: u64) -> Result<(), LedgerError> {
        let len = self.len();
        if to > len {
            return Err(LedgerError::OutOfRange {
                sequence_no: to,
                len,
            });
        }
        let mut verifier = Verifier::new(from, to)?;
        while verifier.step(self)?.is_some() {}
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn tamper_payload(&self, sequence_no: u64, payload: LedgerPayload) {
        let mut records = self.records.write().unwrap();
        records[(sequence_no - 1) as usize].payload = payload;
    }
}

impl Default for AuditLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Resumable chain verification, one record per step.
///
/// The cursor owns no ledger state, so a caller can cancel between steps and
/// pick the same cursor up later; each step re-reads the two records it
/// needs under the read lock.
pub struct Verifier {
    next: u64,
    to: u64,
}

impl Verifier {
    pub fn new(from: u64, to: u64) -> Result<Self, LedgerError> {
        if from == 0 || from > to {
            return Err(LedgerError::InvalidRange(format!("[{}, {}]", from, to)));
        }
        Ok(Self { next: from, to })
    }

    /// Sequence number the next step will verify, if any remain.
    pub fn position(&self) -> Option<u64> {
        (self.next <= self.to).then_some(self.next)
    }

    /// Verify one record. Returns the sequence number just verified, or
    /// `None` once the range is exhausted.
    pub fn step(&mut self, ledger: &AuditLedger) -> Result<Option<u64>, LedgerError> {
        let Some(sequence_no) = self.position() else {
            return Ok(None);
        };
        let record = ledger.record(sequence_no)?;

        let expected_prev = if sequence_no == 1 {
            genesis_hash()
        } else {
            ledger.record(sequence_no - 1)?.record_hash()
        };
        if record.prev_hash != expected_prev {
            return Err(LedgerError::TamperDetected { sequence_no });
        }
        if record.payload.content_hash()? != record.payload_hash {
            return Err(LedgerError::TamperDetected { sequence_no });
        }

        self.next += 1;
        Ok(Some(sequence_no))
    }
}
