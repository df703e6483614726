use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use riskfield_types::{EntityId, GateState, Hash32, RiskEvent, TopologyChange};

use crate::error::LedgerError;

/// Fixed root of every chain. Domain-prefixed so a record hash can never
/// collide with it.
pub fn genesis_hash() -> Hash32 {
    Hash32::from_bytes(*blake3::hash(b"riskfield-ledger-genesis-v1").as_bytes())
}

/// The closed set of state-affecting actions the ledger records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LedgerPayload {
    EntityRegistered {
        entity_id: EntityId,
        type_tag: String,
    },
    /// A scheduler tick. Ticks mutate every vector, so replay needs them.
    TickApplied {
        dt: f64,
    },
    EventApplied {
        event: RiskEvent,
    },
    TopologyChanged {
        change: TopologyChange,
    },
    /// Appended only when the gate label actually changed.
    GateTransition {
        entity_id: EntityId,
        from: GateState,
        to: GateState,
        aggregate_score: f64,
        terminal: bool,
    },
}

impl LedgerPayload {
    /// BLAKE3 over the domain prefix and the canonical JSON encoding.
    pub fn content_hash(&self) -> Result<Hash32, LedgerError> {
        let bytes =
            serde_json::to_vec(self).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"riskfield-payload-v1:");
        hasher.update(&bytes);
        Ok(Hash32::from_bytes(*hasher.finalize().as_bytes()))
    }
}

/// One chain link. Sequence numbers start at 1 and are assigned internally;
/// `prev_hash` is the record hash of the immediately preceding record, or
/// the genesis constant for the first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub sequence_no: u64,
    pub prev_hash: Hash32,
    pub payload_hash: Hash32,
    pub payload: LedgerPayload,
    pub timestamp: DateTime<Utc>,
}

impl LedgerRecord {
    /// Hash of this record as seen by its successor's `prev_hash`.
    pub fn record_hash(&self) -> Hash32 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"riskfield-record-v1:");
        hasher.update(&self.sequence_no.to_le_bytes());
        hasher.update(self.prev_hash.as_bytes());
        hasher.update(self.payload_hash.as_bytes());
        hasher.update(&self.timestamp.timestamp_millis().to_le_bytes());
        Hash32::from_bytes(*hasher.finalize().as_bytes())
    }
}
