use tracing::debug;

use riskfield_config::DomainConfig;
use riskfield_state::StateVector;
use riskfield_types::{EntityId, GateState};

use crate::chain::AuditLedger;
use crate::error::LedgerError;
use crate::record::LedgerPayload;

/// Result of folding the ledger back through the decision physics for one
/// entity.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayedEntity {
    pub entity_id: EntityId,
    /// `None` when the ledger never registered the entity.
    pub vector: Option<StateVector>,
    pub last_applied: u64,
    pub gate_state: GateState,
    pub gate_history: Vec<(GateState, GateState)>,
    pub records_applied: u64,
}

/// Deterministic per-entity replay, resumable at record granularity.
///
/// The replayer applies the same pure functions the live engine applies:
/// ticks advance the vector, events fold through `apply_event`, and gate
/// transitions are checked for continuity (including the terminal
/// invariant) as they are replayed. The ledger is the canonical recovery
/// mechanism; if replay and live state disagree, the live state is wrong.
pub struct Replayer<'a> {
    entity_id: EntityId,
    config: &'a DomainConfig,
    next: u64,
    vector: Option<StateVector>,
    last_applied: u64,
    gate_state: GateState,
    gate_history: Vec<(GateState, GateState)>,
    records_applied: u64,
}

impl<'a> Replayer<'a> {
    pub fn new(entity_id: EntityId, config: &'a DomainConfig) -> Self {
        Self {
            entity_id,
            config,
            next: 1,
            vector: None,
            last_applied: 0,
            gate_state: GateState::Safe,
            gate_history: Vec::new(),
            records_applied: 0,
        }
    }

    /// Sequence number the next step will fold, if the ledger has it.
    pub fn position(&self) -> u64 {
        self.next
    }

    /// Fold one ledger record. Returns the sequence number folded, or
    /// `None` when the ledger is exhausted; callers may cancel and resume
    /// between any two steps.
    pub fn step(&mut self, ledger: &AuditLedger) -> Result<Option<u64>, LedgerError> {
        if self.next > ledger.len() {
            return Ok(None);
        }
        let sequence_no = self.next;
        let record = ledger.record(sequence_no)?;
        self.fold(sequence_no, &record.payload)?;
        self.next += 1;
        self.records_applied += 1;
        Ok(Some(sequence_no))
    }

    /// Run to the end of the ledger and return the reconstruction.
    pub fn run(mut self, ledger: &AuditLedger) -> Result<ReplayedEntity, LedgerError> {
        while self.step(ledger)?.is_some() {}
        debug!(entity_id = %self.entity_id, records = self.records_applied, "Replay complete");
        Ok(ReplayedEntity {
            entity_id: self.entity_id,
            vector: self.vector,
            last_applied: self.last_applied,
            gate_state: self.gate_state,
            gate_history: self.gate_history,
            records_applied: self.records_applied,
        })
    }

    fn fold(&mut self, sequence_no: u64, payload: &LedgerPayload) -> Result<(), LedgerError> {
        match payload {
            LedgerPayload::EntityRegistered { entity_id, .. } if *entity_id == self.entity_id => {
                if self.vector.is_some() {
                    return Err(LedgerError::Replay {
                        sequence_no,
                        reason: "entity registered twice".into(),
                    });
                }
                self.vector = Some(StateVector::new(self.config));
            }
            LedgerPayload::TickApplied { dt } => {
                if let Some(vector) = self.vector.as_mut() {
                    vector
                        .advance(self.config, *dt)
                        .map_err(|e| LedgerError::Replay {
                            sequence_no,
                            reason: e.to_string(),
                        })?;
                }
            }
            LedgerPayload::EventApplied { event } if event.entity_id == self.entity_id => {
                let vector = self.vector.as_mut().ok_or_else(|| LedgerError::Replay {
                    sequence_no,
                    reason: "event precedes entity registration".into(),
                })?;
                vector
                    .apply_event(self.config, event)
                    .map_err(|e| LedgerError::Replay {
                        sequence_no,
                        reason: e.to_string(),
                    })?;
                self.last_applied = event.timestamp;
            }
            LedgerPayload::GateTransition {
                entity_id, from, to, ..
            } if *entity_id == self.entity_id => {
                if *from != self.gate_state {
                    return Err(LedgerError::Replay {
                        sequence_no,
                        reason: format!(
                            "gate discontinuity: ledger says {} -> {} but replay is at {}",
                            from, to, self.gate_state
                        ),
                    });
                }
                if self.gate_state.is_terminal() {
                    return Err(LedgerError::Replay {
                        sequence_no,
                        reason: "transition recorded out of a terminal state".into(),
                    });
                }
                self.gate_history.push((*from, *to));
                self.gate_state = *to;
            }
            // Records for other entities and topology changes carry no
            // per-entity vector effect.
            _ => {}
        }
        Ok(())
    }
}
