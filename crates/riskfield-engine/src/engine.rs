use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info};

use riskfield_config::DomainConfig;
use riskfield_gate::{aggregate_score, classify, GateCell, PnrPredictor};
use riskfield_gateway::{project, require, AccessTier, TierView};
use riskfield_graph::{Propagator, Topology};
use riskfield_ledger::{AuditLedger, LedgerPayload, LedgerRecord, ReplayedEntity, Replayer};
use riskfield_state::{StateError, StateStore};
use riskfield_types::{
    EntityId, Hash32, RiskEvent, RiskSnapshot, TopologyChange, TransitionNotice,
};

use crate::error::EngineError;

/// Per-entity classification state: the gate cell, the point-of-no-return
/// predictor, and the entity's slice of the propagated pressure field.
struct RiskCell {
    gate: GateCell,
    pnr: PnrPredictor,
    pressure: f64,
}

/// The deterministic decision physics engine.
///
/// Concurrency model:
/// - per-entity mutation (event application) holds the pass lock in read
///   mode, so distinct entities process fully in parallel;
/// - ticks and topology commits hold it in write mode, which quiesces
///   mutation and gives the propagation pass a globally consistent snapshot;
/// - ledger appends are linearized inside [`AuditLedger`];
/// - every operation is bounded synchronous; cadence belongs to the caller's
///   scheduler, which passes an explicit `dt` and may cancel only between
///   ticks.
pub struct Engine {
    config: DomainConfig,
    store: StateStore,
    topology: RwLock<Topology>,
    propagator: Propagator,
    ledger: AuditLedger,
    cells: RwLock<HashMap<EntityId, Arc<Mutex<RiskCell>>>>,
    subscribers: Mutex<Vec<Sender<TransitionNotice>>>,
    pass_lock: RwLock<()>,
}

impl Engine {
    /// Build an engine from validated configuration. Damping is checked
    /// against the (initially empty) topology here and re-checked on every
    /// topology change, so divergence never survives past validation.
    pub fn new(config: DomainConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let propagator = Propagator::new(config.damping);
        let topology = Topology::new();
        propagator.validate(&topology)?;
        info!(version = %config.version, "Engine initialized");
        Ok(Self {
            config,
            store: StateStore::new(),
            topology: RwLock::new(topology),
            propagator,
            ledger: AuditLedger::new(),
            cells: RwLock::new(HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
            pass_lock: RwLock::new(()),
        })
    }

    pub fn config(&self) -> &DomainConfig {
        &self.config
    }

    /// Onboard an entity with a fully-healthy vector and a SAFE gate.
    pub fn register_entity(
        &self,
        id: EntityId,
        type_tag: impl Into<String>,
    ) -> Result<(), EngineError> {
        let type_tag = type_tag.into();
        let _quiesce = self.pass_lock.read().map_err(|_| EngineError::Lock)?;
        self.store.register(id.clone(), type_tag.clone(), &self.config)?;
        self.cells
            .write()
            .map_err(|_| EngineError::Lock)?
            .insert(
                id.clone(),
                Arc::new(Mutex::new(RiskCell {
                    gate: GateCell::new(),
                    pnr: PnrPredictor::new(self.config.velocity_smoothing),
                    pressure: 0.0,
                })),
            );
        self.ledger.append(LedgerPayload::EntityRegistered {
            entity_id: id,
            type_tag,
        })?;
        Ok(())
    }

    /// Ingest one business event: staleness/validation checks, all-or-nothing
    /// vector update, ledger append, reclassification. A rejected event
    /// leaves every piece of global state untouched.
    ///
    /// The entity's cell lock is held across apply + append so the ledger
    /// order for one entity always matches its application order; distinct
    /// entities still proceed in parallel.
    pub fn ingest_event(&self, event: RiskEvent) -> Result<(), EngineError> {
        let _quiesce = self.pass_lock.read().map_err(|_| EngineError::Lock)?;
        let cell = self.cell(&event.entity_id)?;
        let mut cell = cell.lock().map_err(|_| EngineError::Lock)?;
        self.store.apply_event(&self.config, &event)?;
        let entity_id = event.entity_id.clone();
        self.ledger
            .append(LedgerPayload::EventApplied { event })?;
        self.classify_cell(&entity_id, &mut cell, None)
    }

    /// Advance the whole system by `dt` ticks: decay every vector, run one
    /// propagation pass from a consistent snapshot, reclassify everyone.
    /// Invoked by an external scheduler; the engine makes no wall-clock
    /// assumption.
    pub fn tick(&self, dt: f64) -> Result<(), EngineError> {
        if !(dt >= 0.0 && dt.is_finite()) {
            return Err(StateError::Validation(format!(
                "dt must be non-negative and finite, got {}",
                dt
            ))
            .into());
        }
        let _quiesce = self.pass_lock.write().map_err(|_| EngineError::Lock)?;
        self.store.advance_all(&self.config, dt)?;
        self.ledger.append(LedgerPayload::TickApplied { dt })?;

        // One diffusion pass from the post-decay snapshot, with the topology
        // read-locked for the duration.
        let field = {
            let topology = self.topology.read().map_err(|_| EngineError::Lock)?;
            let snapshot = self.store.pressures()?;
            self.propagator.pass(&snapshot, &topology)?
        };

        for id in self.store.ids()? {
            let cell = self.cell(&id)?;
            let mut cell = cell.lock().map_err(|_| EngineError::Lock)?;
            if let Some(pressure) = field.get(&id) {
                cell.pressure = *pressure;
            }
            self.classify_cell(&id, &mut cell, Some(dt))?;
        }
        Ok(())
    }

    /// Apply a topology change. The change is validated against the
    /// candidate table (including the damping convergence bound), ledgered,
    /// and only then committed.
    pub fn apply_topology(&self, change: TopologyChange) -> Result<(), EngineError> {
        if let TopologyChange::AddEdge { from, to, .. } = &change {
            for endpoint in [from, to] {
                if !self.store.contains(endpoint) {
                    return Err(EngineError::UnknownEntity(endpoint.clone()));
                }
            }
        }
        let mut topology = self.topology.write().map_err(|_| EngineError::Lock)?;
        let mut candidate = topology.clone();
        candidate.apply_change(&change)?;
        self.propagator.validate(&candidate)?;
        self.ledger
            .append(LedgerPayload::TopologyChanged {
                change: change.clone(),
            })?;
        *topology = candidate;
        debug!(edge_id = %change.edge_id(), "Topology change committed");
        Ok(())
    }

    /// Derive the current risk snapshot for one entity. Always recomputed;
    /// nothing here is cached across calls.
    pub fn snapshot(&self, id: &EntityId) -> Result<RiskSnapshot, EngineError> {
        let (vector, last_applied) = self.store.view(id)?;
        let cell = self.cell(id)?;
        let cell = cell.lock().map_err(|_| EngineError::Lock)?;

        let mean_risk = vector.pressure();
        let score = aggregate_score(mean_risk, cell.pressure, &self.config.score_weights);
        let gate_state = cell.gate.current();
        // A terminal entity has already crossed; no countdown is surfaced.
        let pnr_eta = if gate_state.is_terminal() {
            None
        } else {
            cell.pnr.eta(score, self.config.thresholds.irreversible)
        };

        Ok(RiskSnapshot {
            entity_id: id.clone(),
            dimension_risk: vector.risks(),
            aggregate_score: score,
            gate_state,
            pressure: cell.pressure,
            pnr_eta,
            config_version: self.config.version.clone(),
            timestamp: last_applied,
        })
    }

    /// Tier-filtered snapshot for one entity.
    pub fn query(&self, tier: AccessTier, id: &EntityId) -> Result<TierView, EngineError> {
        let snapshot = self.snapshot(id)?;
        Ok(project(tier, &snapshot, &self.config))
    }

    /// Tier-filtered snapshots for every entity. Listing the whole fleet
    /// requires Analyst or above.
    pub fn query_all(&self, tier: AccessTier) -> Result<Vec<TierView>, EngineError> {
        require(tier, AccessTier::Analyst)?;
        let mut views = Vec::new();
        for id in self.store.ids()? {
            let snapshot = self.snapshot(&id)?;
            views.push(project(tier, &snapshot, &self.config));
        }
        Ok(views)
    }

    /// Verify the ledger chain across `[from, to]`. Auditor only.
    pub fn verify(&self, tier: AccessTier, from: u64, to: u64) -> Result<(), EngineError> {
        require(tier, AccessTier::Auditor)?;
        self.ledger.verify(from, to)?;
        Ok(())
    }

    /// Replay one entity's history from the ledger. Auditor only.
    pub fn replay(
        &self,
        tier: AccessTier,
        id: &EntityId,
    ) -> Result<ReplayedEntity, EngineError> {
        require(tier, AccessTier::Auditor)?;
        Ok(Replayer::new(id.clone(), &self.config).run(&self.ledger)?)
    }

    pub fn ledger_len(&self) -> u64 {
        self.ledger.len()
    }

    /// Hash the next ledger append will chain from. Auditor only.
    pub fn ledger_head(&self, tier: AccessTier) -> Result<Hash32, EngineError> {
        require(tier, AccessTier::Auditor)?;
        Ok(self.ledger.head_hash()?)
    }

    /// Raw ledger records across `[from, to]` inclusive. Auditor only.
    pub fn ledger_records(
        &self,
        tier: AccessTier,
        from: u64,
        to: u64,
    ) -> Result<Vec<LedgerRecord>, EngineError> {
        require(tier, AccessTier::Auditor)?;
        Ok(self.ledger.records(from, to)?)
    }

    /// Register for transition notices. One notice is delivered per actual
    /// gate transition, never per tick.
    pub fn subscribe(&self) -> Result<Receiver<TransitionNotice>, EngineError> {
        let (tx, rx) = channel();
        self.subscribers
            .lock()
            .map_err(|_| EngineError::Lock)?
            .push(tx);
        Ok(rx)
    }

    fn cell(&self, id: &EntityId) -> Result<Arc<Mutex<RiskCell>>, EngineError> {
        self.cells
            .read()
            .map_err(|_| EngineError::Lock)?
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownEntity(id.clone()))
    }

    /// Recompute the aggregate score and drive the gate cell. On a tick the
    /// velocity estimate is fed as well (`dt` is known there). Appends a
    /// ledger record and fans out one notice only when the label actually
    /// changed; a terminal cell absorbs lower classifications silently.
    fn classify_cell(
        &self,
        id: &EntityId,
        cell: &mut RiskCell,
        dt: Option<f64>,
    ) -> Result<(), EngineError> {
        let (vector, last_applied) = self.store.view(id)?;

        let mean_risk = vector.pressure();
        let score = aggregate_score(mean_risk, cell.pressure, &self.config.score_weights);
        if let Some(dt) = dt {
            cell.pnr.observe(score, dt);
        }

        let target = classify(score, &self.config.thresholds);
        if cell.gate.current().is_terminal() {
            // Point of no return: recovering scores no longer move the gate.
            if target != cell.gate.current() {
                debug!(entity_id = %id, %target, "Classification absorbed by terminal gate");
            }
            return Ok(());
        }

        if let Some((from, to)) = cell.gate.transition(target).map_err(EngineError::from)? {
            let terminal = to.is_terminal();
            self.ledger.append(LedgerPayload::GateTransition {
                entity_id: id.clone(),
                from,
                to,
                aggregate_score: score,
                terminal,
            })?;
            self.notify(TransitionNotice {
                entity_id: id.clone(),
                from,
                to,
                aggregate_score: score,
                terminal,
                timestamp: last_applied,
            })?;
        }
        Ok(())
    }

    fn notify(&self, notice: TransitionNotice) -> Result<(), EngineError> {
        let mut subscribers = self.subscribers.lock().map_err(|_| EngineError::Lock)?;
        subscribers.retain(|tx| tx.send(notice.clone()).is_ok());
        Ok(())
    }
}
