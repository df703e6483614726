use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use tracing::debug;

use riskfield_config::DomainConfig;
use riskfield_types::{EntityId, RiskEvent};

use crate::error::StateError;
use crate::vector::StateVector;

/// Everything the store holds for one entity. Mutated only under the
/// entity's own mutex.
#[derive(Clone, Debug)]
pub struct EntityState {
    pub type_tag: String,
    pub vector: StateVector,
    /// Logical timestamp of the last applied event. Events at or after this
    /// are accepted; strictly older ones are stale. Ordering is per entity,
    /// never global.
    pub last_applied: u64,
}

/// Per-entity state vector store.
///
/// The outer map is read-locked for lookups; each entity carries its own
/// mutex so mutation is serialized per entity while distinct entities
/// process fully in parallel. Cross-entity snapshot consistency for the
/// propagation pass is the engine's concern (it quiesces mutation around
/// the pass).
pub struct StateStore {
    entities: RwLock<HashMap<EntityId, Arc<Mutex<EntityState>>>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
        }
    }

    /// Register an entity with a fully-healthy vector. Entities are created
    /// by onboarding collaborators, never implicitly by the engine.
    pub fn register(
        &self,
        id: EntityId,
        type_tag: impl Into<String>,
        config: &DomainConfig,
    ) -> Result<(), StateError> {
        let mut entities = self.entities.write().map_err(|_| StateError::Lock)?;
        if entities.contains_key(&id) {
            return Err(StateError::DuplicateEntity(id));
        }
        entities.insert(
            id.clone(),
            Arc::new(Mutex::new(EntityState {
                type_tag: type_tag.into(),
                vector: StateVector::new(config),
                last_applied: 0,
            })),
        );
        debug!(entity_id = %id, "Registered entity");
        Ok(())
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities
            .read()
            .map(|entities| entities.contains_key(id))
            .unwrap_or(false)
    }

    pub fn ids(&self) -> Result<Vec<EntityId>, StateError> {
        let entities = self.entities.read().map_err(|_| StateError::Lock)?;
        let mut ids: Vec<_> = entities.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn cell(&self, id: &EntityId) -> Result<Arc<Mutex<EntityState>>, StateError> {
        let entities = self.entities.read().map_err(|_| StateError::Lock)?;
        entities
            .get(id)
            .cloned()
            .ok_or_else(|| StateError::UnknownEntity(id.clone()))
    }

    /// Run `f` inside the entity's exclusive section.
    pub fn with_entity<R>(
        &self,
        id: &EntityId,
        f: impl FnOnce(&mut EntityState) -> Result<R, StateError>,
    ) -> Result<R, StateError> {
        let cell = self.cell(id)?;
        let mut state = cell.lock().map_err(|_| StateError::Lock)?;
        f(&mut state)
    }

    /// Apply one event: staleness check, then all-or-nothing vector update,
    /// then the last-applied watermark moves forward.
    pub fn apply_event(
        &self,
        config: &DomainConfig,
        event: &RiskEvent,
    ) -> Result<(), StateError> {
        self.with_entity(&event.entity_id, |state| {
            if event.timestamp < state.last_applied {
                return Err(StateError::StaleEvent {
                    entity_id: event.entity_id.clone(),
                    last_applied: state.last_applied,
                    submitted: event.timestamp,
                });
            }
            state.vector.apply_event(config, event)?;
            state.last_applied = event.timestamp;
            debug!(entity_id = %event.entity_id, category = %event.category, "Applied event");
            Ok(())
        })
    }

    /// Advance every entity by `dt` ticks of recovery. Each entity is locked
    /// in turn; the caller quiesces concurrent mutation if it needs the tick
    /// to be atomic across entities.
    pub fn advance_all(&self, config: &DomainConfig, dt: f64) -> Result<(), StateError> {
        for id in self.ids()? {
            self.with_entity(&id, |state| state.vector.advance(config, dt))?;
        }
        Ok(())
    }

    /// Current pressure scalar (`1 - mean(vector)`) for every entity, sorted
    /// by entity id for deterministic iteration.
    pub fn pressures(&self) -> Result<BTreeMap<EntityId, f64>, StateError> {
        let mut out = BTreeMap::new();
        for id in self.ids()? {
            let pressure = self.with_entity(&id, |state| Ok(state.vector.pressure()))?;
            out.insert(id, pressure);
        }
        Ok(out)
    }

    /// Clone of the entity's vector plus its last-applied watermark.
    pub fn view(&self, id: &EntityId) -> Result<(StateVector, u64), StateError> {
        self.with_entity(id, |state| Ok((state.vector.clone(), state.last_applied)))
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskfield_config::{CategorySchema, DimensionSpec, GateThresholds, ScoreWeights};

    fn test_config() -> DomainConfig {
        DomainConfig {
            version: "test-1".into(),
            dimensions: vec![DimensionSpec {
                name: "liquidity".into(),
                half_life: 30.0,
                inertia: 0.0,
            }],
            categories: BTreeMap::from([(
                "chargeback".to_string(),
                CategorySchema {
                    base_delta: -0.2,
                    weights: BTreeMap::from([("liquidity".to_string(), 1.0)]),
                },
            )]),
            impact_coefficient: 0.1,
            thresholds: GateThresholds::default(),
            damping: 0.3,
            score_weights: ScoreWeights::default(),
            velocity_smoothing: 0.5,
            hints: BTreeMap::new(),
        }
    }

    #[test]
    fn register_and_view() {
        let config = test_config();
        let store = StateStore::new();
        let id = EntityId::new();
        store.register(id.clone(), "merchant", &config).unwrap();
        let (vector, last_applied) = store.view(&id).unwrap();
        assert_eq!(vector.value("liquidity"), Some(1.0));
        assert_eq!(last_applied, 0);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let config = test_config();
        let store = StateStore::new();
        let id = EntityId::new();
        store.register(id.clone(), "merchant", &config).unwrap();
        assert!(matches!(
            store.register(id, "merchant", &config),
            Err(StateError::DuplicateEntity(_))
        ));
    }

    #[test]
    fn stale_event_rejected_after_newer_one() {
        let config = test_config();
        let store = StateStore::new();
        let id = EntityId::new();
        store.register(id.clone(), "merchant", &config).unwrap();

        let newer = RiskEvent::new(id.clone(), "chargeback", 100).with_magnitude(10.0);
        store.apply_event(&config, &newer).unwrap();

        let stale = RiskEvent::new(id.clone(), "chargeback", 99).with_magnitude(10.0);
        let err = store.apply_event(&config, &stale).unwrap_err();
        assert!(matches!(err, StateError::StaleEvent { last_applied: 100, .. }));

        // Equal timestamps are accepted: only strictly-older is stale.
        let equal = RiskEvent::new(id, "chargeback", 100).with_magnitude(10.0);
        store.apply_event(&config, &equal).unwrap();
    }

    #[test]
    fn rejected_event_does_not_advance_watermark() {
        let config = test_config();
        let store = StateStore::new();
        let id = EntityId::new();
        store.register(id.clone(), "merchant", &config).unwrap();

        let bad = RiskEvent::new(id.clone(), "unknown_category", 50);
        assert!(store.apply_event(&config, &bad).is_err());
        let (_, last_applied) = store.view(&id).unwrap();
        assert_eq!(last_applied, 0);
    }

    #[test]
    fn unknown_entity_event_rejected() {
        let config = test_config();
        let store = StateStore::new();
        let event = RiskEvent::new(EntityId::new(), "chargeback", 1);
        assert!(matches!(
            store.apply_event(&config, &event),
            Err(StateError::UnknownEntity(_))
        ));
    }

    #[test]
    fn pressures_cover_all_entities() {
        let config = test_config();
        let store = StateStore::new();
        let a = EntityId::new();
        let b = EntityId::new();
        store.register(a.clone(), "merchant", &config).unwrap();
        store.register(b.clone(), "processor", &config).unwrap();

        let event = RiskEvent::new(a.clone(), "chargeback", 1).with_magnitude(1000.0);
        store.apply_event(&config, &event).unwrap();

        let pressures = store.pressures().unwrap();
        assert_eq!(pressures.len(), 2);
        assert!(pressures[&a] > 0.0);
        assert_eq!(pressures[&b], 0.0);
    }

    #[test]
    fn advance_all_recovers_toward_one() {
        let config = test_config();
        let store = StateStore::new();
        let id = EntityId::new();
        store.register(id.clone(), "merchant", &config).unwrap();
        let event = RiskEvent::new(id.clone(), "chargeback", 1).with_magnitude(100.0);
        store.apply_event(&config, &event).unwrap();
        let (before, _) = store.view(&id).unwrap();

        store.advance_all(&config, 30.0).unwrap();
        let (after, _) = store.view(&id).unwrap();
        assert!(after.value("liquidity") > before.value("liquidity"));
    }
}
