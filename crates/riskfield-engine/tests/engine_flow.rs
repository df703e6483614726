//! End-to-end flows: ingest → physics → propagation → classification →
//! ledger → gateway, exercised the way an external scheduler and
//! collaborators would drive the engine.

use std::collections::BTreeMap;

use riskfield_config::{CategorySchema, DimensionSpec, GateThresholds, ScoreWeights};
use riskfield_engine::{
    AccessTier, DomainConfig, EdgeId, Engine, EngineError, EntityId, GateState, RiskEvent,
    TierView, TopologyChange,
};

fn test_config() -> DomainConfig {
    DomainConfig {
        version: "itest-1".into(),
        dimensions: vec![DimensionSpec {
            name: "liquidity".into(),
            half_life: 30.0,
            inertia: 0.0,
        }],
        categories: BTreeMap::from([(
            "chargeback".to_string(),
            CategorySchema {
                base_delta: -0.5,
                weights: BTreeMap::from([("liquidity".to_string(), 1.0)]),
            },
        )]),
        impact_coefficient: 0.1,
        thresholds: GateThresholds::default(),
        damping: 0.3,
        score_weights: ScoreWeights {
            risk: 1.0,
            pressure: 0.5,
        },
        velocity_smoothing: 0.5,
        hints: BTreeMap::new(),
    }
}

fn hit(engine: &Engine, id: &EntityId, timestamp: u64, magnitude: f64) {
    let event = RiskEvent::new(id.clone(), "chargeback", timestamp).with_magnitude(magnitude);
    engine.ingest_event(event).unwrap();
}

#[test]
fn gate_climbs_and_notices_fire_once_per_transition() {
    let engine = Engine::new(test_config()).unwrap();
    let rx = engine.subscribe().unwrap();
    let id = EntityId::new();
    engine.register_entity(id.clone(), "merchant").unwrap();

    // One hard event: value 1.0 → 0.3, score 0.7 → CRITICAL (skipping
    // WARNING is legal; the order constrains direction, not step size).
    hit(&engine, &id, 10, 10_000.0);
    assert_eq!(engine.snapshot(&id).unwrap().gate_state, GateState::Critical);

    // A second one crosses the point of no return.
    hit(&engine, &id, 20, 10_000.0);
    assert_eq!(
        engine.snapshot(&id).unwrap().gate_state,
        GateState::Irreversible
    );

    let notices: Vec<_> = rx.try_iter().collect();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].from, GateState::Safe);
    assert_eq!(notices[0].to, GateState::Critical);
    assert!(!notices[0].terminal);
    assert_eq!(notices[1].to, GateState::Irreversible);
    assert!(notices[1].terminal);
}

#[test]
fn irreversible_survives_full_recovery() {
    let engine = Engine::new(test_config()).unwrap();
    let id = EntityId::new();
    engine.register_entity(id.clone(), "merchant").unwrap();
    hit(&engine, &id, 10, 10_000.0);
    hit(&engine, &id, 20, 10_000.0);
    assert_eq!(
        engine.snapshot(&id).unwrap().gate_state,
        GateState::Irreversible
    );

    let rx = engine.subscribe().unwrap();
    // Many half-lives of recovery: the score collapses, the gate does not.
    for _ in 0..20 {
        engine.tick(30.0).unwrap();
    }
    let snapshot = engine.snapshot(&id).unwrap();
    assert!(snapshot.aggregate_score < 0.1);
    assert_eq!(snapshot.gate_state, GateState::Irreversible);
    // No countdown is surfaced past the crossing.
    assert_eq!(snapshot.pnr_eta, None);
    // And no transition notices fired during recovery ticks.
    assert_eq!(rx.try_iter().count(), 0);
}

#[test]
fn ticks_do_not_append_transition_records_without_changes() {
    let engine = Engine::new(test_config()).unwrap();
    let id = EntityId::new();
    engine.register_entity(id.clone(), "merchant").unwrap();
    let before = engine.ledger_len();
    for _ in 0..5 {
        engine.tick(1.0).unwrap();
    }
    // Exactly one TickApplied record per tick, nothing else.
    assert_eq!(engine.ledger_len(), before + 5);
}

#[test]
fn stale_event_rejected_and_not_ledgered() {
    let engine = Engine::new(test_config()).unwrap();
    let id = EntityId::new();
    engine.register_entity(id.clone(), "merchant").unwrap();
    hit(&engine, &id, 100, 10.0);

    let before = engine.ledger_len();
    let stale = RiskEvent::new(id.clone(), "chargeback", 99).with_magnitude(10.0);
    let err = engine.ingest_event(stale).unwrap_err();
    assert!(matches!(err, EngineError::State(_)));
    assert_eq!(engine.ledger_len(), before);
}

#[test]
fn pressure_propagates_to_neighbors_on_tick() {
    let engine = Engine::new(test_config()).unwrap();
    let a = EntityId::new();
    let b = EntityId::new();
    engine.register_entity(a.clone(), "merchant").unwrap();
    engine.register_entity(b.clone(), "processor").unwrap();
    engine
        .apply_topology(TopologyChange::AddEdge {
            edge_id: EdgeId::new(),
            from: a.clone(),
            to: b.clone(),
            weight: 0.5,
            timestamp: 1,
        })
        .unwrap();

    hit(&engine, &a, 10, 10_000.0);
    engine.tick(1.0).unwrap();

    let snap_b = engine.snapshot(&b).unwrap();
    assert!(
        snap_b.pressure > 0.0,
        "neighbor pressure {} should be positive",
        snap_b.pressure
    );
    // B's own vector is untouched; only diffused pressure moves its score.
    assert_eq!(snap_b.dimension_risk["liquidity"], 0.0);
    assert!(snap_b.aggregate_score > 0.0);
}

#[test]
fn replay_reproduces_live_state_exactly() {
    let engine = Engine::new(test_config()).unwrap();
    let id = EntityId::new();
    engine.register_entity(id.clone(), "merchant").unwrap();

    hit(&engine, &id, 10, 500.0);
    engine.tick(5.0).unwrap();
    hit(&engine, &id, 30, 9_000.0);
    engine.tick(12.5).unwrap();
    hit(&engine, &id, 55, 20_000.0);
    engine.tick(0.5).unwrap();

    let live = engine.snapshot(&id).unwrap();
    let replayed = engine.replay(AccessTier::Auditor, &id).unwrap();

    assert_eq!(replayed.vector.unwrap().risks(), live.dimension_risk);
    assert_eq!(replayed.gate_state, live.gate_state);
    assert_eq!(replayed.last_applied, live.timestamp);
}

#[test]
fn ledger_verifies_clean_after_a_busy_run() {
    let engine = Engine::new(test_config()).unwrap();
    let id = EntityId::new();
    engine.register_entity(id.clone(), "merchant").unwrap();
    for i in 1..=10u64 {
        hit(&engine, &id, i * 10, (i as f64) * 300.0);
        engine.tick(1.0).unwrap();
    }
    let len = engine.ledger_len();
    assert!(len > 20);
    engine.verify(AccessTier::Auditor, 1, len).unwrap();
}

#[test]
fn verify_and_replay_are_auditor_only() {
    let engine = Engine::new(test_config()).unwrap();
    let id = EntityId::new();
    engine.register_entity(id.clone(), "merchant").unwrap();

    for tier in [AccessTier::Observer, AccessTier::Analyst] {
        assert!(matches!(
            engine.verify(tier, 1, 1),
            Err(EngineError::Gateway(_))
        ));
        assert!(matches!(
            engine.replay(tier, &id),
            Err(EngineError::Gateway(_))
        ));
        assert!(matches!(
            engine.ledger_records(tier, 1, 1),
            Err(EngineError::Gateway(_))
        ));
        assert!(matches!(
            engine.ledger_head(tier),
            Err(EngineError::Gateway(_))
        ));
    }
    engine.verify(AccessTier::Auditor, 1, 1).unwrap();
    engine.replay(AccessTier::Auditor, &id).unwrap();
    let records = engine.ledger_records(AccessTier::Auditor, 1, 1).unwrap();
    assert_eq!(records[0].sequence_no, 1);
    engine.ledger_head(AccessTier::Auditor).unwrap();
}

#[test]
fn observer_query_is_field_filtered() {
    let engine = Engine::new(test_config()).unwrap();
    let id = EntityId::new();
    engine.register_entity(id.clone(), "merchant").unwrap();
    hit(&engine, &id, 10, 10_000.0);

    match engine.query(AccessTier::Observer, &id).unwrap() {
        TierView::Observer {
            gate_state,
            next_action_hint,
            ..
        } => {
            assert_eq!(gate_state, GateState::Critical);
            assert!(!next_action_hint.is_empty());
        }
        other => panic!("unexpected view {:?}", other),
    }

    // Fleet-wide listing is Analyst and above.
    assert!(engine.query_all(AccessTier::Observer).is_err());
    assert_eq!(engine.query_all(AccessTier::Analyst).unwrap().len(), 1);
}

#[test]
fn pnr_eta_appears_only_while_risk_is_rising() {
    let engine = Engine::new(test_config()).unwrap();
    let id = EntityId::new();
    engine.register_entity(id.clone(), "merchant").unwrap();

    // Two ticks flanking a damaging event give a positive velocity.
    engine.tick(1.0).unwrap();
    hit(&engine, &id, 10, 2_000.0);
    engine.tick(1.0).unwrap();
    let rising = engine.snapshot(&id).unwrap();
    assert!(rising.pnr_eta.is_some());

    // Long recovery flips the velocity negative; the countdown disappears.
    for _ in 0..10 {
        engine.tick(30.0).unwrap();
    }
    let recovering = engine.snapshot(&id).unwrap();
    assert_eq!(recovering.pnr_eta, None);
}

#[test]
fn removing_an_edge_stops_diffusion() {
    let engine = Engine::new(test_config()).unwrap();
    let a = EntityId::new();
    let b = EntityId::new();
    engine.register_entity(a.clone(), "merchant").unwrap();
    engine.register_entity(b.clone(), "processor").unwrap();
    let edge = EdgeId::new();
    engine
        .apply_topology(TopologyChange::AddEdge {
            edge_id: edge.clone(),
            from: a.clone(),
            to: b.clone(),
            weight: 0.5,
            timestamp: 1,
        })
        .unwrap();
    engine
        .apply_topology(TopologyChange::RemoveEdge {
            edge_id: edge,
            timestamp: 2,
        })
        .unwrap();

    hit(&engine, &a, 10, 10_000.0);
    engine.tick(1.0).unwrap();
    assert_eq!(engine.snapshot(&b).unwrap().pressure, 0.0);
}
