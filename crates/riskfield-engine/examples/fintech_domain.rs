//! # Fintech Domain Example
//!
//! Drives the engine through a small merchant-risk scenario:
//! - loading a domain configuration
//! - registering entities and linking them in the topology
//! - ingesting events and ticking the physics
//! - querying through the access tiers
//! - verifying and replaying the audit ledger
//!
//! Run with: `cargo run --example fintech_domain`

use riskfield_engine::{
    AccessTier, DomainConfig, EdgeId, Engine, EntityId, RiskEvent, TopologyChange,
};

const CONFIG: &str = r#"{
    "version": "fintech-1",
    "dimensions": [
        {"name": "liquidity", "half_life": 30.0, "inertia": 0.2},
        {"name": "compliance", "half_life": 90.0, "inertia": 0.5}
    ],
    "categories": {
        "chargeback": {"base_delta": -0.4, "weights": {"liquidity": 1.0}},
        "kyc_flag": {"base_delta": -0.3, "weights": {"compliance": 1.0, "liquidity": 0.2}}
    },
    "damping": 0.3
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = DomainConfig::from_json(CONFIG)?;
    let engine = Engine::new(config)?;

    let merchant = EntityId::new();
    let processor = EntityId::new();
    engine.register_entity(merchant.clone(), "merchant")?;
    engine.register_entity(processor.clone(), "processor")?;
    engine.apply_topology(TopologyChange::AddEdge {
        edge_id: EdgeId::new(),
        from: merchant.clone(),
        to: processor.clone(),
        weight: 0.5,
        timestamp: 0,
    })?;

    let notices = engine.subscribe()?;

    // A burst of chargebacks against the merchant, with ticks in between.
    for i in 1..=6u64 {
        let event = RiskEvent::new(merchant.clone(), "chargeback", i * 100)
            .with_magnitude(50_000.0)
            .with_confidence(0.95);
        engine.ingest_event(event)?;
        engine.tick(1.0)?;
    }

    for notice in notices.try_iter() {
        println!(
            "gate transition: {} {} -> {} (score {:.3})",
            notice.entity_id, notice.from, notice.to, notice.aggregate_score
        );
    }

    // The processor never saw an event, but pressure reached it via the edge.
    let observer = engine.query(AccessTier::Observer, &processor)?;
    let analyst = engine.query(AccessTier::Analyst, &processor)?;
    println!("observer view: {}", serde_json::to_string_pretty(&observer)?);
    println!("analyst view:  {}", serde_json::to_string_pretty(&analyst)?);

    // The auditor closes the loop: the chain verifies and replay agrees.
    engine.verify(AccessTier::Auditor, 1, engine.ledger_len())?;
    let replayed = engine.replay(AccessTier::Auditor, &merchant)?;
    let live = engine.snapshot(&merchant)?;
    assert_eq!(replayed.gate_state, live.gate_state);
    println!(
        "ledger verified ({} records); replayed gate state {}",
        engine.ledger_len(),
        replayed.gate_state
    );

    Ok(())
}
