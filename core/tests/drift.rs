//! Drift engine integration tests: per-tick invariants, alert cap,
//! demo-mode freeze, unseeded no-op.

use lattice_core::{
    engine::DriftEngine,
    rng::DriftRng,
    state::{ChannelCounts, InventoryItem, ReturnsPool, SeedDocument, TelemetryState, MAX_ALERTS},
};

const NOW: i64 = 1_700_000_000;

fn item(id: &str, shopify: i64, amazon: i64, wms: i64) -> InventoryItem {
    InventoryItem {
        id: id.to_string(),
        name: format!("Item {id}"),
        country_of_origin: "Vietnam".to_string(),
        unit_cost: 40.0,
        committed: 20,
        lead_time_days: 35,
        reorder_point: 50,
        systems: ChannelCounts {
            shopify,
            amazon,
            wms,
            pos: 15,
        },
        true_atp: 0,
        available: 0,
        discrepancy: false,
        risk_value: 0,
    }
}

fn seeded_state(seed: u64) -> TelemetryState {
    let doc = SeedDocument {
        inventory: vec![
            item("SKU-101", 140, 130, 87),
            item("SKU-102", 60, 58, 55),
            item("SKU-103", 30, 90, 28),
        ],
        tariffs: Vec::new(),
        returns: ReturnsPool::default(),
        alerts: Vec::new(),
    };
    let mut rng = DriftRng::seed_from_u64(seed);
    TelemetryState::from_seed(doc, &mut rng, NOW)
}

/// The derived-field invariants must hold for every item after any tick.
#[test]
fn derived_invariants_hold_across_many_ticks() {
    let mut state = seeded_state(1);
    let mut engine = DriftEngine::from_seed(99);

    for step in 0..500 {
        engine.tick(&mut state, NOW + step * 5);
        for item in &state.inventory {
            assert!(item.available >= 0, "available went negative on {}", item.id);
            assert_eq!(
                item.available,
                (item.systems.wms - item.committed).max(0),
                "available inconsistent on {}",
                item.id
            );
            let gap = item.systems.shopify.max(item.systems.amazon) - item.systems.wms;
            assert_eq!(
                item.discrepancy,
                gap > 5,
                "discrepancy flag wrong on {} (gap {gap})",
                item.id
            );
            if !item.discrepancy {
                assert_eq!(item.risk_value, 0, "risk_value nonzero without discrepancy");
            }
            assert!(item.systems.shopify >= 0 && item.systems.amazon >= 0);
            assert!(item.systems.wms >= 0 && item.systems.pos >= 0);
        }
    }
}

/// The alert feed never exceeds its cap, and newest entries sit at
/// index 0.
#[test]
fn alert_feed_is_capped_and_newest_first() {
    let mut state = seeded_state(2);
    let mut engine = DriftEngine::from_seed(7);

    for step in 0..2000 {
        engine.tick(&mut state, NOW + step * 5);
        assert!(
            state.alerts.len() <= MAX_ALERTS,
            "alert feed grew past cap: {}",
            state.alerts.len()
        );
    }

    // Alert ids are minted from a monotonic counter, so newest-first
    // means descending numeric suffixes.
    let suffixes: Vec<u64> = state
        .alerts
        .iter()
        .filter_map(|a| a.id.split('-').nth(1)?.parse().ok())
        .collect();
    for pair in suffixes.windows(2) {
        assert!(pair[0] > pair[1], "alerts not newest-first: {suffixes:?}");
    }
}

/// Demo mode freezes every count and only refreshes the timestamp.
#[test]
fn demo_mode_freezes_the_scene() {
    let mut state = seeded_state(3);
    state.demo_mode = true;
    let before = serde_json::to_value(&state.inventory).unwrap();

    let mut engine = DriftEngine::from_seed(5);
    engine.tick(&mut state, NOW + 5);

    let after = serde_json::to_value(&state.inventory).unwrap();
    assert_eq!(before, after, "inventory drifted while in demo mode");
    assert_eq!(state.last_update, NOW + 5, "timestamp not refreshed");
}

/// A tick over an unseeded state must be a silent no-op.
#[test]
fn unseeded_state_is_a_noop() {
    let mut rng = DriftRng::seed_from_u64(0);
    let mut state = TelemetryState::from_seed(SeedDocument::default(), &mut rng, NOW);
    let mut engine = DriftEngine::from_seed(0);
    engine.tick(&mut state, NOW + 5);
    assert_eq!(state.last_update, NOW, "unseeded tick mutated timestamp");
    assert!(state.alerts.is_empty());
}

/// Connection latency stays floored and statuses stay valid.
#[test]
fn connection_jitter_stays_bounded() {
    let mut state = seeded_state(4);
    let mut engine = DriftEngine::from_seed(13);
    for step in 0..300 {
        engine.tick(&mut state, NOW + step * 5);
        for (system, conn) in &state.connections {
            assert!(
                conn.latency_ms >= 10,
                "latency below floor for {system}: {}",
                conn.latency_ms
            );
            assert!(conn.last_sync <= NOW + step * 5, "last_sync in the future");
        }
    }
}
