//! Boot-time history generation tests: shape, floors, and the derived
//! velocity series the forecast model consumes.

use lattice_core::{
    history::{generate_history, HISTORY_HOURS, VIRAL_SPIKE_SKU},
    rng::DriftRng,
    state::{ChannelCounts, InventoryItem},
};

const NOW: i64 = 1_700_000_000;

fn item(id: &str) -> InventoryItem {
    let mut item = InventoryItem {
        id: id.to_string(),
        name: format!("Item {id}"),
        country_of_origin: "Vietnam".to_string(),
        unit_cost: 60.0,
        committed: 20,
        lead_time_days: 30,
        reorder_point: 40,
        systems: ChannelCounts {
            shopify: 120,
            amazon: 100,
            wms: 90,
            pos: 20,
        },
        true_atp: 0,
        available: 0,
        discrepancy: false,
        risk_value: 0,
    };
    item.recompute_derived();
    item
}

#[test]
fn history_has_expected_shape() {
    let inventory = vec![item(VIRAL_SPIKE_SKU), item("SKU-200")];
    let mut rng = DriftRng::seed_from_u64(42);
    let history = generate_history(&inventory, &mut rng, NOW);

    assert_eq!(history.len(), 2);
    for (sku, series) in &history {
        assert_eq!(series.hourly.len(), HISTORY_HOURS, "wrong series length for {sku}");
        assert_eq!(series.sparkline.len(), HISTORY_HOURS / 12, "sparkline stride wrong");
        assert_eq!(series.daily_velocity.len(), 7, "one velocity entry per day");
        for v in &series.daily_velocity {
            assert!(v.velocity >= 1, "velocity floored at 1, got {}", v.velocity);
        }
    }
}

#[test]
fn counts_respect_channel_floors() {
    let inventory = vec![item("SKU-300")];
    let mut rng = DriftRng::seed_from_u64(7);
    let history = generate_history(&inventory, &mut rng, NOW);
    for p in &history["SKU-300"].hourly {
        assert!(p.shopify >= 10, "shopify under floor: {}", p.shopify);
        assert!(p.amazon >= 5, "amazon under floor: {}", p.amazon);
        assert!(p.wms >= 10, "wms under floor: {}", p.wms);
        assert_eq!(p.total, p.shopify + p.amazon + p.wms);
        assert!(p.ts <= NOW, "sample from the future");
    }
}

#[test]
fn timestamps_ascend_hourly() {
    let inventory = vec![item("SKU-400")];
    let mut rng = DriftRng::seed_from_u64(11);
    let history = generate_history(&inventory, &mut rng, NOW);
    let hourly = &history["SKU-400"].hourly;
    for pair in hourly.windows(2) {
        assert_eq!(pair[1].ts - pair[0].ts, 3600, "non-hourly spacing");
    }
    assert_eq!(hourly[0].day, 0);
    assert_eq!(hourly[HISTORY_HOURS - 1].day, 6);
}
