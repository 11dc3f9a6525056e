//! Recommendation ranker tests: candidate rules, scoring bounds,
//! ordering, and the documented shopify tie-break.

use lattice_core::{
    forecast::{EnrichedItem, StockoutForecast},
    recommend::{build_recommendations, RecommendationKind},
    state::{ChannelCounts, InventoryItem, ReturnsPool, TariffScenario, TariffSchedule},
};

const NOW: i64 = 1_700_000_000;

fn base_item(id: &str, shopify: i64, amazon: i64, wms: i64) -> InventoryItem {
    let mut item = InventoryItem {
        id: id.to_string(),
        name: format!("Item {id}"),
        country_of_origin: "Vietnam".to_string(),
        unit_cost: 40.0,
        committed: 10,
        lead_time_days: 35,
        reorder_point: 50,
        systems: ChannelCounts {
            shopify,
            amazon,
            wms,
            pos: 10,
        },
        true_atp: 0,
        available: 0,
        discrepancy: false,
        risk_value: 0,
    };
    item.recompute_derived();
    item
}

fn enriched(item: InventoryItem, risk_7d: f64) -> EnrichedItem {
    EnrichedItem {
        stockout_forecast: StockoutForecast {
            daily_demand: 5.0,
            days_to_stockout: 4.0,
            risk_7d,
            risk_14d: risk_7d,
            confidence: 0.7,
        },
        item,
    }
}

fn loaded_returns() -> ReturnsPool {
    ReturnsPool {
        in_limbo: 15,
        total_frozen_value: 40_800,
        average_days_stuck: 24.0,
        items: Vec::new(),
    }
}

fn tariff(country: &str, current: f64, proposed: f64) -> TariffSchedule {
    TariffSchedule {
        country: country.to_string(),
        current_rate: current,
        scenarios: vec![TariffScenario {
            rate: proposed,
            effective_date: Some("2026-10-01".to_string()),
        }],
    }
}

/// Scores land in [0, 100], at most three results, sorted descending,
/// ranked 1..N.
#[test]
fn scoring_bounds_order_and_ranks() {
    let inventory = vec![
        enriched(base_item("SKU-101", 140, 130, 87), 72.0),
        enriched(base_item("SKU-102", 60, 95, 40), 61.0),
        enriched(base_item("SKU-103", 20, 18, 90), 12.0),
    ];
    let recs = build_recommendations(
        &inventory,
        &loaded_returns(),
        &[tariff("Vietnam", 0.08, 0.25)],
        NOW,
    );

    assert!(!recs.is_empty(), "expected candidates from a loaded state");
    assert!(recs.len() <= 3, "more than three recommendations returned");
    for (idx, rec) in recs.iter().enumerate() {
        assert!(
            (0.0..=100.0).contains(&rec.score),
            "score out of bounds: {}",
            rec.score
        );
        assert_eq!(rec.rank, idx + 1, "ranks not assigned in order");
        if idx > 0 {
            assert!(
                recs[idx - 1].score >= rec.score,
                "not sorted descending: {} before {}",
                recs[idx - 1].score,
                rec.score
            );
        }
        assert!((0.0..=1.0).contains(&rec.urgency), "urgency out of bounds");
    }
}

/// A clean state produces no recommendations at all.
#[test]
fn clean_state_yields_nothing() {
    let inventory = vec![enriched(base_item("SKU-103", 20, 18, 90), 12.0)];
    let recs = build_recommendations(&inventory, &ReturnsPool::default(), &[], NOW);
    assert!(recs.is_empty(), "clean state produced {recs:?}");
}

/// Discrepant items with positive risk get a sync candidate carrying
/// the matching action command.
#[test]
fn sync_rule_fires_for_discrepant_items() {
    let inventory = vec![enriched(base_item("SKU-101", 140, 130, 87), 10.0)];
    let recs = build_recommendations(&inventory, &ReturnsPool::default(), &[], NOW);
    let sync = recs
        .iter()
        .find(|r| r.kind == RecommendationKind::Sync)
        .expect("no sync candidate");
    assert_eq!(sync.command.as_deref(), Some("sync_inventory:SKU-101"));
    assert_eq!(sync.expected_impact, inventory[0].item.risk_value);
    assert_eq!(sync.sku.as_deref(), Some("SKU-101"));
}

/// An exact shopify/amazon tie pauses shopify, never amazon.
#[test]
fn pause_tie_break_favors_shopify() {
    let inventory = vec![enriched(base_item("SKU-104", 45, 45, 44), 80.0)];
    let recs = build_recommendations(&inventory, &ReturnsPool::default(), &[], NOW);
    let pause = recs
        .iter()
        .find(|r| r.kind == RecommendationKind::Pause)
        .expect("no pause candidate at 80% risk");
    assert_eq!(
        pause.command.as_deref(),
        Some("pause_channel:shopify:SKU-104"),
        "tie must resolve to shopify"
    );
}

/// No pause candidate when the dominant channel is already at zero.
#[test]
fn pause_skipped_for_empty_dominant_channel() {
    let inventory = vec![enriched(base_item("SKU-105", 0, 0, 30), 90.0)];
    let recs = build_recommendations(&inventory, &ReturnsPool::default(), &[], NOW);
    assert!(
        !recs.iter().any(|r| r.kind == RecommendationKind::Pause),
        "paused a channel holding zero units"
    );
}

/// The returns rule emits a single candidate with frozen value as
/// impact.
#[test]
fn returns_rule_uses_frozen_value() {
    let inventory = vec![enriched(base_item("SKU-103", 20, 18, 90), 12.0)];
    let recs = build_recommendations(&inventory, &loaded_returns(), &[], NOW);
    let returns: Vec<_> = recs
        .iter()
        .filter(|r| r.kind == RecommendationKind::Returns)
        .collect();
    assert_eq!(returns.len(), 1, "expected exactly one returns candidate");
    assert_eq!(returns[0].expected_impact, 40_800);
    assert_eq!(returns[0].command.as_deref(), Some("release_returns"));
}

/// Tariff candidates require a positive rate delta and affected SKUs.
#[test]
fn tariff_rule_requires_exposure() {
    let inventory = vec![enriched(base_item("SKU-101", 30, 28, 90), 10.0)];

    // Rate decrease: no candidate.
    let recs = build_recommendations(
        &inventory,
        &ReturnsPool::default(),
        &[tariff("Vietnam", 0.25, 0.08)],
        NOW,
    );
    assert!(!recs.iter().any(|r| r.kind == RecommendationKind::Tariff));

    // No SKUs from that country: no candidate.
    let recs = build_recommendations(
        &inventory,
        &ReturnsPool::default(),
        &[tariff("Bangladesh", 0.08, 0.30)],
        NOW,
    );
    assert!(!recs.iter().any(|r| r.kind == RecommendationKind::Tariff));

    // Positive delta and matching origin: candidate with no command.
    let recs = build_recommendations(
        &inventory,
        &ReturnsPool::default(),
        &[tariff("Vietnam", 0.08, 0.30)],
        NOW,
    );
    let t = recs
        .iter()
        .find(|r| r.kind == RecommendationKind::Tariff)
        .expect("no tariff candidate");
    assert!(t.command.is_none(), "tariff shifts are advisory only");
    assert!(t.expected_impact > 0);
    assert!((0.2..=1.0).contains(&t.urgency), "tariff urgency clamp broken");
}
