//! Action executor tests: parsing, the three mutations, audit alerts,
//! and error results that leave state untouched.

use lattice_core::{
    action::{self, Action, ActionStatus},
    error::CoreError,
    rng::DriftRng,
    state::{
        AlertKind, ChannelCounts, InventoryItem, ReturnsPool, SeedDocument, TelemetryState,
    },
};

const NOW: i64 = 1_700_000_000;

fn item(id: &str, shopify: i64, amazon: i64, wms: i64) -> InventoryItem {
    InventoryItem {
        id: id.to_string(),
        name: format!("Item {id}"),
        country_of_origin: "Vietnam".to_string(),
        unit_cost: 89.0,
        committed: 45,
        lead_time_days: 35,
        reorder_point: 60,
        systems: ChannelCounts {
            shopify,
            amazon,
            wms,
            pos: 24,
        },
        true_atp: 0,
        available: 0,
        discrepancy: false,
        risk_value: 0,
    }
}

fn state() -> TelemetryState {
    let doc = SeedDocument {
        inventory: vec![item("SKU-101", 140, 130, 87), item("SKU-102", 50, 48, 47)],
        tariffs: Vec::new(),
        returns: ReturnsPool {
            in_limbo: 15,
            total_frozen_value: 40_800,
            average_days_stuck: 24.0,
            items: vec![serde_json::json!({"batch": "RET-1"})],
        },
        alerts: Vec::new(),
    };
    let mut rng = DriftRng::seed_from_u64(42);
    TelemetryState::from_seed(doc, &mut rng, NOW)
}

// ── Parsing ───────────────────────────────────────────────────────

#[test]
fn parse_recognizes_all_action_kinds() {
    assert_eq!(
        Action::parse("sync_inventory:SKU-101").unwrap(),
        Action::SyncInventory {
            sku: Some("SKU-101".to_string())
        }
    );
    assert_eq!(
        Action::parse("sync_inventory:*").unwrap(),
        Action::SyncInventory { sku: None }
    );
    assert_eq!(Action::parse("release_returns").unwrap(), Action::ReleaseReturns);
    assert_eq!(
        Action::parse("pause_channel:amazon:SKU-102").unwrap(),
        Action::PauseChannel {
            channel: "amazon".to_string(),
            sku: "SKU-102".to_string()
        }
    );
}

#[test]
fn parse_rejects_unknown_and_malformed() {
    match Action::parse("do_a_barrel_roll") {
        Err(CoreError::UnknownAction { action }) => assert_eq!(action, "do_a_barrel_roll"),
        other => panic!("expected UnknownAction, got {other:?}"),
    }
    match Action::parse("pause_channel:shopify") {
        Err(CoreError::MalformedAction { expected }) => {
            assert!(expected.contains("pause_channel"), "unhelpful error: {expected}")
        }
        other => panic!("expected MalformedAction, got {other:?}"),
    }
}

// ── sync_inventory ────────────────────────────────────────────────

#[test]
fn sync_aligns_channels_to_wms_and_audits_once() {
    let mut st = state();
    let alerts_before = st.alerts.len();

    let outcome = action::execute(
        &mut st,
        &Action::parse("sync_inventory:SKU-101").unwrap(),
        NOW + 5,
    )
    .unwrap();

    assert_eq!(outcome.status, ActionStatus::Success);
    let it = st.item("SKU-101").unwrap();
    assert_eq!(it.systems.shopify, 87);
    assert_eq!(it.systems.amazon, 87);
    assert_eq!(it.systems.wms, 87);
    assert!(!it.discrepancy);
    assert_eq!(it.risk_value, 0);

    assert_eq!(st.alerts.len(), alerts_before + 1, "expected exactly one audit alert");
    let audit = &st.alerts[0];
    assert_eq!(audit.kind, AlertKind::Info);
    assert_eq!(audit.sku.as_deref(), Some("SKU-101"));
    assert!(audit.id.starts_with("ACT-"), "audit id missing origin tag: {}", audit.id);
}

#[test]
fn sync_with_nothing_discrepant_is_no_change() {
    let mut st = state();
    let outcome = action::execute(
        &mut st,
        &Action::parse("sync_inventory:SKU-102").unwrap(),
        NOW + 5,
    )
    .unwrap();
    assert_eq!(outcome.status, ActionStatus::NoChange);
    assert!(st.alerts.is_empty(), "no-op sync must not audit");
}

#[test]
fn sync_all_covers_every_discrepant_item() {
    let mut st = state();
    st.item_mut("SKU-102").unwrap().systems.shopify = 90;
    st.item_mut("SKU-102").unwrap().recompute_derived();

    let outcome =
        action::execute(&mut st, &Action::parse("sync_inventory:*").unwrap(), NOW + 5).unwrap();
    assert_eq!(outcome.status, ActionStatus::Success);
    for it in &st.inventory {
        assert!(!it.discrepancy, "{} still discrepant after sync all", it.id);
    }
}

// ── release_returns ───────────────────────────────────────────────

#[test]
fn release_returns_zeroes_pool_and_reports_value() {
    let mut st = state();
    let outcome =
        action::execute(&mut st, &Action::ReleaseReturns, NOW + 5).unwrap();

    assert_eq!(outcome.status, ActionStatus::Success);
    assert_eq!(st.returns.in_limbo, 0);
    assert_eq!(st.returns.total_frozen_value, 0);
    assert_eq!(st.returns.average_days_stuck, 0.0);
    assert!(st.returns.items.is_empty());

    let audit = &st.alerts[0];
    assert!(
        audit.message.contains("$40,800"),
        "audit must report the released value: {}",
        audit.message
    );
}

// ── pause_channel ─────────────────────────────────────────────────

#[test]
fn pause_zeroes_the_channel_and_audits() {
    let mut st = state();
    let outcome = action::execute(
        &mut st,
        &Action::parse("pause_channel:amazon:SKU-102").unwrap(),
        NOW + 5,
    )
    .unwrap();
    assert_eq!(outcome.status, ActionStatus::Success);
    assert_eq!(st.item("SKU-102").unwrap().systems.amazon, 0);
    assert!(st.alerts[0].message.contains("was 48 units"), "{}", st.alerts[0].message);
}

#[test]
fn pause_twice_is_no_change() {
    let mut st = state();
    let act = Action::parse("pause_channel:amazon:SKU-102").unwrap();
    action::execute(&mut st, &act, NOW + 5).unwrap();
    let alerts_after_first = st.alerts.len();

    let outcome = action::execute(&mut st, &act, NOW + 10).unwrap();
    assert_eq!(outcome.status, ActionStatus::NoChange);
    assert_eq!(st.alerts.len(), alerts_after_first, "no-op pause must not audit");
}

#[test]
fn pause_unknown_target_errors_without_mutation() {
    let mut st = state();
    let snapshot = serde_json::to_value(&st.inventory).unwrap();

    let err = action::execute(
        &mut st,
        &Action::parse("pause_channel:shopify:SKU-999").unwrap(),
        NOW + 5,
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::UnknownTarget { .. }), "got {err:?}");

    let err = action::execute(
        &mut st,
        &Action::parse("pause_channel:telegraph:SKU-101").unwrap(),
        NOW + 5,
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::UnknownTarget { .. }), "got {err:?}");

    assert_eq!(
        snapshot,
        serde_json::to_value(&st.inventory).unwrap(),
        "failed action mutated inventory"
    );
}

#[test]
fn actions_require_seeded_state() {
    let mut rng = DriftRng::seed_from_u64(0);
    let mut st = TelemetryState::from_seed(SeedDocument::default(), &mut rng, NOW);
    let err = action::execute(&mut st, &Action::ReleaseReturns, NOW).unwrap_err();
    assert!(matches!(err, CoreError::NotInitialized), "got {err:?}");
}
