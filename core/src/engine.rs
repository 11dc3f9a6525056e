//! The drift engine, the only component with scheduled side effects.
//!
//! PER-TICK ORDER (fixed, documented, never reordered):
//!   1. Random-walk the listed channels and (slowly) the WMS count.
//!   2. Recompute derived inventory fields.
//!   3. Emit deduplicated reorder / gap alerts.
//!   4. Jitter connection health.
//!   5. Truncate the alert feed and refresh the update timestamp.
//!
//! RULES:
//!   - All randomness flows through the engine's DriftRng.
//!   - A tick runs to completion; callers must not interleave other
//!     state mutations inside one.
//!   - Demo mode freezes the scene: the tick only refreshes the
//!     update timestamp.
//!   - An unseeded state is a silent no-op, never an error.

use crate::{
    rng::DriftRng,
    state::{Alert, AlertKind, TelemetryState},
    types::UnixTime,
};

/// Reference tick cadence for the background loop.
pub const TICK_INTERVAL_SECS: u64 = 5;

/// Listed-channel walk, weighted toward small moves.
const CHANNEL_WALK: &[i64] = &[-3, -2, -1, -1, 0, 0, 0, 1, 1, 2];

/// WMS walk applied on 15% of ticks; the physical system moves slowly.
const WMS_WALK: &[i64] = &[-1, 0, 0, 1];
const WMS_WALK_PROBABILITY: f64 = 0.15;

/// Per-tick alert emission probabilities, tuned for a readable feed
/// at a 5-second cadence.
const REORDER_ALERT_PROBABILITY: f64 = 0.03;
const GAP_ALERT_PROBABILITY: f64 = 0.04;

/// Gaps beyond this many units qualify for a CRITICAL alert.
const CRITICAL_GAP_UNITS: i64 = 20;

/// Dedup guard window: newest alerts inspected per SKU.
const DEDUP_WINDOW: usize = 10;

pub struct DriftEngine {
    rng: DriftRng,
}

impl DriftEngine {
    pub fn new(rng: DriftRng) -> Self {
        Self { rng }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::new(DriftRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(DriftRng::from_entropy())
    }

    /// Advance the simulated world by one tick.
    pub fn tick(&mut self, state: &mut TelemetryState, now: UnixTime) {
        if !state.is_seeded() {
            log::debug!("tick skipped: state not seeded");
            return;
        }
        if state.demo_mode {
            state.last_update = now;
            return;
        }

        for idx in 0..state.inventory.len() {
            self.drift_item(state, idx);
        }
        self.jitter_connections(state, now);

        state.truncate_alerts();
        state.last_update = now;
        log::debug!(
            "tick complete: {} SKUs, {} alerts",
            state.inventory.len(),
            state.alerts.len()
        );
    }

    fn drift_item(&mut self, state: &mut TelemetryState, idx: usize) {
        let (sku, name, gap, available, reorder_point, risk_value, discrepancy, gap_message);
        {
            let item = &mut state.inventory[idx];

            let shopify_delta = self.rng.pick(CHANNEL_WALK);
            item.systems.shopify = (item.systems.shopify + shopify_delta).max(0);
            let amazon_delta = self.rng.pick(CHANNEL_WALK);
            item.systems.amazon = (item.systems.amazon + amazon_delta).max(0);
            let pos_delta = self.rng.pick(CHANNEL_WALK);
            item.systems.pos = (item.systems.pos + pos_delta).max(0);

            if self.rng.chance(WMS_WALK_PROBABILITY) {
                let wms_delta = self.rng.pick(WMS_WALK);
                item.systems.wms = (item.systems.wms + wms_delta).max(0);
            }

            item.recompute_derived();

            sku = item.id.clone();
            name = item.name.clone();
            gap = item.listing_gap();
            available = item.available;
            reorder_point = item.reorder_point;
            risk_value = item.risk_value;
            discrepancy = item.discrepancy;
            // Shopify wins exact ties when naming the overstated channel.
            gap_message = if item.systems.shopify >= item.systems.amazon {
                format!("Shopify ({})", item.systems.shopify)
            } else {
                format!("Amazon ({})", item.systems.amazon)
            };
        }

        // Dedup guard: one live reorder alert and one live gap alert
        // per SKU within the newest window.
        let recent: Vec<&Alert> = state
            .alerts
            .iter()
            .take(DEDUP_WINDOW)
            .filter(|a| a.sku.as_deref() == Some(sku.as_str()))
            .collect();
        let has_reorder = recent
            .iter()
            .any(|a| a.message.to_lowercase().contains("reorder"));
        let has_gap = recent
            .iter()
            .any(|a| a.message.to_lowercase().contains("gap"));
        drop(recent);

        if available > 0
            && available <= reorder_point
            && !has_reorder
            && self.rng.chance(REORDER_ALERT_PROBABILITY)
        {
            let id = state.next_alert_id("SIM");
            state.push_alert(Alert {
                id,
                kind: AlertKind::Warning,
                message: format!(
                    "{name} approaching reorder point: {available} available vs {reorder_point} threshold"
                ),
                risk: risk_value,
                action: None,
                sku: Some(sku.clone()),
                time: "just now".to_string(),
            });
        }

        if discrepancy && gap > CRITICAL_GAP_UNITS && !has_gap && self.rng.chance(GAP_ALERT_PROBABILITY)
        {
            let wms = state.inventory[idx].systems.wms;
            let id = state.next_alert_id("SIM");
            state.push_alert(Alert {
                id,
                kind: AlertKind::Critical,
                message: format!(
                    "{name}: {gap}-unit gap detected, {gap_message} vs WMS ({wms})"
                ),
                risk: risk_value,
                action: Some("sync_inventory".to_string()),
                sku: Some(sku),
                time: "just now".to_string(),
            });
        }
    }

    fn jitter_connections(&mut self, state: &mut TelemetryState, now: UnixTime) {
        for conn in state.connections.values_mut() {
            conn.latency_ms = (conn.latency_ms + self.rng.range_i64(-15, 15)).max(10);
            if self.rng.chance(0.02) {
                conn.status = conn.status.flipped();
            }
            conn.last_sync = now - self.rng.range_i64(5, 120);
        }
    }
}
