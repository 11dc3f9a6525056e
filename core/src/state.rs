//! Telemetry state: the single shared record of inventory, alerts,
//! connection health, history, and the supplier risk ledger.
//!
//! RULES:
//!   - There are exactly two mutation entry points: the drift engine's
//!     tick and the action executor. Everything else reads.
//!   - Derived inventory fields (true_atp, available, discrepancy,
//!     risk_value) are re-established only through
//!     `InventoryItem::recompute_derived`.
//!   - State lives in memory for the process lifetime and is rebuilt
//!     from the seed document at startup. Nothing writes it back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    history::{self, SkuHistory},
    rng::DriftRng,
    supplier::SupplierLedger,
    types::{Sku, UnixTime},
};

/// Listed-vs-physical gap above which an item is flagged discrepant.
pub const GAP_THRESHOLD: i64 = 5;

/// Annualization multiplier applied to gap exposure in dollars.
pub const RISK_ANNUALIZATION: f64 = 12.0;

/// The alert feed is capped at this many entries, newest first.
pub const MAX_ALERTS: usize = 25;

// ── Inventory ──────────────────────────────────────────────────────

/// Per-channel unit counts. The WMS count is physical truth; the
/// listed channels drift away from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelCounts {
    pub shopify: i64,
    pub amazon:  i64,
    pub wms:     i64,
    #[serde(default)]
    pub pos:     i64,
}

impl ChannelCounts {
    pub fn get(&self, channel: &str) -> Option<i64> {
        match channel {
            "shopify" => Some(self.shopify),
            "amazon"  => Some(self.amazon),
            "wms"     => Some(self.wms),
            "pos"     => Some(self.pos),
            _ => None,
        }
    }

    pub fn set(&mut self, channel: &str, units: i64) -> bool {
        match channel {
            "shopify" => self.shopify = units,
            "amazon"  => self.amazon = units,
            "wms"     => self.wms = units,
            "pos"     => self.pos = units,
            _ => return false,
        }
        true
    }

    /// The larger of the two listed-channel counts.
    pub fn max_listed(&self) -> i64 {
        self.shopify.max(self.amazon)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id:                Sku,
    pub name:              String,
    pub country_of_origin: String,
    pub unit_cost:         f64,
    pub committed:         i64,
    pub lead_time_days:    i64,
    pub reorder_point:     i64,
    pub systems:           ChannelCounts,
    // Derived fields. Seed documents may omit them; recompute_derived
    // establishes them before first read.
    #[serde(default)]
    pub true_atp:    i64,
    #[serde(default)]
    pub available:   i64,
    #[serde(default)]
    pub discrepancy: bool,
    #[serde(default)]
    pub risk_value:  i64,
}

impl InventoryItem {
    /// Listed-channel overhang vs physical truth. Negative when WMS
    /// holds more than either listing shows.
    pub fn listing_gap(&self) -> i64 {
        self.systems.max_listed() - self.systems.wms
    }

    /// Re-establish every derived field from the channel counts.
    /// available >= 0; discrepancy iff gap > GAP_THRESHOLD; risk_value
    /// is zero for non-discrepant items.
    pub fn recompute_derived(&mut self) {
        self.true_atp = self.systems.wms;
        self.available = (self.systems.wms - self.committed).max(0);
        let gap = self.listing_gap();
        if gap > GAP_THRESHOLD {
            self.discrepancy = true;
            self.risk_value = ((gap as f64) * self.unit_cost * RISK_ANNUALIZATION).max(0.0) as i64;
        } else {
            self.discrepancy = false;
            self.risk_value = 0;
        }
    }
}

// ── Alerts ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertKind {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind:    AlertKind,
    pub message: String,
    pub risk:    i64,
    pub action:  Option<String>,
    pub sku:     Option<Sku>,
    pub time:    String,
}

// ── Tariffs ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffScenario {
    pub rate: f64,
    #[serde(default)]
    pub effective_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffSchedule {
    pub country:      String,
    pub current_rate: f64,
    #[serde(default)]
    pub scenarios:    Vec<TariffScenario>,
}

impl TariffSchedule {
    /// Rate of the first (reference) scenario, falling back to the
    /// current rate when no scenario is listed.
    pub fn proposed_rate(&self) -> f64 {
        self.scenarios
            .first()
            .map(|s| s.rate)
            .unwrap_or(self.current_rate)
    }
}

// ── Returns ────────────────────────────────────────────────────────

/// Aggregate of returned units stuck in inspection. Individual rows
/// are opaque payloads; only the aggregate drives any logic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnsPool {
    #[serde(default)]
    pub in_limbo: i64,
    #[serde(default)]
    pub total_frozen_value: i64,
    #[serde(default)]
    pub average_days_stuck: f64,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

// ── Connections ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Degraded,
}

impl ConnectionStatus {
    pub fn flipped(self) -> Self {
        match self {
            Self::Connected => Self::Degraded,
            Self::Degraded => Self::Connected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub status:     ConnectionStatus,
    pub last_sync:  UnixTime,
    pub latency_ms: i64,
}

/// Systems reported on the connection-health panel, with their boot
/// baselines: (last_sync offset range, latency range).
const CONNECTION_BASELINES: &[(&str, (i64, i64), (i64, i64))] = &[
    ("shopify", (10, 120), (45, 180)),
    ("amazon",  (30, 300), (80, 250)),
    ("wms",     (5, 60),   (20, 80)),
    ("shipbob", (60, 600), (100, 350)),
    ("pos",     (15, 180), (30, 120)),
];

fn baseline_connections(rng: &mut DriftRng, now: UnixTime) -> BTreeMap<String, Connection> {
    CONNECTION_BASELINES
        .iter()
        .map(|(system, sync_range, latency_range)| {
            let conn = Connection {
                status:     ConnectionStatus::Connected,
                last_sync:  now - rng.range_i64(sync_range.0, sync_range.1),
                latency_ms: rng.range_i64(latency_range.0, latency_range.1),
            };
            (system.to_string(), conn)
        })
        .collect()
}

// ── Seed document ──────────────────────────────────────────────────

/// Top-level shape of the seed JSON document. Read once at startup;
/// the engine never writes it back.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedDocument {
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub tariffs: Vec<TariffSchedule>,
    #[serde(default)]
    pub returns: ReturnsPool,
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

// ── Telemetry state ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct TelemetryState {
    pub inventory:      Vec<InventoryItem>,
    pub tariffs:        Vec<TariffSchedule>,
    pub returns:        ReturnsPool,
    pub alerts:         Vec<Alert>,
    pub history:        BTreeMap<Sku, SkuHistory>,
    pub connections:    BTreeMap<String, Connection>,
    pub supplier_risks: BTreeMap<String, SupplierLedger>,
    pub demo_mode:      bool,
    pub last_update:    UnixTime,
    pub boot_time:      UnixTime,
    alert_counter:      u64,
}

impl TelemetryState {
    /// Build the full boot-time state from a seed document: derived
    /// inventory fields, 7-day history walk, and connection baselines.
    pub fn from_seed(seed: SeedDocument, rng: &mut DriftRng, now: UnixTime) -> Self {
        let mut inventory = seed.inventory;
        for item in &mut inventory {
            item.recompute_derived();
        }
        let history = history::generate_history(&inventory, rng, now);
        let connections = baseline_connections(rng, now);
        log::info!(
            "telemetry state seeded: {} SKUs, {} tariffs, {} alerts",
            inventory.len(),
            seed.tariffs.len(),
            seed.alerts.len()
        );
        Self {
            inventory,
            tariffs: seed.tariffs,
            returns: seed.returns,
            alerts: seed.alerts,
            history,
            connections,
            supplier_risks: BTreeMap::new(),
            demo_mode: false,
            last_update: now,
            boot_time: now,
            alert_counter: 100,
        }
    }

    /// True once seed data has been ingested. Derived endpoints must
    /// refuse to compute over an unseeded state.
    pub fn is_seeded(&self) -> bool {
        !self.inventory.is_empty()
    }

    pub fn item(&self, sku: &str) -> Option<&InventoryItem> {
        self.inventory.iter().find(|i| i.id == sku)
    }

    pub fn item_mut(&mut self, sku: &str) -> Option<&mut InventoryItem> {
        self.inventory.iter_mut().find(|i| i.id == sku)
    }

    /// Mint the next alert id for an origin tag, e.g. "SIM-101".
    pub fn next_alert_id(&mut self, tag: &str) -> String {
        self.alert_counter += 1;
        format!("{tag}-{}", self.alert_counter)
    }

    /// Prepend an alert; the feed is newest-first.
    pub fn push_alert(&mut self, alert: Alert) {
        log::info!("alert {} [{:?}]: {}", alert.id, alert.kind, alert.message);
        self.alerts.insert(0, alert);
    }

    /// Drop everything past the newest MAX_ALERTS entries.
    pub fn truncate_alerts(&mut self) {
        self.alerts.truncate(MAX_ALERTS);
    }
}
