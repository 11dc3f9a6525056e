//! Boot-time history generation: a 7-day hourly random walk per SKU.
//!
//! Generated once when the state is seeded and read-only afterwards.
//! The drift engine never touches it; the forecast model reads the
//! derived daily velocity series.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    rng::DriftRng,
    state::InventoryItem,
    types::{Sku, UnixTime},
};

/// 7 days of hourly samples.
pub const HISTORY_HOURS: usize = 7 * 24;

/// Sparkline keeps every 12th hourly total (14 points over 7 days).
const SPARKLINE_STRIDE: usize = 12;

/// The one SKU whose history carries a day-5 viral demand surge.
pub const VIRAL_SPIKE_SKU: &str = "SKU-101";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub ts:      UnixTime,
    pub day:     u32,
    pub hour:    u32,
    pub shopify: i64,
    pub amazon:  i64,
    pub wms:     i64,
    pub total:   i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyVelocity {
    pub day:      u32,
    pub velocity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkuHistory {
    pub hourly:         Vec<HistoryPoint>,
    pub daily_velocity: Vec<DailyVelocity>,
    pub sparkline:      Vec<i64>,
}

/// Generate the full history map for the seeded inventory.
pub fn generate_history(
    inventory: &[InventoryItem],
    rng: &mut DriftRng,
    now: UnixTime,
) -> BTreeMap<Sku, SkuHistory> {
    inventory
        .iter()
        .map(|item| (item.id.clone(), walk_sku(item, rng, now)))
        .collect()
}

fn walk_sku(item: &InventoryItem, rng: &mut DriftRng, now: UnixTime) -> SkuHistory {
    // Walk starts slightly below the live counts so the series trends
    // up toward the present.
    let mut shopify = item.systems.shopify as f64 * 0.85;
    let mut amazon = item.systems.amazon as f64 * 0.85;
    let mut wms = item.systems.wms as f64 * 0.92;

    let mut hourly = Vec::with_capacity(HISTORY_HOURS);
    for h in 0..HISTORY_HOURS {
        let day = (h / 24) as u32;
        let hour = (h % 24) as u32;

        // Demand concentrates in business hours.
        let demand_mult = if (9..=21).contains(&hour) { 1.2 } else { 0.7 };

        // Shopify: highest volatility, slight upward trend.
        shopify += rng.gauss(0.15, 1.5) * demand_mult;
        if item.id == VIRAL_SPIKE_SKU && day == 5 && (10..=16).contains(&hour) {
            shopify += rng.gauss(8.0, 3.0);
        }

        // Amazon: moderate volatility; the spike SKU keeps a lift
        // from day 5 onward.
        amazon += rng.gauss(0.12, 1.2) * demand_mult;
        if item.id == VIRAL_SPIKE_SKU && day >= 5 {
            amazon += rng.gauss(2.0, 1.0);
        }

        // WMS moves slowly; occasional restock bump every other day.
        wms += rng.gauss(0.0, 0.3);
        if h % 48 == 0 && rng.chance(0.3) {
            wms += rng.gauss(5.0, 2.0);
        }

        shopify = shopify.max(10.0);
        amazon = amazon.max(5.0);
        wms = wms.max(10.0);

        let ts = now - ((HISTORY_HOURS - h) as i64) * 3600;
        let (s, a, w) = (
            shopify.round() as i64,
            amazon.round() as i64,
            wms.round() as i64,
        );
        hourly.push(HistoryPoint {
            ts,
            day,
            hour,
            shopify: s,
            amazon: a,
            wms: w,
            total: s + a + w,
        });
    }

    // Daily velocity: net positive listed-channel movement per day,
    // floored at one unit.
    let mut daily_velocity = Vec::with_capacity(7);
    for day in 0..7u32 {
        let day_points: Vec<&HistoryPoint> = hourly.iter().filter(|p| p.day == day).collect();
        if let (Some(first), Some(last)) = (day_points.first(), day_points.last()) {
            let velocity =
                (last.shopify - first.shopify).max(0) + (last.amazon - first.amazon).max(0);
            daily_velocity.push(DailyVelocity {
                day,
                velocity: velocity.max(1),
            });
        }
    }

    let sparkline = hourly
        .iter()
        .step_by(SPARKLINE_STRIDE)
        .map(|p| p.total)
        .collect();

    SkuHistory {
        hourly,
        daily_velocity,
        sparkline,
    }
}
