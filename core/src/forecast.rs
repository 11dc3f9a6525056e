//! Stockout forecast model.
//!
//! Pure function of one inventory item and its historical daily
//! velocity series. Blends a horizon term and a lead-time pressure
//! term through the logistic function; never reads or writes state.

use serde::Serialize;

use crate::{
    history::SkuHistory,
    state::InventoryItem,
    types::{clamp, round_dp},
};

#[derive(Debug, Clone, Serialize)]
pub struct StockoutForecast {
    pub daily_demand:     f64,
    pub days_to_stockout: f64,
    /// Stockout probability within 7 days, percent.
    pub risk_7d:  f64,
    /// Stockout probability within 14 days, percent.
    pub risk_14d: f64,
    pub confidence: f64,
}

/// An inventory item with its forecast attached, as served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedItem {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub stockout_forecast: StockoutForecast,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Forecast stockout probability for the 7- and 14-day horizons.
pub fn stockout_forecast(item: &InventoryItem, history: Option<&SkuHistory>) -> StockoutForecast {
    let velocity_series: Vec<i64> = history
        .map(|h| h.daily_velocity.iter().map(|d| d.velocity).collect())
        .unwrap_or_default();
    let recent: Vec<i64> = velocity_series
        .iter()
        .rev()
        .take(3)
        .copied()
        .filter(|v| *v > 0)
        .collect();

    // Demand estimate: mean of the last 3 nonzero daily velocities,
    // else assume committed units turn over in two weeks.
    let daily_demand = if recent.is_empty() {
        (item.committed as f64 / 14.0).max(1.0)
    } else {
        recent.iter().sum::<i64>() as f64 / recent.len() as f64
    };

    let available = (item.available as f64).max(0.0);
    let lead_time_days = (item.lead_time_days as f64).max(1.0);
    let reorder_point = (item.reorder_point as f64).max(1.0);
    let days_to_stockout = available / daily_demand.max(1.0);

    let lead_pressure = sigmoid((lead_time_days - days_to_stockout) / 6.0);

    let horizon_risk = |horizon_days: f64| {
        let horizon_push = sigmoid((horizon_days - days_to_stockout) / 2.8);
        let mut base = 0.05 + 0.65 * horizon_push + 0.25 * lead_pressure;
        if available <= reorder_point {
            base += 0.08;
        }
        clamp(base, 0.01, 0.99)
    };

    let confidence = clamp(
        0.55 + (velocity_series.len() as f64 * 0.03).min(0.3),
        0.55,
        0.9,
    );

    StockoutForecast {
        daily_demand:     round_dp(daily_demand, 2),
        days_to_stockout: round_dp(days_to_stockout, 1),
        risk_7d:          round_dp(horizon_risk(7.0) * 100.0, 1),
        risk_14d:         round_dp(horizon_risk(14.0) * 100.0, 1),
        confidence:       round_dp(confidence, 2),
    }
}

/// Attach a forecast to every inventory item.
pub fn enrich(
    inventory: &[InventoryItem],
    history: &std::collections::BTreeMap<crate::types::Sku, SkuHistory>,
) -> Vec<EnrichedItem> {
    inventory
        .iter()
        .map(|item| EnrichedItem {
            stockout_forecast: stockout_forecast(item, history.get(&item.id)),
            item: item.clone(),
        })
        .collect()
}
