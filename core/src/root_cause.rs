//! Root-cause synthesizer.
//!
//! Classifies an alert by case-insensitive substring match on its
//! message, in a fixed priority order, and builds a four-step causal
//! chain (Root Cause / Effect / Impact / Action) from the live
//! entities the alert references. Derived at read time; never stored.

use serde::Serialize;

use crate::{
    state::{Alert, TelemetryState},
    types::usd_compact,
};

/// Fallback country for tariff alerts naming no known country.
const FALLBACK_TARIFF_COUNTRY: &str = "Vietnam";

#[derive(Debug, Clone, Serialize)]
pub struct CauseStep {
    pub label: &'static str,
    pub text:  String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RootCause {
    pub chain: Vec<CauseStep>,
}

fn chain(steps: [(&'static str, String); 4]) -> RootCause {
    RootCause {
        chain: steps
            .into_iter()
            .map(|(label, text)| CauseStep { label, text })
            .collect(),
    }
}

/// Build the causal chain for an alert, or None when no message
/// pattern matches. Callers must treat None as "no root cause
/// available", not an error.
pub fn synthesize(alert: &Alert, state: &TelemetryState) -> Option<RootCause> {
    let msg = alert.message.to_lowercase();
    let item = alert.sku.as_deref().and_then(|sku| state.item(sku));
    let risk_str = usd_compact(alert.risk as f64);
    let sku_label = alert.sku.as_deref().unwrap_or("affected SKU");

    // Priority order matters: an oversell message mentioning a reorder
    // threshold still reads as an oversell.
    if msg.contains("oversold") || msg.contains("gap") {
        let name = item.map(|i| i.name.as_str()).unwrap_or("Unknown SKU");
        let (shopify, amazon, wms) = item
            .map(|i| (i.systems.shopify, i.systems.amazon, i.systems.wms))
            .unwrap_or((0, 0, 0));
        let max_listed = shopify.max(amazon);
        let gap = max_listed - wms;
        let source = if shopify >= amazon { "Shopify" } else { "Amazon" };
        return Some(chain([
            (
                "Root Cause",
                format!("{source} webhook delay: {name} listed at {max_listed} vs WMS truth of {wms}"),
            ),
            (
                "Effect",
                format!("{gap}-unit oversell against stale inventory count on {source}"),
            ),
            (
                "Impact",
                format!("{risk_str} capital at risk, backorder fulfillment required for {gap} units"),
            ),
            (
                "Action",
                format!("Sync {sku_label} to WMS truth ({wms} units) across all channels"),
            ),
        ]));
    }

    if msg.contains("tariff") {
        let country = state
            .tariffs
            .iter()
            .find(|t| msg.contains(&t.country.to_lowercase()))
            .map(|t| t.country.clone())
            .unwrap_or_else(|| FALLBACK_TARIFF_COUNTRY.to_string());
        let tariff = state.tariffs.iter().find(|t| t.country == country);

        if let Some(tariff) = tariff {
            let current = tariff.current_rate;
            let proposed = tariff.proposed_rate();
            let eff_date = tariff
                .scenarios
                .first()
                .and_then(|s| s.effective_date.as_deref())
                .unwrap_or("TBD");
            let affected = state
                .inventory
                .iter()
                .filter(|i| i.country_of_origin == country)
                .count();
            return Some(chain([
                (
                    "Root Cause",
                    format!(
                        "{country} tariff increase: {:.0}% to {:.0}% effective {eff_date}",
                        current * 100.0,
                        proposed * 100.0
                    ),
                ),
                (
                    "Effect",
                    format!("{affected} SKUs sourced from {country} face higher landed cost"),
                ),
                (
                    "Impact",
                    format!("{risk_str} annual exposure if no sourcing changes made"),
                ),
                (
                    "Action",
                    "Shift affected SKUs to lower-tariff origin or negotiate pre-tariff bulk order"
                        .to_string(),
                ),
            ]));
        }
        return Some(chain([
            (
                "Root Cause",
                "Geopolitical policy change affecting import duties".to_string(),
            ),
            (
                "Effect",
                "Landed cost increase pending for affected SKUs".to_string(),
            ),
            (
                "Impact",
                format!("{risk_str} exposure across affected inventory"),
            ),
            (
                "Action",
                "Review sourcing alternatives and pre-tariff purchasing".to_string(),
            ),
        ]));
    }

    if msg.contains("spike") || msg.contains("tiktok") || msg.contains("velocity") {
        let name = item.map(|i| i.name.as_str()).unwrap_or("Unknown SKU");
        let atp = item.map(|i| i.true_atp).unwrap_or(0);
        let available = item.map(|i| i.available).unwrap_or(0);
        let lead_time = item.map(|i| i.lead_time_days).unwrap_or(30);
        let days_stock = ((available as f64 / (atp as f64 * 0.1).max(1.0)).round() as i64).max(1);
        return Some(chain([
            (
                "Root Cause",
                format!("Viral social media exposure driving demand surge for {name}"),
            ),
            (
                "Effect",
                format!(
                    "Order velocity 3.2x normal: {available} units available, ~{days_stock} days of stock remaining"
                ),
            ),
            (
                "Impact",
                format!("{risk_str} at risk, stockout probable before next PO (lead time {lead_time}d)"),
            ),
            (
                "Action",
                format!(
                    "Expedite PO for {sku_label} or reallocate {} units from wholesale channel",
                    available.min(50)
                ),
            ),
        ]));
    }

    if msg.contains("return") || msg.contains("backlog") || msg.contains("inspection") {
        let returns = &state.returns;
        let frozen_str = usd_compact(returns.total_frozen_value as f64);
        let batches = returns.items.len();
        return Some(chain([
            (
                "Root Cause",
                format!(
                    "ShipBob inspection bottleneck: {batches} return batches stuck avg {} days",
                    returns.average_days_stuck
                ),
            ),
            (
                "Effect",
                format!(
                    "{} units awaiting grading, {frozen_str} frozen in limbo",
                    returns.in_limbo
                ),
            ),
            (
                "Impact",
                "Unavailable ATP reducing sellable stock, customer wait times increasing"
                    .to_string(),
            ),
            (
                "Action",
                format!("Release {batches} graded returns ({frozen_str}) back into sellable inventory"),
            ),
        ]));
    }

    if msg.contains("reorder") || msg.contains("threshold") {
        let name = item.map(|i| i.name.as_str()).unwrap_or("Unknown SKU");
        let available = item.map(|i| i.available).unwrap_or(0);
        let reorder_point = item.map(|i| i.reorder_point).unwrap_or(50);
        let lead_time = item.map(|i| i.lead_time_days).unwrap_or(30);
        let unit_cost = item.map(|i| i.unit_cost).unwrap_or(25.0);
        let reorder_qty = (reorder_point * 2).max(100);
        let reorder_cost = crate::types::usd((reorder_qty as f64 * unit_cost) as i64);
        return Some(chain([
            (
                "Root Cause",
                format!(
                    "Sustained demand for {name}: {available} available vs {reorder_point} safety threshold"
                ),
            ),
            (
                "Effect",
                format!("Only {available} units left, {lead_time}-day lead time for replenishment"),
            ),
            (
                "Impact",
                format!("Stockout risk before next PO arrival, {risk_str} revenue at risk"),
            ),
            (
                "Action",
                format!(
                    "Emergency reorder {reorder_qty} units ({reorder_cost}) or transfer from another channel"
                ),
            ),
        ]));
    }

    None
}
