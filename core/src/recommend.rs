//! Recommendation ranker.
//!
//! Generates remediation candidates from four independent rules
//! (sync, pause, returns, tariff), scores them on normalized impact,
//! urgency, and per-kind confidence, and returns the top three.
//!
//! Dominant-channel tie-break: an exact shopify/amazon tie resolves to
//! shopify. The pause rule and its command string depend on it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::{
    forecast::EnrichedItem,
    state::{ReturnsPool, TariffSchedule},
    types::{clamp, round_dp, usd, Sku, UnixTime},
};

/// Days-until-effective assumed for tariff scenarios with no date.
const DEFAULT_TARIFF_LEAD_DAYS: f64 = 30.0;

/// At most this many recommendations are returned, ranked 1..N.
pub const MAX_RECOMMENDATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Sync,
    Pause,
    Returns,
    Tariff,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub kind:      RecommendationKind,
    pub title:     String,
    pub rationale: String,
    /// Action string the client can POST back, when one applies.
    pub command: Option<String>,
    pub expected_impact: i64,
    pub urgency:    f64,
    pub confidence: f64,
    pub sku: Option<Sku>,
    pub score: f64,
    pub expected_risk_reduction_usd: i64,
    pub rank: usize,
}

struct Candidate {
    kind:      RecommendationKind,
    title:     String,
    rationale: String,
    command:   Option<String>,
    expected_impact: i64,
    urgency:    f64,
    confidence: f64,
    sku: Option<Sku>,
}

/// Rank the top remediation actions for the current state snapshot.
pub fn build_recommendations(
    inventory: &[EnrichedItem],
    returns: &ReturnsPool,
    tariffs: &[TariffSchedule],
    now: UnixTime,
) -> Vec<Recommendation> {
    let mut candidates = Vec::new();

    for enriched in inventory {
        let item = &enriched.item;
        let forecast = &enriched.stockout_forecast;
        let gap = item.listing_gap().max(0);

        if item.discrepancy && item.risk_value > 0 {
            candidates.push(Candidate {
                kind: RecommendationKind::Sync,
                title: format!("Sync {} to WMS truth", item.name),
                rationale: format!(
                    "{gap}-unit listing gap is exposing {} of annualized risk.",
                    usd(item.risk_value)
                ),
                command: Some(format!("sync_inventory:{}", item.id)),
                expected_impact: item.risk_value.max(1),
                urgency: clamp(gap as f64 / 30.0 + item.risk_value as f64 / 50_000.0, 0.0, 1.0),
                confidence: 0.92,
                sku: Some(item.id.clone()),
            });
        }

        if forecast.risk_7d >= 55.0 {
            // Shopify wins exact ties.
            let channel = if item.systems.shopify >= item.systems.amazon {
                "shopify"
            } else {
                "amazon"
            };
            let channel_units = item.systems.get(channel).unwrap_or(0);
            if channel_units <= 0 {
                continue;
            }
            let exposure = ((forecast.risk_7d / 100.0)
                * (item.available.max(1) as f64)
                * item.unit_cost
                * 4.0) as i64;
            candidates.push(Candidate {
                kind: RecommendationKind::Pause,
                title: format!("Pause {} listing for {}", title_case(channel), item.id),
                rationale: format!(
                    "{:.1}% 7-day stockout risk with ~{} days of coverage.",
                    forecast.risk_7d, forecast.days_to_stockout
                ),
                command: Some(format!("pause_channel:{channel}:{}", item.id)),
                expected_impact: exposure.max(1),
                urgency: clamp(forecast.risk_7d / 100.0, 0.0, 1.0),
                confidence: 0.78,
                sku: Some(item.id.clone()),
            });
        }
    }

    if returns.in_limbo > 0 && returns.total_frozen_value > 0 {
        candidates.push(Candidate {
            kind: RecommendationKind::Returns,
            title: "Release inspected returns to ATP".to_string(),
            rationale: format!(
                "{} units and {} remain frozen for ~{} days.",
                returns.in_limbo,
                usd(returns.total_frozen_value),
                returns.average_days_stuck
            ),
            command: Some("release_returns".to_string()),
            expected_impact: returns.total_frozen_value,
            urgency: clamp(
                returns.average_days_stuck / 30.0 + returns.in_limbo as f64 / 40.0,
                0.0,
                1.0,
            ),
            confidence: 0.88,
            sku: None,
        });
    }

    for tariff in tariffs {
        let delta = tariff.proposed_rate() - tariff.current_rate;
        if delta <= 0.0 {
            continue;
        }
        let affected: Vec<&EnrichedItem> = inventory
            .iter()
            .filter(|e| e.item.country_of_origin == tariff.country)
            .collect();
        if affected.is_empty() {
            continue;
        }

        let exposure: i64 = affected
            .iter()
            .map(|e| (e.item.true_atp as f64 * e.item.unit_cost * delta * 4.0) as i64)
            .sum();

        let days_to_effective = tariff
            .scenarios
            .first()
            .and_then(|s| s.effective_date.as_deref())
            .and_then(|d| days_until(d, now))
            .map(|d| d as f64)
            .unwrap_or(DEFAULT_TARIFF_LEAD_DAYS);

        candidates.push(Candidate {
            kind: RecommendationKind::Tariff,
            title: format!("Shift sourcing away from {}", tariff.country),
            rationale: format!(
                "Tariff delta of {:.0} pts could add ~{} annualized landed cost.",
                delta * 100.0,
                usd(exposure)
            ),
            command: None,
            expected_impact: exposure.max(1),
            urgency: clamp(1.0 - days_to_effective / 90.0, 0.2, 1.0),
            confidence: 0.66,
            sku: None,
        });
    }

    if candidates.is_empty() {
        return Vec::new();
    }

    let max_impact = candidates
        .iter()
        .map(|c| c.expected_impact)
        .max()
        .unwrap_or(1)
        .max(1) as f64;

    let mut scored: Vec<Recommendation> = candidates
        .into_iter()
        .map(|c| {
            let impact_component = clamp(c.expected_impact as f64 / max_impact, 0.0, 1.0);
            let score = 100.0 * (0.5 * impact_component + 0.3 * c.urgency + 0.2 * c.confidence);
            Recommendation {
                kind:      c.kind,
                title:     c.title,
                rationale: c.rationale,
                command:   c.command,
                expected_impact: c.expected_impact,
                urgency:    c.urgency,
                confidence: c.confidence,
                sku: c.sku,
                score: round_dp(score, 1),
                expected_risk_reduction_usd: c.expected_impact,
                rank: 0,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(MAX_RECOMMENDATIONS);
    for (idx, rec) in scored.iter_mut().enumerate() {
        rec.rank = idx + 1;
    }
    scored
}

fn title_case(channel: &str) -> String {
    let mut chars = channel.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Whole days from `now` to a YYYY-MM-DD date, floored at zero.
/// None when the date does not parse.
fn days_until(date: &str, now: UnixTime) -> Option<i64> {
    let target = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let today = DateTime::<Utc>::from_timestamp(now, 0)?.date_naive();
    Some((target - today).num_days().max(0))
}
