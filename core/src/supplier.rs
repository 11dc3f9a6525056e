//! Supplier risk scorer and ledger.
//!
//! Scores a parsed supplier-document record (a loosely-typed JSON
//! object from the extraction capability) against live tariff and
//! inventory context, then upserts the result into a per-supplier
//! ledger with a bounded history and hysteresis-banded trend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    state::TelemetryState,
    types::{clamp, round_dp, UnixTime},
};

/// History entries retained per supplier; oldest evicted first.
const MAX_LEDGER_HISTORY: usize = 10;

/// Trend classification band: scores within +-3 of the previous
/// latest read as flat.
const TREND_BAND: f64 = 3.0;

const SEVERITY_CRITICAL_WEIGHT: f64 = 20.0;
const SEVERITY_WARNING_WEIGHT: f64 = 12.0;
const SEVERITY_INFO_WEIGHT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    New,
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: u32,
    pub warning:  u32,
    pub info:     u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskComponents {
    pub severity:      f64,
    pub capacity:      f64,
    pub tariff:        f64,
    pub concentration: f64,
    pub tariff_delta_pts: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierRiskProfile {
    pub supplier: String,
    pub origin:   String,
    pub po_number: Option<Value>,
    /// 0-100 composite risk.
    pub score: f64,
    /// 0.55-0.92, grows with anomaly count and factory-load presence.
    pub confidence: f64,
    pub components: RiskComponents,
    pub severity_counts: SeverityCounts,
    pub updated_at: UnixTime,
    pub trend: Trend,
}

/// Per-supplier ledger entry: the latest profile plus a bounded history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierLedger {
    pub latest:  Option<SupplierRiskProfile>,
    pub history: Vec<SupplierRiskProfile>,
}

/// Upsert result returned to the caller of the parse flow.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerView {
    pub supplier: String,
    pub latest:   SupplierRiskProfile,
    pub history:  Vec<SupplierRiskProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    pub supplier:   String,
    pub score:      f64,
    pub trend:      Trend,
    pub confidence: f64,
    pub origin:     String,
    pub updated_at: UnixTime,
    pub history_points: usize,
}

/// Score a parsed supplier document against live state.
/// Pure with respect to `state`; the ledger upsert is separate.
pub fn score_supplier_risk(
    extracted: &Value,
    state: &TelemetryState,
    now: UnixTime,
) -> SupplierRiskProfile {
    let supplier = extracted
        .get("supplier")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown Supplier")
        .to_string();
    let origin = extracted
        .get("origin")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown")
        .to_string();
    let origin_lower = origin.to_lowercase();

    let empty = Vec::new();
    let anomalies = extracted
        .get("anomalies")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    // Severity: weighted sum over anomalies, capped. Anything that is
    // not an object defaults to warning weight.
    let mut counts = SeverityCounts::default();
    let mut severity_score = 0.0;
    for anomaly in anomalies {
        let severity = anomaly
            .as_object()
            .map(|obj| {
                obj.get("severity")
                    .and_then(Value::as_str)
                    .unwrap_or("info")
                    .to_lowercase()
            })
            .unwrap_or_else(|| "warning".to_string());
        match severity.as_str() {
            "critical" => {
                counts.critical += 1;
                severity_score += SEVERITY_CRITICAL_WEIGHT;
            }
            "warning" => {
                counts.warning += 1;
                severity_score += SEVERITY_WARNING_WEIGHT;
            }
            _ => {
                counts.info += 1;
                severity_score += SEVERITY_INFO_WEIGHT;
            }
        }
    }
    let severity_score = clamp(severity_score, 0.0, 65.0);

    let factory_load = extracted.get("factory_load").and_then(extract_number);
    let capacity_score = match factory_load {
        Some(load) if load > 80.0 => clamp((load - 80.0) * 0.8, 0.0, 15.0),
        _ => 0.0,
    };

    // Tariff: first schedule whose country appears in the origin text.
    let mut tariff_score = 0.0;
    let mut tariff_delta = 0.0;
    for tariff in &state.tariffs {
        let country = tariff.country.to_lowercase();
        if !country.is_empty() && origin_lower.contains(&country) {
            tariff_delta = ((tariff.proposed_rate() - tariff.current_rate) * 100.0).max(0.0);
            tariff_score = clamp(tariff_delta, 0.0, 12.0);
            break;
        }
    }

    // Concentration: how much of our catalog shares this origin.
    let same_origin = state
        .inventory
        .iter()
        .filter(|item| {
            let country = item.country_of_origin.to_lowercase();
            !country.is_empty() && origin_lower.contains(&country)
        })
        .count();
    let concentration_score = clamp(same_origin as f64 * 2.0, 0.0, 8.0);

    let total = clamp(
        severity_score + capacity_score + tariff_score + concentration_score,
        0.0,
        100.0,
    );
    let confidence = clamp(
        0.55 + (anomalies.len() as f64 * 0.05).min(0.25)
            + if factory_load.is_some() { 0.08 } else { 0.0 },
        0.55,
        0.92,
    );

    SupplierRiskProfile {
        supplier,
        origin,
        po_number: extracted.get("po_number").cloned().filter(|v| !v.is_null()),
        score: round_dp(total, 1),
        confidence: round_dp(confidence, 2),
        components: RiskComponents {
            severity:      round_dp(severity_score, 1),
            capacity:      round_dp(capacity_score, 1),
            tariff:        round_dp(tariff_score, 1),
            concentration: round_dp(concentration_score, 1),
            tariff_delta_pts: round_dp(tariff_delta, 1),
        },
        severity_counts: counts,
        updated_at: now,
        trend: Trend::New,
    }
}

/// Classify the trend against the previous latest score and append the
/// profile to the supplier's ledger, evicting beyond the history cap.
pub fn upsert_supplier_risk(
    ledgers: &mut BTreeMap<String, SupplierLedger>,
    mut profile: SupplierRiskProfile,
) -> LedgerView {
    let entry = ledgers.entry(profile.supplier.clone()).or_default();

    profile.trend = match entry.latest.as_ref().map(|p| p.score) {
        None => Trend::New,
        Some(prev) if profile.score > prev + TREND_BAND => Trend::Up,
        Some(prev) if profile.score < prev - TREND_BAND => Trend::Down,
        Some(_) => Trend::Flat,
    };

    entry.history.push(profile.clone());
    if entry.history.len() > MAX_LEDGER_HISTORY {
        let excess = entry.history.len() - MAX_LEDGER_HISTORY;
        entry.history.drain(..excess);
    }
    entry.latest = Some(profile.clone());

    LedgerView {
        supplier: profile.supplier.clone(),
        latest:   profile,
        history:  entry.history.clone(),
    }
}

/// One row per supplier with its latest profile, highest risk first.
pub fn leaderboard(ledgers: &BTreeMap<String, SupplierLedger>) -> Vec<LeaderboardRow> {
    let mut board: Vec<LeaderboardRow> = ledgers
        .iter()
        .filter_map(|(supplier, ledger)| {
            ledger.latest.as_ref().map(|latest| LeaderboardRow {
                supplier:   supplier.clone(),
                score:      latest.score,
                trend:      latest.trend,
                confidence: latest.confidence,
                origin:     latest.origin.clone(),
                updated_at: latest.updated_at,
                history_points: ledger.history.len(),
            })
        })
        .collect();
    board.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    board
}

/// Pull a numeric value out of a JSON number or a free-text field like
/// "92% booked". Takes the first decimal run found.
fn extract_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => first_decimal_run(s),
        _ => None,
    }
}

fn first_decimal_run(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;
    let mut end = start;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    text[start..end].trim_end_matches('.').parse().ok()
}
