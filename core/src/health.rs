//! Composite supply-chain health score.
//!
//! Four sub-scores, each independently clamped to [0, 25], summed into
//! a 0-100 integer. Pure function over a state snapshot.

use serde::Serialize;

use crate::state::{AlertKind, TelemetryState};

#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthBreakdown {
    pub inventory_sync: i64,
    pub risk_exposure:  i64,
    pub returns_flow:   i64,
    pub alert_health:   i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub score:     i64,
    pub breakdown: HealthBreakdown,
}

/// Score the current state. An unseeded state reports zero health.
pub fn health_report(state: &TelemetryState) -> HealthReport {
    if !state.is_seeded() {
        return HealthReport {
            score: 0,
            breakdown: HealthBreakdown::default(),
        };
    }

    let discrepant = state.inventory.iter().filter(|i| i.discrepancy).count() as f64;
    let inventory_sync = (25.0 - discrepant * 5.0).max(0.0);

    let total_risk: i64 = state.inventory.iter().map(|i| i.risk_value).sum();
    let risk_exposure = (25.0 - (total_risk as f64 / 5000.0).min(25.0)).max(0.0);

    let returns_pressure =
        state.returns.average_days_stuck * 0.5 + state.returns.total_frozen_value as f64 / 5000.0;
    let returns_flow = (25.0 - returns_pressure.min(25.0)).max(0.0);

    let critical = state
        .alerts
        .iter()
        .filter(|a| a.kind == AlertKind::Critical)
        .count() as f64;
    let warning = state
        .alerts
        .iter()
        .filter(|a| a.kind == AlertKind::Warning)
        .count() as f64;
    let alert_health = (25.0 - critical * 5.0 - warning * 2.0).max(0.0);

    let total = (inventory_sync + risk_exposure + returns_flow + alert_health)
        .round()
        .clamp(0.0, 100.0) as i64;

    HealthReport {
        score: total,
        breakdown: HealthBreakdown {
            inventory_sync: inventory_sync.round() as i64,
            risk_exposure:  risk_exposure.round() as i64,
            returns_flow:   returns_flow.round() as i64,
            alert_health:   alert_health.round() as i64,
        },
    }
}
