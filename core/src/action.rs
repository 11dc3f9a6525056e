//! Action executor: user-triggered state mutations.
//!
//! Each recognized action is idempotent in effect but not in audit
//! trail: every successful execution appends one INFO alert tagged
//! ACT. Errors leave the state unmutated.

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, CoreResult},
    state::{Alert, AlertKind, TelemetryState},
    types::{usd, Sku, UnixTime},
};

/// All recognized action strings, parsed into typed form.
/// `sync_inventory:<SKU|*>` / `release_returns` /
/// `pause_channel:<channel>:<SKU>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    SyncInventory {
        /// None syncs every discrepant item.
        sku: Option<Sku>,
    },
    ReleaseReturns,
    PauseChannel {
        channel: String,
        sku: Sku,
    },
}

impl Action {
    pub fn parse(raw: &str) -> CoreResult<Action> {
        if let Some(rest) = raw.strip_prefix("sync_inventory") {
            let sku = rest
                .strip_prefix(':')
                .map(str::to_string)
                .filter(|s| !s.is_empty() && s != "*");
            return Ok(Action::SyncInventory { sku });
        }
        if raw == "release_returns" {
            return Ok(Action::ReleaseReturns);
        }
        if raw.starts_with("pause_channel") {
            let parts: Vec<&str> = raw.split(':').collect();
            if parts.len() < 3 || parts[1].is_empty() || parts[2].is_empty() {
                return Err(CoreError::MalformedAction {
                    expected: "pause_channel:<channel>:<SKU-ID>".to_string(),
                });
            }
            return Ok(Action::PauseChannel {
                channel: parts[1].to_lowercase(),
                sku: parts[2].to_string(),
            });
        }
        Err(CoreError::UnknownAction {
            action: raw.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Success,
    NoChange,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub status:  ActionStatus,
    pub message: String,
}

/// Execute an action against live state.
pub fn execute(
    state: &mut TelemetryState,
    action: &Action,
    now: UnixTime,
) -> CoreResult<ActionOutcome> {
    if !state.is_seeded() {
        return Err(CoreError::NotInitialized);
    }
    match action {
        Action::SyncInventory { sku } => sync_inventory(state, sku.as_deref(), now),
        Action::ReleaseReturns => release_returns(state, now),
        Action::PauseChannel { channel, sku } => pause_channel(state, channel, sku, now),
    }
}

fn sync_inventory(
    state: &mut TelemetryState,
    sku: Option<&str>,
    now: UnixTime,
) -> CoreResult<ActionOutcome> {
    let mut synced: Vec<String> = Vec::new();
    for item in &mut state.inventory {
        if let Some(target) = sku {
            if item.id != target {
                continue;
            }
        }
        if item.discrepancy {
            let wms = item.systems.wms;
            item.systems.shopify = wms;
            item.systems.amazon = wms;
            item.recompute_derived();
            synced.push(item.name.clone());
        }
    }

    state.last_update = now;
    if synced.is_empty() {
        return Ok(ActionOutcome {
            status:  ActionStatus::NoChange,
            message: "No discrepancies to sync".to_string(),
        });
    }

    let names = synced.join(", ");
    let id = state.next_alert_id("ACT");
    state.push_alert(Alert {
        id,
        kind: AlertKind::Info,
        message: format!("Inventory synced for {names}: all channels now match WMS"),
        risk: 0,
        action: None,
        sku: sku.map(str::to_string),
        time: "just now".to_string(),
    });
    Ok(ActionOutcome {
        status:  ActionStatus::Success,
        message: format!("Synced: {names}"),
    })
}

fn release_returns(state: &mut TelemetryState, now: UnixTime) -> CoreResult<ActionOutcome> {
    let released = state.returns.total_frozen_value;
    state.returns.in_limbo = 0;
    state.returns.total_frozen_value = 0;
    state.returns.average_days_stuck = 0.0;
    state.returns.items.clear();

    let id = state.next_alert_id("ACT");
    state.push_alert(Alert {
        id,
        kind: AlertKind::Info,
        message: format!(
            "Returns released: {} in frozen inventory returned to sellable ATP",
            usd(released)
        ),
        risk: 0,
        action: None,
        sku: None,
        time: "just now".to_string(),
    });
    state.last_update = now;
    Ok(ActionOutcome {
        status:  ActionStatus::Success,
        message: format!("Released {} in returns", usd(released)),
    })
}

fn pause_channel(
    state: &mut TelemetryState,
    channel: &str,
    sku: &str,
    now: UnixTime,
) -> CoreResult<ActionOutcome> {
    let not_found = || CoreError::UnknownTarget {
        sku:     sku.to_string(),
        channel: channel.to_string(),
    };

    let item = state.item_mut(sku).ok_or_else(not_found)?;
    let units = item.systems.get(channel).ok_or_else(not_found)?;
    let name = item.name.clone();

    if units <= 0 {
        state.last_update = now;
        return Ok(ActionOutcome {
            status:  ActionStatus::NoChange,
            message: format!("{name} already paused on {channel}"),
        });
    }

    item.systems.set(channel, 0);
    item.recompute_derived();

    let id = state.next_alert_id("ACT");
    state.push_alert(Alert {
        id,
        kind: AlertKind::Info,
        message: format!("{name} paused on {} (was {units} units)", title_case(channel)),
        risk: 0,
        action: None,
        sku: Some(sku.to_string()),
        time: "just now".to_string(),
    });
    state.last_update = now;
    Ok(ActionOutcome {
        status:  ActionStatus::Success,
        message: format!("Paused {name} on {channel}"),
    })
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
