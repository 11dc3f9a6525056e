//! HTTP surface of the telemetry fabric.
//!
//! RULES:
//!   - GET endpoints take a read lock, compute over the snapshot, and
//!     never mutate. POST endpoints are the only writers.
//!   - The state lock is always released before a language-model call;
//!     context is serialized out first.
//!   - An unseeded state answers derived endpoints with a JSON error
//!     body, never a panic or a 500.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use lattice_core::{
    action::{self, Action},
    forecast, health, recommend, root_cause,
    state::TelemetryState,
    supplier,
};

use crate::{ai, SharedState};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/inventory", get(inventory))
        .route("/api/history", get(history))
        .route("/api/health", get(health_score))
        .route("/api/recommendations", get(recommendations))
        .route("/api/supplier-risks", get(supplier_risks))
        .route("/api/demo-mode", post(demo_mode))
        .route("/api/query", post(query))
        .route("/api/parse", post(parse_document))
        .route("/api/action", post(execute_action))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn not_initialized() -> Response {
    Json(json!({ "error": "Telemetry state not yet initialized" })).into_response()
}

// ── Read surface ───────────────────────────────────────────────────

async fn root() -> Json<Value> {
    Json(json!({
        "service": "lattice",
        "message": "Inventory telemetry fabric online",
    }))
}

/// The full dashboard payload: forecast-enriched inventory, the alert
/// feed with causal chains attached, ranked recommendations, and the
/// supplier leaderboard, all from one consistent snapshot.
async fn inventory(State(state): State<SharedState>) -> Response {
    let now = Utc::now().timestamp();
    let st = state.telemetry.read().await;
    if !st.is_seeded() {
        return not_initialized();
    }

    let enriched = forecast::enrich(&st.inventory, &st.history);
    let alerts: Vec<Value> = st
        .alerts
        .iter()
        .map(|alert| {
            let mut row = serde_json::to_value(alert).unwrap_or(Value::Null);
            if let Some(chain) = root_cause::synthesize(alert, &st) {
                row["root_cause"] = serde_json::to_value(&chain).unwrap_or(Value::Null);
            }
            row
        })
        .collect();
    let recommendations = recommend::build_recommendations(&enriched, &st.returns, &st.tariffs, now);
    let suppliers = supplier::leaderboard(&st.supplier_risks);

    Json(json!({
        "inventory": enriched,
        "alerts": alerts,
        "recommendations": recommendations,
        "supplier_risks": suppliers,
        "tariffs": st.tariffs,
        "returns": st.returns,
        "connections": st.connections,
        "demo_mode": st.demo_mode,
        "last_update": st.last_update,
        "uptime_secs": now - st.boot_time,
    }))
    .into_response()
}

async fn history(State(state): State<SharedState>) -> Response {
    let st = state.telemetry.read().await;
    if !st.is_seeded() {
        return not_initialized();
    }
    Json(st.history.clone()).into_response()
}

async fn health_score(State(state): State<SharedState>) -> Json<health::HealthReport> {
    let st = state.telemetry.read().await;
    Json(health::health_report(&st))
}

async fn recommendations(State(state): State<SharedState>) -> Response {
    let now = Utc::now().timestamp();
    let st = state.telemetry.read().await;
    if !st.is_seeded() {
        return not_initialized();
    }
    let enriched = forecast::enrich(&st.inventory, &st.history);
    Json(json!({
        "generated_at": now,
        "demo_mode": st.demo_mode,
        "recommendations": recommend::build_recommendations(&enriched, &st.returns, &st.tariffs, now),
    }))
    .into_response()
}

async fn supplier_risks(State(state): State<SharedState>) -> Json<Value> {
    let st = state.telemetry.read().await;
    let suppliers = supplier::leaderboard(&st.supplier_risks);
    Json(json!({
        "total_suppliers": suppliers.len(),
        "suppliers": suppliers,
    }))
}

// ── Control surface ────────────────────────────────────────────────

#[derive(Deserialize)]
struct DemoModeRequest {
    #[serde(default)]
    enabled: Value,
}

/// Toggle demo mode. Disabling runs one immediate tick so the scene
/// visibly resumes without waiting out the interval.
async fn demo_mode(
    State(state): State<SharedState>,
    Json(req): Json<DemoModeRequest>,
) -> Json<Value> {
    let enabled = coerce_enabled(&req.enabled);

    // Lock order matches the tick loop: engine first, then state.
    let mut engine = state.engine.lock().await;
    let mut st = state.telemetry.write().await;
    st.demo_mode = enabled;
    if !enabled {
        engine.tick(&mut st, Utc::now().timestamp());
    }
    log::info!("demo mode {}", if enabled { "enabled" } else { "disabled" });

    Json(json!({
        "demo_mode": enabled,
        "message": if enabled {
            "Demo mode on: simulation drift paused"
        } else {
            "Demo mode off: live drift resumed"
        },
    }))
}

/// Clients send booleans, strings, and the occasional 0/1.
fn coerce_enabled(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "on" | "yes"),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        _ => false,
    }
}

#[derive(Deserialize)]
struct ActionRequest {
    #[serde(default)]
    action: String,
}

async fn execute_action(
    State(state): State<SharedState>,
    Json(req): Json<ActionRequest>,
) -> Json<Value> {
    let parsed = match Action::parse(&req.action) {
        Ok(parsed) => parsed,
        Err(err) => return Json(json!({ "error": err.to_string() })),
    };
    let now = Utc::now().timestamp();
    let mut st = state.telemetry.write().await;
    match action::execute(&mut st, &parsed, now) {
        Ok(outcome) => Json(json!({
            "status": outcome.status,
            "message": outcome.message,
        })),
        Err(err) => Json(json!({ "error": err.to_string() })),
    }
}

// ── Intelligence surface ───────────────────────────────────────────

#[derive(Deserialize)]
struct QueryRequest {
    #[serde(default)]
    query: String,
    #[serde(default)]
    history: Vec<ai::ChatMessage>,
}

/// Natural-language operations query, streamed back as plain text.
async fn query(State(state): State<SharedState>, Json(req): Json<QueryRequest>) -> Response {
    if req.query.trim().is_empty() {
        return Json(json!({ "error": "No query provided" })).into_response();
    }
    if !state.intelligence.is_configured() {
        return Json(json!({
            "response": "The language model is not configured. \
                         Set OPENAI_API_KEY to enable operational queries.",
        }))
        .into_response();
    }

    // Serialize the snapshot and drop the lock before the model call.
    let context = {
        let st = state.telemetry.read().await;
        if !st.is_seeded() {
            return not_initialized();
        }
        operations_context(&st)
    };

    let mut messages = vec![ai::ChatMessage {
        role:    "system".to_string(),
        content: chat_system_prompt(&context),
    }];
    messages.extend(req.history.into_iter().take(12));
    messages.push(ai::ChatMessage {
        role:    "user".to_string(),
        content: req.query,
    });

    match state.intelligence.chat_stream(messages).await {
        Ok(stream) => {
            let body = Body::from_stream(stream.map(Ok::<_, Infallible>));
            Response::builder()
                .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(body)
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Err(err) => {
            log::error!("query failed: {err:#}");
            Json(json!({ "error": format!("Intelligence service error: {err}") })).into_response()
        }
    }
}

#[derive(Deserialize)]
struct ParseRequest {
    #[serde(default)]
    text: String,
}

/// Extract a structured supplier record from pasted document text,
/// then score it into the supplier risk ledger.
async fn parse_document(
    State(state): State<SharedState>,
    Json(req): Json<ParseRequest>,
) -> Json<Value> {
    if req.text.trim().is_empty() {
        return Json(json!({ "error": "No document text provided" }));
    }
    if !state.intelligence.is_configured() {
        return Json(json!({ "error": "OPENAI_API_KEY is not configured" }));
    }

    let context = {
        let st = state.telemetry.read().await;
        json!({
            "tariffs": st.tariffs,
            "inventory": st
                .inventory
                .iter()
                .map(|item| {
                    json!({
                        "id": item.id,
                        "name": item.name,
                        "country_of_origin": item.country_of_origin,
                    })
                })
                .collect::<Vec<_>>(),
            "alerts": st.alerts.iter().take(5).collect::<Vec<_>>(),
        })
    };
    let system = extraction_system_prompt(&context);

    match state.intelligence.extract(&system, &req.text).await {
        Ok(ai::Extraction::Structured(mut extracted)) => {
            ai::normalize_anomalies(&mut extracted);
            let now = Utc::now().timestamp();
            let mut st = state.telemetry.write().await;
            let profile = supplier::score_supplier_risk(&extracted, &st, now);
            let view = supplier::upsert_supplier_risk(&mut st.supplier_risks, profile);
            Json(json!({
                "status": "success",
                "extracted": extracted,
                "supplier_risk": view,
            }))
        }
        Ok(ai::Extraction::Raw(text)) => Json(json!({
            "status": "success",
            "extracted": { "raw": text },
        })),
        Err(err) => {
            log::error!("parse failed: {err:#}");
            Json(json!({ "error": format!("Extraction failed: {err}") }))
        }
    }
}

// ── Prompt assembly ────────────────────────────────────────────────

/// The live snapshot handed to the query model: enriched inventory,
/// the newest alerts, and the aggregates that anchor dollar figures.
fn operations_context(st: &TelemetryState) -> Value {
    let enriched = forecast::enrich(&st.inventory, &st.history);
    json!({
        "inventory": enriched,
        "alerts": st.alerts.iter().take(5).collect::<Vec<_>>(),
        "returns": st.returns,
        "tariffs": st.tariffs,
        "health": health::health_report(st),
    })
}

fn chat_system_prompt(context: &Value) -> String {
    format!(
        "You are the inventory operations copilot for a multi-channel \
         apparel retailer. Answer from the live telemetry below; cite \
         concrete unit counts and dollar figures from it, and keep \
         answers to a few short sentences.\n\
         When a remediation applies, name exactly one of these commands: \
         sync_inventory:<SKU>, release_returns, \
         pause_channel:<channel>:<SKU>.\n\n\
         Live telemetry:\n{}",
        serde_json::to_string(context).unwrap_or_default()
    )
}

fn extraction_system_prompt(context: &Value) -> String {
    format!(
        "You extract structured supplier records from freeform documents \
         (emails, purchase orders, factory reports). Reply with a single \
         JSON object and nothing else, using this shape (null for any \
         field the document does not state):\n\
         {{\"po_number\": string|null, \"supplier\": string, \
         \"contact\": string|null, \"style\": string|null, \
         \"quantity\": number|null, \"unit_cost\": number|null, \
         \"ship_date\": string|null, \"origin\": string, \
         \"hts_code\": string|null, \"factory_load\": number|null, \
         \"anomalies\": [{{\"severity\": \"critical\"|\"warning\"|\"info\", \
         \"title\": string, \"detail\": string}}]}}\n\
         Flag cost spikes, schedule slips, capacity constraints, and \
         tariff exposure as anomalies. Current trade context:\n{}",
        serde_json::to_string(context).unwrap_or_default()
    )
}
