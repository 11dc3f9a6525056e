//! lattice-server: the telemetry fabric service binary.
//!
//! Boots the in-memory state from a seed document, runs the drift
//! engine on a fixed background cadence, and serves the HTTP surface.

mod ai;
mod routes;

use std::{env, fs, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use lattice_core::{
    engine::{DriftEngine, TICK_INTERVAL_SECS},
    rng::DriftRng,
    state::{SeedDocument, TelemetryState},
};

/// Everything the handlers share.
pub struct AppState {
    pub telemetry:    RwLock<TelemetryState>,
    pub engine:       Mutex<DriftEngine>,
    pub intelligence: ai::IntelligenceClient,
}

pub type SharedState = Arc<AppState>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed_path = env::var("LATTICE_SEED_PATH").unwrap_or_else(|_| "data/seed.json".to_string());
    let seed = load_seed(&seed_path);

    let mut rng = match env::var("LATTICE_SEED").ok().and_then(|s| s.parse::<u64>().ok()) {
        Some(master) => {
            log::info!("deterministic drift stream, seed {master}");
            DriftRng::seed_from_u64(master)
        }
        None => DriftRng::from_entropy(),
    };
    let telemetry = TelemetryState::from_seed(seed, &mut rng, Utc::now().timestamp());

    let state: SharedState = Arc::new(AppState {
        telemetry:    RwLock::new(telemetry),
        engine:       Mutex::new(DriftEngine::new(rng)),
        intelligence: ai::IntelligenceClient::from_env(),
    });

    tokio::spawn(drift_loop(state.clone()));

    let addr = env::var("LATTICE_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    log::info!("lattice server listening on {addr}");
    axum::serve(listener, routes::router(state)).await?;
    Ok(())
}

/// Read the seed document. A missing or malformed file still boots the
/// server; derived endpoints answer with the not-initialized error
/// until a valid seed is supplied.
fn load_seed(path: &str) -> SeedDocument {
    match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(err) => {
                log::error!("seed file {path} is malformed: {err}");
                SeedDocument::default()
            }
        },
        Err(err) => {
            log::warn!("seed file {path} not readable ({err}); starting unseeded");
            SeedDocument::default()
        }
    }
}

/// Background drift loop. Each pass holds both locks for the duration
/// of one tick so readers always observe a complete tick.
async fn drift_loop(state: SharedState) {
    let mut interval = tokio::time::interval(Duration::from_secs(TICK_INTERVAL_SECS));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let mut engine = state.engine.lock().await;
        let mut telemetry = state.telemetry.write().await;
        engine.tick(&mut telemetry, Utc::now().timestamp());
    }
}
