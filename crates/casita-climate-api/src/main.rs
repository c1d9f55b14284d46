//! Casita Climate - thermostat entity API server
//!
//! Hosts climate entities over simulated thermostat channels.

use axum::{
    extract::{Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zigbee_climate::{
    ClimateError, HvacMode, Preset, QuirkRule, SetTemperature, ThermostatAttribute,
};

mod simulator;
mod websocket;

use simulator::ClimateHub;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<ClimateHub>,
}

/// API response wrapper using serde_json::Value for flexibility
#[derive(Serialize)]
struct ApiResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiResponse {
    fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: Some(serde_json::to_value(data).unwrap_or(serde_json::Value::Null)),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn error_response(e: &ClimateError) -> ApiResult {
    let status = match e {
        ClimateError::EntityNotFound(_) => StatusCode::NOT_FOUND,
        ClimateError::NotAThermostat(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::error(e.to_string())))
}

/// Set HVAC mode request
#[derive(Deserialize)]
struct HvacModeRequest {
    hvac_mode: HvacMode,
}

/// Set preset request
#[derive(Deserialize)]
struct PresetRequest {
    preset_mode: Preset,
}

/// Simulated attribute report
#[derive(Deserialize)]
struct AttributeReport {
    attribute: ThermostatAttribute,
    value: Option<i64>,
}

/// Health check
async fn health() -> impl IntoResponse {
    Json(ApiResponse::success("ok"))
}

/// List all climate entities
async fn list_climate(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.hub.states().await))
}

/// Get one climate entity
async fn get_climate(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.hub.get(&id) {
        Ok(entity) => {
            let climate = entity.thermostat.lock().await.state();
            (StatusCode::OK, Json(ApiResponse::success(climate)))
        }
        Err(e) => error_response(&e),
    }
}

/// Set target temperature(s)
async fn set_temperature(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetTemperature>,
) -> impl IntoResponse {
    match state.hub.get(&id) {
        Ok(entity) => {
            let thermostat = entity.thermostat.lock().await;
            thermostat.set_temperature(req).await;
            (StatusCode::OK, Json(ApiResponse::success(thermostat.state())))
        }
        Err(e) => error_response(&e),
    }
}

/// Set HVAC mode
async fn set_hvac_mode(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<HvacModeRequest>,
) -> impl IntoResponse {
    match state.hub.get(&id) {
        Ok(entity) => {
            let thermostat = entity.thermostat.lock().await;
            thermostat.set_hvac_mode(req.hvac_mode).await;
            (StatusCode::OK, Json(ApiResponse::success(thermostat.state())))
        }
        Err(e) => error_response(&e),
    }
}

/// Set preset mode
async fn set_preset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PresetRequest>,
) -> impl IntoResponse {
    match state.hub.get(&id) {
        Ok(entity) => {
            let mut thermostat = entity.thermostat.lock().await;
            thermostat.set_preset_mode(req.preset_mode).await;
            (StatusCode::OK, Json(ApiResponse::success(thermostat.state())))
        }
        Err(e) => error_response(&e),
    }
}

/// Change a simulated attribute as if the device reported it
async fn report_attribute(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AttributeReport>,
) -> impl IntoResponse {
    match state
        .hub
        .report_attribute(&id, req.attribute, req.value)
        .await
    {
        Ok(climate) => (StatusCode::OK, Json(ApiResponse::success(climate))),
        Err(e) => error_response(&e),
    }
}

/// List registered quirk rules
async fn list_quirks(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.hub.quirk_rules()))
}

/// Register a quirk rule for thermostats added later
async fn add_quirk(
    State(state): State<AppState>,
    Json(rule): Json<QuirkRule>,
) -> impl IntoResponse {
    match state.hub.add_quirk_rule(rule).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(state.hub.quirk_rules())),
        ),
        Err(e) => error_response(&e),
    }
}

/// WebSocket handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| websocket::handle_socket(socket, state))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "casita_climate_api=debug,zigbee_climate=debug,info".into()),
        )
        .init();

    tracing::info!("Starting Casita Climate API server");

    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());
    let port: u16 = match std::env::var("CLIMATE_PORT") {
        Ok(port) => port.parse()?,
        Err(_) => 3000,
    };

    let hub = ClimateHub::load(std::path::Path::new(&data_dir)).await;
    tracing::info!("Loaded {} climate entities from {}", hub.len(), data_dir);

    let state = AppState { hub: Arc::new(hub) };

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/v1/climate", get(list_climate))
        .route("/api/v1/climate/:id", get(get_climate))
        .route("/api/v1/climate/:id/temperature", post(set_temperature))
        .route("/api/v1/climate/:id/hvac-mode", post(set_hvac_mode))
        .route("/api/v1/climate/:id/preset", post(set_preset))
        .route("/api/v1/climate/:id/attributes", post(report_attribute))
        .route("/api/v1/quirks", get(list_quirks).post(add_quirk))
        // WebSocket
        .route("/ws", get(ws_handler))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
