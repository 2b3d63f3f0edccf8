//! HTTP route handlers.
//!
//! All handlers are thin - they delegate to the receiver facade and the
//! services for business logic. "Set" handlers power the receiver on before
//! applying a value, since its power state is unknown to the API.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::api::response::{api_ok, api_success};
use crate::api::AppState;
use crate::eiscp::{InputSelector, SubwooferLevel, VolumeLevel};
use crate::error::{ApiResult, EiscpError};
use crate::protocol_constants::SERVICE_ID;
use crate::services::profiles::{self, apply_profile, current_profile, device_info};

// ─────────────────────────────────────────────────────────────────────────────
// Request Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LevelQuery {
    level: Option<String>,
}

#[derive(Deserialize)]
struct NameQuery {
    name: Option<String>,
}

/// Parses a `level` query parameter, reporting bad input as a validation error.
fn parse_level(level: Option<&str>, what: &str) -> ApiResult<i32> {
    level
        .and_then(|l| l.trim().parse().ok())
        .ok_or_else(|| EiscpError::validation(format!("invalid {} level format", what)).into())
}

/// Extracts a non-empty `name` query parameter.
fn require_name(name: Option<&str>, what: &str) -> ApiResult<String> {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => Ok(n.to_string()),
        _ => Err(EiscpError::validation(format!("{} name cannot be empty", what)).into()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Creates the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/power", get(get_power))
        .route("/power/on", put(power_on))
        .route("/power/off", put(power_off))
        .route("/power/switch", put(power_switch))
        .route("/volume", get(get_volume).put(set_volume))
        .route("/volume/up", put(volume_up))
        .route("/volume/down", put(volume_down))
        .route("/subwoofer", get(get_subwoofer).put(set_subwoofer))
        .route("/subwoofer/up", put(subwoofer_up))
        .route("/subwoofer/down", put(subwoofer_down))
        .route("/input", get(get_input).put(set_input))
        .route("/profile", get(get_profile).put(set_profile))
        .route("/device", get(get_device))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Liveness probe. Does not touch the receiver.
async fn health_check() -> impl IntoResponse {
    api_success(json!({ "status": "ok", "service": SERVICE_ID }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Power Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn get_power(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let is_powered = state.receiver.query_power().await?;
    Ok(api_success(json!({ "isPowered": is_powered })))
}

async fn power_on(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.receiver.power_on().await?;
    Ok(api_success(json!({ "isPowered": true })))
}

async fn power_off(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.receiver.power_off().await?;
    Ok(api_success(json!({ "isPowered": false })))
}

async fn power_switch(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let is_powered = state.receiver.switch_power().await?;
    Ok(api_success(json!({ "isPowered": is_powered })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Volume Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn get_volume(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let level = state.receiver.query_volume().await?;
    Ok(api_success(json!({ "level": level })))
}

/// PUT /volume?level=n
async fn set_volume(
    State(state): State<AppState>,
    Query(query): Query<LevelQuery>,
) -> ApiResult<impl IntoResponse> {
    let level = VolumeLevel::new(parse_level(query.level.as_deref(), "volume")?)?;

    state.receiver.power_on().await?;
    state.receiver.set_volume(level.value().into()).await?;
    Ok(api_success(json!({ "level": level.value() })))
}

async fn volume_up(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.receiver.volume_up().await?;
    Ok(api_ok())
}

async fn volume_down(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.receiver.volume_down().await?;
    Ok(api_ok())
}

// ─────────────────────────────────────────────────────────────────────────────
// Subwoofer Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn get_subwoofer(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let level = state.receiver.query_subwoofer_level().await?;
    Ok(api_success(json!({ "level": level })))
}

/// PUT /subwoofer?level=n
async fn set_subwoofer(
    State(state): State<AppState>,
    Query(query): Query<LevelQuery>,
) -> ApiResult<impl IntoResponse> {
    let level = SubwooferLevel::new(parse_level(query.level.as_deref(), "subwoofer")?)?;

    state.receiver.power_on().await?;
    state
        .receiver
        .set_subwoofer_level(level.value().into())
        .await?;
    Ok(api_success(json!({ "level": level.value() })))
}

async fn subwoofer_up(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.receiver.subwoofer_up().await?;
    Ok(api_ok())
}

async fn subwoofer_down(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.receiver.subwoofer_down().await?;
    Ok(api_ok())
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn get_input(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let input = state.receiver.query_input_selector().await?;
    Ok(api_success(json!({ "input": input })))
}

/// PUT /input?name=x
async fn set_input(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> ApiResult<impl IntoResponse> {
    let input: InputSelector = require_name(query.name.as_deref(), "input")?.parse()?;

    state.receiver.power_on().await?;
    state.receiver.set_input_selector(input.name()).await?;
    Ok(api_success(json!({ "input": input })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /profile
///
/// Current input's profile with live volume and subwoofer levels.
async fn get_profile(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let profiles = state.config.read().profiles.clone();
    let profile = current_profile(&*state.receiver, &profiles).await?;
    Ok(api_success(profile))
}

/// PUT /profile?name=x
///
/// Powers on and applies the named profile's presets.
async fn set_profile(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> ApiResult<impl IntoResponse> {
    let name = require_name(query.name.as_deref(), "profile")?;
    let profile = profiles::find(&state.config.read().profiles, &name)
        .cloned()
        .ok_or_else(|| EiscpError::validation(format!("profile '{}' does not exist", name)))?;

    apply_profile(&*state.receiver, &profile).await?;
    Ok(api_success(profile))
}

/// GET /device
async fn get_device(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let profiles = state.config.read().profiles.clone();
    let info = device_info(&*state.receiver, &profiles).await?;
    Ok(api_success(info))
}
