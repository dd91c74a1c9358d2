//! Presentation API
//!
//! Read-mostly HTTP surface over the published control state, plus the two
//! operator inputs: profile selection and surrogate reset.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use biochamber_common::{
    BiochamberError, ControlSnapshot, Preset, Profile, ResolvedReading, SensorReading,
};
use biochamber_surrogate::{ModelInfo, SurrogateCache};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::CustomSetpoints;
use crate::cycle::ProfileHandle;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub snapshot: watch::Receiver<ControlSnapshot>,
    pub profile: ProfileHandle,
    pub surrogate: Arc<SurrogateCache>,
}

/// Body of `PUT /api/v1/profile`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSelection {
    Preset(Preset),
    Custom(CustomSetpoints),
}

#[derive(Debug, Serialize)]
struct PresetEntry {
    preset: Preset,
    profile: Profile,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    efficiency: f64,
    features: [f64; biochamber_common::FEATURE_COUNT],
    trained_for: String,
}

/// Handler error mapped onto an HTTP status
pub struct ApiError(BiochamberError);

impl From<BiochamberError> for ApiError {
    fn from(err: BiochamberError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BiochamberError::InvalidProfile(_) | BiochamberError::Config(_) => {
                StatusCode::BAD_REQUEST
            }
            BiochamberError::StoreUnavailable(_) | BiochamberError::NoReading(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/state", get(get_state))
        .route("/api/v1/profile", get(get_profile).put(put_profile))
        .route("/api/v1/profiles", get(list_profiles))
        .route("/api/v1/estimator", get(estimator_info))
        .route("/api/v1/estimator/reset", post(reset_estimator))
        .route("/api/v1/estimator/predict", post(predict))
        .route("/api/v1/version", get(version))
        .layer(cors)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.snapshot.borrow();
    Json(serde_json::json!({
        "status": "healthy",
        "control": snapshot.status,
        "model_ready": state.surrogate.current().is_some(),
    }))
}

async fn get_state(State(state): State<AppState>) -> Json<ControlSnapshot> {
    Json(state.snapshot.borrow().clone())
}

async fn get_profile(State(state): State<AppState>) -> Json<Profile> {
    Json((*state.profile.snapshot()).clone())
}

async fn put_profile(
    State(state): State<AppState>,
    Json(selection): Json<ProfileSelection>,
) -> Result<Json<Profile>, ApiError> {
    let profile = match selection {
        ProfileSelection::Preset(preset) => state.profile.select(preset),
        ProfileSelection::Custom(c) => {
            let profile = Profile::custom(
                c.target_temperature,
                c.target_ph,
                c.target_dissolved_oxygen,
            )
            .map_err(BiochamberError::from)?;
            state.profile.replace(profile)?
        }
    };
    Ok(Json((*profile).clone()))
}

async fn list_profiles() -> Json<Vec<PresetEntry>> {
    Json(
        Preset::ALL
            .iter()
            .map(|&preset| PresetEntry {
                preset,
                profile: preset.profile(),
            })
            .collect(),
    )
}

async fn estimator_info(State(state): State<AppState>) -> Json<Option<ModelInfo>> {
    Json(state.surrogate.current().map(|m| m.info().clone()))
}

/// Drop the fitted model and refit against the active profile
async fn reset_estimator(State(state): State<AppState>) -> Result<Json<ModelInfo>, ApiError> {
    let profile = state.profile.snapshot();
    info!(profile = %profile.name, "Estimator reset via API");
    state.surrogate.reset();
    let model = state.surrogate.model(&profile).await?;
    Ok(Json(model.info().clone()))
}

/// Ad-hoc inference; missing fields count as zero
async fn predict(
    State(state): State<AppState>,
    Json(reading): Json<SensorReading>,
) -> Result<Json<PredictResponse>, ApiError> {
    let model = state.surrogate.model(&state.profile.snapshot()).await?;
    let features = reading.resolve(&ResolvedReading::ZERO).features();
    Ok(Json(PredictResponse {
        efficiency: model.predict(&features),
        features,
        trained_for: model.info().trained_for.clone(),
    }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "biochamber-controld",
        "version": crate::CONTROLD_VERSION,
        "description": "Closed-loop bioreactor control",
    }))
}
