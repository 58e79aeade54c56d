use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Storage used by the next upload: "local" or "remote".
    pub storage: String,
    pub remote_provider: Option<String>,
    pub pending_uploads: usize,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let remote = state.remote.current();

    Json(HealthResponse {
        status: "ok".to_string(),
        storage: if remote.is_some() { "remote" } else { "local" }.to_string(),
        remote_provider: remote.map(|store| store.provider_id().to_string()),
        pending_uploads: state.registry.len(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
