use axum::{extract::State, http::StatusCode, Json};
use tracing::error;

use common::types::{Health, Message};

use crate::errors::JsonApiError;
use crate::state::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Checks the database connection and the storage root.
#[utoipa::path(get, path = "/api/healthchecker", tag = "health", responses((status = 200, description = "Dependencies reachable", body = crate::openapi::MessageDoc), (status = 500, description = "Database or storage unavailable")))]
pub async fn healthchecker(State(state): State<ServerState>) -> Result<Json<Message>, JsonApiError> {
    if let Err(e) = state.db.ping().await {
        error!(error = %e, "database health check failed");
        return Err(JsonApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            Some("Error connecting to the database".into()),
        ));
    }
    if let Err(e) = state.storage.check_writable().await {
        error!(error = %e, "storage health check failed");
        return Err(JsonApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            Some("Storage root is not writable".into()),
        ));
    }
    Ok(Json(Message::new("Welcome to the Contacts API!")))
}
