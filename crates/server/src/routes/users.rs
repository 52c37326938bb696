use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::user::{self, Role};
use service::pagination::Pagination;
use service::user_service;

use crate::errors::JsonApiError;
use crate::extract::{require_role, CurrentUser};
use crate::state::ServerState;

/// Public view of an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserOut {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub confirmed: bool,
    pub role: Role,
    pub created_at: DateTime<FixedOffset>,
}

impl From<user::Model> for UserOut {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            role: u.role(),
            username: u.username,
            email: u.email,
            avatar: u.avatar,
            confirmed: u.confirmed,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

#[utoipa::path(get, path = "/api/v1/users", tag = "users", params(("skip" = Option<u64>, Query, description = "Rows to skip"), ("limit" = Option<u64>, Query, description = "Page size, 1 to 100")), responses((status = 200, description = "Users", body = [crate::openapi::UserDoc]), (status = 403, description = "Forbidden")), security(("bearer" = [])))]
pub async fn list_users(
    State(state): State<ServerState>,
    CurrentUser(me): CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<UserOut>>, JsonApiError> {
    require_role(&me, &[Role::Admin, Role::Moderator])?;
    let users = user_service::list_users(&state.db, page).await?;
    Ok(Json(users.into_iter().map(UserOut::from).collect()))
}

#[utoipa::path(get, path = "/api/v1/users/{user_id}", tag = "users", params(("user_id" = Uuid, Path, description = "User id")), responses((status = 200, description = "User", body = crate::openapi::UserDoc), (status = 404, description = "User not found.")), security(("bearer" = [])))]
pub async fn get_user(
    State(state): State<ServerState>,
    CurrentUser(_me): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserOut>, JsonApiError> {
    user_service::get_user(&state.db, user_id)
        .await?
        .map(|u| Json(u.into()))
        .ok_or_else(|| JsonApiError::not_found("User not found."))
}

/// Multipart upload with a single `file` field.
#[utoipa::path(patch, path = "/api/v1/users/avatar", tag = "users", request_body(content = crate::openapi::AvatarUpload, content_type = "multipart/form-data"), responses((status = 200, description = "Updated user", body = crate::openapi::UserDoc), (status = 422, description = "Unsupported or oversized image")), security(("bearer" = [])))]
pub async fn update_avatar(
    State(state): State<ServerState>,
    CurrentUser(me): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<UserOut>, JsonApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| JsonApiError::bad_request(e.to_string()))? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| JsonApiError::bad_request(e.to_string()))?;
        let url = user_service::save_avatar(&state.storage, me.id, &content_type, &bytes, state.config.storage.max_avatar_bytes).await?;
        let updated = user_service::update_avatar(&state.db, me.id, &url).await?;
        state.user_cache.insert(updated.clone()).await;
        return Ok(Json(updated.into()));
    }
    Err(JsonApiError::validation("multipart field `file` is required"))
}

#[utoipa::path(patch, path = "/api/v1/users/{user_id}/role", tag = "users", params(("user_id" = Uuid, Path, description = "User id")), request_body = crate::openapi::RoleUpdateDoc, responses((status = 200, description = "Updated user", body = crate::openapi::UserDoc), (status = 403, description = "Forbidden"), (status = 404, description = "User not found.")), security(("bearer" = [])))]
pub async fn set_role(
    State(state): State<ServerState>,
    CurrentUser(me): CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(input): Json<RoleUpdate>,
) -> Result<Json<UserOut>, JsonApiError> {
    require_role(&me, &[Role::Admin])?;
    let updated = user_service::set_role(&state.db, user_id, input.role)
        .await
        .map_err(|e| match e {
            service::errors::ServiceError::NotFound(_) => JsonApiError::not_found("User not found."),
            other => other.into(),
        })?;
    state.user_cache.invalidate(&updated.email).await;
    Ok(Json(updated.into()))
}
