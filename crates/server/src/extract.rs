use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use models::user::{self, Role};
use service::errors::ServiceError;

use crate::errors::JsonApiError;
use crate::state::ServerState;

/// Cookie set by login, read when no `Authorization` header is sent.
pub const ACCESS_COOKIE: &str = "access_token";

const CREDENTIALS_ERROR: &str = "Could not validate credentials";

/// The authenticated user behind the request's access token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

/// `Authorization: Bearer <jwt>`, falling back to the access cookie.
pub fn access_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    bearer.or_else(|| CookieJar::from_headers(headers).get(ACCESS_COOKIE).map(|c| c.value().to_string()))
}

#[axum::async_trait]
impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let token = access_token(&parts.headers).ok_or_else(|| JsonApiError::unauthorized(CREDENTIALS_ERROR))?;
        let email = state.auth.access_subject(&token)?;

        if let Some(cached) = state.user_cache.get(&email).await {
            return Ok(CurrentUser(cached));
        }
        let found = user::find_by_email(&state.db, &email)
            .await
            .map_err(ServiceError::from)?
            .ok_or_else(|| JsonApiError::unauthorized(CREDENTIALS_ERROR))?;
        debug!(user_id = %found.id, "user loaded from database");
        state.user_cache.insert(found.clone()).await;
        Ok(CurrentUser(found))
    }
}

pub fn require_role(user: &user::Model, allowed: &[Role]) -> Result<(), JsonApiError> {
    if allowed.contains(&user.role()) {
        Ok(())
    } else {
        Err(JsonApiError::forbidden())
    }
}
