use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{info, warn};

use common::types::Message;
use service::auth::domain::{ConfirmOutcome, LoginInput, SignupInput, TokenPair};
use service::mail::templates;
use service::rate_limiter::RateDecision;

use crate::errors::JsonApiError;
use crate::extract::{CurrentUser, ACCESS_COOKIE};
use crate::metrics::RATE_LIMITED_TOTAL;
use crate::routes::users::UserOut;
use crate::state::ServerState;

/// OAuth2-style password form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

fn access_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(ACCESS_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

#[utoipa::path(post, path = "/api/v1/auth/signup", tag = "auth", request_body = crate::openapi::SignupRequest, responses((status = 201, description = "Created", body = crate::openapi::UserDoc), (status = 409, description = "Account already exists"), (status = 422, description = "Validation Error")))]
pub async fn signup(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(input): Json<SignupInput>,
) -> Result<(StatusCode, Json<UserOut>), JsonApiError> {
    let created = state.auth.signup(input).await?;
    let token = state.auth.verification_token(&created.email)?;
    let base = state.base_url(&headers);
    state.send_mail(templates::verification_email(&created.email, &created.username, &base, &token));

    let row = models::user::find_by_email(&state.db, &created.email)
        .await
        .map_err(service::errors::ServiceError::from)?
        .ok_or_else(|| JsonApiError::internal("user vanished after signup"))?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[utoipa::path(post, path = "/api/v1/auth/login", tag = "auth", request_body(content = crate::openapi::LoginForm, content_type = "application/x-www-form-urlencoded"), responses((status = 200, description = "Token pair; also sets the access_token cookie", body = crate::openapi::TokenPairDoc), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Json<TokenPair>), JsonApiError> {
    let session = state.auth.login(LoginInput { login: form.username, password: form.password }).await?;
    let jar = jar.add(access_cookie(session.tokens.access_token.clone()));
    Ok((jar, Json(session.tokens)))
}

#[utoipa::path(post, path = "/api/v1/auth/refresh_token", tag = "auth", request_body = crate::openapi::RefreshRequestDoc, responses((status = 200, description = "Rotated token pair", body = crate::openapi::TokenPairDoc), (status = 401, description = "Invalid refresh token")))]
pub async fn refresh_token(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<RefreshRequest>,
) -> Result<(CookieJar, Json<TokenPair>), JsonApiError> {
    let session = state.auth.refresh(&input.refresh_token).await?;
    let jar = jar.add(access_cookie(session.tokens.access_token.clone()));
    Ok((jar, Json(session.tokens)))
}

#[utoipa::path(post, path = "/api/v1/auth/logout", tag = "auth", responses((status = 204, description = "Refresh tokens revoked"), (status = 401, description = "Unauthorized")), security(("bearer" = [])))]
pub async fn logout(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), JsonApiError> {
    state.auth.logout(user.id).await?;
    state.user_cache.invalidate(&user.email).await;
    let jar = jar.remove(Cookie::build(ACCESS_COOKIE).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}

#[utoipa::path(get, path = "/api/v1/auth/me", tag = "auth", responses((status = 200, description = "Current user", body = crate::openapi::UserDoc), (status = 401, description = "Unauthorized"), (status = 429, description = "Too Many Requests")), security(("bearer" = [])))]
pub async fn me(State(state): State<ServerState>, CurrentUser(user): CurrentUser) -> Result<Json<UserOut>, JsonApiError> {
    if let RateDecision::Limited { retry_after } = state.me_limiter.check(&user.id.to_string()) {
        RATE_LIMITED_TOTAL.inc();
        warn!(user_id = %user.id, "rate limit exceeded on /me");
        return Err(JsonApiError::too_many_requests(retry_after));
    }
    Ok(Json(user.into()))
}

#[utoipa::path(get, path = "/api/v1/auth/confirmed_email/{token}", tag = "auth", params(("token" = String, Path, description = "Verification token from the e-mail")), responses((status = 200, description = "Confirmed", body = crate::openapi::MessageDoc), (status = 400, description = "Verification error")))]
pub async fn confirmed_email(State(state): State<ServerState>, Path(token): Path<String>) -> Result<Json<Message>, JsonApiError> {
    let msg = match state.auth.confirm_email(&token).await? {
        ConfirmOutcome::Confirmed => "Email confirmed",
        ConfirmOutcome::AlreadyConfirmed => "Your email is already confirmed",
    };
    Ok(Json(Message::new(msg)))
}

#[utoipa::path(post, path = "/api/v1/auth/request_email", tag = "auth", request_body = crate::openapi::EmailRequestDoc, responses((status = 200, description = "Verification e-mail queued", body = crate::openapi::MessageDoc), (status = 404, description = "User not found"), (status = 409, description = "Already confirmed")))]
pub async fn request_email(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(input): Json<EmailRequest>,
) -> Result<Json<Message>, JsonApiError> {
    let (user, token) = state.auth.request_confirmation(&input.email).await?;
    let base = state.base_url(&headers);
    state.send_mail(templates::verification_email(&user.email, &user.username, &base, &token));
    Ok(Json(Message::new("Check your email for confirmation.")))
}

#[utoipa::path(post, path = "/api/v1/auth/request_password_reset", tag = "auth", request_body = crate::openapi::EmailRequestDoc, responses((status = 202, description = "Accepted", body = crate::openapi::MessageDoc)))]
pub async fn request_password_reset(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(input): Json<EmailRequest>,
) -> Result<(StatusCode, Json<Message>), JsonApiError> {
    if let Some((user, token)) = state.auth.password_reset_token(&input.email).await? {
        let base = state.base_url(&headers);
        state.send_mail(templates::password_reset_email(&user.email, &user.username, &base, &token));
        info!(user_id = %user.id, "password_reset_requested");
    }
    // same answer for unknown addresses
    Ok((StatusCode::ACCEPTED, Json(Message::new("If an account with that email exists, a password reset link has been sent."))))
}

#[utoipa::path(post, path = "/api/v1/auth/reset_password/{token}", tag = "auth", params(("token" = String, Path, description = "Reset token from the e-mail")), request_body = crate::openapi::ResetPasswordDoc, responses((status = 200, description = "Password changed", body = crate::openapi::MessageDoc), (status = 400, description = "Invalid or expired token"), (status = 404, description = "User not found")))]
pub async fn reset_password(
    State(state): State<ServerState>,
    Path(token): Path<String>,
    Json(input): Json<ResetPasswordRequest>,
) -> Result<Json<Message>, JsonApiError> {
    let user = state.auth.reset_password(&token, &input.new_password).await?;
    state.user_cache.invalidate(&user.email).await;
    Ok(Json(Message::new("Password has been reset successfully.")))
}
