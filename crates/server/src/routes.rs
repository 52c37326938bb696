use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use service::storage::AVATARS_DIR;

use crate::metrics;
use crate::openapi::ApiDoc;
use crate::state::ServerState;

pub mod auth;
pub mod contacts;
pub mod health;
pub mod users;

// multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

fn build_cors(cfg: &configs::CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Build the full application router: public, auth, users and contacts routes.
pub fn build_router(state: ServerState) -> Router {
    let avatar_limit = state.config.storage.max_avatar_bytes + MULTIPART_OVERHEAD;
    let avatars = ServeDir::new(state.storage.path().join(AVATARS_DIR));
    let cors = build_cors(&state.config.cors);

    // Public routes (health, metrics, avatars)
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/api/healthchecker", get(health::healthchecker))
        .route("/metrics", get(metrics::metrics_handler))
        .nest_service("/static/avatars", avatars);

    let auth_routes = Router::new()
        .route("/api/v1/auth/signup", post(auth::signup))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh_token", post(auth::refresh_token))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/confirmed_email/:token", get(auth::confirmed_email))
        .route("/api/v1/auth/request_email", post(auth::request_email))
        .route("/api/v1/auth/request_password_reset", post(auth::request_password_reset))
        .route("/api/v1/auth/reset_password/:token", post(auth::reset_password));

    let user_routes = Router::new()
        .route("/api/v1/users", get(users::list_users))
        .route(
            "/api/v1/users/avatar",
            patch(users::update_avatar).layer(DefaultBodyLimit::max(avatar_limit)),
        )
        .route("/api/v1/users/:user_id", get(users::get_user))
        .route("/api/v1/users/:user_id/role", patch(users::set_role));

    let contact_routes = Router::new()
        .route("/api/v1/contacts", post(contacts::create_contact).get(contacts::list_contacts))
        .route("/api/v1/contacts/search", get(contacts::search_contacts))
        .route("/api/v1/contacts/upcoming_birthdays", get(contacts::upcoming_birthdays))
        .route(
            "/api/v1/contacts/:contact_id",
            get(contacts::get_contact)
                .patch(contacts::update_contact)
                .delete(contacts::delete_contact),
        );

    // Compose
    public
        .merge(auth_routes)
        .merge(user_routes)
        .merge(contact_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(middleware::from_fn(metrics::track))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时记录状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
