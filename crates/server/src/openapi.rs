use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct MessageDoc { pub message: String }

#[derive(ToSchema)]
pub struct SignupRequest { pub username: String, pub email: String, pub password: String, pub avatar: Option<String> }

#[derive(ToSchema)]
pub struct LoginForm { pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct TokenPairDoc { pub access_token: String, pub refresh_token: String, pub token_type: String }

#[derive(ToSchema)]
pub struct RefreshRequestDoc { pub refresh_token: String }

#[derive(ToSchema)]
pub struct EmailRequestDoc { pub email: String }

#[derive(ToSchema)]
pub struct ResetPasswordDoc { pub new_password: String }

#[derive(ToSchema)]
pub struct UserDoc {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub confirmed: bool,
    /// `admin`, `moderator` or `user`
    pub role: String,
    pub created_at: String,
}

#[derive(ToSchema)]
pub struct RoleUpdateDoc { pub role: String }

#[derive(ToSchema)]
pub struct AvatarUpload {
    #[schema(format = Binary)]
    pub file: String,
}

#[derive(ToSchema)]
pub struct ContactCreateDoc {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    /// `YYYY-MM-DD`
    pub birthday: String,
    pub other_info: Option<String>,
}

#[derive(ToSchema)]
pub struct ContactUpdateDoc {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub birthday: Option<String>,
    /// `null` clears the stored value.
    pub other_info: Option<String>,
}

#[derive(ToSchema)]
pub struct ContactDoc {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birthday: String,
    pub other_info: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health,
        crate::routes::health::healthchecker,
        crate::routes::auth::signup,
        crate::routes::auth::login,
        crate::routes::auth::refresh_token,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::confirmed_email,
        crate::routes::auth::request_email,
        crate::routes::auth::request_password_reset,
        crate::routes::auth::reset_password,
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        crate::routes::users::update_avatar,
        crate::routes::users::set_role,
        crate::routes::contacts::create_contact,
        crate::routes::contacts::list_contacts,
        crate::routes::contacts::search_contacts,
        crate::routes::contacts::upcoming_birthdays,
        crate::routes::contacts::get_contact,
        crate::routes::contacts::update_contact,
        crate::routes::contacts::delete_contact,
    ),
    components(
        schemas(
            HealthResponse,
            MessageDoc,
            SignupRequest,
            LoginForm,
            TokenPairDoc,
            RefreshRequestDoc,
            EmailRequestDoc,
            ResetPasswordDoc,
            UserDoc,
            RoleUpdateDoc,
            AvatarUpload,
            ContactCreateDoc,
            ContactUpdateDoc,
            ContactDoc,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "users"),
        (name = "contacts")
    )
)]
pub struct ApiDoc;
