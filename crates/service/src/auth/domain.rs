use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::user::Role;

/// Signup input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Login input; `login` is a username or an e-mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub login: String,
    pub password: String,
}

/// Domain user (business view)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub confirmed: bool,
    pub role: Role,
}

/// Fields needed to create an account
#[derive(Debug, Clone)]
pub struct NewAuthUser {
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
}

/// Domain credentials (hashed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: Uuid,
    pub password_hash: String,
    pub password_algorithm: String,
}

/// Issued on login and on refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Login result (session)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: AuthUser,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    AlreadyConfirmed,
}
