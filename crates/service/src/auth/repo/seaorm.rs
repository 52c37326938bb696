use chrono::Duration;
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use models::{token, user, user_credentials};

use crate::auth::domain::{AuthUser, Credentials, NewAuthUser};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn to_auth_user(u: user::Model) -> AuthUser {
    AuthUser { id: u.id, role: u.role(), username: u.username, email: u.email, confirmed: u.confirmed }
}

fn to_credentials(c: user_credentials::Model) -> Credentials {
    Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(user::find_by_email(&self.db, email).await?.map(to_auth_user))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(user::find_by_username(&self.db, username).await?.map(to_auth_user))
    }

    async fn create_user(&self, input: NewAuthUser) -> Result<AuthUser, AuthError> {
        let created = user::create(
            &self.db,
            user::NewUser {
                username: input.username,
                email: input.email,
                avatar: input.avatar,
                confirmed: false,
                role: user::Role::User,
            },
        )
        .await?;
        Ok(to_auth_user(created))
    }

    async fn confirm_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(user::set_confirmed(&self.db, email).await?.map(to_auth_user))
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        Ok(user_credentials::find_for_user(&self.db, user_id).await?.map(to_credentials))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = user_credentials::set_password(&self.db, user_id, password_hash, &password_algorithm)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(to_credentials(c))
    }

    async fn issue_refresh_token(&self, user_id: Uuid, ttl: Duration) -> Result<String, AuthError> {
        let t = token::issue(&self.db, user_id, token::REFRESH, ttl)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(t.token)
    }

    async fn consume_refresh_token(&self, raw: &str) -> Result<Option<AuthUser>, AuthError> {
        let Some(t) = token::consume(&self.db, raw, token::REFRESH)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))? else { return Ok(None) };
        let owner = user::Entity::find_by_id(t.user_id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(owner.map(to_auth_user))
    }

    async fn revoke_refresh_tokens(&self, user_id: Uuid) -> Result<u64, AuthError> {
        token::revoke_all(&self.db, user_id, token::REFRESH)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))
    }
}
