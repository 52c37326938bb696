use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, NewAuthUser};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn create_user(&self, user: NewAuthUser) -> Result<AuthUser, AuthError>;
    /// Returns the updated user, or `None` when no account uses `email`.
    async fn confirm_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;

    async fn issue_refresh_token(&self, user_id: Uuid, ttl: Duration) -> Result<String, AuthError>;
    /// Single use: a consumed token cannot be presented again.
    async fn consume_refresh_token(&self, token: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn revoke_refresh_tokens(&self, user_id: Uuid) -> Result<u64, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use chrono::{DateTime, Utc};
    use models::user::Role;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>,                       // key: email
        creds: Mutex<HashMap<Uuid, Credentials>>,                      // key: user_id
        refresh: Mutex<HashMap<String, (Uuid, DateTime<Utc>)>>,        // key: token
    }

    impl MockAuthRepository {
        fn user_by_id(&self, id: Uuid) -> Option<AuthUser> {
            self.users.lock().unwrap().values().find(|u| u.id == id).cloned()
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(&email.trim().to_lowercase()).cloned())
        }

        async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|u| u.username == username.trim()).cloned())
        }

        async fn create_user(&self, user: NewAuthUser) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            let email = user.email.trim().to_lowercase();
            if users.contains_key(&email) || users.values().any(|u| u.username == user.username) {
                return Err(AuthError::Conflict("Account already exists".into()));
            }
            let created = AuthUser { id: Uuid::new_v4(), username: user.username, email: email.clone(), confirmed: false, role: Role::User };
            users.insert(email, created.clone());
            Ok(created)
        }

        async fn confirm_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let mut users = self.users.lock().unwrap();
            Ok(users.get_mut(&email.trim().to_lowercase()).map(|u| {
                u.confirmed = true;
                u.clone()
            }))
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }

        async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
            let mut creds = self.creds.lock().unwrap();
            let c = Credentials { user_id, password_hash, password_algorithm };
            creds.insert(user_id, c.clone());
            Ok(c)
        }

        async fn issue_refresh_token(&self, user_id: Uuid, ttl: Duration) -> Result<String, AuthError> {
            let token = Uuid::new_v4().simple().to_string();
            self.refresh.lock().unwrap().insert(token.clone(), (user_id, Utc::now() + ttl));
            Ok(token)
        }

        async fn consume_refresh_token(&self, token: &str) -> Result<Option<AuthUser>, AuthError> {
            let entry = self.refresh.lock().unwrap().remove(token);
            match entry {
                Some((user_id, expires_at)) if expires_at > Utc::now() => Ok(self.user_by_id(user_id)),
                _ => Ok(None),
            }
        }

        async fn revoke_refresh_tokens(&self, user_id: Uuid) -> Result<u64, AuthError> {
            let mut refresh = self.refresh.lock().unwrap();
            let before = refresh.len();
            refresh.retain(|_, (uid, _)| *uid != user_id);
            Ok((before - refresh.len()) as u64)
        }
    }
}
