//! In-process cache of user rows keyed by e-mail, consulted when resolving
//! the current user from an access token.

use std::time::Duration;

use moka::future::Cache;

use models::user;

#[derive(Clone)]
pub struct UserCache {
    inner: Cache<String, user::Model>,
}

impl UserCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    fn key(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub async fn get(&self, email: &str) -> Option<user::Model> {
        self.inner.get(&Self::key(email)).await
    }

    pub async fn insert(&self, u: user::Model) {
        self.inner.insert(Self::key(&u.email), u).await;
    }

    pub async fn invalidate(&self, email: &str) {
        self.inner.invalidate(&Self::key(email)).await;
    }
}
