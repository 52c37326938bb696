use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap};
use sea_orm::DatabaseConnection;
use tracing::{debug, warn};

use configs::{AppConfig, MailTransport};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::cache::UserCache;
use service::mail::{EmailMessage, LogMailer, Mailer, OutboxMailer};
use service::rate_limiter::RateLimiter;
use service::storage::StorageRoot;

const USER_CACHE_CAPACITY: u64 = 10_000;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService<SeaOrmAuthRepository>>,
    pub storage: Arc<StorageRoot>,
    pub mailer: Arc<dyn Mailer>,
    pub user_cache: UserCache,
    pub me_limiter: Arc<RateLimiter>,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, config: AppConfig, storage: Arc<StorageRoot>) -> Self {
        let repo = Arc::new(SeaOrmAuthRepository::new(db.clone()));
        let auth = Arc::new(AuthService::new(repo, AuthConfig::from(&config.auth)));
        let mailer: Arc<dyn Mailer> = match config.mail.transport {
            MailTransport::Outbox => Arc::new(OutboxMailer::new(storage.clone(), &config.mail.from_name, &config.mail.from)),
            MailTransport::Log => Arc::new(LogMailer),
        };
        let user_cache = UserCache::new(Duration::from_secs(config.auth.user_cache_ttl_secs), USER_CACHE_CAPACITY);
        let me_limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        Self { db, config: Arc::new(config), auth, storage, mailer, user_cache, me_limiter }
    }

    /// Absolute base URL (with trailing slash) used in e-mail links.
    pub fn base_url(&self, headers: &HeaderMap) -> String {
        if let Some(url) = &self.config.server.public_base_url {
            return url.clone();
        }
        match headers.get(header::HOST).and_then(|v| v.to_str().ok()) {
            Some(host) => format!("http://{host}/"),
            None => format!("http://localhost:{}/", self.config.server.port),
        }
    }

    /// Deliver in the background; failures are logged only.
    pub fn send_mail(&self, message: EmailMessage) {
        let mailer = self.mailer.clone();
        crate::metrics::MAIL_QUEUED_TOTAL.inc();
        tokio::spawn(async move {
            let to = message.to.clone();
            match mailer.send(message).await {
                Ok(()) => debug!(%to, "mail queued"),
                Err(e) => warn!(%to, error = %e, "mail delivery failed"),
            }
        });
    }
}
