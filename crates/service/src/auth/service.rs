use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, instrument, warn};

use super::domain::{AuthSession, AuthUser, ConfirmOutcome, LoginInput, NewAuthUser, SignupInput, TokenPair};
use super::errors::AuthError;
use super::password;
use super::repository::AuthRepository;
use super::tokens::{JwtCodec, TokenScope};

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub password_algorithm: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub verification_ttl: Duration,
    pub reset_ttl: Duration,
}

impl AuthConfig {
    /// Defaults matching the `[auth]` section, with the given secret.
    pub fn with_secret(secret: &str) -> Self {
        Self::from(&configs::AuthConfig { jwt_secret: secret.to_string(), ..Default::default() })
    }
}

impl From<&configs::AuthConfig> for AuthConfig {
    fn from(c: &configs::AuthConfig) -> Self {
        Self {
            jwt_secret: c.jwt_secret.clone(),
            password_algorithm: password::ALGORITHM.into(),
            access_ttl: Duration::minutes(c.access_token_minutes),
            refresh_ttl: Duration::days(c.refresh_token_days),
            verification_ttl: Duration::minutes(c.verification_token_minutes),
            reset_ttl: Duration::minutes(c.password_reset_minutes),
        }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
    jwt: JwtCodec,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self {
        let jwt = JwtCodec::new(&cfg.jwt_secret);
        Self { repo, cfg, jwt }
    }

    /// Register a new, unconfirmed user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::SignupInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::with_secret("secret"));
    /// let input = SignupInput { username: "tester".into(), email: "user@example.com".into(), password: "Secret123".into(), avatar: None };
    /// let user = tokio_test::block_on(svc.signup(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// assert!(!user.confirmed);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email, username = %input.username))]
    pub async fn signup(&self, input: SignupInput) -> Result<AuthUser, AuthError> {
        models::user::validate_username(&input.username)?;
        models::user::validate_email(&input.email)?;
        password::validate(&input.password)?;

        if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict("Account already exists".into()));
        }
        if self.repo.find_user_by_username(&input.username).await?.is_some() {
            return Err(AuthError::Conflict("Username already taken".into()));
        }

        let hash = password::hash(&input.password)?;
        let user = self
            .repo
            .create_user(NewAuthUser { username: input.username, email: input.email, avatar: input.avatar })
            .await?;
        self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user.id, email = %user.email, "user_registered");
        Ok(user)
    }

    /// Authenticate by username or e-mail and issue an access/refresh pair.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{SignupInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::with_secret("secret"));
    /// let signup = SignupInput { username: "ann".into(), email: "u@e.com".into(), password: "Passw0rd".into(), avatar: None };
    /// tokio_test::block_on(svc.signup(signup)).unwrap();
    /// let token = svc.verification_token("u@e.com").unwrap();
    /// tokio_test::block_on(svc.confirm_email(&token)).unwrap();
    /// let session = tokio_test::block_on(svc.login(LoginInput { login: "ann".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert_eq!(session.tokens.token_type, "bearer");
    /// ```
    #[instrument(skip(self, input), fields(login = %input.login))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = match self.repo.find_user_by_username(&input.login).await? {
            Some(u) => Some(u),
            None => self.repo.find_user_by_email(&input.login).await?,
        };
        let user = user.ok_or_else(|| AuthError::Unauthorized("Invalid username or email".into()))?;
        if !user.confirmed {
            return Err(AuthError::Unauthorized("Email is not verified".into()));
        }

        let cred = self
            .repo
            .get_credentials(user.id)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Invalid password".into()))?;
        if !password::verify(&input.password, &cred.password_hash)? {
            warn!(user_id = %user.id, "login with wrong password");
            return Err(AuthError::Unauthorized("Invalid password".into()));
        }

        let tokens = self.issue_pair(&user).await?;
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, tokens })
    }

    /// Exchange a refresh token for a new pair. The presented token is spent.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let user = self
            .repo
            .consume_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Invalid refresh token".into()))?;
        let tokens = self.issue_pair(&user).await?;
        Ok(AuthSession { user, tokens })
    }

    /// Revoke every refresh token of the user.
    pub async fn logout(&self, user_id: uuid::Uuid) -> Result<u64, AuthError> {
        let revoked = self.repo.revoke_refresh_tokens(user_id).await?;
        info!(%user_id, revoked, "user_logged_out");
        Ok(revoked)
    }

    async fn issue_pair(&self, user: &AuthUser) -> Result<TokenPair, AuthError> {
        let access_token = self.jwt.issue(&user.email, TokenScope::Access, self.cfg.access_ttl)?;
        let refresh_token = self.repo.issue_refresh_token(user.id, self.cfg.refresh_ttl).await?;
        Ok(TokenPair { access_token, refresh_token, token_type: "bearer".into() })
    }

    /// E-mail address carried by a valid access token.
    pub fn access_subject(&self, access_token: &str) -> Result<String, AuthError> {
        self.jwt
            .verify(access_token, TokenScope::Access)
            .map(|c| c.sub)
            .map_err(|_| AuthError::Unauthorized("Could not validate credentials".into()))
    }

    pub fn verification_token(&self, email: &str) -> Result<String, AuthError> {
        self.jwt.issue(&email.trim().to_lowercase(), TokenScope::Verification, self.cfg.verification_ttl)
    }

    #[instrument(skip_all)]
    pub async fn confirm_email(&self, token: &str) -> Result<ConfirmOutcome, AuthError> {
        let claims = self.jwt.verify(token, TokenScope::Verification)?;
        let user = self
            .repo
            .find_user_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::Verification)?;
        if user.confirmed {
            return Ok(ConfirmOutcome::AlreadyConfirmed);
        }
        self.repo.confirm_email(&claims.sub).await?.ok_or(AuthError::Verification)?;
        info!(user_id = %user.id, "email_confirmed");
        Ok(ConfirmOutcome::Confirmed)
    }

    /// Returns the user and a fresh verification token to mail out.
    pub async fn request_confirmation(&self, email: &str) -> Result<(AuthUser, String), AuthError> {
        let user = self
            .repo
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found".into()))?;
        if user.confirmed {
            return Err(AuthError::Conflict("Your email is already confirmed".into()));
        }
        let token = self.verification_token(&user.email)?;
        Ok((user, token))
    }

    /// Reset token for an existing account; `None` when the e-mail is unknown.
    pub async fn password_reset_token(&self, email: &str) -> Result<Option<(AuthUser, String)>, AuthError> {
        let Some(user) = self.repo.find_user_by_email(email).await? else {
            debug!("password reset requested for unknown email");
            return Ok(None);
        };
        let token = self.jwt.issue(&user.email, TokenScope::PasswordReset, self.cfg.reset_ttl)?;
        Ok(Some((user, token)))
    }

    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<AuthUser, AuthError> {
        let claims = self
            .jwt
            .verify(token, TokenScope::PasswordReset)
            .map_err(|_| AuthError::InvalidToken("Invalid or expired token.".into()))?;
        let user = self
            .repo
            .find_user_by_email(&claims.sub)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found.".into()))?;
        password::validate(new_password)?;
        let hash = password::hash(new_password)?;
        self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        self.repo.revoke_refresh_tokens(user.id).await?;
        info!(user_id = %user.id, "password_reset");
        Ok(user)
    }
}
