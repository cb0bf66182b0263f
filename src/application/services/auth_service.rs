//! Authentication Service
//!
//! Handles registration, login, JWT issuing and refresh-token sessions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::dto::request::RegisterRequest;
use crate::application::dto::response::TokenResponse;
use crate::config::JwtSettings;
use crate::domain::{Role, Session, SessionRepository, User, UserRepository};
use crate::shared::error::AppError;
use crate::shared::password::{hash_password, verify_password};

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new student account and open a session
    async fn register(&self, request: RegisterRequest) -> Result<(User, AuthTokens), AuthError>;

    /// Authenticate with email and password
    async fn login(
        &self,
        email: &str,
        password: &str,
        user_agent: Option<String>,
    ) -> Result<(User, AuthTokens), AuthError>;

    /// Exchange a refresh token for a new token pair (rotation)
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;

    /// Revoke the session behind a refresh token
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;

    /// Change password and revoke every session of the user
    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    async fn is_email_available(&self, email: &str) -> Result<bool, AuthError>;
}

/// Authentication tokens
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

impl From<AuthTokens> for TokenResponse {
    fn from(tokens: AuthTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Roles held when the token was issued
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// JWT ID for token revocation tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Decode and validate an access token.
pub fn decode_access_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is locked. Please try again later.")]
    AccountLocked,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Current password is incorrect")]
    IncorrectPassword,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Session not found or expired")]
    SessionNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::InvalidToken
            | AuthError::SessionNotFound => AppError::Unauthorized(err.to_string()),
            AuthError::AccountLocked => AppError::Forbidden(err.to_string()),
            AuthError::EmailTaken | AuthError::UsernameTaken => AppError::Conflict(err.to_string()),
            AuthError::IncorrectPassword => AppError::BadRequest(err.to_string()),
            AuthError::UserNotFound => AppError::NotFound(err.to_string()),
            AuthError::Repository(e) => e,
        }
    }
}

/// AuthService implementation
pub struct AuthServiceImpl<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    jwt_settings: JwtSettings,
}

impl<U, S> AuthServiceImpl<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, jwt_settings: JwtSettings) -> Self {
        Self {
            user_repo,
            session_repo,
            jwt_settings,
        }
    }

    /// Generate access and refresh tokens
    fn generate_tokens(&self, user: &User) -> Result<AuthTokens, AuthError> {
        let now = Utc::now();
        let access_expiry = now + Duration::minutes(self.jwt_settings.access_token_expiry_minutes);

        let access_claims = Claims {
            sub: user.id.to_string(),
            roles: user.roles.clone(),
            exp: access_expiry.timestamp(),
            iat: now.timestamp(),
            jti: Some(Uuid::new_v4().to_string()),
        };

        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.jwt_settings.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        // Opaque refresh token, only its hash is stored
        let refresh_token = format!("{}.{}", Uuid::new_v4(), Uuid::new_v4());

        Ok(AuthTokens {
            access_token,
            refresh_token,
            expires_in: self.jwt_settings.access_token_expiry_minutes * 60,
            token_type: "Bearer".to_string(),
        })
    }

    fn refresh_expiry(&self) -> chrono::DateTime<Utc> {
        Utc::now() + Duration::days(self.jwt_settings.refresh_token_expiry_days)
    }

    /// Issue tokens and persist the refresh session.
    async fn open_session(
        &self,
        user: &User,
        user_agent: Option<String>,
    ) -> Result<AuthTokens, AuthError> {
        let tokens = self.generate_tokens(user)?;
        let mut session = Session::new(
            user.id,
            hash_refresh_token(&tokens.refresh_token),
            self.refresh_expiry(),
        );
        session.user_agent = user_agent;
        self.session_repo.create(&session).await?;
        Ok(tokens)
    }
}

/// Hash refresh token for storage
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl<U, S> AuthService for AuthServiceImpl<U, S>
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
{
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn register(&self, request: RegisterRequest) -> Result<(User, AuthTokens), AuthError> {
        let email = request.email.trim().to_lowercase();
        let username = request.username.trim().to_string();

        if self.user_repo.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }
        if self.user_repo.username_exists(&username).await? {
            return Err(AuthError::UsernameTaken);
        }

        let user = User {
            id: Uuid::now_v7(),
            username,
            email,
            password_hash: hash_password(&request.password)?,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            bio: None,
            profile_picture_path: None,
            created_at: Utc::now(),
            last_login_at: None,
            lockout_end: None,
            roles: vec![Role::Student],
        };

        let created = self.user_repo.create(&user).await?;
        let tokens = self.open_session(&created, None).await?;

        info!(user_id = %created.id, "User registered");
        Ok((created, tokens))
    }

    #[instrument(skip(self, password, user_agent))]
    async fn login(
        &self,
        email: &str,
        password: &str,
        user_agent: Option<String>,
    ) -> Result<(User, AuthTokens), AuthError> {
        let mut user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let now = Utc::now();
        if user.is_locked_at(now) {
            warn!(user_id = %user.id, "Login attempt on locked account");
            return Err(AuthError::AccountLocked);
        }

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.user_repo.record_login(user.id, now).await?;
        user.last_login_at = Some(now);

        let tokens = self.open_session(&user, user_agent).await?;
        info!(user_id = %user.id, "User logged in");
        Ok((user, tokens))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let session = self
            .session_repo
            .find_by_token_hash(&hash_refresh_token(refresh_token))
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if !session.is_active() {
            return Err(AuthError::TokenExpired);
        }

        let user = self
            .user_repo
            .find_by_id(session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if user.is_locked_at(Utc::now()) {
            self.session_repo.revoke(session.id).await?;
            return Err(AuthError::AccountLocked);
        }

        // Rotate: the presented refresh token stops working
        let tokens = self.generate_tokens(&user)?;
        self.session_repo
            .update_token_hash(
                session.id,
                &hash_refresh_token(&tokens.refresh_token),
                self.refresh_expiry(),
            )
            .await?;

        Ok(tokens)
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let session = self
            .session_repo
            .find_by_token_hash(&hash_refresh_token(refresh_token))
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        self.session_repo.revoke(session.id).await?;
        Ok(())
    }

    #[instrument(skip(self, current_password, new_password))]
    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(current_password, &user.password_hash)? {
            return Err(AuthError::IncorrectPassword);
        }

        self.user_repo
            .update_password(user_id, &hash_password(new_password)?)
            .await?;
        let revoked = self.session_repo.revoke_all_for_user(user_id).await?;

        info!(%user_id, revoked_sessions = revoked, "Password changed");
        Ok(())
    }

    async fn is_email_available(&self, email: &str) -> Result<bool, AuthError> {
        Ok(!self.user_repo.email_exists(email.trim()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockSessionRepository, MockUserRepository};
    use mockall::predicate::eq;

    fn jwt_settings() -> JwtSettings {
        JwtSettings {
            secret: "0123456789abcdef0123456789abcdef".into(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        }
    }

    fn user_with_password(password: &str) -> User {
        User {
            id: Uuid::now_v7(),
            username: "lina".into(),
            email: "lina@example.com".into(),
            password_hash: hash_password(password).unwrap(),
            first_name: "Lina".into(),
            last_name: "Mostafa".into(),
            bio: None,
            profile_picture_path: None,
            created_at: Utc::now(),
            last_login_at: None,
            lockout_end: None,
            roles: vec![Role::Student],
        }
    }

    fn service(
        users: MockUserRepository,
        sessions: MockSessionRepository,
    ) -> AuthServiceImpl<MockUserRepository, MockSessionRepository> {
        AuthServiceImpl::new(Arc::new(users), Arc::new(sessions), jwt_settings())
    }

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            username: "lina".into(),
            email: "Lina@Example.com".into(),
            password: "Password@123".into(),
            first_name: "Lina".into(),
            last_name: "Mostafa".into(),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let mut users = MockUserRepository::new();
        users
            .expect_email_exists()
            .withf(|email| email == "lina@example.com")
            .returning(|_| Ok(true));

        let result = service(users, MockSessionRepository::new())
            .register(register_request())
            .await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_register_rejects_taken_username() {
        let mut users = MockUserRepository::new();
        users.expect_email_exists().returning(|_| Ok(false));
        users.expect_username_exists().returning(|_| Ok(true));

        let result = service(users, MockSessionRepository::new())
            .register(register_request())
            .await;
        assert!(matches!(result, Err(AuthError::UsernameTaken)));
    }

    #[tokio::test]
    async fn test_register_creates_student_with_session() {
        let mut users = MockUserRepository::new();
        users.expect_email_exists().returning(|_| Ok(false));
        users.expect_username_exists().returning(|_| Ok(false));
        users
            .expect_create()
            .withf(|u| u.roles == vec![Role::Student] && u.password_hash.starts_with("$argon2"))
            .returning(|u| Ok(u.clone()));

        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_create()
            .times(1)
            .returning(|s| Ok(s.clone()));

        let (user, tokens) = service(users, sessions)
            .register(register_request())
            .await
            .unwrap();

        assert_eq!(user.email, "lina@example.com");
        let claims = decode_access_token(&jwt_settings().secret, &tokens.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.roles, vec![Role::Student]);
        assert_eq!(tokens.expires_in, 15 * 60);
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));

        let result = service(users, MockSessionRepository::new())
            .login("nobody@example.com", "whatever", None)
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let user = user_with_password("Password@123");
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let result = service(users, MockSessionRepository::new())
            .login("lina@example.com", "wrong-password", None)
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_locked_account() {
        let mut user = user_with_password("Password@123");
        user.lockout_end = Some(Utc::now() + Duration::hours(1));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        users.expect_record_login().never();

        let result = service(users, MockSessionRepository::new())
            .login("lina@example.com", "Password@123", None)
            .await;
        assert!(matches!(result, Err(AuthError::AccountLocked)));
    }

    #[tokio::test]
    async fn test_login_expired_lock_allows_login() {
        let mut user = user_with_password("Password@123");
        user.lockout_end = Some(Utc::now() - Duration::minutes(1));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        users.expect_record_login().times(1).returning(|_, _| Ok(()));

        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_create()
            .withf(|s| s.user_agent.as_deref() == Some("tests"))
            .returning(|s| Ok(s.clone()));

        let (user, _) = service(users, sessions)
            .login("lina@example.com", "Password@123", Some("tests".into()))
            .await
            .unwrap();
        assert!(user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let user = user_with_password("Password@123");
        let user_id = user.id;
        let session = Session::new(user_id, hash_refresh_token("old"), Utc::now() + Duration::days(1));
        let session_id = session.id;

        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_find_by_token_hash()
            .withf(|hash| hash == hash_refresh_token("old"))
            .returning(move |_| Ok(Some(session.clone())));
        sessions
            .expect_update_token_hash()
            .withf(move |id, hash, _| *id == session_id && hash != hash_refresh_token("old"))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |_| Ok(Some(user.clone())));

        let tokens = service(users, sessions).refresh("old").await.unwrap();
        assert_ne!(tokens.refresh_token, "old");
    }

    #[tokio::test]
    async fn test_refresh_unknown_token() {
        let mut sessions = MockSessionRepository::new();
        sessions.expect_find_by_token_hash().returning(|_| Ok(None));

        let result = service(MockUserRepository::new(), sessions)
            .refresh("missing")
            .await;
        assert!(matches!(result, Err(AuthError::SessionNotFound)));
    }

    #[tokio::test]
    async fn test_change_password_wrong_current() {
        let user = user_with_password("Password@123");
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        users.expect_update_password().never();

        let result = service(users, MockSessionRepository::new())
            .change_password(Uuid::now_v7(), "nope", "NewPassword@1")
            .await;
        assert!(matches!(result, Err(AuthError::IncorrectPassword)));
    }

    #[tokio::test]
    async fn test_change_password_revokes_sessions() {
        let user = user_with_password("Password@123");
        let user_id = user.id;
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_update_password()
            .withf(move |id, hash| *id == user_id && hash.starts_with("$argon2"))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_revoke_all_for_user()
            .with(eq(user_id))
            .times(1)
            .returning(|_| Ok(2));

        service(users, sessions)
            .change_password(user_id, "Password@123", "NewPassword@1")
            .await
            .unwrap();
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        let user = user_with_password("x-password");
        let svc = service(MockUserRepository::new(), MockSessionRepository::new());
        let tokens = svc.generate_tokens(&user).unwrap();

        let result = decode_access_token("another-secret-another-secret-xx", &tokens.access_token);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            AppError::from(AuthError::AccountLocked),
            AppError::Forbidden(_)
        ));
        assert!(matches!(
            AppError::from(AuthError::EmailTaken),
            AppError::Conflict(m) if m == "Email is already registered"
        ));
    }
}
