//! Authentication Middleware
//!
//! JWT validation for protected routes and role guards for the instructor
//! and admin areas.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use uuid::Uuid;

use crate::application::services::decode_access_token;
use crate::config::Settings;
use crate::domain::Role;
use crate::shared::error::AppError;

/// Authenticated user, inserted into request extensions by [`auth_middleware`]
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub roles: Vec<Role>,
}

impl AuthUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))
    }
}

fn bearer_token(request: &Request) -> Result<Authorization<Bearer>, AppError> {
    if !request.headers().contains_key(AUTHORIZATION) {
        return Err(AppError::Unauthorized("Missing authorization header".into()));
    }

    request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".into()))
}

/// Authentication middleware that validates JWT access tokens
pub async fn auth_middleware(
    State(settings): State<Arc<Settings>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = bearer_token(&request)?;

    let claims = decode_access_token(&settings.jwt.secret, bearer.token())?;
    let user_id = claims.user_id()?;

    request.extensions_mut().insert(AuthUser {
        user_id,
        roles: claims.roles,
    });

    Ok(next.run(request).await)
}

/// Optional authentication middleware (doesn't fail if no token)
pub async fn optional_auth_middleware(
    State(settings): State<Arc<Settings>>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = bearer_token(&request)
        .ok()
        .and_then(|bearer| decode_access_token(&settings.jwt.secret, bearer.token()).ok())
        .and_then(|claims| {
            let user_id = claims.user_id().ok()?;
            Some(AuthUser {
                user_id,
                roles: claims.roles,
            })
        });

    if let Some(user) = user {
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}

async fn require_role(role: Role, request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

    if !user.has_role(role) {
        return Err(AppError::Forbidden(format!("{} role required", role)));
    }

    Ok(next.run(request).await)
}

/// Guard for `/admin` routes. Must run after [`auth_middleware`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    require_role(Role::Admin, request, next).await
}

/// Guard for `/instructor` routes. Must run after [`auth_middleware`].
pub async fn require_instructor(request: Request, next: Next) -> Result<Response, AppError> {
    require_role(Role::Instructor, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::Claims;
    use crate::config::test_support::test_settings;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tower::ServiceExt;

    fn token(settings: &Settings, user_id: Uuid, roles: Vec<Role>, ttl: Duration) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            roles,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(settings.jwt.secret.as_bytes()),
        )
        .unwrap()
    }

    async fn whoami(Extension(user): Extension<AuthUser>) -> String {
        user.user_id.to_string()
    }

    fn app(settings: Arc<Settings>) -> Router {
        let admin = Router::new()
            .route("/admin", get(|| async { "admin area" }))
            .route_layer(middleware::from_fn(require_admin));

        Router::new()
            .route("/me", get(whoami))
            .merge(admin)
            .route_layer(middleware::from_fn_with_state(settings, auth_middleware))
    }

    fn request(uri: &str, token: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let settings = Arc::new(test_settings());
        let response = app(settings).oneshot(request("/me", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_sets_user() {
        let settings = Arc::new(test_settings());
        let user_id = Uuid::now_v7();
        let jwt = token(&settings, user_id, vec![Role::Student], Duration::minutes(5));

        let response = app(settings)
            .oneshot(request("/me", Some(&jwt)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_rejected() {
        let settings = Arc::new(test_settings());
        let request = HttpRequest::builder()
            .uri("/me")
            .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();

        let response = app(settings).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let settings = Arc::new(test_settings());
        let jwt = token(&settings, Uuid::now_v7(), vec![Role::Student], Duration::hours(-2));

        let response = app(settings)
            .oneshot(request("/me", Some(&jwt)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_role_guard_rejects_missing_role() {
        let settings = Arc::new(test_settings());
        let jwt = token(&settings, Uuid::now_v7(), vec![Role::Instructor], Duration::minutes(5));

        let response = app(settings)
            .oneshot(request("/admin", Some(&jwt)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_role_guard_allows_admin() {
        let settings = Arc::new(test_settings());
        let jwt = token(&settings, Uuid::now_v7(), vec![Role::Admin], Duration::minutes(5));

        let response = app(settings)
            .oneshot(request("/admin", Some(&jwt)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
