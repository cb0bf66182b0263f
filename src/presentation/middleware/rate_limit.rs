//! Rate Limiting Middleware
//!
//! Redis-based distributed rate limiting using a sliding window. Limits come
//! from `RateLimitSettings`; authentication endpoints get a stricter class.
//! Redis failures let the request through.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use redis::aio::ConnectionManager;
use serde::Serialize;

use crate::config::RateLimitSettings;
use crate::infrastructure::cache::{keys, KEY_PREFIX};
use crate::presentation::middleware::auth::AuthUser;
use crate::shared::error::{AppError, ErrorResponse};
use crate::startup::AppState;

/// Sliding window over a sorted set: members are request ids, scores are
/// timestamps in milliseconds.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now_ms = tonumber(ARGV[1])
local window_start = tonumber(ARGV[2])
local max_requests = tonumber(ARGV[3])
local window_seconds = tonumber(ARGV[4])

redis.call('ZREMRANGEBYSCORE', key, '-inf', window_start)
local current_count = redis.call('ZCARD', key)

if current_count < max_requests then
    local member = now_ms .. ':' .. math.random(1000000)
    redis.call('ZADD', key, now_ms, member)
    redis.call('EXPIRE', key, window_seconds + 1)
    return {1, current_count + 1, max_requests}
else
    local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
    local retry_after = 0
    if oldest and #oldest >= 2 then
        retry_after = oldest[2] + (window_seconds * 1000) - now_ms
    end
    return {0, current_count, max_requests, retry_after}
end
"#;

/// Endpoint classes with separate budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointClass {
    /// Register, login, refresh
    Auth,
    Api,
}

impl EndpointClass {
    fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::Auth => "auth",
            EndpointClass::Api => "api",
        }
    }
}

/// Window and allowance for one endpoint class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_window: u32,
    pub window_seconds: u64,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    pub fn for_class(class: EndpointClass, settings: &RateLimitSettings) -> Self {
        let requests_per_window = match class {
            EndpointClass::Auth => settings.auth_requests_per_window,
            EndpointClass::Api => settings.api_requests_per_window,
        };
        Self {
            requests_per_window,
            window_seconds: settings.window_seconds,
            burst_allowance: settings.burst_size,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.requests_per_window + self.burst_allowance
    }
}

/// Rate limit status returned to clients.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp when the window resets
    pub reset_at: i64,
    pub retry_after: u64,
}

#[derive(Debug, Serialize)]
struct RateLimitExceededResponse {
    #[serde(flatten)]
    error: ErrorResponse,
    rate_limit: RateLimitInfo,
}

/// Redis-backed sliding window limiter.
#[derive(Clone)]
pub struct RateLimiter {
    redis: ConnectionManager,
    class: EndpointClass,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(redis: ConnectionManager, class: EndpointClass, config: RateLimitConfig) -> Self {
        Self {
            redis,
            class,
            config,
        }
    }

    /// `Ok` when the request is allowed, `Err` with retry information otherwise.
    pub async fn check(&self, identifier: &str) -> Result<RateLimitInfo, RateLimitInfo> {
        let key = format!(
            "{}{}",
            KEY_PREFIX,
            keys::rate_limit(self.class.as_str(), identifier)
        );
        let now_ms = chrono::Utc::now().timestamp_millis();
        let window_ms = (self.config.window_seconds * 1000) as i64;
        let max_requests = self.config.max_requests();
        let reset_at = (now_ms / 1000) + self.config.window_seconds as i64;

        let mut conn = self.redis.clone();
        let result: Vec<i64> = match redis::Script::new(SLIDING_WINDOW_SCRIPT)
            .key(&key)
            .arg(now_ms)
            .arg(now_ms - window_ms)
            .arg(max_requests as i64)
            .arg(self.config.window_seconds as i64)
            .invoke_async(&mut conn)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Rate limiter Redis error");
                return Ok(RateLimitInfo {
                    limit: max_requests,
                    remaining: max_requests,
                    reset_at,
                    retry_after: 0,
                });
            }
        };

        Self::interpret(&result, max_requests, reset_at)
    }

    /// Turn the script's reply into allow/deny.
    fn interpret(
        result: &[i64],
        max_requests: u32,
        reset_at: i64,
    ) -> Result<RateLimitInfo, RateLimitInfo> {
        let allowed = result.first().copied() == Some(1);
        let current = result.get(1).copied().unwrap_or_default().max(0) as u32;
        let retry_ms = result.get(3).copied().unwrap_or(0).max(0);

        let info = RateLimitInfo {
            limit: max_requests,
            remaining: max_requests.saturating_sub(current),
            reset_at,
            retry_after: if allowed {
                0
            } else {
                (retry_ms as u64).div_ceil(1000)
            },
        };

        if allowed {
            Ok(info)
        } else {
            Err(info)
        }
    }
}

/// Rate limit identifier: authenticated user first, then forwarded headers,
/// then the peer address.
fn extract_identifier(request: &Request, client_ip: Option<IpAddr>) -> String {
    if let Some(user) = request.extensions().get::<AuthUser>() {
        return format!("user:{}", user.user_id);
    }

    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim);
    let real_ip = request
        .headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim);

    if let Some(ip) = forwarded
        .into_iter()
        .chain(real_ip)
        .find_map(|v| v.parse::<IpAddr>().ok())
    {
        return format!("ip:{}", ip);
    }

    match client_ip {
        Some(ip) => format!("ip:{}", ip),
        None => {
            tracing::warn!("Could not determine client identifier for rate limiting");
            "ip:unknown".to_string()
        }
    }
}

pub async fn rate_limit_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    rate_limit_inner(state, request, next, EndpointClass::Auth).await
}

pub async fn rate_limit_api(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    rate_limit_inner(state, request, next, EndpointClass::Api).await
}

async fn rate_limit_inner(
    state: AppState,
    request: Request,
    next: Next,
    class: EndpointClass,
) -> Response {
    // Present when served with `into_make_service_with_connect_info`
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip());
    let identifier = extract_identifier(&request, peer);
    let config = RateLimitConfig::for_class(class, &state.settings.rate_limit);
    let limiter = RateLimiter::new(state.redis.clone(), class, config);

    match limiter.check(&identifier).await {
        Ok(info) => {
            let mut response = next.run(request).await;
            add_rate_limit_headers(response.headers_mut(), &info);
            response
        }
        Err(info) => {
            tracing::warn!(identifier = %identifier, class = ?class, "Rate limit exceeded");
            rate_limited_response(info)
        }
    }
}

fn add_rate_limit_headers(headers: &mut HeaderMap, info: &RateLimitInfo) {
    headers.insert("X-RateLimit-Limit", HeaderValue::from(info.limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(info.remaining));
    headers.insert("X-RateLimit-Reset", HeaderValue::from(info.reset_at));
}

fn rate_limited_response(info: RateLimitInfo) -> Response {
    let info = RateLimitInfo {
        remaining: 0,
        ..info
    };
    let error = AppError::RateLimited;
    let body = RateLimitExceededResponse {
        error: ErrorResponse {
            is_success: false,
            code: error.code(),
            message: "You are being rate limited. Please slow down.".to_string(),
            errors: None,
        },
        rate_limit: info.clone(),
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(info.retry_after));
    add_rate_limit_headers(response.headers_mut(), &info);
    response
}
