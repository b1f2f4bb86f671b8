//! Request middleware: admin session gate and edge rate limiting

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderName, HeaderValue, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::warn;

use crate::{
    auth::{AdminIdentity, current_admin},
    error::ApiError,
    rate_limiter::RateLimitDecision,
    state::AppState,
};

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Admin gate
///
/// Resolves the session into an [`AdminIdentity`] request extension, or
/// rejects the request before the handler runs.
pub async fn require_admin(
    session: Session,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let identity: AdminIdentity = current_admin(&session)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Fixed-window rate limiting per client IP
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&req);
    let decision = state.rate_limiter.check(&key).await;

    let mut response = if decision.allowed {
        next.run(req).await
    } else {
        warn!(
            "Rejecting request from {}: more than {} requests in {}s",
            key,
            decision.limit,
            state.rate_limiter.config().window_seconds
        );
        let mut response = ApiError::TooManyRequests.into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(reset_seconds(&decision)));
        response
    };

    let headers = response.headers_mut();
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(reset_seconds(&decision)));

    response
}

fn client_key(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn reset_seconds(decision: &RateLimitDecision) -> u64 {
    let reset = decision.reset_after;
    reset.as_secs() + u64::from(reset.subsec_nanos() > 0)
}
