// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the inquiry rate limiter service.
//!
//! Every form submission is checked against the limiter before anything
//! else happens, in a window keyed by form and client. Throttled clients
//! get a 429 with `Retry-After`; admitted ones are validated and
//! acknowledged. All form responses carry the `X-RateLimit-*` headers.

use crate::client::client_key;
use crate::config::Config;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::metrics::Metrics;
use crate::validator::{InquiryForm, InquiryKind, InquiryValidator, ValidationResult};
use axum::{
    extract::{ConnectInfo, FromRequest, Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub validator: InquiryValidator,
    pub config: Config,
    pub metrics: Option<Metrics>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            error: error.into(),
            code,
            retry_after_secs: None,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Rate limit check request (for external callers).
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub key: String,
    pub limit: u32,
}

/// Accepted submission acknowledgement.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub status: &'static str,
    pub kind: InquiryKind,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut router: Router<Arc<AppState>> = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/check", post(check))
        .route("/api/contact", post(contact))
        .route("/api/inquiries/product", post(product_inquiry))
        .route("/api/inquiries/service", post(service_inquiry));

    if state.config.metrics.enabled {
        router = router.route(&state.config.metrics.path, get(metrics));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "inquiry-rate-limiter",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Check a key against the limiter on behalf of another service.
///
/// Consumes quota exactly like a form submission would.
pub async fn check(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckRequest>,
) -> Response {
    if req.key.trim().is_empty() || req.limit == 0 {
        warn!(key = %req.key, limit = req.limit, "Rejected malformed check");
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "key must be non-empty and limit positive",
                "INVALID_CHECK",
            )),
        )
            .into_response();
    }

    let result = state.limiter.check(&req.key, req.limit).await;
    debug!(key = %req.key, success = result.success, "External check");
    Json(result).into_response()
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let Some(metrics) = &state.metrics else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn contact(
    State(state): State<Arc<AppState>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> Response {
    submit(state, InquiryKind::Contact, peer(connect), request).await
}

pub async fn product_inquiry(
    State(state): State<Arc<AppState>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> Response {
    submit(state, InquiryKind::ProductInquiry, peer(connect), request).await
}

pub async fn service_inquiry(
    State(state): State<Arc<AppState>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> Response {
    submit(state, InquiryKind::ServiceInquiry, peer(connect), request).await
}

fn peer(connect: Option<ConnectInfo<SocketAddr>>) -> Option<SocketAddr> {
    connect.map(|ConnectInfo(addr)| addr)
}

async fn submit(
    state: Arc<AppState>,
    kind: InquiryKind,
    peer: Option<SocketAddr>,
    request: Request,
) -> Response {
    let key = client_key(
        request.headers(),
        peer,
        state.config.client.trust_forwarded_headers,
    );
    let limit = state.config.forms.limit_for(kind);
    let result = state.limiter.check(&window_key(kind, &key), limit).await;

    if !result.success {
        let retry_secs = state.limiter.retry_after(&result).as_secs();
        info!(
            client = %key,
            %kind,
            retry_after_secs = retry_secs,
            "Submission rate limited"
        );
        let response = (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_secs.to_string())],
            Json(ErrorResponse {
                error: "Too many submissions, please try again later".to_string(),
                code: "RATE_LIMITED",
                retry_after_secs: Some(retry_secs),
            }),
        )
            .into_response();
        return with_rate_limit_headers(response, &result);
    }

    let response = accept(&state, kind, &key, request).await;
    with_rate_limit_headers(response, &result)
}

/// Validate and acknowledge an admitted submission.
async fn accept(state: &AppState, kind: InquiryKind, key: &str, request: Request) -> Response {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if let ValidationResult::Invalid(err) =
        state.validator.validate_content_type(content_type.as_deref())
    {
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(ErrorResponse::new(err.to_string(), "INVALID_CONTENT_TYPE")),
        )
            .into_response();
    }

    let form = match parse_form(content_type.as_deref(), request).await {
        Ok(form) => form,
        Err(message) => {
            debug!(client = %key, %kind, error = %message, "Unreadable submission body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(message, "MALFORMED_BODY")),
            )
                .into_response();
        }
    };

    if let ValidationResult::Invalid(err) = state.validator.validate_form(kind, &form) {
        info!(client = %key, %kind, error = %err, "Validation failed");
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new(err.to_string(), "INVALID_SUBMISSION")),
        )
            .into_response();
    }

    info!(client = %key, %kind, "Submission accepted");
    (
        StatusCode::ACCEPTED,
        Json(SubmissionResponse {
            status: "accepted",
            kind,
        }),
    )
        .into_response()
}

async fn parse_form(content_type: Option<&str>, request: Request) -> Result<InquiryForm, String> {
    let is_json = content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mt| mt.trim().eq_ignore_ascii_case("application/json"));

    if is_json {
        Json::<InquiryForm>::from_request(request, &())
            .await
            .map(|Json(form)| form)
            .map_err(|rejection| rejection.body_text())
    } else {
        Form::<InquiryForm>::from_request(request, &())
            .await
            .map(|Form(form)| form)
            .map_err(|rejection| rejection.body_text())
    }
}

/// Each form gets its own window per client.
fn window_key(kind: InquiryKind, client: &str) -> String {
    format!("{kind}:{client}")
}

fn with_rate_limit_headers(mut response: Response, result: &RateLimitResult) -> Response {
    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(result.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(result.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(result.reset_secs()));
    response
}
