// src/api.rs
// Axum-based API router for creating, listing and settling payment links.
//
// This layer is the system's form boundary: it owns recipient-format and
// positive-amount checks before anything reaches the store. The store only
// re-checks that required fields are present.

use axum::extract::{ConnectInfo, Extension, Path, Query};
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{payment_url, CreateLinkInput, Currency, PaymentLink};
use crate::store::LinkStore;

/// Settings the handlers need beyond the store itself.
#[derive(Clone)]
pub struct ApiSettings {
    /// Public origin that shareable `/pay/<id>` URLs are minted against.
    pub base_url: String,
}

/// Simple per-IP rate limiter with a sliding window.
#[derive(Clone)]
struct RateLimiter {
    // Map of IP address -> (request_count, window_start_time)
    buckets: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
    max_requests: u32,
    window_duration: Duration,
}

impl RateLimiter {
    fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window_duration: Duration::from_secs(window_secs),
        }
    }

    /// Returns true if a request from the given IP should be allowed.
    fn check_rate_limit(&self, ip: &str) -> bool {
        // Recover the data even if a panicking holder poisoned the mutex
        let mut buckets = self.buckets.lock().unwrap_or_else(|poisoned| {
            warn!("rate limiter mutex poisoned, recovering data");
            poisoned.into_inner()
        });
        let now = Instant::now();

        let entry = buckets.entry(ip.to_string()).or_insert((0, now));
        let (count, window_start) = entry;

        if now.duration_since(*window_start) > self.window_duration {
            *count = 1;
            *window_start = now;
            true
        } else if *count < self.max_requests {
            *count += 1;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub recipient: String,
    pub amount: String,
    pub currency: Currency,
    pub message: Option<String>,
    /// Wallet address of the creator, if one is connected.
    pub created_by: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedLinkResponse {
    link: PaymentLink,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidRequest {
    pub paid_by: String,
    pub tx_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub creator: Option<String>,
}

#[derive(Debug, Error)]
enum ApiError {
    #[error("store error")]
    Store(StoreError),

    #[error("link not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Store(e) => {
                error!("store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "storage error".to_string())
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, "link not found".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };
        let body_json = serde_json::json!({ "error": body });
        (status, Json(body_json)).into_response()
    }
}

fn is_eth_address(s: &str) -> bool {
    s.len() == 42 && s.starts_with("0x") && s[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_positive_amount(s: &str) -> bool {
    match s.trim().parse::<f64>() {
        Ok(v) => v.is_finite() && v > 0.0,
        Err(_) => false,
    }
}

///////////////////////////////////////////////////////////////////////////
// POST /links
///////////////////////////////////////////////////////////////////////////
async fn create_link(
    Extension(store): Extension<Arc<dyn LinkStore>>,
    Extension(settings): Extension<ApiSettings>,
    Json(req): Json<CreateLinkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.recipient.trim().is_empty() {
        return Err(ApiError::BadRequest("recipient required".into()));
    }
    if !is_eth_address(req.recipient.trim()) {
        return Err(ApiError::BadRequest(
            "recipient must be a 0x-prefixed 40-hex-digit address".into(),
        ));
    }
    if !is_positive_amount(&req.amount) {
        return Err(ApiError::BadRequest("amount must be a positive number".into()));
    }

    let input = CreateLinkInput {
        recipient: req.recipient.trim().to_string(),
        amount: req.amount.trim().to_string(),
        currency: req.currency,
        message: req.message,
    };
    let link = store.create(input, req.created_by).await?;

    info!("created link {} for {} {}", link.id, link.amount, link.currency);

    let url = payment_url(&settings.base_url, link.id);
    Ok((StatusCode::CREATED, Json(CreatedLinkResponse { link, url })))
}

///////////////////////////////////////////////////////////////////////////
// GET /links  (optionally ?creator=0x...)
///////////////////////////////////////////////////////////////////////////
async fn list_links(
    Extension(store): Extension<Arc<dyn LinkStore>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let links = match query.creator {
        Some(creator) => store.get_by_creator(&creator).await?,
        None => store.get_all().await?,
    };
    Ok((StatusCode::OK, Json(links)))
}

///////////////////////////////////////////////////////////////////////////
// GET /links/:id
///////////////////////////////////////////////////////////////////////////
async fn get_link(
    Path(id): Path<String>,
    Extension(store): Extension<Arc<dyn LinkStore>>,
) -> Result<impl IntoResponse, ApiError> {
    // A never-issued id is a plain not-found, whether or not it parses
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound)?;
    match store.get_by_id(id).await? {
        Some(link) => Ok((StatusCode::OK, Json(link))),
        None => Err(ApiError::NotFound),
    }
}

///////////////////////////////////////////////////////////////////////////
// POST /links/:id/pay
///////////////////////////////////////////////////////////////////////////
async fn mark_paid(
    Path(id): Path<String>,
    Extension(store): Extension<Arc<dyn LinkStore>>,
    Json(req): Json<MarkPaidRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.paid_by.trim().is_empty() || req.tx_hash.trim().is_empty() {
        return Err(ApiError::BadRequest("paidBy and txHash are required".into()));
    }

    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound)?;
    match store.mark_paid(id, req.paid_by.trim(), req.tx_hash.trim()).await? {
        Some(link) => {
            info!("link {} settled by {}", link.id, req.paid_by.trim());
            Ok((StatusCode::OK, Json(link)))
        }
        None => Err(ApiError::NotFound),
    }
}

///////////////////////////////////////////////////////////////////////////
// GET /health
///////////////////////////////////////////////////////////////////////////
async fn health(Extension(store): Extension<Arc<dyn LinkStore>>) -> Response {
    match store.ping().await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response(),
        Err(e) => {
            error!("health: store error: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({"status": "store-unavailable"})),
            )
                .into_response()
        }
    }
}

/// Request logging middleware: method, path, status, latency.
async fn logging_middleware<B>(req: Request<B>, next: Next<B>) -> Result<Response, StatusCode> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();
    info!("{} {} {} - {:.3}s", method, path, status, latency);

    Ok(response)
}

/// Rate limiting middleware. Returns 429 when the per-IP window is spent.
///
/// The client address comes from request extensions; when the router is
/// driven without connect info (in-process tests) every request shares one
/// bucket.
async fn rate_limit_middleware<B>(
    Extension(rate_limiter): Extension<RateLimiter>,
    req: Request<B>,
    next: Next<B>,
) -> Result<Response, StatusCode> {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if rate_limiter.check_rate_limit(&ip) {
        Ok(next.run(req).await)
    } else {
        warn!("rate limit exceeded for IP: {}", ip);
        Err(StatusCode::TOO_MANY_REQUESTS)
    }
}

/// Build the router for this service (call from main).
pub fn router(store: Arc<dyn LinkStore>, settings: ApiSettings) -> Router {
    let max_requests = std::env::var("RATE_LIMIT_MAX_REQUESTS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(100);

    let window_secs = std::env::var("RATE_LIMIT_WINDOW_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60);

    let rate_limiter = RateLimiter::new(max_requests, window_secs);

    info!(
        "rate limiting enabled: {} requests per {} seconds",
        max_requests, window_secs
    );

    // Health stays outside the rate limit so probes never get throttled
    let public_routes = Router::new().route("/health", get(health));

    let link_routes = Router::new()
        .route("/links", post(create_link).get(list_links))
        .route("/links/:id", get(get_link))
        .route("/links/:id/pay", post(mark_paid))
        .layer(middleware::from_fn(rate_limit_middleware))
        .layer(Extension(rate_limiter));

    Router::new()
        .merge(public_routes)
        .merge(link_routes)
        .layer(middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(store))
        .layer(Extension(settings))
}
