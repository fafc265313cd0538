//! HTTP router, shared state and middleware

pub mod handlers;

use crate::{
    error::{error_body, AppError, Result, INTERNAL_ERROR_MESSAGE},
    logging::{ErrorEventLogger, LogSettings, Logger, LoggerFactory, NetworkLogger},
    models::ServerConfig,
    probe::WebsiteProber,
    stats::round2,
};
use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::{any::Any, sync::Arc, time::Instant};
use tower_http::catch_panic::CatchPanicLayer;

/// Response header carrying the per-request correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation ID attached to each request by the logging middleware
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// State shared by every handler; all of it is read-only after startup
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub prober: Arc<WebsiteProber>,
    pub logger: Logger,
    pub network_logger: NetworkLogger,
    pub error_logger: ErrorEventLogger,
}

impl AppState {
    /// Build state with default log settings
    pub fn new(config: ServerConfig) -> Result<Self> {
        Self::with_log_settings(config, LogSettings::default())
    }

    /// Build state with explicit log settings
    pub fn with_log_settings(config: ServerConfig, settings: LogSettings) -> Result<Self> {
        let prober = WebsiteProber::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            prober: Arc::new(prober),
            logger: Logger::with_settings("HTTP".to_string(), settings),
            network_logger: NetworkLogger::new(settings),
            error_logger: ErrorEventLogger::new(settings),
        })
    }

    /// Build state whose loggers share the factory's session ID
    pub async fn from_factory(config: ServerConfig, factory: &LoggerFactory) -> Result<Self> {
        let prober = WebsiteProber::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            prober: Arc::new(prober),
            logger: factory.create_logger("HTTP").await,
            network_logger: factory.create_network_logger().await,
            error_logger: factory.create_error_logger().await,
        })
    }
}

/// Assemble the full application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/download", get(handlers::download))
        .route("/api/file-sizes", get(handlers::file_sizes))
        .route("/api/test-info", get(handlers::test_info))
        .route("/api/latency-test", get(handlers::latency_test))
        .route("/api/ping", get(handlers::ping))
        .route("/api/website-test", get(handlers::website_test))
        .route("/api/websites", get(handlers::websites))
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state)
}

/// Tag the request with a correlation ID and write one access line.
///
/// The line is written once the response head is ready, so a download is
/// logged before its body has streamed.
async fn log_requests(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let correlation_id = Logger::new_correlation_id();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    request.extensions_mut().insert(RequestId(correlation_id.clone()));

    let start = Instant::now();
    let mut response = next.run(request).await;
    let elapsed_ms = round2(start.elapsed().as_secs_f64() * 1000.0);

    state
        .network_logger
        .log_access(method.as_str(), &path, response.status().as_u16(), elapsed_ms, &correlation_id)
        .await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    eprintln!("{}", AppError::internal(format!("Handler panicked: {}", detail)).format_for_console(true));

    (StatusCode::INTERNAL_SERVER_ERROR, Json(error_body(INTERNAL_ERROR_MESSAGE))).into_response()
}
