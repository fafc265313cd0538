//! Route handlers

use super::{AppState, RequestId};
use crate::{
    error::{error_body, AppError, Result, METHOD_NOT_ALLOWED_MESSAGE, NOT_FOUND_MESSAGE},
    logging::ErrorEventLogger,
    models::{
        iso_timestamp, unix_time_secs, ConnectivitySummary, LatencySampleDetail, SizeProfile,
        WebsiteTarget,
    },
    probe::probe_all,
    stats::{calculate_latency_stats, round2},
    stream::{random_packet, RandomSource, RandomStreamGenerator},
};
use axum::{
    body::{Body, Bytes},
    extract::{Extension, Query, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, EXPIRES, PRAGMA},
        StatusCode,
    },
    response::{Html, IntoResponse, Response},
    Json,
};
use futures::{stream, Stream};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{io, time::Instant};

const INDEX_HTML: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/index.html"));

/// Raw `key=value` pairs of a query string, repeated keys included
pub type QueryPairs = Vec<(String, String)>;

/// `?size=<key>` query used by the download and test-info routes
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SizeQuery {
    pub size: Option<String>,
}

impl SizeQuery {
    /// Take the first `size` value; later repeats are ignored
    pub fn from_pairs(pairs: QueryPairs) -> Self {
        Self {
            size: pairs.into_iter().find(|(key, _)| key == "size").map(|(_, value)| value),
        }
    }
}

/// One entry of `/api/file-sizes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSizeInfo {
    pub key: String,
    pub size_bytes: u64,
    pub size_mb: f64,
    pub display_name: String,
}

impl From<&SizeProfile> for FileSizeInfo {
    fn from(profile: &SizeProfile) -> Self {
        Self {
            key: profile.key.clone(),
            size_bytes: profile.size_bytes,
            size_mb: profile.size_mb(),
            display_name: profile.display_name(),
        }
    }
}

fn download_file_name(profile: &SizeProfile) -> String {
    format!("test_data_{}.bin", profile.key)
}

fn resolve_profile(state: &AppState, requested: Option<&str>) -> Result<SizeProfile> {
    state
        .config
        .resolve_size(requested)
        .cloned()
        .ok_or_else(|| AppError::config(format!("Default size '{}' is not configured", state.config.default_size_key)))
}

/// `GET /`
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /download?size=<key>`
///
/// Streams random bytes for the resolved size. Unknown keys fall back to the
/// default size. `Content-Length` always carries the nominal size; if the
/// random source fails the body errors out and the connection is aborted
/// instead of completing short.
pub async fn download(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
    request_id: Option<Extension<RequestId>>,
) -> Result<Response> {
    let query = SizeQuery::from_pairs(pairs);
    let profile = resolve_profile(&state, query.size.as_deref())?;
    let generator = RandomStreamGenerator::new(profile.size_bytes, state.config.chunk_size);
    let request_id = request_id.map(|Extension(RequestId(id))| id);

    crate::log_debug!(state.logger, "Streaming {} bytes for size '{}'", profile.size_bytes, profile.key);

    let body = Body::from_stream(payload_stream(generator, state.error_logger.clone(), request_id));

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/octet-stream")
        .header(CONTENT_DISPOSITION, format!("attachment; filename={}", download_file_name(&profile)))
        .header(CONTENT_LENGTH, profile.size_bytes)
        .header(CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(PRAGMA, "no-cache")
        .header(EXPIRES, "0")
        .body(body)
        .map_err(|e| AppError::internal(format!("Failed to build download response: {}", e)))
}

/// Adapt a generator into a response body stream.
///
/// A generator that ends before its total is turned into one trailing
/// `io::Error`, which makes hyper drop the connection rather than finish a
/// body shorter than the declared length.
pub(crate) fn payload_stream<S: RandomSource>(
    generator: RandomStreamGenerator<S>,
    errors: ErrorEventLogger,
    request_id: Option<String>,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    stream::unfold(Some(generator), move |pending| {
        let errors = errors.clone();
        let request_id = request_id.clone();
        async move {
            let mut generator = pending?;

            if let Some(chunk) = generator.next() {
                return Some((Ok(Bytes::from(chunk)), Some(generator)));
            }
            if generator.is_complete() {
                return None;
            }

            let failure = generator
                .take_failure()
                .unwrap_or_else(|| AppError::stream_generation("payload ended early"));
            let context = format!(
                "Download truncated after {} of {} bytes",
                generator.emitted_bytes(),
                generator.total_bytes()
            );
            errors.log_error(&failure, Some(&context), request_id.as_deref()).await;

            Some((Err(io::Error::other(failure.to_string())), None))
        }
    })
}

/// `GET /api/file-sizes`
pub async fn file_sizes(State(state): State<AppState>) -> Json<Value> {
    let sizes: Vec<FileSizeInfo> = state.config.file_sizes.iter().map(FileSizeInfo::from).collect();
    Json(json!({ "sizes": sizes }))
}

/// `GET /api/test-info?size=<key>`
pub async fn test_info(State(state): State<AppState>, Query(pairs): Query<QueryPairs>) -> Result<Json<Value>> {
    let query = SizeQuery::from_pairs(pairs);
    let profile = resolve_profile(&state, query.size.as_deref())?;

    Ok(Json(json!({
        "file_size": profile.size_bytes,
        "file_size_mb": profile.size_mb(),
        "file_name": download_file_name(&profile),
        "file_size_key": profile.key,
    })))
}

/// `GET /api/latency-test`
///
/// Each sample times the generation of one small random packet.
pub async fn latency_test(State(state): State<AppState>) -> Result<Json<Value>> {
    let count = state.config.latency_test_count;
    let packet_size = state.config.latency_test_size;

    let mut latencies = Vec::with_capacity(count as usize);
    let mut details = Vec::with_capacity(count as usize);

    for test in 1..=count {
        let start = Instant::now();
        let packet = random_packet(packet_size)?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        drop(packet);

        latencies.push(latency_ms);
        details.push(LatencySampleDetail::new(test, latency_ms));
    }

    let statistics = calculate_latency_stats(latencies.clone());
    crate::log_info!(
        state.logger,
        "Latency test finished: avg {}ms, jitter {}ms",
        statistics.avg,
        statistics.jitter
    );

    Ok(Json(json!({
        "test_count": count,
        "test_size_bytes": packet_size,
        "test_size_kb": round2(packet_size as f64 / 1024.0),
        "latencies": latencies,
        "test_details": details,
        "statistics": statistics,
        "timestamp": iso_timestamp(),
    })))
}

/// `GET /api/ping`
pub async fn ping() -> Json<Value> {
    let start = Instant::now();
    let timestamp = iso_timestamp();
    let server_time = unix_time_secs();
    let response_time_ms = round2(start.elapsed().as_secs_f64() * 1000.0);

    Json(json!({
        "status": "ok",
        "message": "pong",
        "timestamp": timestamp,
        "server_time": server_time,
        "response_time_ms": response_time_ms,
    }))
}

/// `GET /api/website-test`
///
/// Probes every configured website with bounded concurrency. Individual
/// failures land in each site's result; only an internal failure of the run
/// itself produces a 500.
pub async fn website_test(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
) -> Response {
    match run_website_test(&state).await {
        Ok(body) => body.into_response(),
        Err(e) => {
            let request_id = request_id.map(|Extension(RequestId(id))| id);
            state
                .error_logger
                .log_error(&e, Some("Website test failed"), request_id.as_deref())
                .await;
            e.into_response()
        }
    }
}

async fn run_website_test(state: &AppState) -> Result<Json<Value>> {
    let targets = &state.config.websites;
    crate::log_info!(state.logger, "Probing {} websites", targets.len());

    let results = probe_all(state.prober.clone(), targets, state.config.max_concurrent_probes).await?;
    let summary = ConnectivitySummary::from_results(results.values());
    let mut websites = serde_json::Map::new();

    for target in targets {
        let Some(result) = results.get(&target.key) else {
            continue;
        };
        state.network_logger.log_probe(&target.key, result).await;
        websites.insert(target.key.clone(), website_entry(target, result)?);
    }

    crate::log_info!(
        state.logger,
        "Website test finished: {}/{} accessible",
        summary.accessible_count,
        summary.total
    );

    Ok(Json(json!({
        "websites": websites,
        "summary": summary,
        "timestamp": iso_timestamp(),
    })))
}

/// Flatten a site's result and add its display name and description
fn website_entry<T: Serialize>(target: &WebsiteTarget, result: &T) -> Result<Value> {
    let value = serde_json::to_value(result)
        .map_err(|e| AppError::internal(format!("Failed to serialize result for website '{}': {}", target.key, e)))?;
    let Value::Object(mut entry) = value else {
        return Err(AppError::internal(format!(
            "Result for website '{}' did not serialize to an object",
            target.key
        )));
    };
    entry.insert("name".to_string(), Value::String(target.name.clone()));
    entry.insert("description".to_string(), Value::String(target.description.clone()));
    Ok(Value::Object(entry))
}

/// `GET /api/websites`
pub async fn websites(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "websites": state.config.websites }))
}

/// Fallback for unmatched routes
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(error_body(NOT_FOUND_MESSAGE)))
}

/// Fallback for known routes called with an unsupported method
pub async fn method_not_allowed() -> (StatusCode, Json<Value>) {
    (StatusCode::METHOD_NOT_ALLOWED, Json(error_body(METHOD_NOT_ALLOWED_MESSAGE)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        logging::{LogLevel, LogSettings},
        models::ServerConfig,
        stream::test_support::FailingSource,
    };
    use futures::StreamExt;

    fn quiet() -> LogSettings {
        LogSettings {
            min_level: LogLevel::Fatal,
            use_color: false,
            ..Default::default()
        }
    }

    fn state() -> AppState {
        AppState::with_log_settings(ServerConfig::default(), quiet()).unwrap()
    }

    #[tokio::test]
    async fn test_payload_stream_complete() {
        let generator = RandomStreamGenerator::new(200_000, 64 * 1024);
        let items: Vec<io::Result<Bytes>> = payload_stream(generator, ErrorEventLogger::new(quiet()), None)
            .collect()
            .await;

        assert_eq!(items.len(), 4);
        let total: usize = items.iter().map(|item| item.as_ref().map(|b| b.len()).unwrap()).sum();
        assert_eq!(total, 200_000);
    }

    #[tokio::test]
    async fn test_payload_stream_truncation_errors() {
        let generator = RandomStreamGenerator::with_source(FailingSource { successful_fills: 1 }, 10_000, 4_000);
        let items: Vec<io::Result<Bytes>> =
            payload_stream(generator, ErrorEventLogger::new(quiet()), Some("req-1".to_string()))
                .collect()
                .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().len(), 4_000);
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_truncated_body_fails_to_collect() {
        let generator = RandomStreamGenerator::with_source(FailingSource { successful_fills: 0 }, 10_000, 4_000);
        let body = Body::from_stream(payload_stream(generator, ErrorEventLogger::new(quiet()), None));
        assert!(axum::body::to_bytes(body, usize::MAX).await.is_err());
    }

    #[tokio::test]
    async fn test_download_headers_use_resolved_key() {
        let pairs = vec![("size".to_string(), "bogus\r\nX-Injected: 1".to_string())];
        let response = download(State(state()), Query(pairs), None).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CONTENT_LENGTH], (50 * 1024 * 1024).to_string().as_str());
        assert_eq!(headers[CONTENT_DISPOSITION], "attachment; filename=test_data_50m.bin");
        assert_eq!(headers[CONTENT_TYPE], "application/octet-stream");
        assert_eq!(headers[CACHE_CONTROL], "no-cache, no-store, must-revalidate");
        assert_eq!(headers[PRAGMA], "no-cache");
        assert_eq!(headers[EXPIRES], "0");
    }

    #[tokio::test]
    async fn test_test_info_fallback() {
        let Json(body) = test_info(State(state()), Query(QueryPairs::new())).await.unwrap();
        assert_eq!(body["file_size_key"], "50m");
        assert_eq!(body["file_size"], 50 * 1024 * 1024);
        assert_eq!(body["file_size_mb"], 50.0);
        assert_eq!(body["file_name"], "test_data_50m.bin");
    }

    #[tokio::test]
    async fn test_latency_test_shape() {
        let Json(body) = latency_test(State(state())).await.unwrap();

        assert_eq!(body["test_count"], 5);
        assert_eq!(body["test_size_bytes"], 1024);
        assert_eq!(body["test_size_kb"], 1.0);
        assert_eq!(body["latencies"].as_array().unwrap().len(), 5);

        let details = body["test_details"].as_array().unwrap();
        assert_eq!(details.len(), 5);
        assert_eq!(details[0]["test"], 1);
        assert_eq!(details[4]["test"], 5);

        let stats = &body["statistics"];
        assert!(stats["min"].as_f64().unwrap() <= stats["median"].as_f64().unwrap());
        assert!(stats["median"].as_f64().unwrap() <= stats["max"].as_f64().unwrap());
    }

    #[tokio::test]
    async fn test_ping() {
        let Json(body) = ping().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["message"], "pong");
        assert!(body["response_time_ms"].as_f64().unwrap() >= 0.0);
        assert!(body["server_time"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_missing_default_size_is_internal_error() {
        let mut config = ServerConfig::default();
        config.default_size_key = "missing".to_string();
        let state = AppState::with_log_settings(config, quiet()).unwrap();

        let err = test_info(State(state), Query(QueryPairs::new())).await.unwrap_err();
        assert_eq!(err.category(), "CONFIG");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_size_query_takes_first_value() {
        let pairs = vec![
            ("other".to_string(), "x".to_string()),
            ("size".to_string(), "1m".to_string()),
            ("size".to_string(), "10m".to_string()),
        ];
        assert_eq!(SizeQuery::from_pairs(pairs).size.as_deref(), Some("1m"));
        assert_eq!(SizeQuery::from_pairs(QueryPairs::new()), SizeQuery::default());
    }

    #[tokio::test]
    async fn test_test_info_repeated_size_uses_first() {
        let pairs = vec![
            ("size".to_string(), "10m".to_string()),
            ("size".to_string(), "1m".to_string()),
        ];
        let Json(body) = test_info(State(state()), Query(pairs)).await.unwrap();
        assert_eq!(body["file_size_key"], "10m");
    }

    #[test]
    fn test_website_entry_flattens_result() {
        let target = WebsiteTarget::new("mock", "Mock", "http://127.0.0.1:1", "Local");
        let result = crate::models::ConnectivityResult::success(&target.url, std::time::Duration::from_millis(7), 204);

        let entry = website_entry(&target, &result).unwrap();
        assert_eq!(entry["status_code"], 204);
        assert_eq!(entry["accessible"], true);
        assert_eq!(entry["name"], "Mock");
        assert_eq!(entry["description"], "Local");
    }

    #[test]
    fn test_website_entry_rejects_non_object() {
        let target = WebsiteTarget::new("mock", "Mock", "http://127.0.0.1:1", "Local");

        let err = website_entry(&target, &"not an object").unwrap_err();
        assert_eq!(err.category(), "INTERNAL");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("mock"));

        // tuple keys cannot become JSON object keys
        let unserializable: std::collections::HashMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        let err = website_entry(&target, &unserializable).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("mock"));
    }

    #[tokio::test]
    async fn test_method_not_allowed_body() {
        let (status, Json(body)) = method_not_allowed().await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], METHOD_NOT_ALLOWED_MESSAGE);
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, Json(body)) = not_found().await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], NOT_FOUND_MESSAGE);
    }
}
