//! Visit and QR-scan tracking, plus the aggregated stats endpoint for the
//! dashboard.
//!
//! Tracking is best-effort enrichment around a single row insert: the
//! client tells us source/path/referrer, the request itself provides ip and
//! User-Agent, and the geolocation API fills in country/city when a token
//! is configured. Only the insert can fail a request.

use crate::auth;
use crate::db::VisitRecord;
use crate::retry::{with_retry_if, RetryConfig};
use crate::server::AppState;
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    pub source: Option<String>,
    pub path: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrScanRequest {
    pub qr_id: String,
    pub path: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    pub success: bool,
    pub visit_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Country/city pair resolved for an ip address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoInfo {
    pub country: String,
    pub city: String,
}

impl Default for GeoInfo {
    fn default() -> Self {
        Self {
            country: "Unknown".to_string(),
            city: "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    country: Option<String>,
    city: Option<String>,
}

/// `POST /api/track` - record a page visit.
pub async fn track_visit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TrackRequest>,
) -> Response {
    let source = request.source.unwrap_or_else(|| "direct".to_string());
    let path = request.path.unwrap_or_else(|| "/".to_string());
    let referrer = request.referrer.unwrap_or_else(|| "direct".to_string());

    match record_visit(&state, &headers, source, path, referrer).await {
        Ok(visit_id) => Json(TrackResponse {
            success: true,
            visit_id,
        })
        .into_response(),
        Err(error) => {
            error!("Failed to track visit: {error:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "message": "Error tracking visit"})),
            )
                .into_response()
        }
    }
}

/// `POST /api/qr-scan` - record a QR code scan. The QR id doubles as the
/// visit source so scans show up in the same stats as page visits.
pub async fn track_qr_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<QrScanRequest>,
) -> Response {
    if !request.qr_id.starts_with("qr-") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Invalid QR ID format"})),
        )
            .into_response();
    }

    let path = request.path.unwrap_or_else(|| "/".to_string());
    let referrer = request.referrer.unwrap_or_else(|| "direct".to_string());

    match record_visit(&state, &headers, request.qr_id, path, referrer).await {
        Ok(visit_id) => Json(TrackResponse {
            success: true,
            visit_id,
        })
        .into_response(),
        Err(error) => {
            error!("Failed to track QR scan: {error:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "message": "Error tracking QR scan"})),
            )
                .into_response()
        }
    }
}

/// `GET /api/analytics/stats` - aggregated visit stats for the dashboard.
/// Requires a bearer token from `/api/auth/login`; the date range defaults
/// to the last 30 days and the end date is inclusive.
pub async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StatsQuery>,
) -> Response {
    if !auth::authorize(&headers, &state.sessions) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Authentication required"})),
        )
            .into_response();
    }

    let end_date = query.end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start_date = query.start_date.unwrap_or(end_date - Duration::days(30));

    let start = day_start_utc(start_date);
    let end = day_start_utc(end_date + Duration::days(1));

    match state.db.visit_stats(start, end) {
        Ok(stats) => Json(stats).into_response(),
        Err(error) => {
            error!("Failed to compute visit stats: {error:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"message": "Error computing stats"})),
            )
                .into_response()
        }
    }
}

async fn record_visit(
    state: &AppState,
    headers: &HeaderMap,
    source: String,
    path: String,
    referrer: String,
) -> Result<i64> {
    let ip_address = client_ip(headers);
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let geo = match &state.config.ipinfo_token {
        Some(token) if ip_address != "unknown" => {
            lookup_geo(&state.http, &state.config.geo_api_url, token, &ip_address)
                .await
                .unwrap_or_else(|error| {
                    warn!("Geolocation lookup failed for {ip_address}: {error:#}");
                    GeoInfo::default()
                })
        }
        _ => GeoInfo::default(),
    };

    let record = VisitRecord {
        timestamp: Utc::now(),
        device: classify_device(&user_agent).to_string(),
        browser: classify_browser(&user_agent).to_string(),
        country: geo.country,
        city: geo.city,
        ip_address,
        referrer,
        user_agent,
        source,
        path,
    };

    state.db.create_visit(&record)
}

/// First hop of `x-forwarded-for`, or "unknown". The service is expected to
/// sit behind a proxy that sets the header.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Coarse device classification from the User-Agent string. Tablets are
/// checked first because tablet UA strings may also contain "Mobile".
fn classify_device(user_agent: &str) -> &'static str {
    if user_agent.is_empty() || user_agent == "unknown" {
        "Unknown"
    } else if user_agent.contains("Tablet") || user_agent.contains("iPad") {
        "Tablet"
    } else if user_agent.contains("Mobile") {
        "Mobile"
    } else {
        "Desktop"
    }
}

/// Coarse browser classification. Order matters: Edge UA strings contain
/// "Chrome", and Chrome UA strings contain "Safari".
fn classify_browser(user_agent: &str) -> &'static str {
    if user_agent.contains("Edg") {
        "Edge"
    } else if user_agent.contains("Chrome") {
        "Chrome"
    } else if user_agent.contains("Firefox") {
        "Firefox"
    } else if user_agent.contains("Safari") {
        "Safari"
    } else {
        "Unknown"
    }
}

/// Resolve country/city for an ip via the ipinfo API.
async fn lookup_geo(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    ip: &str,
) -> Result<GeoInfo> {
    with_retry_if(
        &RetryConfig::geo_lookup(),
        &format!("Geolocation for {ip}"),
        || async {
            let response = client
                .get(format!("{base_url}/{ip}/json"))
                .query(&[("token", token)])
                .send()
                .await
                .context("Failed to send geolocation request")?;

            if !response.status().is_success() {
                let status = response.status();
                anyhow::bail!("Geolocation API error ({})", status);
            }

            let geo: GeoResponse = response
                .json()
                .await
                .context("Failed to parse geolocation response")?;

            Ok(GeoInfo {
                country: geo.country.unwrap_or_else(|| "Unknown".to_string()),
                city: geo.city.unwrap_or_else(|| "Unknown".to_string()),
            })
        },
        is_retryable_error,
    )
    .await
}

/// Determine if an error is retryable (5xx errors, 429 rate limit, network errors)
/// Other 4xx client errors should not be retried
fn is_retryable_error(error: &anyhow::Error) -> bool {
    let error_str = error.to_string();

    // Error format: "Geolocation API error (429 Too Many Requests)"
    if error_str.contains("Geolocation API error") {
        if let Some(start) = error_str.find('(') {
            if let Some(end) = error_str[start..].find(')') {
                let status_str = &error_str[start + 1..start + end];
                let status_num = status_str.split_whitespace().next().unwrap_or("");
                if let Ok(status) = status_num.parse::<u16>() {
                    return status == 429 || status >= 500;
                }
            }
        }
    }

    // Retry network errors, timeouts, and other transient failures
    true
}

fn day_start_utc(date: NaiveDate) -> chrono::DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Classification Tests ====================

    const CHROME_DESKTOP: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
    const FIREFOX_DESKTOP: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const EDGE_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36 Edg/120.0";

    #[test]
    fn test_classify_device() {
        assert_eq!(classify_device(CHROME_DESKTOP), "Desktop");
        assert_eq!(classify_device(SAFARI_IPHONE), "Mobile");
        assert_eq!(classify_device("Mozilla/5.0 (iPad; CPU OS 17_0)"), "Tablet");
        assert_eq!(classify_device("Mozilla/5.0 (Linux; Android 14; Tablet)"), "Tablet");
        assert_eq!(classify_device("unknown"), "Unknown");
        assert_eq!(classify_device(""), "Unknown");
    }

    #[test]
    fn test_classify_browser() {
        assert_eq!(classify_browser(CHROME_DESKTOP), "Chrome");
        assert_eq!(classify_browser(FIREFOX_DESKTOP), "Firefox");
        assert_eq!(classify_browser(SAFARI_IPHONE), "Safari");
        assert_eq!(classify_browser("curl/8.0"), "Unknown");
    }

    #[test]
    fn test_classify_browser_edge_before_chrome() {
        // Edge UAs contain "Chrome"; the Edge check must win.
        assert_eq!(classify_browser(EDGE_DESKTOP), "Edge");
    }

    // ==================== client_ip Tests ====================

    fn headers_with(name: &str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
            value.parse().unwrap(),
        );
        headers
    }

    #[test]
    fn test_client_ip_from_forwarded_header() {
        let headers = headers_with("x-forwarded-for", "203.0.113.7");
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_takes_first_hop() {
        let headers = headers_with("x-forwarded-for", "203.0.113.7, 10.0.0.1, 10.0.0.2");
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_missing_header() {
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn test_client_ip_empty_header() {
        let headers = headers_with("x-forwarded-for", "");
        assert_eq!(client_ip(&headers), "unknown");
    }

    // ==================== Geo Lookup Tests ====================

    #[tokio::test]
    async fn test_lookup_geo_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/203.0.113.7/json"))
            .and(query_param("token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "country": "ES",
                "city": "Madrid"
            })))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let geo = lookup_geo(&client, &mock_server.uri(), "test-token", "203.0.113.7")
            .await
            .expect("Should succeed");

        assert_eq!(geo.country, "ES");
        assert_eq!(geo.city, "Madrid");
    }

    #[tokio::test]
    async fn test_lookup_geo_partial_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/203.0.113.7/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"country": "ES"})))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let geo = lookup_geo(&client, &mock_server.uri(), "t", "203.0.113.7")
            .await
            .expect("Should succeed");

        assert_eq!(geo.country, "ES");
        assert_eq!(geo.city, "Unknown");
    }

    #[tokio::test]
    async fn test_lookup_geo_no_retry_on_403() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/203.0.113.7/json"))
            .respond_with(ResponseTemplate::new(403).set_body_string("invalid token"))
            .expect(1) // Should only be called once - no retries
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let result = lookup_geo(&client, &mock_server.uri(), "bad", "203.0.113.7").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_lookup_geo_retries_on_500() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/203.0.113.7/json"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/203.0.113.7/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "country": "ES",
                "city": "Sevilla"
            })))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let geo = lookup_geo(&client, &mock_server.uri(), "t", "203.0.113.7")
            .await
            .expect("Should succeed after retry");
        assert_eq!(geo.city, "Sevilla");
    }

    // ==================== is_retryable_error Tests ====================

    #[test]
    fn test_is_retryable_error_statuses() {
        let server_error = anyhow::anyhow!("Geolocation API error (500 Internal Server Error)");
        assert!(is_retryable_error(&server_error));

        let rate_limited = anyhow::anyhow!("Geolocation API error (429 Too Many Requests)");
        assert!(is_retryable_error(&rate_limited));

        let forbidden = anyhow::anyhow!("Geolocation API error (403 Forbidden)");
        assert!(!is_retryable_error(&forbidden));

        let network = anyhow::anyhow!("Failed to send geolocation request");
        assert!(is_retryable_error(&network));
    }

    // ==================== Date Range Tests ====================

    #[test]
    fn test_day_start_utc() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let start = day_start_utc(date);
        assert_eq!(start.to_rfc3339(), "2026-01-15T00:00:00+00:00");
    }

    #[test]
    fn test_stats_query_parses_dates() {
        let query: StatsQuery =
            serde_json::from_str(r#"{"startDate": "2026-01-01", "endDate": "2026-01-31"}"#)
                .unwrap();
        assert_eq!(
            query.start_date,
            Some(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
        );
        assert_eq!(
            query.end_date,
            Some(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap())
        );
    }
}
