// # NS1 Upstream Gateway
//
// This crate provides the production upstream gateway for the zonecache
// service: zone and record operations against the NS1 REST API v1.
//
// ## Behaviour
//
// - One HTTP request per operation; no retries, no backoff
// - Every answer is handed back to the engine as-is: the status decides
//   between accepted and rejected, the body is never parsed here
// - Zone and record names are percent-encoded as single path segments, so a
//   name can never address a different resource
// - Transport failures (DNS, connect, timeout) are `Error::Http`
// - Per-request timeout (10 seconds by default)
//
// ## Architectural Constraints
//
// ### Trust Level: Untrusted (Upstream Gateway)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS API calls to the configured NS1 endpoint only
//
// **Forbidden Capabilities** (enforced by code review):
// - ❌ Spawn tasks or threads
// - ❌ Implement retry logic
// - ❌ Access the zone cache (owned by ZoneEngine)
// - ❌ Interpret or rewrite a non-success answer
//
// ## Security Requirements
//
// - API key NEVER appears in logs or `Debug` output
// - API key MUST be provided via environment variables only
// - Construction fails if the key is empty
//
// ## API Reference
//
// - NS1 API v1: https://developer.ibm.com/apis/catalog/ns1--ibm-ns1-connect-api/
// - Create zone: PUT `/zones/:zone`
// - Update zone: POST `/zones/:zone`
// - Get zone: GET `/zones/:zone`
// - Delete zone: DELETE `/zones/:zone`
// - Create record: PUT `/zones/:zone/:domain/:type`

use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use zonecache_core::config::{DEFAULT_NS1_ENDPOINT, ProviderConfig};
use zonecache_core::registry::ProviderRegistry;
use zonecache_core::traits::{
    RecordService, Reply, UpstreamFactory, UpstreamResponse, UpstreamServices, ZoneService,
};
use zonecache_core::{Error, Record, Result, Zone};

/// Header carrying the API key
const API_KEY_HEADER: &str = "X-NSONE-Key";

/// Default HTTP timeout for API requests (10 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// NS1 upstream gateway
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot. Sequencing and cache writes are owned by
/// `ZoneEngine`.
pub struct Ns1Provider {
    /// NS1 API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API base URL; requests append their segments to its path
    endpoint: Url,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for Ns1Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ns1Provider")
            .field("api_key", &"<REDACTED>")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl Ns1Provider {
    /// Create a new NS1 provider
    ///
    /// # Parameters
    ///
    /// - `api_key`: NS1 API key with zone and record write access
    /// - `endpoint`: API base URL, e.g. `https://api.nsone.net/v1`
    /// - `timeout`: Per-request timeout
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("NS1 API key cannot be empty"));
        }

        let endpoint = endpoint.into();
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| Error::config(format!("Invalid NS1 endpoint '{}': {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::config(format!(
                "NS1 endpoint '{}' cannot carry a path",
                endpoint
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            endpoint,
            client,
        })
    }

    /// Create a provider against the public NS1 endpoint
    pub fn with_defaults(api_key: impl Into<String>) -> Result<Self> {
        Self::new(api_key, DEFAULT_NS1_ENDPOINT, DEFAULT_HTTP_TIMEOUT)
    }

    /// API base URL in use
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Append `segments` to the endpoint path, escaping each one
    ///
    /// A `/` inside a segment is sent as `%2F`. Empty, `.` and `..` segments
    /// would change which resource the path names, so they are refused.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(Error::invalid_input(format!(
                "'{}' cannot be used as an NS1 path segment",
                bad
            )));
        }

        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Send one request and capture its status and body
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
        target: &str,
    ) -> Result<UpstreamResponse> {
        let response = request
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| Error::http(format!("NS1 {} {} failed: {}", operation, target, e)))?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            Error::http(format!(
                "NS1 {} {}: failed to read response body: {}",
                operation, target, e
            ))
        })?;

        tracing::debug!(
            "NS1 {} {} -> {} ({} bytes)",
            operation,
            target,
            status,
            body.len()
        );
        Ok(UpstreamResponse::new(status, body.to_vec()))
    }
}

#[async_trait]
impl ZoneService for Ns1Provider {
    async fn create_zone(&self, zone: &Zone) -> Result<Reply> {
        let request = self.client.put(self.url(&["zones", &zone.name])?).json(zone);
        let response = self.send(request, "create zone", &zone.name).await?;
        Ok(Reply::from_response(response))
    }

    async fn update_zone(&self, zone: &Zone) -> Result<Reply> {
        let request = self.client.post(self.url(&["zones", &zone.name])?).json(zone);
        let response = self.send(request, "update zone", &zone.name).await?;
        Ok(Reply::from_response(response))
    }

    async fn get_zone(&self, name: &str) -> Result<Reply> {
        let request = self.client.get(self.url(&["zones", name])?);
        let response = self.send(request, "get zone", name).await?;
        Ok(Reply::from_response(response))
    }

    async fn delete_zone(&self, name: &str) -> Result<Reply> {
        let request = self.client.delete(self.url(&["zones", name])?);
        let response = self.send(request, "delete zone", name).await?;
        Ok(Reply::from_response(response))
    }

    fn provider_name(&self) -> &'static str {
        "ns1"
    }
}

#[async_trait]
impl RecordService for Ns1Provider {
    async fn create_record(&self, record: &Record) -> Result<Reply> {
        let url = self.url(&["zones", &record.zone, &record.domain, &record.record_type])?;
        let request = self.client.put(url).json(record);
        let response = self
            .send(request, "create record", &record.key().to_string())
            .await?;
        Ok(Reply::from_response(response))
    }
}

/// Factory building [`Ns1Provider`] from `ProviderConfig::Ns1`
pub struct Ns1Factory;

impl UpstreamFactory for Ns1Factory {
    fn create(&self, config: &ProviderConfig) -> Result<UpstreamServices> {
        match config {
            ProviderConfig::Ns1 {
                api_key,
                endpoint,
                timeout_secs,
            } => {
                if api_key.is_empty() {
                    return Err(Error::config("NS1 API key is required"));
                }

                let provider = Ns1Provider::new(
                    api_key.clone(),
                    endpoint.clone(),
                    Duration::from_secs(*timeout_secs),
                )?;
                tracing::info!("Using NS1 at {}", provider.endpoint());

                Ok(UpstreamServices::from_provider(Arc::new(provider)))
            }
            _ => Err(Error::config("Invalid config for NS1 provider")),
        }
    }
}

/// Register the NS1 provider under the `ns1` type name
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider("ns1", Box::new(Ns1Factory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::put;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    const KEY: &str = "test-key-12345";

    /// Requests the mock received, as "<op> <path params>"
    type Hits = Arc<Mutex<Vec<String>>>;

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            == Some(KEY)
    }

    /// Minimal stand-in for the NS1 API: knows `example.com` only
    ///
    /// Record creation answers 200 with an empty body, like NS1 may.
    async fn mock_ns1() -> (String, Hits) {
        async fn create_zone(
            headers: HeaderMap,
            Path(zone): Path<String>,
            axum::Json(body): axum::Json<Value>,
        ) -> (StatusCode, String) {
            if !authorized(&headers) {
                return (StatusCode::UNAUTHORIZED, r#"{"message":"Unauthorized"}"#.into());
            }
            if zone != "example.com" {
                return (StatusCode::BAD_REQUEST, r#"{"message":"invalid: FQDN"}"#.into());
            }
            let mut doc = body;
            doc["id"] = json!("52051b2c9f782d58bb4df41b");
            doc["ttl"] = json!(3600);
            doc["dns_servers"] = json!(["dns1.p06.nsone.net", "dns2.p06.nsone.net"]);
            doc["hostmaster"] = json!("hostmaster@nsone.net");
            (StatusCode::OK, doc.to_string())
        }

        async fn get_zone(Path(zone): Path<String>) -> (StatusCode, String) {
            if zone == "example.com" {
                let doc = json!({ "zone": zone, "id": "52051b2c9f782d58bb4df41b", "records": [] });
                (StatusCode::OK, doc.to_string())
            } else {
                (StatusCode::NOT_FOUND, r#"{"message":"zone not found"}"#.into())
            }
        }

        async fn delete_zone(
            State(hits): State<Hits>,
            Path(zone): Path<String>,
        ) -> (StatusCode, &'static str) {
            hits.lock().unwrap().push(format!("delete zone {zone}"));
            (StatusCode::OK, "{}")
        }

        async fn create_record(
            State(hits): State<Hits>,
            Path((zone, domain, rtype)): Path<(String, String, String)>,
        ) -> StatusCode {
            hits.lock()
                .unwrap()
                .push(format!("create record {zone} {domain} {rtype}"));
            StatusCode::OK
        }

        async fn delete_record(
            State(hits): State<Hits>,
            Path((zone, domain, rtype)): Path<(String, String, String)>,
        ) -> (StatusCode, &'static str) {
            hits.lock()
                .unwrap()
                .push(format!("delete record {zone} {domain} {rtype}"));
            (StatusCode::OK, "{}")
        }

        let hits = Hits::default();
        let app = Router::new()
            .route(
                "/v1/zones/{zone}",
                put(create_zone).get(get_zone).delete(delete_zone),
            )
            .route(
                "/v1/zones/{zone}/{domain}/{rtype}",
                put(create_record).delete(delete_record),
            )
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/v1/", addr), hits)
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let err = Ns1Provider::new("", DEFAULT_NS1_ENDPOINT, DEFAULT_HTTP_TIMEOUT).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let err = Ns1Provider::new(KEY, "not a url", DEFAULT_HTTP_TIMEOUT).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_api_key_not_exposed_in_debug() {
        let provider = Ns1Provider::with_defaults("secret_key_12345").unwrap();

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_key"));
        assert!(debug_str.contains("Ns1Provider"));
        assert!(debug_str.contains("<REDACTED>"));
    }

    #[test]
    fn test_urls_are_built_from_segments() {
        for endpoint in ["https://api.nsone.net/v1/", "https://api.nsone.net/v1"] {
            let provider = Ns1Provider::new(KEY, endpoint, DEFAULT_HTTP_TIMEOUT).unwrap();
            assert_eq!(
                provider
                    .url(&["zones", "example.com", "www.example.com", "A"])
                    .unwrap()
                    .as_str(),
                "https://api.nsone.net/v1/zones/example.com/www.example.com/A"
            );
        }
    }

    #[test]
    fn test_names_stay_inside_their_segment() {
        let provider = Ns1Provider::with_defaults(KEY).unwrap();

        let url = provider
            .url(&["zones", "example.com/www.example.com/A"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.nsone.net/v1/zones/example.com%2Fwww.example.com%2FA"
        );

        for segment in ["", ".", ".."] {
            let err = provider.url(&["zones", segment]).unwrap_err();
            assert!(err.is_local_rejection(), "segment {segment:?}");
        }
    }

    #[test]
    fn test_factory_builds_from_config() {
        let config = ProviderConfig::Ns1 {
            api_key: KEY.to_string(),
            endpoint: DEFAULT_NS1_ENDPOINT.to_string(),
            timeout_secs: 10,
        };
        let services = Ns1Factory.create(&config).unwrap();
        assert_eq!(services.zones.provider_name(), "ns1");

        assert!(Ns1Factory.create(&ProviderConfig::Memory).is_err());
    }

    #[test]
    fn test_register_adds_ns1() {
        let registry = ProviderRegistry::new();
        register(&registry);
        assert!(registry.has_provider("ns1"));
    }

    #[tokio::test]
    async fn test_create_zone_returns_provider_body_untouched() {
        let (endpoint, _) = mock_ns1().await;
        let provider = Ns1Provider::new(KEY, endpoint, DEFAULT_HTTP_TIMEOUT).unwrap();

        let response = provider
            .create_zone(&Zone::named("example.com"))
            .await
            .unwrap()
            .accepted()
            .unwrap();

        assert_eq!(response.status, 200);
        let document: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(document["id"], "52051b2c9f782d58bb4df41b");
        assert_eq!(document["ttl"], 3600);
        assert_eq!(document["dns_servers"][0], "dns1.p06.nsone.net");
        assert_eq!(document["hostmaster"], "hostmaster@nsone.net");
    }

    #[tokio::test]
    async fn test_rejection_keeps_status_and_body() {
        let (endpoint, _) = mock_ns1().await;
        let provider = Ns1Provider::new(KEY, endpoint, DEFAULT_HTTP_TIMEOUT).unwrap();

        let reply = provider.get_zone("missing.com").await.unwrap();
        assert_eq!(
            reply,
            Reply::Rejected(UpstreamResponse::new(404, r#"{"message":"zone not found"}"#))
        );
    }

    #[tokio::test]
    async fn test_wrong_key_is_a_rejection_not_an_error() {
        let (endpoint, _) = mock_ns1().await;
        let provider = Ns1Provider::new("wrong-key", endpoint, DEFAULT_HTTP_TIMEOUT).unwrap();

        let reply = provider.create_zone(&Zone::named("example.com")).await.unwrap();
        assert_eq!(reply.status(), 401);
    }

    #[tokio::test]
    async fn test_delete_passes_body_through() {
        let (endpoint, hits) = mock_ns1().await;
        let provider = Ns1Provider::new(KEY, endpoint, DEFAULT_HTTP_TIMEOUT).unwrap();

        let response = provider
            .delete_zone("example.com")
            .await
            .unwrap()
            .accepted()
            .unwrap();
        assert_eq!(response.into_body(), b"{}");
        assert_eq!(*hits.lock().unwrap(), vec!["delete zone example.com"]);
    }

    #[tokio::test]
    async fn test_slashed_zone_name_cannot_reach_a_record() {
        let (endpoint, hits) = mock_ns1().await;
        let provider = Ns1Provider::new(KEY, endpoint, DEFAULT_HTTP_TIMEOUT).unwrap();

        provider
            .delete_zone("example.com/www.example.com/A")
            .await
            .unwrap();

        assert_eq!(
            *hits.lock().unwrap(),
            vec!["delete zone example.com/www.example.com/A"]
        );
    }

    #[tokio::test]
    async fn test_record_create_with_empty_body_is_accepted() {
        let (endpoint, hits) = mock_ns1().await;
        let provider = Ns1Provider::new(KEY, endpoint, DEFAULT_HTTP_TIMEOUT).unwrap();

        let record = Record::new("example.com", "www.example.com", "A").with_answer(["1.2.3.4"]);
        let reply = provider.create_record(&record).await.unwrap();

        assert_eq!(reply, Reply::Accepted(UpstreamResponse::new(200, Vec::new())));
        assert_eq!(
            *hits.lock().unwrap(),
            vec!["create record example.com www.example.com A"]
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let provider = Ns1Provider::new(KEY, "http://127.0.0.1:1/v1", DEFAULT_HTTP_TIMEOUT).unwrap();

        let err = provider.get_zone("example.com").await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        assert!(!err.to_string().contains(KEY));
    }

    #[test]
    fn test_provider_name() {
        let provider = Ns1Provider::with_defaults(KEY).unwrap();
        assert_eq!(provider.provider_name(), "ns1");
    }
}
