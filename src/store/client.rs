//! REST client for the hosted document store.
//!
//! The store owns persistence, document ids, and server-generated timestamps;
//! this client shapes requests against one transport configuration and maps
//! failures into [`StoreError`]. Retry and fallback policy live in
//! [`crate::store::resilient`], not here.

use crate::error::{ErrorDescriptor, StoreError};
use crate::store::transport::{TransportMode, build_store_client};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

/// One write attempt against one transport configuration.
///
/// The seam the resilient writer drives; scripted doubles implement it in
/// tests.
#[async_trait]
pub trait WriteTransport: Send + Sync {
    async fn create_document(
        &self,
        collection: &str,
        payload: &Map<String, Value>,
    ) -> Result<String, StoreError>;
}

/// Sentinel the store replaces with its own clock on write.
pub fn server_timestamp() -> Value {
    serde_json::json!({ ".sv": "timestamp" })
}

#[derive(Clone)]
pub struct StoreClient {
    mode: TransportMode,
    /// Pre-computed `{base}/v1/projects/{project}/collections` prefix.
    cached_collections_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    status: Option<String>,
    message: String,
}

impl StoreClient {
    pub fn new(base_url: &str, project_id: &str, mode: TransportMode) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            mode,
            cached_collections_url: format!("{base}/v1/projects/{project_id}/collections"),
            client: build_store_client(mode),
        }
    }

    pub fn from_config(config: &crate::config::StoreConfig, mode: TransportMode) -> Self {
        Self::new(&config.base_url, &config.project_id, mode)
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    fn documents_url(&self, collection: &str) -> String {
        format!("{}/{collection}/documents", self.cached_collections_url)
    }

    /// Create a document with a store-assigned id; returns that id.
    pub async fn create(
        &self,
        collection: &str,
        payload: &Map<String, Value>,
    ) -> Result<String, StoreError> {
        let response = self
            .client
            .post(self.documents_url(collection))
            .json(payload)
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(rejection(&body, status));
        }

        let created: CreateResponse = serde_json::from_str(&body)
            .map_err(|err| StoreError::Malformed(format!("create response: {err}")))?;
        Ok(document_id_from_name(&created.name))
    }

    /// Upsert a document at a caller-chosen id (`users/{uid}` profile docs).
    pub async fn set(
        &self,
        collection: &str,
        document_id: &str,
        payload: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let url = format!("{}/{document_id}", self.documents_url(collection));
        let response = self
            .client
            .patch(url)
            .json(payload)
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|err| StoreError::Transport(err.to_string()))?;
            return Err(rejection(&body, status));
        }
        Ok(())
    }
}

#[async_trait]
impl WriteTransport for StoreClient {
    async fn create_document(
        &self,
        collection: &str,
        payload: &Map<String, Value>,
    ) -> Result<String, StoreError> {
        self.create(collection, payload).await
    }
}

/// The store names documents with a full resource path; callers only ever see
/// the trailing id segment.
fn document_id_from_name(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

fn rejection(body: &str, status: reqwest::StatusCode) -> StoreError {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        let code = envelope
            .error
            .status
            .map(|s| s.trim().to_ascii_lowercase().replace('_', "-"))
            .filter(|s| !s.is_empty());
        return StoreError::Rejected(ErrorDescriptor::new(code, envelope.error.message));
    }

    // No parseable error body; keep the HTTP status line as the message so
    // the transport-suspect classifier still sees "400 Bad Request".
    StoreError::Rejected(ErrorDescriptor::message_only(format!("HTTP {status}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn waitlist_payload() -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("name".into(), Value::String("Ada".into()));
        payload.insert("email".into(), Value::String("ada@nexgenu.edu".into()));
        payload.insert("joined_at".into(), server_timestamp());
        payload
    }

    fn make_client(url: &str) -> StoreClient {
        StoreClient::new(url, "nexgen-university-001", TransportMode::Streaming)
    }

    #[test]
    fn document_id_is_trailing_path_segment() {
        assert_eq!(
            document_id_from_name("projects/p/collections/waitlists/documents/abc123"),
            "abc123"
        );
        assert_eq!(document_id_from_name("abc123"), "abc123");
    }

    #[test]
    fn server_timestamp_is_the_sentinel_object() {
        assert_eq!(server_timestamp(), serde_json::json!({".sv": "timestamp"}));
    }

    #[tokio::test]
    async fn create_posts_payload_and_returns_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/v1/projects/nexgen-university-001/collections/waitlists/documents",
            ))
            .and(body_partial_json(
                serde_json::json!({"email": "ada@nexgenu.edu"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "projects/nexgen-university-001/collections/waitlists/documents/w-1",
                "create_time": "2025-09-01T12:00:00Z"
            })))
            .mount(&server)
            .await;

        let id = make_client(&server.uri())
            .create("waitlists", &waitlist_payload())
            .await
            .unwrap();
        assert_eq!(id, "w-1");
    }

    #[tokio::test]
    async fn rejection_carries_code_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"status": "PERMISSION_DENIED", "message": "Missing permissions"}
            })))
            .mount(&server)
            .await;

        let err = make_client(&server.uri())
            .create("waitlists", &waitlist_payload())
            .await
            .unwrap_err();
        let descriptor = err.descriptor();
        assert_eq!(descriptor.code.as_deref(), Some("permission-denied"));
        assert_eq!(descriptor.message, "Missing permissions");
    }

    #[tokio::test]
    async fn unparseable_rejection_keeps_status_line() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("<html>proxy says no</html>"))
            .mount(&server)
            .await;

        let err = make_client(&server.uri())
            .create("waitlists", &waitlist_payload())
            .await
            .unwrap_err();
        let descriptor = err.descriptor();
        assert!(descriptor.code.is_none());
        assert!(descriptor.message.contains("400 Bad Request"));
    }

    #[tokio::test]
    async fn set_patches_document_at_id() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(
                "/v1/projects/nexgen-university-001/collections/users/documents/uid-1",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        make_client(&server.uri())
            .set("users", "uid-1", &waitlist_payload())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_error() {
        // Port 1 refuses connections.
        let err = StoreClient::new("http://127.0.0.1:1", "p", TransportMode::Streaming)
            .create("waitlists", &waitlist_payload())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }
}
