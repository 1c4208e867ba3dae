//! Resilient write pipeline for the waitlist signup path.
//!
//! One logical write, at-least-once: a primary attempt on the default
//! transport, at most one fallback attempt on the long-polling transport when
//! the failure looks transport-inflicted, then a bounded number of generic
//! retries with linear backoff. The caller sees a single terminal outcome;
//! it is never told how many underlying writes were attempted, and a retry
//! after a lost-response-but-committed write can produce a duplicate
//! document. Callers that cannot tolerate duplicates must serialize their own
//! submissions.

use crate::error::ErrorDescriptor;
use crate::store::client::WriteTransport;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Message substrings that mark a failure as inflicted by the transport path
/// rather than by the store itself.
const TRANSPORT_MESSAGE_MARKERS: [&str; 4] = [
    "WebChannelConnection",
    "transport errored",
    "Bad Request",
    "400",
];

/// Status codes (substring, case-insensitive) for transient availability
/// failures.
const TRANSPORT_CODE_MARKERS: [&str; 2] = ["internal", "unavailable"];

/// One logical write: collection plus payload. Constructed fresh per
/// submission, never reused.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub collection: String,
    pub payload: Map<String, Value>,
}

impl WriteRequest {
    pub fn new(collection: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            collection: collection.into(),
            payload,
        }
    }
}

/// Terminal outcome of one [`ResilientWriter::write`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Success {
        document_id: String,
    },
    Failure {
        classification: FailureClass,
        last_error: ErrorDescriptor,
    },
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    TransportSuspect,
    Other,
}

/// Retry knobs. `max_generic_retries` bounds the attempts after the primary
/// (and possible fallback) attempt; the delay before generic retry *i*
/// (0-based) is `backoff_base_ms * (i + 1)`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_generic_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_generic_retries: 1,
            backoff_base_ms: 500,
        }
    }
}

impl From<&crate::config::ReliabilityConfig> for RetryPolicy {
    fn from(config: &crate::config::ReliabilityConfig) -> Self {
        Self {
            max_generic_retries: config.max_generic_retries,
            backoff_base_ms: config.backoff_base_ms,
        }
    }
}

/// Classify a failure as transport-suspect or not.
///
/// Total over every descriptor: any message, any code, including empty ones.
pub fn is_transport_suspect(error: &ErrorDescriptor) -> bool {
    if TRANSPORT_MESSAGE_MARKERS
        .iter()
        .any(|marker| error.message.contains(marker))
    {
        return true;
    }

    error
        .code
        .as_deref()
        .map(str::to_ascii_lowercase)
        .is_some_and(|code| {
            TRANSPORT_CODE_MARKERS
                .iter()
                .any(|marker| code.contains(marker))
        })
}

pub struct ResilientWriter {
    primary: Arc<dyn WriteTransport>,
    fallback: Arc<dyn WriteTransport>,
    policy: RetryPolicy,
}

impl ResilientWriter {
    pub fn new(
        primary: Arc<dyn WriteTransport>,
        fallback: Arc<dyn WriteTransport>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            primary,
            fallback,
            policy,
        }
    }

    /// Perform one logical write, returning the first success or the last
    /// observed failure.
    ///
    /// Attempt order: primary on the default transport; one fallback attempt
    /// iff the primary failure is transport-suspect; then up to
    /// `max_generic_retries` attempts back on the default transport with
    /// linear backoff. The generic loop runs after a failed fallback too, and
    /// it retries non-transport failures as well — a permanent error (e.g.
    /// permission-denied) burns through every retry before surfacing. Attempts
    /// run strictly in sequence; there is no cancellation once started.
    pub async fn write(&self, request: &WriteRequest) -> WriteOutcome {
        let mut last_error = match self.attempt(self.primary.as_ref(), request).await {
            Ok(document_id) => return WriteOutcome::Success { document_id },
            Err(error) => error,
        };
        tracing::warn!(
            collection = %request.collection,
            error = %last_error,
            "primary write attempt failed"
        );

        if is_transport_suspect(&last_error) {
            tracing::info!(
                collection = %request.collection,
                "retrying write on the long-polling fallback transport"
            );
            match self.attempt(self.fallback.as_ref(), request).await {
                Ok(document_id) => return WriteOutcome::Success { document_id },
                Err(error) => {
                    tracing::warn!(error = %error, "fallback write attempt failed");
                    last_error = error;
                }
            }
        }

        for attempt in 0..self.policy.max_generic_retries {
            let delay = self.policy.backoff_base_ms * u64::from(attempt + 1);
            sleep(Duration::from_millis(delay)).await;

            match self.attempt(self.primary.as_ref(), request).await {
                Ok(document_id) => return WriteOutcome::Success { document_id },
                Err(error) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %error,
                        "generic retry attempt failed"
                    );
                    last_error = error;
                }
            }
        }

        let classification = if is_transport_suspect(&last_error) {
            FailureClass::TransportSuspect
        } else {
            FailureClass::Other
        };
        WriteOutcome::Failure {
            classification,
            last_error,
        }
    }

    async fn attempt(
        &self,
        transport: &dyn WriteTransport,
        request: &WriteRequest,
    ) -> Result<String, ErrorDescriptor> {
        transport
            .create_document(&request.collection, &request.payload)
            .await
            .map_err(|err| err.descriptor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted transport: pops one result per call, counts calls.
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<String, StoreError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<String, StoreError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WriteTransport for ScriptedTransport {
        async fn create_document(
            &self,
            _collection: &str,
            _payload: &Map<String, Value>,
        ) -> Result<String, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(rejected(None, "script exhausted")))
        }
    }

    fn rejected(code: Option<&str>, message: &str) -> StoreError {
        StoreError::Rejected(ErrorDescriptor::new(
            code.map(ToOwned::to_owned),
            message.to_string(),
        ))
    }

    fn request() -> WriteRequest {
        let mut payload = Map::new();
        payload.insert("email".into(), Value::String("ada@nexgenu.edu".into()));
        WriteRequest::new("waitlists", payload)
    }

    fn writer(
        primary: &Arc<ScriptedTransport>,
        fallback: &Arc<ScriptedTransport>,
        policy: RetryPolicy,
    ) -> ResilientWriter {
        ResilientWriter::new(
            Arc::clone(primary) as Arc<dyn WriteTransport>,
            Arc::clone(fallback) as Arc<dyn WriteTransport>,
            policy,
        )
    }

    // ── Classification ───────────────────────────────────────────────

    #[test]
    fn webchannel_message_is_transport_suspect() {
        let descriptor =
            ErrorDescriptor::message_only("WebChannelConnection transport errored");
        assert!(is_transport_suspect(&descriptor));
    }

    #[test]
    fn permission_denied_is_not_transport_suspect() {
        let descriptor = ErrorDescriptor::new(
            Some("permission-denied".into()),
            "Missing permissions",
        );
        assert!(!is_transport_suspect(&descriptor));
    }

    #[test]
    fn availability_codes_match_case_insensitively() {
        for code in ["internal", "INTERNAL", "unavailable", "Unavailable"] {
            let descriptor = ErrorDescriptor::new(Some(code.into()), "try again");
            assert!(is_transport_suspect(&descriptor), "code {code}");
        }
    }

    #[test]
    fn http_400_status_line_is_transport_suspect() {
        let descriptor = ErrorDescriptor::message_only("HTTP 400 Bad Request");
        assert!(is_transport_suspect(&descriptor));
    }

    #[test]
    fn classifier_is_total_over_empty_input() {
        // Never panics: empty message, missing code, empty code.
        assert!(!is_transport_suspect(&ErrorDescriptor::message_only("")));
        assert!(!is_transport_suspect(&ErrorDescriptor::new(
            Some(String::new()),
            ""
        )));
    }

    // ── Pipeline ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn primary_success_skips_fallback_and_retries() {
        let primary = ScriptedTransport::new(vec![Ok("w-1".into())]);
        let fallback = ScriptedTransport::new(vec![]);

        let outcome = writer(&primary, &fallback, RetryPolicy::default())
            .write(&request())
            .await;

        assert_eq!(
            outcome,
            WriteOutcome::Success {
                document_id: "w-1".into()
            }
        );
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn transport_suspect_failure_runs_fallback_exactly_once() {
        let primary = ScriptedTransport::new(vec![Err(rejected(
            None,
            "WebChannelConnection transport errored",
        ))]);
        let fallback = ScriptedTransport::new(vec![Ok("w-2".into())]);

        let outcome = writer(&primary, &fallback, RetryPolicy::default())
            .write(&request())
            .await;

        assert!(outcome.is_success());
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fallback_still_enters_generic_retries() {
        let primary = ScriptedTransport::new(vec![
            Err(rejected(Some("unavailable"), "store unavailable")),
            Ok("w-3".into()),
        ]);
        let fallback =
            ScriptedTransport::new(vec![Err(rejected(Some("unavailable"), "still down"))]);

        let outcome = writer(&primary, &fallback, RetryPolicy::default())
            .write(&request())
            .await;

        assert!(outcome.is_success());
        assert_eq!(primary.calls(), 2);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn non_transport_failure_skips_fallback_and_returns_last_error() {
        let primary = ScriptedTransport::new(vec![
            Err(rejected(Some("permission-denied"), "E1")),
            Err(rejected(Some("permission-denied"), "E2")),
        ]);
        let fallback = ScriptedTransport::new(vec![]);

        let outcome = writer(
            &primary,
            &fallback,
            RetryPolicy {
                max_generic_retries: 1,
                backoff_base_ms: 500,
            },
        )
        .write(&request())
        .await;

        assert_eq!(fallback.calls(), 0);
        assert_eq!(primary.calls(), 2);
        match outcome {
            WriteOutcome::Failure {
                classification,
                last_error,
            } => {
                assert_eq!(classification, FailureClass::Other);
                assert_eq!(last_error.message, "E2");
            }
            WriteOutcome::Success { .. } => panic!("expected exhaustion"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_is_linear_in_attempt_number() {
        let primary = ScriptedTransport::new(vec![
            Err(rejected(Some("permission-denied"), "E0")),
            Err(rejected(Some("permission-denied"), "E1")),
            Err(rejected(Some("permission-denied"), "E2")),
        ]);
        let fallback = ScriptedTransport::new(vec![]);

        let started = tokio::time::Instant::now();
        let outcome = writer(
            &primary,
            &fallback,
            RetryPolicy {
                max_generic_retries: 2,
                backoff_base_ms: 500,
            },
        )
        .write(&request())
        .await;

        // 500ms before retry 1, 1000ms before retry 2; virtual clock, exact.
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
        assert!(!outcome.is_success());
        assert_eq!(primary.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_transport_suspect_failure_is_classified_as_such() {
        let primary = ScriptedTransport::new(vec![
            Err(rejected(None, "WebChannelConnection transport errored")),
            Err(rejected(None, "WebChannelConnection transport errored")),
        ]);
        let fallback =
            ScriptedTransport::new(vec![Err(rejected(None, "HTTP 400 Bad Request"))]);

        let outcome = writer(&primary, &fallback, RetryPolicy::default())
            .write(&request())
            .await;

        match outcome {
            WriteOutcome::Failure { classification, .. } => {
                assert_eq!(classification, FailureClass::TransportSuspect);
            }
            WriteOutcome::Success { .. } => panic!("expected exhaustion"),
        }
    }

    #[tokio::test]
    async fn zero_retries_surfaces_primary_error_without_delay() {
        let primary =
            ScriptedTransport::new(vec![Err(rejected(Some("permission-denied"), "E1"))]);
        let fallback = ScriptedTransport::new(vec![]);

        let outcome = writer(
            &primary,
            &fallback,
            RetryPolicy {
                max_generic_retries: 0,
                backoff_base_ms: 500,
            },
        )
        .write(&request())
        .await;

        assert_eq!(primary.calls(), 1);
        match outcome {
            WriteOutcome::Failure { last_error, .. } => assert_eq!(last_error.message, "E1"),
            WriteOutcome::Success { .. } => panic!("expected failure"),
        }
    }
}
