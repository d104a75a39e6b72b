//! HTTP transport implementation.
//!
//! The actual HTTP client is abstracted via a trait so the engine does not
//! pick an HTTP library. [`HttpTransport`] maps the authority's response
//! envelopes onto the [`SyncTransport`] port.

use crate::error::{SyncError, SyncResult};
use crate::transport::SyncTransport;
use mastersync_protocol::{schema_url, BatchRequest, ProtocolError, ResponseEnvelope, SyncBatch};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
    /// Value of the response signature header, if present.
    pub signature: Option<String>,
}

impl HttpResponse {
    /// A 200 response without signature.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            signature: None,
        }
    }

    /// Attaches a signature.
    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// Implementations map connection failures to [`SyncError::Network`].
pub trait HttpClient: Send + Sync {
    /// Sends a GET request.
    fn get(&self, url: &str) -> SyncResult<HttpResponse>;

    /// Checks if the network is available.
    fn is_reachable(&self) -> bool;
}

/// HTTP-based sync transport.
pub struct HttpTransport<C: HttpClient> {
    base_url: String,
    client: C,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            last_error: RwLock::new(None),
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn get_envelope<T: DeserializeOwned>(&self, url: &str) -> SyncResult<Option<T>> {
        let result = self.try_get_envelope(url);
        *self.last_error.write() = result.as_ref().err().map(ToString::to_string);
        result
    }

    fn try_get_envelope<T: DeserializeOwned>(&self, url: &str) -> SyncResult<Option<T>> {
        let response = self.client.get(url)?;

        if !response.is_success() {
            let message = format!("HTTP {} from {url}", response.status);
            return Err(if response.status >= 500 {
                SyncError::network_retryable(message)
            } else {
                SyncError::network_fatal(message)
            });
        }

        match ResponseEnvelope::<T>::from_slice(&response.body)?.into_response() {
            Ok(body) => Ok(body),
            Err(ProtocolError::Service { errors }) => Err(SyncError::network_fatal(
                ProtocolError::Service { errors }.to_string(),
            )),
            Err(other) => Err(other.into()),
        }
    }
}

impl<C: HttpClient> SyncTransport for HttpTransport<C> {
    fn fetch(&self, request: &BatchRequest) -> SyncResult<SyncBatch> {
        let url = request.url(&self.base_url);
        tracing::debug!(url = %url, "fetching sync batch");
        self.get_envelope::<SyncBatch>(&url)?
            .ok_or_else(|| ProtocolError::json("sync batch", "envelope has no response").into())
    }

    fn fetch_schema(&self, trigger_point: &str) -> SyncResult<Option<Value>> {
        let url = schema_url(&self.base_url, trigger_point);
        tracing::debug!(url = %url, "fetching identity schema");
        self.get_envelope::<Value>(&url)
    }

    fn is_reachable(&self) -> bool {
        self.client.is_reachable()
    }
}

impl<C: HttpClient> std::fmt::Debug for HttpTransport<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    struct TestClient {
        response: SyncResult<HttpResponse>,
        urls: Mutex<Vec<String>>,
    }

    impl TestClient {
        fn answering(response: HttpResponse) -> Self {
            Self {
                response: Ok(response),
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for TestClient {
        fn get(&self, url: &str) -> SyncResult<HttpResponse> {
            self.urls.lock().push(url.to_string());
            match &self.response {
                Ok(response) => Ok(response.clone()),
                Err(_) => Err(SyncError::network_retryable("connection refused")),
            }
        }

        fn is_reachable(&self) -> bool {
            self.response.is_ok()
        }
    }

    fn envelope(response: serde_json::Value) -> Vec<u8> {
        json!({"id": "mosip.clientsettings", "response": response, "errors": null})
            .to_string()
            .into_bytes()
    }

    #[test]
    fn fetch_parses_batch() {
        let body = envelope(json!({
            "dataToSync": [{"entityName": "Language", "entityType": "structured-data", "data": ""}],
            "lastSyncTime": "2024-03-01T10:30:00.000Z"
        }));
        let transport =
            HttpTransport::new("https://auth.example", TestClient::answering(HttpResponse::ok(body)));

        let batch = transport
            .fetch(&BatchRequest::new("key-1").with_last_updated("2024-01-01"))
            .unwrap();
        assert_eq!(batch.entries[0].category_name, "Language");
        assert!(transport.last_error().is_none());

        let urls = transport.client.urls.lock();
        assert_eq!(
            urls[0],
            "https://auth.example/v1/syncdata/clientsettings?keyindex=key-1&lastupdated=2024-01-01"
        );
    }

    #[test]
    fn non_success_status() {
        let transport = HttpTransport::new(
            "https://auth.example",
            TestClient::answering(HttpResponse {
                status: 503,
                body: Vec::new(),
                signature: None,
            }),
        );
        let err = transport.fetch(&BatchRequest::new("k")).unwrap_err();
        assert!(matches!(err, SyncError::Network { retryable: true, .. }));
        assert!(transport.last_error().unwrap().contains("503"));

        let transport = HttpTransport::new(
            "https://auth.example",
            TestClient::answering(HttpResponse {
                status: 401,
                body: Vec::new(),
                signature: None,
            }),
        );
        let err = transport.fetch(&BatchRequest::new("k")).unwrap_err();
        assert!(matches!(err, SyncError::Network { retryable: false, .. }));
    }

    #[test]
    fn envelope_errors_are_network_errors() {
        let body = json!({
            "response": null,
            "errors": [{"errorCode": "KER-SNC-149", "message": "machine not found"}]
        })
        .to_string();
        let transport = HttpTransport::new(
            "https://auth.example",
            TestClient::answering(HttpResponse::ok(body)),
        );

        let err = transport.fetch(&BatchRequest::new("k")).unwrap_err();
        assert!(err.to_string().contains("KER-SNC-149"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn missing_batch_is_protocol_error() {
        let transport = HttpTransport::new(
            "https://auth.example",
            TestClient::answering(HttpResponse::ok(envelope(json!(null)))),
        );
        assert!(matches!(
            transport.fetch(&BatchRequest::new("k")),
            Err(SyncError::Protocol(_))
        ));
    }

    #[test]
    fn schema_absent_is_none() {
        let transport = HttpTransport::new(
            "https://auth.example",
            TestClient::answering(HttpResponse::ok(envelope(json!(null)))),
        );
        assert!(transport.fetch_schema("System").unwrap().is_none());
    }

    #[test]
    fn connection_failure_propagates() {
        let transport = HttpTransport::new(
            "https://auth.example",
            TestClient {
                response: Err(SyncError::NoNetwork),
                urls: Mutex::new(Vec::new()),
            },
        );
        assert!(!transport.is_reachable());
        let err = transport.fetch_schema("System").unwrap_err();
        assert!(err.is_retryable());
    }
}
