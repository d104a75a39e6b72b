//! Response signature verification.
//!
//! The authority signs every response body with HMAC-SHA256 and sends the
//! base64 signature alongside it. [`VerifyingClient`] wraps any
//! [`HttpClient`] and rejects responses whose signature does not match
//! before the transport parses them.

use crate::error::{SyncError, SyncResult};
use crate::http::{HttpClient, HttpResponse};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Checks that a response body was produced by the authority.
pub trait ResponseVerifier: Send + Sync {
    /// Verifies `body` against `signature`.
    fn verify(&self, body: &[u8], signature: Option<&str>) -> SyncResult<()>;
}

/// HMAC-SHA256 verifier over the raw response body.
#[derive(Clone)]
pub struct HmacVerifier {
    key: Vec<u8>,
}

impl HmacVerifier {
    /// Creates a verifier with a shared secret.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Signs a body, returning the base64 signature the authority would send.
    pub fn sign(&self, body: &[u8]) -> SyncResult<String> {
        Ok(STANDARD.encode(self.mac(body)?.finalize().into_bytes()))
    }

    fn mac(&self, body: &[u8]) -> SyncResult<HmacSha256> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.key)
            .map_err(|e| SyncError::SignatureInvalid(format!("unusable key: {e}")))?;
        mac.update(body);
        Ok(mac)
    }
}

impl ResponseVerifier for HmacVerifier {
    fn verify(&self, body: &[u8], signature: Option<&str>) -> SyncResult<()> {
        let signature =
            signature.ok_or_else(|| SyncError::SignatureInvalid("missing signature".into()))?;
        let expected = STANDARD
            .decode(signature.trim())
            .map_err(|_| SyncError::SignatureInvalid("signature is not base64".into()))?;

        self.mac(body)?
            .verify_slice(&expected)
            .map_err(|_| SyncError::SignatureInvalid("signature mismatch".into()))
    }
}

impl std::fmt::Debug for HmacVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacVerifier").finish_non_exhaustive()
    }
}

/// An [`HttpClient`] that verifies every successful response.
///
/// Error statuses are passed through untouched so the transport can report
/// them as network errors.
#[derive(Debug)]
pub struct VerifyingClient<C, V> {
    inner: C,
    verifier: V,
}

impl<C: HttpClient, V: ResponseVerifier> VerifyingClient<C, V> {
    /// Wraps a client.
    pub fn new(inner: C, verifier: V) -> Self {
        Self { inner, verifier }
    }

    /// Returns the wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: HttpClient, V: ResponseVerifier> HttpClient for VerifyingClient<C, V> {
    fn get(&self, url: &str) -> SyncResult<HttpResponse> {
        let response = self.inner.get(url)?;
        if response.is_success() {
            if let Err(e) = self
                .verifier
                .verify(&response.body, response.signature.as_deref())
            {
                tracing::warn!(url = %url, error = %e, "rejecting unverified response");
                return Err(e);
            }
        }
        Ok(response)
    }

    fn is_reachable(&self) -> bool {
        self.inner.is_reachable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpTransport;
    use crate::transport::SyncTransport;

    struct Fixed(HttpResponse);

    impl HttpClient for Fixed {
        fn get(&self, _url: &str) -> SyncResult<HttpResponse> {
            Ok(self.0.clone())
        }

        fn is_reachable(&self) -> bool {
            true
        }
    }

    const BODY: &[u8] = br#"{"response":{"dataToSync":[]},"errors":[]}"#;

    #[test]
    fn sign_then_verify() {
        let verifier = HmacVerifier::new(b"shared-secret".to_vec());
        let signature = verifier.sign(BODY).unwrap();
        assert!(verifier.verify(BODY, Some(&signature)).is_ok());
    }

    #[test]
    fn tampered_body_rejected() {
        let verifier = HmacVerifier::new(b"shared-secret".to_vec());
        let signature = verifier.sign(BODY).unwrap();

        let err = verifier.verify(b"{}", Some(&signature)).unwrap_err();
        assert!(matches!(err, SyncError::SignatureInvalid(_)));
    }

    #[test]
    fn wrong_key_rejected() {
        let signature = HmacVerifier::new(b"other".to_vec()).sign(BODY).unwrap();
        let verifier = HmacVerifier::new(b"shared-secret".to_vec());
        assert!(verifier.verify(BODY, Some(&signature)).is_err());
    }

    #[test]
    fn missing_or_garbled_signature() {
        let verifier = HmacVerifier::new(b"k".to_vec());
        assert!(matches!(
            verifier.verify(BODY, None),
            Err(SyncError::SignatureInvalid(m)) if m.contains("missing")
        ));
        assert!(matches!(
            verifier.verify(BODY, Some("%%%")),
            Err(SyncError::SignatureInvalid(m)) if m.contains("base64")
        ));
    }

    #[test]
    fn verifying_client_guards_transport() {
        let verifier = HmacVerifier::new(b"shared-secret".to_vec());
        let signed = HttpResponse::ok(BODY).with_signature(verifier.sign(BODY).unwrap());
        let transport = HttpTransport::new(
            "https://auth.example",
            VerifyingClient::new(Fixed(signed), verifier.clone()),
        );
        assert!(transport.fetch_schema("System").is_ok());

        let unsigned = HttpResponse::ok(BODY);
        let transport = HttpTransport::new(
            "https://auth.example",
            VerifyingClient::new(Fixed(unsigned), verifier),
        );
        assert!(matches!(
            transport.fetch_schema("System"),
            Err(SyncError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn error_statuses_pass_through() {
        let client = VerifyingClient::new(
            Fixed(HttpResponse {
                status: 502,
                body: Vec::new(),
                signature: None,
            }),
            HmacVerifier::new(b"k".to_vec()),
        );
        assert_eq!(client.get("https://auth.example").unwrap().status, 502);
    }
}
