//! Category payload decoding.

use crate::crypto::{AesGcmCrypto, CryptoPort};
use crate::error::{DecodeError, DecodeResult};
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::Value;
use std::sync::Arc;

/// A decoded record before shape resolution: a JSON object.
pub type GenericRecord = serde_json::Map<String, Value>;

/// Decodes encrypted category payloads into generic records.
///
/// The codec is stateless apart from the shared crypto port and can be
/// cloned freely into every sync task.
#[derive(Clone)]
pub struct PayloadCodec {
    crypto: Arc<dyn CryptoPort>,
}

impl PayloadCodec {
    /// Creates a codec that decrypts through the given crypto port.
    pub fn new(crypto: Arc<dyn CryptoPort>) -> Self {
        Self { crypto }
    }

    /// Decodes a base64 payload into records.
    ///
    /// A missing or blank payload yields an empty vector without touching
    /// the crypto port.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::MalformedPayload`] if the payload is not base64 or
    ///   the plaintext is not a JSON array of objects
    /// - [`DecodeError::CryptoFailure`] if decryption fails
    pub fn decode(&self, payload: Option<&str>) -> DecodeResult<Vec<GenericRecord>> {
        let payload = match payload.map(str::trim) {
            Some(payload) if !payload.is_empty() => payload,
            _ => return Ok(Vec::new()),
        };

        let ciphertext = decode_base64(payload)?;
        let plaintext = self.crypto.decrypt(&ciphertext)?;
        let records = parse_records(&plaintext)?;

        tracing::trace!(
            ciphertext_len = ciphertext.len(),
            records = records.len(),
            "payload decoded"
        );
        Ok(records)
    }
}

impl std::fmt::Debug for PayloadCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCodec").finish_non_exhaustive()
    }
}

/// Decodes base64 in any of the standard or URL-safe alphabets, padded or not.
pub fn decode_base64(payload: &str) -> DecodeResult<Vec<u8>> {
    let engines = [&STANDARD, &URL_SAFE, &STANDARD_NO_PAD, &URL_SAFE_NO_PAD];
    engines
        .iter()
        .find_map(|engine| engine.decode(payload).ok())
        .ok_or_else(|| DecodeError::malformed("payload is not valid base64"))
}

/// Parses decrypted plaintext into records.
///
/// The plaintext must be a JSON array. Each element is either an object or
/// a string holding a serialized object.
pub fn parse_records(plaintext: &[u8]) -> DecodeResult<Vec<GenericRecord>> {
    let text = std::str::from_utf8(plaintext)
        .map_err(|_| DecodeError::malformed("decrypted payload is not valid UTF-8"))?;

    let value: Value = serde_json::from_str(text)
        .map_err(|e| DecodeError::malformed(format!("decrypted payload is not JSON: {e}")))?;

    let Value::Array(items) = value else {
        return Err(DecodeError::malformed(format!(
            "expected a JSON array of records, found {}",
            kind_of(&value)
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| into_record(index, item))
        .collect()
}

fn into_record(index: usize, item: Value) -> DecodeResult<GenericRecord> {
    match item {
        Value::Object(map) => Ok(map),
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(DecodeError::malformed(format!(
                "record {index} encodes {}, expected an object",
                kind_of(&other)
            ))),
            Err(e) => Err(DecodeError::malformed(format!(
                "record {index} is not valid JSON: {e}"
            ))),
        },
        other => Err(DecodeError::malformed(format!(
            "record {index} is {}, expected an object",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Encrypts records into a base64 payload with inline JSON objects.
///
/// Inverse of [`PayloadCodec::decode`]; used by fixtures and the CLI.
pub fn seal_payload(cipher: &AesGcmCrypto, records: &[Value]) -> DecodeResult<String> {
    let plaintext = serde_json::to_vec(records)
        .map_err(|e| DecodeError::malformed(format!("records are not serializable: {e}")))?;
    let ciphertext = cipher.encrypt(&plaintext)?;
    Ok(STANDARD.encode(ciphertext))
}

/// Encrypts records as an array of JSON strings, each holding one object.
///
/// This is the historical layout some authorities still emit.
pub fn seal_stringified_payload(cipher: &AesGcmCrypto, records: &[Value]) -> DecodeResult<String> {
    let stringified: Vec<Value> = records
        .iter()
        .map(|record| Value::String(record.to_string()))
        .collect();
    seal_payload(cipher, &stringified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::EncryptionKey;
    use crate::error::CryptoError;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn crypto() -> Arc<AesGcmCrypto> {
        Arc::new(AesGcmCrypto::new(
            EncryptionKey::from_bytes(&[0x42u8; 32]).unwrap(),
        ))
    }

    struct CountingCrypto {
        calls: AtomicUsize,
    }

    impl CryptoPort for CountingCrypto {
        fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ciphertext.to_vec())
        }
    }

    #[test]
    fn empty_payload_yields_no_records() {
        let counting = Arc::new(CountingCrypto {
            calls: AtomicUsize::new(0),
        });
        let codec = PayloadCodec::new(counting.clone());

        assert!(codec.decode(None).unwrap().is_empty());
        assert!(codec.decode(Some("")).unwrap().is_empty());
        assert!(codec.decode(Some("   ")).unwrap().is_empty());
        assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn decodes_inline_objects() {
        let crypto = crypto();
        let payload = seal_payload(
            &crypto,
            &[json!({"id": "1", "name": "Desktop"}), json!({"id": "2"})],
        )
        .unwrap();

        let records = PayloadCodec::new(crypto).decode(Some(&payload)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], "Desktop");
    }

    #[test]
    fn decodes_stringified_objects() {
        let crypto = crypto();
        let payload =
            seal_stringified_payload(&crypto, &[json!({"id": "7", "isActive": true})]).unwrap();

        let records = PayloadCodec::new(crypto).decode(Some(&payload)).unwrap();
        assert_eq!(records[0]["id"], "7");
        assert_eq!(records[0]["isActive"], true);
    }

    #[test]
    fn wrong_key_is_crypto_failure() {
        let payload = seal_payload(&crypto(), &[json!({"id": "1"})]).unwrap();
        let other = Arc::new(AesGcmCrypto::new(EncryptionKey::generate()));

        let err = PayloadCodec::new(other).decode(Some(&payload)).unwrap_err();
        assert!(err.is_crypto_failure());
    }

    #[test]
    fn invalid_base64_is_malformed() {
        let err = PayloadCodec::new(crypto())
            .decode(Some("not base64 at all!"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload { .. }));
    }

    #[test]
    fn url_safe_alphabet_accepted() {
        let crypto = crypto();
        let ciphertext = crypto.encrypt(b"[]").unwrap();
        let payload = URL_SAFE_NO_PAD.encode(ciphertext);

        assert!(PayloadCodec::new(crypto)
            .decode(Some(&payload))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn non_array_plaintext_is_malformed() {
        let err = parse_records(br#"{"id": "1"}"#).unwrap_err();
        assert!(err.to_string().contains("an object"));
    }

    #[test]
    fn scalar_element_is_malformed() {
        let err = parse_records(br#"[{"id": "1"}, 42]"#).unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn string_element_must_hold_object() {
        let err = parse_records(br#"["[1,2]"]"#).unwrap_err();
        assert!(err.to_string().contains("record 0 encodes an array"));

        let err = parse_records(br#"["{broken"]"#).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let err = parse_records(&[0xFF, 0xFE]).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload { .. }));
    }

    proptest! {
        #[test]
        fn sealed_records_decode_in_order(ids in prop::collection::vec("[A-Z0-9]{1,12}", 0..20)) {
            let crypto = crypto();
            let records: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
            let payload = seal_payload(&crypto, &records).unwrap();

            let decoded = PayloadCodec::new(crypto).decode(Some(&payload)).unwrap();
            let decoded_ids: Vec<&str> = decoded.iter().map(|r| r["id"].as_str().unwrap()).collect();
            prop_assert_eq!(decoded_ids, ids.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }
}
