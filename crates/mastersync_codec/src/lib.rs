//! # MasterSync Codec
//!
//! Payload codec and crypto port for MasterSync.
//!
//! Every category dataset delivered by the central authority carries its
//! records as a base64 string. Decoding a dataset is a pure pipeline:
//!
//! 1. base64 → ciphertext
//! 2. ciphertext → plaintext through an injected [`CryptoPort`]
//! 3. plaintext → JSON array → [`GenericRecord`]s
//!
//! The codec never owns key material. [`AesGcmCrypto`] is the bundled
//! AES-256-GCM adapter; any other `Send + Sync` implementation of
//! [`CryptoPort`] can be plugged in.
//!
//! ## Usage
//!
//! ```
//! use mastersync_codec::{seal_payload, AesGcmCrypto, EncryptionKey, PayloadCodec};
//! use std::sync::Arc;
//!
//! let crypto = Arc::new(AesGcmCrypto::new(EncryptionKey::generate()));
//! let payload = seal_payload(&crypto, &[serde_json::json!({"id": "10001"})]).unwrap();
//!
//! let codec = PayloadCodec::new(crypto);
//! let records = codec.decode(Some(&payload)).unwrap();
//! assert_eq!(records[0]["id"], "10001");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod crypto;
mod error;
mod payload;

pub use crypto::{AesGcmCrypto, CryptoPort, EncryptionKey, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, DecodeError, DecodeResult};
pub use payload::{
    decode_base64, parse_records, seal_payload, seal_stringified_payload, GenericRecord,
    PayloadCodec,
};
