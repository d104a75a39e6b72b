//! Error types for the codec crate.

use thiserror::Error;

/// Result type for payload decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised by a [`crate::CryptoPort`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The key material has the wrong length.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected size in bytes.
        expected: usize,
        /// Actual size in bytes.
        actual: usize,
    },

    /// Encryption failed.
    #[error("encryption failed: {message}")]
    EncryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Decryption failed (wrong key, corrupted or truncated ciphertext).
    #[error("decryption failed: {message}")]
    DecryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Deriving a key from a passphrase failed.
    #[error("key derivation failed: {message}")]
    KeyDerivationFailed {
        /// Description of the failure.
        message: String,
    },
}

impl CryptoError {
    /// Creates an invalid key size error.
    pub fn invalid_key_size(actual: usize, expected: usize) -> Self {
        Self::InvalidKeySize { expected, actual }
    }

    /// Creates an encryption failed error.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            message: message.into(),
        }
    }

    /// Creates a decryption failed error.
    pub fn decryption_failed(message: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            message: message.into(),
        }
    }

    /// Creates a key derivation failed error.
    pub fn key_derivation_failed(message: impl Into<String>) -> Self {
        Self::KeyDerivationFailed {
            message: message.into(),
        }
    }
}

/// Errors that can occur while decoding a category payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload could not be decrypted.
    #[error("payload could not be decrypted: {0}")]
    CryptoFailure(#[from] CryptoError),

    /// The payload was decrypted but its structure is not a record array.
    #[error("malformed payload: {message}")]
    MalformedPayload {
        /// Description of the structural problem.
        message: String,
    },
}

impl DecodeError {
    /// Creates a malformed payload error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    /// Returns true if the failure came from the crypto port.
    pub fn is_crypto_failure(&self) -> bool {
        matches!(self, DecodeError::CryptoFailure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_error_converts_to_crypto_failure() {
        let err: DecodeError = CryptoError::decryption_failed("tag mismatch").into();
        assert!(err.is_crypto_failure());
        assert!(err.to_string().contains("tag mismatch"));
    }

    #[test]
    fn malformed_is_not_crypto_failure() {
        let err = DecodeError::malformed("expected array");
        assert!(!err.is_crypto_failure());
        assert_eq!(err.to_string(), "malformed payload: expected array");
    }

    #[test]
    fn key_size_display() {
        let err = CryptoError::invalid_key_size(16, 32);
        assert_eq!(
            err.to_string(),
            "invalid key size: expected 32 bytes, got 16"
        );
    }
}
