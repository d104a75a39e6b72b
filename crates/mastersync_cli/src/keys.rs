//! Key material arguments shared by `sync` and `seal`.

use crate::error::{CliError, CliResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::Args;
use mastersync_codec::{AesGcmCrypto, EncryptionKey};

/// Where the payload key comes from.
#[derive(Args, Debug, Clone, Default)]
pub struct KeyArgs {
    /// Base64-encoded 32-byte key
    #[arg(long, conflicts_with_all = ["passphrase", "salt"])]
    pub key: Option<String>,

    /// Machine secret to derive the key from (requires --salt)
    #[arg(long, requires = "salt")]
    pub passphrase: Option<String>,

    /// Salt for key derivation
    #[arg(long, requires = "passphrase")]
    pub salt: Option<String>,
}

impl KeyArgs {
    /// Resolves the arguments into a key.
    pub fn encryption_key(&self) -> CliResult<EncryptionKey> {
        match (&self.key, &self.passphrase, &self.salt) {
            (Some(encoded), _, _) => {
                let bytes = STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| CliError::Key(format!("--key is not base64: {e}")))?;
                EncryptionKey::from_bytes(&bytes).map_err(|e| CliError::Key(e.to_string()))
            }
            (None, Some(passphrase), Some(salt)) => {
                EncryptionKey::derive_from_passphrase(passphrase.as_bytes(), salt.as_bytes())
                    .map_err(|e| CliError::Key(e.to_string()))
            }
            _ => Err(CliError::Key(
                "pass --key or both --passphrase and --salt".to_string(),
            )),
        }
    }

    /// Resolves the arguments into a cipher.
    pub fn cipher(&self) -> CliResult<AesGcmCrypto> {
        Ok(AesGcmCrypto::new(self.encryption_key()?))
    }
}
