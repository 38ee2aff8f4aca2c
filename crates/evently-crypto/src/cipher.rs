use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit, OsRng, rand_core::RngCore},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};

const NONCE_SIZE: usize = 12;

/// Secrets that ship in sample configs and must never reach production.
pub const PLACEHOLDER_SECRETS: &[&str] = &[
    "secret",
    "change-me",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("encryption secret is empty")]
    MissingSecret,
    #[error("encryption secret is a placeholder value")]
    PlaceholderSecret,
    #[error("encrypted payload is malformed")]
    Malformed,
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed: wrong key or tampered data")]
    Decrypt,
    #[error("decrypted payload is not valid UTF-8")]
    NotUtf8,
}

/// Encrypts text with AES-256-GCM under a key derived from a configured secret.
///
/// Output is `base64(nonce || ciphertext || tag)` with a fresh random nonce per call,
/// so encrypting the same text twice yields different strings.
#[derive(Clone)]
pub struct TextCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for TextCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextCipher").finish_non_exhaustive()
    }
}

impl TextCipher {
    /// Build a cipher from `secret`. Empty and placeholder secrets are rejected.
    pub fn from_secret(secret: &str) -> Result<Self, CryptoError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(CryptoError::MissingSecret);
        }
        if PLACEHOLDER_SECRETS.contains(&secret) {
            return Err(CryptoError::PlaceholderSecret);
        }

        let key = Sha256::digest(secret.as_bytes());
        Ok(Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice())),
        })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(out))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let bytes = BASE64.decode(encoded).map_err(|_| CryptoError::Malformed)?;
        if bytes.len() < NONCE_SIZE {
            return Err(CryptoError::Malformed);
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CryptoError::Decrypt)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::NotUtf8)
    }
}
