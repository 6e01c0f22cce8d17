// security/src/vault.rs

use chacha20poly1305::aead::rand_core::RngCore;
use chacha20poly1305::aead::{Aead, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use serde::Serialize;
use serde::de::DeserializeOwned;

use models::errors::{EmergencyError, Result};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Authenticated encryption over patient medical fields.
///
/// Wire format is `hex(nonce):hex(tag):hex(ciphertext)` with a fresh random
/// nonce per call, so encrypting the same plaintext twice yields distinct
/// outputs. Decryption authenticates the tag; tampering anywhere in the three
/// parts fails with [`EmergencyError::Crypto`].
#[derive(Clone)]
pub struct CredentialVault {
    cipher: ChaCha20Poly1305,
}

impl CredentialVault {
    /// Builds a vault from a raw key. The key must be exactly 256 bits; there
    /// is no derivation or padding fallback.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_LEN {
            return Err(EmergencyError::Crypto(format!(
                "encryption key must be {} bytes, got {}",
                KEY_LEN,
                key.len()
            )));
        }
        Ok(CredentialVault {
            cipher: ChaCha20Poly1305::new(Key::from_slice(key)),
        })
    }

    /// Builds a vault from a hex-encoded 256-bit key, the form it takes in
    /// configuration.
    pub fn from_hex_key(hex_key: &str) -> Result<Self> {
        let key = hex::decode(hex_key)
            .map_err(|e| EmergencyError::Crypto(format!("key is not valid hex: {}", e)))?;
        Self::new(&key)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| EmergencyError::Crypto("encryption failed".to_string()))?;

        // The AEAD output is ciphertext with the 16-byte tag appended.
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);
        Ok(format!(
            "{}:{}:{}",
            hex::encode(nonce_bytes),
            hex::encode(tag),
            hex::encode(ciphertext)
        ))
    }

    pub fn decrypt(&self, stored: &str) -> Result<String> {
        let parts: Vec<&str> = stored.split(':').collect();
        if parts.len() != 3 {
            return Err(EmergencyError::Crypto(
                "malformed ciphertext: expected nonce:tag:ciphertext".to_string(),
            ));
        }

        let nonce_bytes = decode_part(parts[0], "nonce")?;
        let tag = decode_part(parts[1], "tag")?;
        let ciphertext = decode_part(parts[2], "ciphertext")?;

        if nonce_bytes.len() != NONCE_LEN {
            return Err(EmergencyError::Crypto(format!(
                "nonce must be {} bytes, got {}",
                NONCE_LEN,
                nonce_bytes.len()
            )));
        }
        if tag.len() != TAG_LEN {
            return Err(EmergencyError::Crypto(format!(
                "tag must be {} bytes, got {}",
                TAG_LEN,
                tag.len()
            )));
        }

        let mut sealed = ciphertext;
        sealed.extend_from_slice(&tag);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), sealed.as_ref())
            .map_err(|_| {
                EmergencyError::Crypto("decryption failed: authentication error".to_string())
            })?;

        Ok(String::from_utf8(plaintext)?)
    }

    /// Serializes a value to JSON and encrypts it.
    pub fn encrypt_value<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = serde_json::to_string(value)?;
        self.encrypt(&json)
    }

    /// Decrypts and deserializes a value previously sealed by
    /// [`encrypt_value`](Self::encrypt_value).
    pub fn decrypt_value<T: DeserializeOwned>(&self, stored: &str) -> Result<T> {
        let json = self.decrypt(stored)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material through Debug.
        f.debug_struct("CredentialVault").finish_non_exhaustive()
    }
}

fn decode_part(part: &str, label: &str) -> Result<Vec<u8>> {
    hex::decode(part)
        .map_err(|e| EmergencyError::Crypto(format!("malformed {} encoding: {}", label, e)))
}
