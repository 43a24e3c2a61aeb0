//! File encryption for incognito favicons

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};

use crate::error::FaviconError;
use crate::Result;

const NONCE_LEN: usize = 12;

/// Seals file contents before they are written.
pub trait FileEncrypter: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;
    fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>>;
}

/// ChaCha20-Poly1305 with a key that only lives in this instance. Output is
/// `nonce || ciphertext`.
pub struct ChaChaFileEncrypter {
    cipher: ChaCha20Poly1305,
}

impl ChaChaFileEncrypter {
    pub fn generate() -> Self {
        let key = ChaCha20Poly1305::generate_key(&mut OsRng);
        Self {
            cipher: ChaCha20Poly1305::new(&key),
        }
    }
}

impl FileEncrypter for ChaChaFileEncrypter {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| FaviconError::Crypto(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_LEN {
            return Err(FaviconError::Crypto("sealed data is truncated".to_string()));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| FaviconError::Crypto(e.to_string()))
    }
}
