//! `Crypto` port: turns stored ciphertext back into a usable key.
//! The core never implements an actual cipher; that's the surrounding
//! service's concern (it owns `account_pool_encryption_key`).

#[derive(Debug, Clone, thiserror::Error)]
#[error("credential decryption failed: {0}")]
pub struct DecryptError(pub String);

pub trait Crypto: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Vec<u8>;
    fn decrypt(&self, ciphertext: &[u8]) -> Result<String, DecryptError>;
}

/// Reference/test-double implementation: ciphertext is just the UTF-8 bytes
/// of the plaintext, with no actual cipher involved. Production deployments
/// supply a real `Crypto` wired to `account_pool_encryption_key`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextCrypto;

impl Crypto for PlaintextCrypto {
    fn encrypt(&self, plaintext: &str) -> Vec<u8> {
        plaintext.as_bytes().to_vec()
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<String, DecryptError> {
        String::from_utf8(ciphertext.to_vec()).map_err(|e| DecryptError(e.to_string()))
    }
}

/// Test double that always fails to decrypt, used to exercise the
/// skip-to-next-candidate path.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysFailCrypto;

impl Crypto for AlwaysFailCrypto {
    fn encrypt(&self, plaintext: &str) -> Vec<u8> {
        plaintext.as_bytes().to_vec()
    }

    fn decrypt(&self, _ciphertext: &[u8]) -> Result<String, DecryptError> {
        Err(DecryptError("simulated decrypt failure".to_string()))
    }
}
