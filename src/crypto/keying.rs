//! Session keys sliced from the shared secret.

use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use super::frame::{self, SecureFrame};
use crate::catalog::Cipher;
use crate::Error;

/// Keys for one session. Derived once, immutable afterwards.
pub struct SessionKeyMaterial {
    cipher: Cipher,
    cipher_key: Vec<u8>,
    iv: Vec<u8>,
    auth_key: Vec<u8>,
}

impl SessionKeyMaterial {
    /// Slice `secret` into cipher key and IV.
    ///
    /// The cipher key is the first `key_size_bits / 8` bytes and the IV the
    /// last `block_size` bytes. A 56-bit DES key is zero-padded to the 8 bytes
    /// DES is keyed with. The HMAC key is SHA-256 over the whole secret.
    pub fn derive(
        secret: &[u8],
        cipher: Cipher,
        key_size_bits: u16,
    ) -> Result<SessionKeyMaterial, Error> {
        if !cipher.supports_key_size(key_size_bits) {
            return Err(Error::KeyMaterial(format!(
                "{} cannot be keyed with {} bits",
                cipher, key_size_bits
            )));
        }

        let key_len = key_size_bits as usize / 8;
        let iv_len = cipher.block_size();
        let needed = key_len + iv_len;

        if secret.len() < needed {
            return Err(Error::KeyMaterial(format!(
                "need {} bytes for {}{}, shared secret has {}",
                needed,
                cipher,
                key_size_bits,
                secret.len()
            )));
        }

        let mut cipher_key = secret[..key_len].to_vec();
        if cipher == Cipher::Des {
            cipher_key.resize(8, 0);
        }

        let iv = secret[secret.len() - iv_len..].to_vec();
        let auth_key = Sha256::digest(secret).to_vec();

        Ok(SessionKeyMaterial {
            cipher,
            cipher_key,
            iv,
            auth_key,
        })
    }

    pub fn cipher(&self) -> Cipher {
        self.cipher
    }

    pub fn cipher_key(&self) -> &[u8] {
        &self.cipher_key
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn auth_key(&self) -> &[u8] {
        &self.auth_key
    }

    /// Encrypt and tag one outbound message.
    pub fn seal(&self, plaintext: &[u8]) -> Result<SecureFrame, Error> {
        frame::seal(
            self.cipher,
            plaintext,
            &self.cipher_key,
            &self.iv,
            &self.auth_key,
        )
    }

    /// Verify and decrypt one inbound message.
    pub fn open(&self, frame: &SecureFrame) -> Result<Vec<u8>, Error> {
        frame::open(
            self.cipher,
            frame,
            &self.cipher_key,
            &self.iv,
            &self.auth_key,
        )
    }
}

impl Drop for SessionKeyMaterial {
    fn drop(&mut self) {
        self.cipher_key.zeroize();
        self.iv.zeroize();
        self.auth_key.zeroize();
    }
}

impl std::fmt::Debug for SessionKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionKeyMaterial({})", self.cipher)
    }
}
