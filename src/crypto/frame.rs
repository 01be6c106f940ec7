//! Authenticated, encrypted application frames.
//!
//! A frame is the CBC ciphertext of the PKCS#7-padded plaintext followed by
//! an HMAC-SHA256 tag over that ciphertext:
//!
//! ```text
//! ciphertext (n * block_size) || tag (32)
//! ```

use cbc::{Decryptor, Encryptor};
use cipher::block_padding::Pkcs7;
use cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, InnerIvInit, KeyInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::catalog::Cipher;
use crate::Error;

type HmacSha256 = Hmac<Sha256>;

/// Length of the authentication tag.
pub const TAG_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureFrame {
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

impl SecureFrame {
    pub fn parse(input: &[u8]) -> Result<SecureFrame, Error> {
        if input.len() < TAG_LEN {
            return Err(Error::Parse(format!(
                "Frame too short: {} bytes",
                input.len()
            )));
        }

        let (ciphertext, tag_bytes) = input.split_at(input.len() - TAG_LEN);
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(tag_bytes);

        Ok(SecureFrame {
            ciphertext: ciphertext.to_vec(),
            tag,
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag);
    }
}

/// Pad, encrypt and tag `plaintext`.
pub fn seal(
    cipher: Cipher,
    plaintext: &[u8],
    key: &[u8],
    iv: &[u8],
    auth_key: &[u8],
) -> Result<SecureFrame, Error> {
    let ciphertext = match cipher {
        Cipher::Aes => match key.len() {
            16 => cbc_encrypt::<aes::Aes128>(key, iv, plaintext)?,
            24 => cbc_encrypt::<aes::Aes192>(key, iv, plaintext)?,
            32 => cbc_encrypt::<aes::Aes256>(key, iv, plaintext)?,
            n => return Err(bad_key(cipher, n)),
        },
        Cipher::Blowfish => cbc_encrypt::<blowfish::Blowfish>(key, iv, plaintext)?,
        Cipher::Des => cbc_encrypt::<des::Des>(key, iv, plaintext)?,
    };

    let tag = tag_for(auth_key, &ciphertext)?.finalize().into_bytes();

    let mut frame = SecureFrame {
        ciphertext,
        tag: [0; TAG_LEN],
    };
    frame.tag.copy_from_slice(&tag);

    Ok(frame)
}

/// Verify the tag, then decrypt and unpad.
///
/// Nothing is decrypted unless the tag matches.
pub fn open(
    cipher: Cipher,
    frame: &SecureFrame,
    key: &[u8],
    iv: &[u8],
    auth_key: &[u8],
) -> Result<Vec<u8>, Error> {
    tag_for(auth_key, &frame.ciphertext)?
        .verify_slice(&frame.tag)
        .map_err(|_| Error::Authentication)?;

    match cipher {
        Cipher::Aes => match key.len() {
            16 => cbc_decrypt::<aes::Aes128>(key, iv, &frame.ciphertext),
            24 => cbc_decrypt::<aes::Aes192>(key, iv, &frame.ciphertext),
            32 => cbc_decrypt::<aes::Aes256>(key, iv, &frame.ciphertext),
            n => Err(bad_key(cipher, n)),
        },
        Cipher::Blowfish => cbc_decrypt::<blowfish::Blowfish>(key, iv, &frame.ciphertext),
        Cipher::Des => cbc_decrypt::<des::Des>(key, iv, &frame.ciphertext),
    }
}

fn tag_for(auth_key: &[u8], ciphertext: &[u8]) -> Result<HmacSha256, Error> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(auth_key)
        .map_err(|_| Error::KeyMaterial("Invalid HMAC key".to_string()))?;
    mac.update(ciphertext);
    Ok(mac)
}

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let inner = <C as KeyInit>::new_from_slice(key)
        .map_err(|_| Error::KeyMaterial(format!("Invalid key length: {}", key.len())))?;
    let enc = Encryptor::<C>::inner_iv_slice_init(inner, iv)
        .map_err(|_| Error::KeyMaterial(format!("Invalid IV length: {}", iv.len())))?;
    Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let inner = <C as KeyInit>::new_from_slice(key)
        .map_err(|_| Error::KeyMaterial(format!("Invalid key length: {}", key.len())))?;
    let dec = Decryptor::<C>::inner_iv_slice_init(inner, iv)
        .map_err(|_| Error::KeyMaterial(format!("Invalid IV length: {}", iv.len())))?;
    // Also rejects ciphertexts that are not a whole number of blocks.
    dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Padding)
}

fn bad_key(cipher: Cipher, len: usize) -> Error {
    Error::KeyMaterial(format!("Invalid {} key length: {}", cipher, len))
}
