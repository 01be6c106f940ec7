//! Ciphers a peer can run and the key sizes it offers for each.

use std::fmt;

use crate::Error;

/// Block ciphers known to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cipher {
    Aes,
    Blowfish,
    Des,
}

impl Cipher {
    /// All ciphers, in the order they are listed by default.
    pub const ALL: &'static [Cipher] = &[Cipher::Aes, Cipher::Blowfish, Cipher::Des];

    /// Look up a cipher by its wire name.
    pub fn from_name(name: &str) -> Option<Cipher> {
        match name {
            "AES" => Some(Cipher::Aes),
            "Blowfish" => Some(Cipher::Blowfish),
            "DES" => Some(Cipher::Des),
            _ => None,
        }
    }

    /// Name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Cipher::Aes => "AES",
            Cipher::Blowfish => "Blowfish",
            Cipher::Des => "DES",
        }
    }

    /// Block size in bytes. This is also the IV length.
    #[rustfmt::skip]
    pub fn block_size(&self) -> usize {
        match self {
            Cipher::Aes      => 16,
            Cipher::Blowfish => 8,
            Cipher::Des      => 8,
        }
    }

    /// Whether `bits` is a key size this cipher can be keyed with.
    pub fn supports_key_size(&self, bits: u16) -> bool {
        if bits == 0 || bits % 8 != 0 {
            return false;
        }
        match self {
            Cipher::Aes => matches!(bits, 128 | 192 | 256),
            Cipher::Blowfish => (32..=448).contains(&bits),
            Cipher::Des => bits == 56,
        }
    }
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One catalog entry: a cipher and its key sizes in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    cipher: Cipher,
    key_sizes: Vec<u16>,
}

impl CatalogEntry {
    pub fn cipher(&self) -> Cipher {
        self.cipher
    }

    pub fn key_sizes(&self) -> &[u16] {
        &self.key_sizes
    }
}

/// Ciphers and key sizes supported by one peer.
///
/// Immutable once built. Entries keep the order they were given in, which
/// is the peer's order of preference when two ciphers offer the same key
/// size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherCatalog {
    entries: Vec<CatalogEntry>,
}

impl CipherCatalog {
    /// Build a catalog from `(cipher, key sizes)` pairs.
    pub fn new<I, S>(entries: I) -> Result<CipherCatalog, Error>
    where
        I: IntoIterator<Item = (Cipher, S)>,
        S: IntoIterator<Item = u16>,
    {
        let mut out: Vec<CatalogEntry> = Vec::new();

        for (cipher, sizes) in entries {
            if out.iter().any(|e| e.cipher == cipher) {
                return Err(Error::Config(format!("Duplicate cipher in catalog: {}", cipher)));
            }

            let mut key_sizes: Vec<u16> = sizes.into_iter().collect();
            if key_sizes.is_empty() {
                return Err(Error::Config(format!("No key sizes for {}", cipher)));
            }

            if let Some(bad) = key_sizes.iter().find(|s| !cipher.supports_key_size(**s)) {
                return Err(Error::Config(format!(
                    "Key size {} is not valid for {}",
                    bad, cipher
                )));
            }

            key_sizes.sort_unstable();
            key_sizes.dedup();

            out.push(CatalogEntry { cipher, key_sizes });
        }

        if out.is_empty() {
            return Err(Error::Config("Cipher catalog is empty".to_string()));
        }

        Ok(CipherCatalog { entries: out })
    }

    /// Everything this crate can run.
    pub fn initiator_default() -> CipherCatalog {
        CipherCatalog {
            entries: vec![
                CatalogEntry {
                    cipher: Cipher::Aes,
                    key_sizes: vec![128, 192, 256],
                },
                CatalogEntry {
                    cipher: Cipher::Blowfish,
                    key_sizes: vec![112, 224, 448],
                },
                CatalogEntry {
                    cipher: Cipher::Des,
                    key_sizes: vec![56],
                },
            ],
        }
    }

    /// AES-256 only.
    pub fn responder_default() -> CipherCatalog {
        CipherCatalog {
            entries: vec![CatalogEntry {
                cipher: Cipher::Aes,
                key_sizes: vec![256],
            }],
        }
    }

    /// Key sizes supported for the cipher with the given wire name.
    pub fn supported_sizes(&self, name: &str) -> Option<&[u16]> {
        let cipher = Cipher::from_name(name)?;
        self.entry(cipher).map(|e| e.key_sizes())
    }

    pub fn entry(&self, cipher: Cipher) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.cipher == cipher)
    }

    pub fn contains(&self, cipher: Cipher, key_size: u16) -> bool {
        self.entry(cipher)
            .map(|e| e.key_sizes.contains(&key_size))
            .unwrap_or(false)
    }

    /// Entries in preference order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }
}
