//! Pick the strongest cipher suite both peers support.

use crate::catalog::{Cipher, CipherCatalog};
use crate::message::{ChosenCipher, Proposal};
use crate::Error;

/// A negotiated cipher suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub cipher: Cipher,
    pub key_size: u16,
}

impl Selection {
    pub fn to_message(&self) -> ChosenCipher {
        ChosenCipher::new(self.cipher.name(), self.key_size)
    }

    /// Check a received choice against our own catalog and what we proposed.
    pub fn validate(
        chosen: &ChosenCipher,
        catalog: &CipherCatalog,
        proposed: &Proposal,
    ) -> Result<Selection, Error> {
        let Some(cipher) = Cipher::from_name(&chosen.name) else {
            return Err(Error::Negotiation(format!(
                "Peer chose unknown cipher: {}",
                chosen.name
            )));
        };

        let offered = proposed
            .key_sizes(cipher.name())
            .map(|s| s.contains(&chosen.key_size))
            .unwrap_or(false);

        if !offered || !catalog.contains(cipher, chosen.key_size) {
            return Err(Error::Negotiation(format!(
                "Peer chose {}{} which we did not offer",
                cipher, chosen.key_size
            )));
        }

        Ok(Selection {
            cipher,
            key_size: chosen.key_size,
        })
    }
}

/// Select the largest key size common to both sides.
///
/// The supported catalog is walked in its own order and only a strictly
/// larger key size replaces the current best, so among ciphers offering the
/// same maximal size the one listed first in `supported` wins.
pub fn select(supported: &CipherCatalog, proposed: &Proposal) -> Result<Selection, Error> {
    let mut best: Option<Selection> = None;
    let mut any_common_cipher = false;

    for entry in supported.iter() {
        let Some(offered) = proposed.key_sizes(entry.cipher().name()) else {
            continue;
        };
        any_common_cipher = true;

        let largest = entry
            .key_sizes()
            .iter()
            .filter(|s| offered.contains(s))
            .max();

        if let Some(&key_size) = largest {
            if best.map(|b| key_size > b.key_size).unwrap_or(true) {
                best = Some(Selection {
                    cipher: entry.cipher(),
                    key_size,
                });
            }
        }
    }

    match best {
        Some(selection) => Ok(selection),
        None if any_common_cipher => Err(Error::Negotiation(
            "No key size in common for any shared cipher".to_string(),
        )),
        None => Err(Error::Negotiation("No cipher in common".to_string())),
    }
}
