use std::ops::Deref;

use num_bigint::{BigUint, RandBigInt};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use zeroize::{Zeroize, Zeroizing};

use crate::Error;

/// RFC 3526 group 14, 2048-bit MODP.
const MODP_2048: &str = "\
FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1\
29024E088A67CC74020BBEA63B139B22514A08798E3404DD\
EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245\
E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED\
EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D\
C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F\
83655D23DCA3AD961C62F356208552BB9ED529077096966D\
670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B\
E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9\
DE2BCBF6955817183995497CEA956AE515D2261898FA0510\
15728E5A8AACAA68FFFFFFFFFFFFFFFF";

/// RFC 3526 group 15, 3072-bit MODP.
const MODP_3072: &str = "\
FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1\
29024E088A67CC74020BBEA63B139B22514A08798E3404DD\
EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245\
E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED\
EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D\
C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F\
83655D23DCA3AD961C62F356208552BB9ED529077096966D\
670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B\
E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9\
DE2BCBF6955817183995497CEA956AE515D2261898FA0510\
15728E5A8AAAC42DAD33170D04507A33A85521ABDF1CBA64\
ECFB850458DBEF0A8AEA71575D060C7DB3970F85A6E1E4C7\
ABF5AE8CDB0933D71E8C94E04A25619DCEE3D2261AD2EE6B\
F12FFA06D98A0864D87602733EC86A64521F2B18177B200C\
BBE117577A615D6C770988C0BAD946E208E24FA074E5AB31\
43DB5BFCE0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF";

static GROUP_14: Lazy<DhGroup> = Lazy::new(|| DhGroup::from_hex(14, MODP_2048));
static GROUP_15: Lazy<DhGroup> = Lazy::new(|| DhGroup::from_hex(15, MODP_3072));

/// Diffie-Hellman domain parameters.
#[derive(Debug)]
pub struct DhGroup {
    id: u8,
    prime: BigUint,
    generator: BigUint,
    /// Byte length of the prime. Shared secrets are encoded at this width.
    len: usize,
}

impl DhGroup {
    fn from_hex(id: u8, hex: &str) -> DhGroup {
        let prime = BigUint::parse_bytes(hex.as_bytes(), 16).expect("RFC 3526 prime");
        let len = ((prime.bits() + 7) / 8) as usize;
        DhGroup {
            id,
            prime,
            generator: BigUint::from(2u32),
            len,
        }
    }

    /// The group both peers use for a negotiated key size.
    pub fn for_key_size(key_size_bits: u16) -> &'static DhGroup {
        if key_size_bits <= 128 {
            &*GROUP_14
        } else {
            &*GROUP_15
        }
    }

    /// RFC 3526 group number.
    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    /// Width in bytes of a shared secret in this group.
    pub fn secret_len(&self) -> usize {
        self.len
    }

    /// Public values in `[2, p-2]` are accepted. Everything else lets the
    /// sender force the shared secret to 0, 1 or ±1.
    fn check_public(&self, value: &BigUint) -> Result<(), Error> {
        let low = BigUint::from(2u32);
        let high = &self.prime - 2u32;
        if *value < low || *value > high {
            return Err(Error::KeyExchange(format!(
                "Peer public value out of range for group {}",
                self.id
            )));
        }
        Ok(())
    }
}

/// Ephemeral key pair. The private exponent never leaves this struct.
///
/// The exponent is held as big-endian bytes that are zeroized on drop.
/// `BigUint` temporaries built from it during `generate` and
/// `compute_shared_secret` are not scrubbed.
pub struct KeyPair {
    group: &'static DhGroup,
    private_key: Zeroizing<Vec<u8>>,
    public_key: BigUint,
}

impl KeyPair {
    /// Generate a key pair in the group for `key_size_bits`.
    pub fn generate(key_size_bits: u16) -> KeyPair {
        let group = DhGroup::for_key_size(key_size_bits);

        // Uniform in [2, p-2]
        let low = BigUint::from(2u32);
        let high = &group.prime - 1u32;
        let exponent = OsRng.gen_biguint_range(&low, &high);

        let public_key = group.generator.modpow(&exponent, &group.prime);

        KeyPair {
            group,
            private_key: Zeroizing::new(exponent.to_bytes_be()),
            public_key,
        }
    }

    pub fn group(&self) -> &'static DhGroup {
        self.group
    }

    pub fn public_key(&self) -> &BigUint {
        &self.public_key
    }

    /// `peer ^ private mod p`, big-endian and left-padded to the prime width.
    pub fn compute_shared_secret(&self, peer_public_key: &BigUint) -> Result<SharedSecret, Error> {
        self.group.check_public(peer_public_key)?;

        let exponent = BigUint::from_bytes_be(&self.private_key);
        let shared = peer_public_key.modpow(&exponent, &self.group.prime);
        let mut raw = shared.to_bytes_be();

        let mut out = vec![0u8; self.group.len];
        let start = out.len() - raw.len();
        out[start..].copy_from_slice(&raw);
        raw.zeroize();

        Ok(SharedSecret(out))
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("group", &self.group.id)
            .finish_non_exhaustive()
    }
}

/// Fixed-width shared secret.
pub struct SharedSecret(Vec<u8>);

impl Deref for SharedSecret {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret({} bytes)", self.0.len())
    }
}
