#![no_main]

//! Fuzz target for opening application frames.
//!
//! Frames are opened with fixed keys for every cipher. Nothing built from
//! fuzzer input should authenticate, and nothing should panic.

use libfuzzer_sys::fuzz_target;

use sechan::crypto::{open, SecureFrame};
use sechan::Cipher;

const KEY: [u8; 32] = [7; 32];
const AUTH_KEY: [u8; 32] = [9; 32];

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = SecureFrame::parse(data) else {
        return;
    };

    for &cipher in Cipher::ALL {
        let (key, iv) = match cipher {
            Cipher::Aes => (&KEY[..16], &KEY[..16]),
            Cipher::Blowfish => (&KEY[..16], &KEY[..8]),
            Cipher::Des => (&KEY[..8], &KEY[..8]),
        };
        assert!(open(cipher, &frame, key, iv, &AUTH_KEY).is_err());
    }
});
