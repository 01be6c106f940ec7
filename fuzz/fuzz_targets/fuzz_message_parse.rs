#![no_main]

//! Fuzz target for handshake message parsing.
//!
//! Arbitrary text goes through the message classifier, and anything that
//! parses must serialize back to something that parses to the same value.

use libfuzzer_sys::fuzz_target;

use sechan::message::Message;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(message) = Message::parse(text) else {
        return;
    };

    let mut out = String::new();
    message.serialize(&mut out);
    let again = Message::parse(&out).expect("serialized message parses");
    assert_eq!(again, message);
});
