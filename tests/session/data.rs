//! Application data once the session is established.

use std::sync::Arc;
use std::thread;

use sechan::{Cipher, CipherCatalog, Error, MemoryTransport, Session, SessionState, Transport};

use crate::common::*;

fn established() -> (Session<MemoryTransport>, Session<MemoryTransport>) {
    let (init, resp) = connect(
        Arc::new(CipherCatalog::initiator_default()),
        Arc::new(CipherCatalog::responder_default()),
    );
    (init.expect("initiator"), resp.expect("responder"))
}

#[test]
fn alternating_messages() {
    init_log();
    let (mut init, mut resp) = established();

    let long = "x".repeat(1000);
    for msg in ["hello", "", "ünïcödé ✓", long.as_str()] {
        init.send_application_message(msg).unwrap();
        let got = resp.receive_application_message().unwrap();
        assert_eq!(got.as_deref(), Some(msg));

        let reply: String = msg.chars().rev().collect();
        resp.send_application_message(&reply).unwrap();
        assert_eq!(init.receive_application_message().unwrap(), Some(reply));
    }
}

#[test]
fn end_of_session_signal() {
    init_log();
    let (mut init, mut resp) = established();

    init.send_application_message("bye").unwrap();
    init.close().unwrap();
    assert_eq!(init.state(), SessionState::Closed);
    assert!(init.key_material().is_none());

    assert_eq!(
        resp.receive_application_message().unwrap().as_deref(),
        Some("bye")
    );
    assert_eq!(resp.receive_application_message().unwrap(), None);
    assert_eq!(resp.state(), SessionState::Closed);
    assert!(resp.key_material().is_none());

    let err = resp.send_application_message("anyone there?").unwrap_err();
    assert!(matches!(err, Error::ProtocolState(_)));

    let err = init.receive_application_message().unwrap_err();
    assert!(matches!(err, Error::ProtocolState(_)));
}

#[test]
fn oversized_message_is_rejected() {
    init_log();
    let (mut init, _resp) = established();

    let err = init
        .send_application_message(&"x".repeat(5000))
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(init.state(), SessionState::Closed);
}

#[test]
fn tampered_frame_is_rejected() {
    init_log();

    // initiator <-> (a, m1) relay (m2, b) <-> responder
    let (a, mut m1) = transports();
    let (mut m2, b) = transports();

    let relay = thread::spawn(move || {
        // Proposal, selection and the two public values pass untouched.
        let p = m1.receive(4096).unwrap();
        m2.send(&p).unwrap();
        let s = m2.receive(4096).unwrap();
        m1.send(&s).unwrap();
        let k = m1.receive(4096).unwrap();
        m2.send(&k).unwrap();
        let k = m2.receive(4096).unwrap();
        m1.send(&k).unwrap();

        // Flip one bit of the first application frame.
        let mut frame = m1.receive(4096).unwrap();
        frame[0] ^= 0x01;
        m2.send(&frame).unwrap();

        (m1, m2)
    });

    let responder = thread::spawn(move || {
        let mut s =
            Session::start_as_responder(b, Arc::new(CipherCatalog::responder_default()), config())
                .expect("responder handshake");
        let err = s.receive_application_message().unwrap_err();
        (err, s.state(), s.key_material().is_none())
    });

    let mut init =
        Session::start_as_initiator(a, Arc::new(CipherCatalog::initiator_default()), config())
            .expect("initiator handshake");
    init.send_application_message("transfer 100 to alice").unwrap();

    let (err, state, keys_gone) = responder.join().unwrap();
    assert!(matches!(err, Error::Authentication), "{:?}", err);
    assert_eq!(state, SessionState::Closed);
    assert!(keys_gone);

    let _ = relay.join().unwrap();
}

#[test]
fn garbage_frame_is_rejected() {
    init_log();

    let (a, mut peer) = transports();
    let c = catalog(&[(Cipher::Aes, &[128])]);

    // A peer that plays the responder by hand, then sends junk.
    let handle = thread::spawn(move || {
        let proposal = recv_text(&mut peer);
        assert!(proposal.starts_with("ProposedCiphers:"));
        peer.send(b"ChosenCipher:AES:128").unwrap();

        let public = recv_text(&mut peer);
        assert!(public.starts_with("DHMKE:"));
        peer.send(b"DHMKE:2").unwrap();

        peer.send(&[0x42; 48]).unwrap();
        peer
    });

    let mut init = Session::start_as_initiator(a, c, config()).expect("handshake");
    let err = init.receive_application_message().unwrap_err();
    assert!(matches!(err, Error::Authentication), "{:?}", err);
    assert_eq!(init.state(), SessionState::Closed);

    let _ = handle.join().unwrap();
}

#[test]
fn handshake_line_after_established() {
    init_log();

    let replayed = format!("DHMKE:{}", "7".repeat(600));
    for (line, short) in [(replayed.as_str(), false), ("DHMKE:2", true)] {
        let (a, mut peer) = transports();
        let c = catalog(&[(Cipher::Aes, &[128])]);
        let line = line.to_string();

        let handle = thread::spawn(move || {
            recv_text(&mut peer);
            peer.send(b"ChosenCipher:AES:128").unwrap();
            recv_text(&mut peer);
            peer.send(b"DHMKE:2").unwrap();

            peer.send(line.as_bytes()).unwrap();
            peer
        });

        let mut init = Session::start_as_initiator(a, c, config()).expect("handshake");
        let err = init.receive_application_message().unwrap_err();
        if short {
            assert!(matches!(err, Error::Parse(_)), "{:?}", err);
        } else {
            assert!(matches!(err, Error::Authentication), "{:?}", err);
        }
        assert_eq!(init.state(), SessionState::Closed);

        let _ = handle.join().unwrap();
    }
}
