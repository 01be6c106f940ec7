//! Misbehaving peers, played by hand over a raw transport.

use std::sync::Arc;

use sechan::{
    Cipher, CipherCatalog, Error, MemoryTransport, Session, SessionState, Transport,
};

use crate::common::*;

/// An initiator offering AES-128 only, and the raw peer end.
fn initiator() -> (Session<MemoryTransport>, MemoryTransport) {
    let (a, peer) = transports();
    let session = Session::initiator(a, catalog(&[(Cipher::Aes, &[128])]), config());
    (session, peer)
}

fn responder() -> (Session<MemoryTransport>, MemoryTransport) {
    let (a, peer) = transports();
    let session = Session::responder(a, Arc::new(CipherCatalog::responder_default()), config());
    (session, peer)
}

fn assert_closed(session: &Session<MemoryTransport>) {
    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.key_material().is_none());
}

#[test]
fn selection_not_offered() {
    init_log();
    let (mut s, mut peer) = initiator();

    peer.send(b"ChosenCipher:DES:56").unwrap();
    let err = s.handshake().unwrap_err();
    assert!(matches!(err, Error::Negotiation(_)), "{:?}", err);
    assert_closed(&s);

    assert!(recv_text(&mut peer).starts_with("ProposedCiphers:AES:[128]"));
}

#[test]
fn key_size_not_offered() {
    init_log();
    let (mut s, mut peer) = initiator();

    peer.send(b"ChosenCipher:AES:256").unwrap();
    let err = s.handshake().unwrap_err();
    assert!(matches!(err, Error::Negotiation(_)), "{:?}", err);
    assert_closed(&s);
}

#[test]
fn degenerate_public_value() {
    init_log();

    for bad in ["DHMKE:0", "DHMKE:1"] {
        let (mut s, mut peer) = initiator();

        peer.send(b"ChosenCipher:AES:128").unwrap();
        peer.send(bad.as_bytes()).unwrap();

        let err = s.handshake().unwrap_err();
        assert!(matches!(err, Error::KeyExchange(_)), "{}: {:?}", bad, err);
        assert_closed(&s);
    }
}

#[test]
fn public_value_instead_of_selection() {
    init_log();
    let (mut s, mut peer) = initiator();

    peer.send(b"DHMKE:5").unwrap();
    let err = s.handshake().unwrap_err();
    assert!(matches!(err, Error::ProtocolState(_)), "{:?}", err);
    assert_closed(&s);
}

#[test]
fn malformed_selection() {
    init_log();
    let (mut s, mut peer) = initiator();

    peer.send(b"ChosenCipher:AES:abc").unwrap();
    let err = s.handshake().unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "{:?}", err);
    assert_closed(&s);
}

#[test]
fn responder_gets_selection_first() {
    init_log();
    let (mut s, mut peer) = responder();

    peer.send(b"ChosenCipher:AES:256").unwrap();
    let err = s.handshake().unwrap_err();
    assert!(matches!(err, Error::ProtocolState(_)), "{:?}", err);
    assert_closed(&s);
}

#[test]
fn unknown_message() {
    init_log();
    let (mut s, mut peer) = responder();

    peer.send(b"Hello:there").unwrap();
    let err = s.handshake().unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "{:?}", err);
    assert_closed(&s);
}

#[test]
fn responder_without_common_cipher() {
    init_log();
    let (mut s, mut peer) = responder();

    peer.send(b"ProposedCiphers:DES:[56],Blowfish:[112]").unwrap();
    let err = s.handshake().unwrap_err();
    assert!(matches!(err, Error::Negotiation(_)), "{:?}", err);
    assert_closed(&s);

    assert_eq!(recv_text(&mut peer), "ChosenCipher:None:None");
}

#[test]
fn initiator_gets_refusal() {
    init_log();
    let (mut s, mut peer) = initiator();

    peer.send(b"ChosenCipher:None:None").unwrap();
    let err = s.handshake().unwrap_err();
    assert!(matches!(err, Error::Negotiation(_)), "{:?}", err);
    assert_closed(&s);
}

#[test]
fn refusal_out_of_order() {
    init_log();
    let (mut s, mut peer) = responder();

    peer.send(b"ChosenCipher:None:None").unwrap();
    let err = s.handshake().unwrap_err();
    assert!(matches!(err, Error::ProtocolState(_)), "{:?}", err);
    assert_closed(&s);
}

#[test]
fn peer_hangs_up_mid_handshake() {
    init_log();
    let (mut s, peer) = initiator();

    drop(peer);
    let err = s.handshake().unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "{:?}", err);
    assert_closed(&s);
}

#[test]
fn responder_by_hand() {
    init_log();
    let (mut s, mut peer) = responder();

    peer.send(b"ProposedCiphers:AES:[128,192,256]").unwrap();
    peer.send(b"DHMKE:2").unwrap();
    s.handshake().unwrap();

    assert_eq!(recv_text(&mut peer), "ChosenCipher:AES:256");
    assert!(recv_text(&mut peer).starts_with("DHMKE:"));
    assert_eq!(s.state(), SessionState::Established);
}
