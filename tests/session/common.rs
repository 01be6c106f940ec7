//! Shared helpers for session integration tests.

#![allow(unused)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sechan::{Cipher, CipherCatalog, Config, Error, MemoryTransport, Session, Transport};

pub const TIMEOUT: Duration = Duration::from_secs(10);

pub fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn config() -> Arc<Config> {
    Arc::new(
        Config::builder()
            .read_timeout(TIMEOUT)
            .build()
            .expect("valid config"),
    )
}

pub fn catalog(entries: &[(Cipher, &[u16])]) -> Arc<CipherCatalog> {
    Arc::new(
        CipherCatalog::new(entries.iter().map(|(c, s)| (*c, s.to_vec()))).expect("valid catalog"),
    )
}

/// Connected in-memory transports that give up after [`TIMEOUT`].
pub fn transports() -> (MemoryTransport, MemoryTransport) {
    let (a, b) = MemoryTransport::pair();
    (a.with_timeout(TIMEOUT), b.with_timeout(TIMEOUT))
}

pub type Outcome = Result<Session<MemoryTransport>, Error>;

/// Run a full handshake, the responder on its own thread.
pub fn connect(initiator: Arc<CipherCatalog>, responder: Arc<CipherCatalog>) -> (Outcome, Outcome) {
    let (a, b) = transports();

    let handle = thread::spawn(move || Session::start_as_responder(b, responder, config()));
    let init = Session::start_as_initiator(a, initiator, config());
    let resp = handle.join().expect("responder thread");

    (init, resp)
}

/// Receive a handshake line from a raw transport end.
pub fn recv_text<T: Transport>(t: &mut T) -> String {
    let bytes = t.receive(4096).expect("receive");
    String::from_utf8(bytes).expect("utf-8")
}
