//! Message-oriented duplex transports.
//!
//! The handshake and the frames it protects are sent as discrete messages.
//! How the bytes travel is up to the transport: [`StreamTransport`] prefixes
//! each message with its length over any byte stream, [`MemoryTransport`]
//! hands messages across threads.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::{Config, Error};

/// Length of the message header used by [`StreamTransport`].
const LENGTH_SIZE: usize = 2;

/// A duplex channel carrying whole messages.
pub trait Transport {
    /// Send one message. An empty message is allowed.
    fn send(&mut self, payload: &[u8]) -> Result<(), Error>;

    /// Block until the next message arrives.
    ///
    /// Messages longer than `max_len` are an error.
    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>, Error>;
}

/// Length-prefixed messages over a byte stream.
///
/// ```text
/// length (u16 big-endian) || payload
/// ```
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
}

impl<S: Read + Write> StreamTransport<S> {
    pub fn new(stream: S) -> Self {
        StreamTransport { stream }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl StreamTransport<TcpStream> {
    /// Wrap a connected TCP stream, applying the configured read timeout.
    pub fn tcp(stream: TcpStream, config: &Config) -> Result<Self, Error> {
        stream.set_read_timeout(Some(config.read_timeout()))?;
        stream.set_nodelay(true)?;
        Ok(StreamTransport::new(stream))
    }
}

impl<S: Read + Write> Transport for StreamTransport<S> {
    fn send(&mut self, payload: &[u8]) -> Result<(), Error> {
        let len = u16::try_from(payload.len()).map_err(|_| {
            Error::Transport(format!("Message too large to send: {}", payload.len()))
        })?;

        let mut buf = Vec::with_capacity(LENGTH_SIZE + payload.len());
        buf.extend_from_slice(&len.to_be_bytes());
        buf.extend_from_slice(payload);

        self.stream.write_all(&buf)?;
        self.stream.flush()?;
        Ok(())
    }

    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>, Error> {
        let mut header = [0u8; LENGTH_SIZE];
        self.stream.read_exact(&mut header).map_err(map_read_error)?;

        let len = u16::from_be_bytes(header) as usize;
        if len > max_len {
            return Err(Error::Transport(format!(
                "Message of {} bytes exceeds limit of {}",
                len, max_len
            )));
        }

        let mut payload = vec![0u8; len];
        self.stream.read_exact(&mut payload).map_err(map_read_error)?;
        Ok(payload)
    }
}

fn map_read_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            Error::Transport("Timed out waiting for peer".to_string())
        }
        io::ErrorKind::UnexpectedEof => Error::Transport("Connection closed by peer".to_string()),
        _ => e.into(),
    }
}

/// In-process transport. Create connected ends with [`MemoryTransport::pair`].
#[derive(Debug)]
pub struct MemoryTransport {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    timeout: Option<Duration>,
}

impl MemoryTransport {
    pub fn pair() -> (MemoryTransport, MemoryTransport) {
        let (tx_a, rx_b) = mpsc::channel();
        let (tx_b, rx_a) = mpsc::channel();

        (
            MemoryTransport {
                tx: tx_a,
                rx: rx_a,
                timeout: None,
            },
            MemoryTransport {
                tx: tx_b,
                rx: rx_b,
                timeout: None,
            },
        )
    }

    /// Fail receives that wait longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, payload: &[u8]) -> Result<(), Error> {
        self.tx
            .send(payload.to_vec())
            .map_err(|_| Error::Transport("Peer has gone away".to_string()))
    }

    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>, Error> {
        let payload = match self.timeout {
            Some(timeout) => self.rx.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => {
                    Error::Transport("Timed out waiting for peer".to_string())
                }
                RecvTimeoutError::Disconnected => {
                    Error::Transport("Peer has gone away".to_string())
                }
            })?,
            None => self
                .rx
                .recv()
                .map_err(|_| Error::Transport("Peer has gone away".to_string()))?,
        };

        if payload.len() > max_len {
            return Err(Error::Transport(format!(
                "Message of {} bytes exceeds limit of {}",
                payload.len(),
                max_len
            )));
        }

        Ok(payload)
    }
}
