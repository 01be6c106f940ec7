//! Two-party secure channel: cipher negotiation, Diffie-Hellman key
//! agreement and authenticated, encrypted messaging.
//!
//! ```no_run
//! use std::net::TcpStream;
//! use std::sync::Arc;
//!
//! use sechan::{CipherCatalog, Config, Session, StreamTransport};
//!
//! # fn main() -> Result<(), sechan::Error> {
//! let config = Arc::new(Config::default());
//! let catalog = Arc::new(CipherCatalog::initiator_default());
//!
//! let stream = TcpStream::connect("127.0.0.1:4600")?;
//! let transport = StreamTransport::tcp(stream, &config)?;
//!
//! let mut session = Session::start_as_initiator(transport, catalog, config)?;
//! session.send_application_message("hello")?;
//! if let Some(reply) = session.receive_application_message()? {
//!     println!("{}", reply);
//! }
//! session.close()?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

#[macro_use]
extern crate log;

mod catalog;
pub use catalog::{CatalogEntry, Cipher, CipherCatalog};

mod config;
pub use config::{Config, ConfigBuilder};

pub mod crypto;

mod error;
pub use error::Error;

pub mod message;

mod selector;
pub use selector::{select, Selection};

mod session;
pub use session::{Role, Session, SessionState};

mod transport;
pub use transport::{MemoryTransport, StreamTransport, Transport};
