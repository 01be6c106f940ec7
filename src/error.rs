use thiserror::Error;

/// Errors surfaced by a session.
///
/// Every variant is fatal to the session it occurs in. The session moves to
/// `Closed` and the error is handed back to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed message: {0}")]
    Parse(String),

    #[error("Negotiation failed: {0}")]
    Negotiation(String),

    #[error("Key exchange failed: {0}")]
    KeyExchange(String),

    #[error("Insufficient key material: {0}")]
    KeyMaterial(String),

    #[error("Frame authentication failed")]
    Authentication,

    #[error("Malformed padding in decrypted frame")]
    Padding,

    #[error("Protocol state violation: {0}")]
    ProtocolState(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Short, stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Parse(_) => "ParseError",
            Error::Negotiation(_) => "NegotiationError",
            Error::KeyExchange(_) => "KeyExchangeError",
            Error::KeyMaterial(_) => "KeyMaterialError",
            Error::Authentication => "AuthenticationError",
            Error::Padding => "PaddingError",
            Error::ProtocolState(_) => "ProtocolStateError",
            Error::Transport(_) => "TransportError",
            Error::Config(_) => "ConfigError",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport(e.to_string())
    }
}
