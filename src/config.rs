use std::time::Duration;

use crate::Error;

/// Smallest accepted `max_message_len`. A 3072-bit public value in decimal
/// is about 925 characters.
const MIN_MESSAGE_LEN: usize = 1024;

/// Session configuration
#[derive(Debug, Clone)]
pub struct Config {
    max_message_len: usize,
    read_timeout: Duration,
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            max_message_len: 4096,
            read_timeout: Duration::from_secs(30),
        }
    }

    /// Largest message we send or accept, in bytes.
    ///
    /// Applies to both handshake lines and sealed frames.
    #[inline(always)]
    pub fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    /// How long to wait for the peer's next message.
    ///
    /// Expiry closes the session with a transport error.
    #[inline(always)]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_message_len: 4096,
            read_timeout: Duration::from_secs(30),
        }
    }
}

/// Builder for session configuration.
pub struct ConfigBuilder {
    max_message_len: usize,
    read_timeout: Duration,
}

impl ConfigBuilder {
    /// Set the largest message size in bytes.
    ///
    /// Defaults to 4096. Must be between 1024 and 65535.
    pub fn max_message_len(mut self, max_message_len: usize) -> Self {
        self.max_message_len = max_message_len;
        self
    }

    /// Set the read timeout.
    ///
    /// Defaults to 30 seconds.
    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<Config, Error> {
        if self.max_message_len < MIN_MESSAGE_LEN || self.max_message_len > u16::MAX as usize {
            return Err(Error::Config(format!(
                "max_message_len must be within {}..={}, got {}",
                MIN_MESSAGE_LEN,
                u16::MAX,
                self.max_message_len
            )));
        }

        if self.read_timeout.is_zero() {
            return Err(Error::Config("read_timeout must be non-zero".to_string()));
        }

        Ok(Config {
            max_message_len: self.max_message_len,
            read_timeout: self.read_timeout,
        })
    }
}
