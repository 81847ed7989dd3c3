//! Transports that carry encoded store requests to a store server.
//!
//! # Responsibility
//! - Move one JSON request body to the server and return the reply body.
//! - Report reachability failures separately from store-level errors.
//!
//! # Invariants
//! - Transports never interpret request or reply payloads.
//! - Bodies may contain credential values and are never logged.

use super::server::handle_json;
use crate::repo::vault_repo::VaultRepository;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Path appended to the configured API base URL.
pub const STORE_ENDPOINT_PATH: &str = "/store";

/// Failure to exchange a request with the store server.
#[derive(Debug)]
pub enum TransportError {
    /// Server answered with a non-success HTTP status.
    Status(u16),
    /// Connection, DNS, TLS or timeout failure.
    Unreachable(String),
    /// Reply body could not be read.
    Io(std::io::Error),
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(code) => write!(f, "store server answered with http status {code}"),
            Self::Unreachable(message) => write!(f, "store server unreachable: {message}"),
            Self::Io(err) => write!(f, "failed to read store reply: {err}"),
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Status(_) | Self::Unreachable(_) => None,
        }
    }
}

/// Request/reply channel to a store server.
pub trait RemoteTransport {
    fn send(&self, body: &str) -> Result<String, TransportError>;
}

impl<T: RemoteTransport + ?Sized> RemoteTransport for &T {
    fn send(&self, body: &str) -> Result<String, TransportError> {
        (**self).send(body)
    }
}

/// Blocking HTTP transport: `POST {base_url}/store` with a JSON body.
pub struct HttpTransport {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpTransport {
    /// Creates a transport for the given API base URL.
    ///
    /// `timeout` bounds connect, read and write separately.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();
        Self {
            agent,
            endpoint: format!(
                "{}{STORE_ENDPOINT_PATH}",
                base_url.trim().trim_end_matches('/')
            ),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RemoteTransport for HttpTransport {
    fn send(&self, body: &str) -> Result<String, TransportError> {
        match self
            .agent
            .post(&self.endpoint)
            .set("content-type", "application/json")
            .send_string(body)
        {
            Ok(resp) => resp.into_string().map_err(TransportError::Io),
            Err(ureq::Error::Status(code, _)) => Err(TransportError::Status(code)),
            Err(ureq::Error::Transport(err)) => Err(TransportError::Unreachable(err.to_string())),
        }
    }
}

/// In-process transport that hands each body straight to the server
/// dispatcher, keeping the full JSON encode/decode path.
pub struct LoopbackTransport<R: VaultRepository> {
    server: R,
}

impl<R: VaultRepository> LoopbackTransport<R> {
    pub fn new(server: R) -> Self {
        Self { server }
    }
}

impl<R: VaultRepository> RemoteTransport for LoopbackTransport<R> {
    fn send(&self, body: &str) -> Result<String, TransportError> {
        Ok(handle_json(&self.server, body))
    }
}

#[cfg(test)]
mod tests {
    use super::HttpTransport;
    use std::time::Duration;

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        let transport = HttpTransport::new("http://localhost:3001/api/", Duration::from_secs(1));
        assert_eq!(transport.endpoint(), "http://localhost:3001/api/store");
    }
}
