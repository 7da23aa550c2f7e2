//! Connection lifecycle for the request/reply channel
//!
//! A [`Connection`] owns at most one open transport bound to an
//! [`Endpoint`]. Opening while open is a silent no-op; callers that want a
//! forced reconnect close first. The [`Dialer`] is process-scoped: one
//! value is created at startup, shared by every connection the process
//! makes, and torn down after the last connection has closed.

use crate::error::{Error, Result};
use crate::transport::{TcpTransport, Transport};
use std::fmt;
use std::sync::Arc;

/// Identifies the remote camera-control service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name or IP address
    pub address: String,
    /// TCP port
    pub port: u16,
}

impl Endpoint {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Endpoint {
            address: address.into(),
            port,
        }
    }

    /// Socket address form accepted by the dialer
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tcp://{}:{}", self.address, self.port)
    }
}

/// Process-scoped transport factory
///
/// The single injection point for how connections reach the network;
/// tests substitute a dialer that hands out mock transports.
pub trait Dialer: Send + Sync {
    /// Create a transport connected to the endpoint
    fn dial(&self, endpoint: &Endpoint) -> std::io::Result<Box<dyn Transport>>;
}

/// Production dialer creating TCP transports
pub struct TcpDialer;

impl Dialer for TcpDialer {
    fn dial(&self, endpoint: &Endpoint) -> std::io::Result<Box<dyn Transport>> {
        let transport = TcpTransport::connect(endpoint.socket_addr())?;
        Ok(Box::new(transport))
    }
}

/// Owns the lifecycle of one outbound request/reply connection
pub struct Connection {
    dialer: Arc<dyn Dialer>,
    transport: Option<Box<dyn Transport>>,
}

impl Connection {
    /// Create a closed connection using the given dialer
    pub fn new(dialer: Arc<dyn Dialer>) -> Self {
        Connection {
            dialer,
            transport: None,
        }
    }

    /// Open a transport to the endpoint
    ///
    /// Silent no-op when already open. On failure the connection stays
    /// closed and `Error::Connect` is returned.
    pub fn open(&mut self, endpoint: &Endpoint) -> Result<()> {
        if self.transport.is_some() {
            log::debug!("Connection already open, ignoring open({})", endpoint);
            return Ok(());
        }

        log::info!("Connecting to {} ...", endpoint);
        match self.dialer.dial(endpoint) {
            Ok(transport) => {
                log::info!("Connected to {}", endpoint);
                self.transport = Some(transport);
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to connect to {}: {}", endpoint, e);
                Err(Error::Connect(e))
            }
        }
    }

    /// Release the transport; idempotent, never blocks
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            log::info!("Connection closed");
        }
    }

    /// Whether a transport is currently open
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Mutable access to the open transport, if any
    pub fn transport_mut(&mut self) -> Option<&mut (dyn Transport + 'static)> {
        self.transport.as_deref_mut()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MockDialer;
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn test_endpoint_display() {
        let ep = Endpoint::new("127.0.0.1", 5555);
        assert_eq!(ep.to_string(), "tcp://127.0.0.1:5555");
        assert_eq!(ep.socket_addr(), "127.0.0.1:5555");
    }

    #[test]
    fn test_open_twice_dials_once() {
        let dialer = Arc::new(MockDialer::new(MockTransport::new()));
        let mut conn = Connection::new(Arc::clone(&dialer) as Arc<dyn Dialer>);
        let ep = Endpoint::new("127.0.0.1", 5555);

        conn.open(&ep).unwrap();
        conn.open(&ep).unwrap();

        assert!(conn.is_open());
        assert_eq!(dialer.dials(), 1);
    }

    #[test]
    fn test_close_idempotent() {
        let dialer = Arc::new(MockDialer::new(MockTransport::new()));
        let mut conn = Connection::new(dialer);
        let ep = Endpoint::new("127.0.0.1", 5555);

        conn.open(&ep).unwrap();
        conn.close();
        assert!(!conn.is_open());
        conn.close();
        assert!(!conn.is_open());
    }

    #[test]
    fn test_failed_open_leaves_closed() {
        let dialer = Arc::new(MockDialer::failing());
        let mut conn = Connection::new(Arc::clone(&dialer) as Arc<dyn Dialer>);
        let ep = Endpoint::new("not-a-host", 1);

        let err = conn.open(&ep).unwrap_err();
        assert!(matches!(err, Error::Connect(_)));
        assert!(!conn.is_open());

        // a later open is a fresh attempt, not poisoned state
        assert!(conn.open(&ep).is_err());
        assert_eq!(dialer.dials(), 2);
    }
}
