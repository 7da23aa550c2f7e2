//! Request/reply session with the remote camera service
//!
//! [`CameraSession`] sequences one command at a time over its
//! [`Connection`]: encode, transmit, block for exactly one reply line,
//! map every failure to a typed error. At most one exchange is in flight;
//! there is no internal queueing, no retries, and no implicit reconnect.
//! Concurrent callers must serialize access themselves (the controller
//! facade wraps the session in a mutex).

use crate::connection::{Connection, Dialer, Endpoint};
use crate::error::{Error, Result};
use crate::protocol::{decode_reply, Command};
use crate::transport::is_timeout;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default receive timeout for setting changes
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(1000);

/// Timeout for the best-effort `Close` sent at shutdown
const CLOSE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Replies longer than this indicate a confused peer
const MAX_REPLY_LENGTH: usize = 16000;

/// Blocking request/reply client for one camera endpoint
///
/// Owns exactly one [`Connection`]; dropping the session sends a
/// best-effort `Close` so the peer can clean up.
pub struct CameraSession {
    connection: Connection,
}

impl CameraSession {
    /// Create a disconnected session using the process-wide dialer
    pub fn new(dialer: Arc<dyn Dialer>) -> Self {
        CameraSession {
            connection: Connection::new(dialer),
        }
    }

    /// Open the connection to the endpoint (no-op when already open)
    pub fn open(&mut self, endpoint: &Endpoint) -> Result<()> {
        self.connection.open(endpoint)
    }

    /// Close the connection (idempotent)
    pub fn close(&mut self) {
        self.connection.close();
    }

    /// Whether the session currently holds an open connection
    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    /// Perform one command/reply exchange
    ///
    /// `timeout` of `None` blocks indefinitely. Returns the peer's reply
    /// line (possibly empty). A timeout leaves the connection open but the
    /// exchange pending on the wire; after repeated timeouts callers
    /// should `close()` and `open()` to re-synchronize.
    pub fn send_command(&mut self, cmd: &Command, timeout: Option<Duration>) -> Result<String> {
        let transport = self.connection.transport_mut().ok_or(Error::NotConnected)?;

        log::debug!("Sending command: {}", cmd.wire_text());

        transport
            .set_read_timeout(timeout)
            .map_err(Error::Transport)?;

        let encoded = cmd.encode();
        let mut sent = 0;
        while sent < encoded.len() {
            let n = transport.write(&encoded[sent..]).map_err(Error::Transport)?;
            sent += n;
        }
        transport.flush().map_err(Error::Transport)?;

        let deadline = timeout.map(|t| Instant::now() + t);
        let mut line: Vec<u8> = Vec::new();
        let mut buf = [0u8; 1024];

        loop {
            // re-arm the deadline if an earlier partial read consumed time
            if let Some(deadline) = deadline {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    log::debug!("Reply timeout for: {}", cmd.wire_text());
                    return Err(Error::Timeout);
                }
                transport
                    .set_read_timeout(Some(remaining))
                    .map_err(Error::Transport)?;
            }

            match transport.read(&mut buf) {
                Ok(0) => {
                    if line.is_empty() {
                        log::warn!("Peer closed the connection before replying");
                        return Err(Error::PeerClosed);
                    }
                    // EOF mid-line: hand back what arrived
                    log::warn!("Peer closed mid-reply, returning partial reply");
                    break;
                }
                Ok(n) => {
                    line.extend_from_slice(&buf[..n]);
                    if let Some(pos) = line.iter().position(|&b| b == b'\n') {
                        line.truncate(pos);
                        break;
                    }
                    if line.len() > MAX_REPLY_LENGTH {
                        return Err(Error::Transport(std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            "reply exceeds maximum length",
                        )));
                    }
                }
                Err(e) if is_timeout(&e) => {
                    log::debug!("Reply timeout for: {}", cmd.wire_text());
                    return Err(Error::Timeout);
                }
                Err(e) => return Err(Error::Transport(e)),
            }
        }

        if line.last() == Some(&b'\r') {
            line.pop();
        }

        let reply = decode_reply(&line);
        log::debug!("The camera answered: {}", reply);
        Ok(reply)
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if self.connection.is_open() {
            // give the peer a chance to clean up; outcome is irrelevant
            if let Err(e) = self.send_command(&Command::Close, Some(CLOSE_TIMEOUT)) {
                log::debug!("Close command at shutdown failed: {}", e);
            }
            self.connection.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::MockDialer;
    use crate::transport::MockTransport;

    fn connected_session(mock: &MockTransport) -> CameraSession {
        let dialer = Arc::new(MockDialer::new(mock.clone()));
        let mut session = CameraSession::new(dialer);
        session
            .open(&Endpoint::new("127.0.0.1", 5555))
            .expect("mock open");
        session
    }

    #[test]
    fn test_send_while_disconnected() {
        let dialer = Arc::new(MockDialer::new(MockTransport::new()));
        let mut session = CameraSession::new(dialer);

        let err = session
            .send_command(&Command::StopRecording, Some(DEFAULT_COMMAND_TIMEOUT))
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[test]
    fn test_round_trip() {
        let mock = MockTransport::new();
        mock.push_reply(b"Done\n");
        let mut session = connected_session(&mock);

        let reply = session
            .send_command(
                &Command::SetResolution {
                    width: 640,
                    height: 480,
                },
                Some(DEFAULT_COMMAND_TIMEOUT),
            )
            .unwrap();

        assert_eq!(reply, "Done");
        assert_eq!(mock.written(), b"Resolution 640 480\n");
    }

    #[test]
    fn test_reply_split_across_reads() {
        let mock = MockTransport::new();
        mock.push_reply(b"/data/2024-");
        mock.push_reply(b"01-01_12-00-00\n");
        let mut session = connected_session(&mock);

        let reply = session
            .send_command(&Command::StopRecording, Some(DEFAULT_COMMAND_TIMEOUT))
            .unwrap();
        assert_eq!(reply, "/data/2024-01-01_12-00-00");
    }

    #[test]
    fn test_timeout_leaves_connection_open() {
        let mock = MockTransport::new();
        mock.push_timeout();
        let mut session = connected_session(&mock);

        let err = session
            .send_command(&Command::StopRecording, Some(Duration::from_millis(50)))
            .unwrap_err();
        assert!(matches!(err, Error::Timeout));
        assert!(session.is_connected());

        // drain the pending Close from Drop without a live script
        mock.push_reply(b"Closing\n");
    }

    #[test]
    fn test_peer_closed_distinct_from_empty_reply() {
        let mock = MockTransport::new();
        mock.push_eof();
        let mut session = connected_session(&mock);

        let err = session
            .send_command(&Command::StopRecording, Some(DEFAULT_COMMAND_TIMEOUT))
            .unwrap_err();
        assert!(matches!(err, Error::PeerClosed));

        // an empty line is a completed, empty reply
        mock.push_reply(b"\n");
        let reply = session
            .send_command(&Command::StopRecording, Some(DEFAULT_COMMAND_TIMEOUT))
            .unwrap();
        assert_eq!(reply, "");
    }

    #[test]
    fn test_write_failure_is_transport_error() {
        let mock = MockTransport::new();
        mock.fail_next_write();
        let mut session = connected_session(&mock);

        let err = session
            .send_command(&Command::StopRecording, Some(DEFAULT_COMMAND_TIMEOUT))
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        // a failed send does not tear the connection down
        assert!(session.is_connected());

        mock.push_reply(b"Closing\n");
    }

    #[test]
    fn test_drop_sends_close() {
        let mock = MockTransport::new();
        mock.push_reply(b"Closing\n");
        {
            let _session = connected_session(&mock);
        }
        assert_eq!(mock.written(), b"Close\n");
    }

    #[test]
    fn test_timeout_is_applied_to_transport() {
        let mock = MockTransport::new();
        mock.push_reply(b"Done\n");
        let mut session = connected_session(&mock);

        session
            .send_command(&Command::SetFramerate(30), Some(Duration::from_millis(250)))
            .unwrap();
        // the initial arm uses the full timeout; the re-arm before the
        // first read may shave a few microseconds off
        let applied = mock.read_timeout().expect("timeout applied");
        assert!(applied <= Duration::from_millis(250));
        assert!(applied > Duration::from_millis(200));
    }
}
