//! Error types for NetraCam

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// NetraCam error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connecting to the remote endpoint failed; the connection is left closed
    #[error("Connect failed: {0}")]
    Connect(std::io::Error),

    /// Send attempted with no open connection
    #[error("Not connected")]
    NotConnected,

    /// Send-side socket failure; the connection is left open
    #[error("Transport error: {0}")]
    Transport(std::io::Error),

    /// No reply within the deadline. The exchange is still pending on the
    /// wire, so a stray reply may be misattributed to the next command;
    /// callers should close and reopen after repeated timeouts.
    #[error("Reply timeout")]
    Timeout,

    /// The peer closed the connection before replying (the remote camera
    /// process likely died)
    #[error("Peer closed the connection")]
    PeerClosed,

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Recording already in progress
    #[error("Recording already in progress")]
    AlreadyRecording,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse error
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}
