//! NetraCam - remote camera control client
//!
//! Command/response session manager for a camera service reachable over a
//! TCP request/reply channel. Commands travel as single-line ASCII
//! messages; each expects exactly one reply. The crate owns the socket
//! lifecycle, applies per-command timeouts, maps failures to typed
//! errors, and keeps a local parameter cache of everything that was
//! requested.
//!
//! ```no_run
//! use netra_cam::connection::{Endpoint, TcpDialer};
//! use netra_cam::session::CameraSession;
//! use netra_cam::protocol::Command;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> netra_cam::Result<()> {
//! let mut session = CameraSession::new(Arc::new(TcpDialer));
//! session.open(&Endpoint::new("127.0.0.1", 5555))?;
//!
//! let reply = session.send_command(
//!     &Command::SetResolution { width: 1280, height: 720 },
//!     Some(Duration::from_millis(1000)),
//! )?;
//! println!("camera answered: {}", reply);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod controller;
pub mod error;
pub mod params;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use connection::{Endpoint, TcpDialer};
pub use controller::CameraController;
pub use error::{Error, Result};
pub use params::{CameraParams, ZoomRect};
pub use protocol::Command;
pub use session::CameraSession;
