//! Transport layer for I/O abstraction

use std::io;
use std::time::Duration;

mod tcp;
pub use tcp::TcpTransport;

mod mock;
pub use mock::MockTransport;

/// Transport trait for peer communication
///
/// Implementations are blocking. `read` returning `Ok(0)` means the peer
/// performed an orderly close; a timed-out read surfaces as an error of
/// kind `WouldBlock` or `TimedOut`.
pub trait Transport: Send {
    /// Read data into buffer, returns number of bytes read
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize>;

    /// Write data from buffer, returns number of bytes written
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Flush any pending writes (blocking until complete)
    fn flush(&mut self) -> io::Result<()>;

    /// Set the read deadline for subsequent reads (`None` blocks forever)
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;
}

/// Whether an I/O error is a read-deadline expiry
///
/// Unix reports timed-out socket reads as `WouldBlock`, Windows as
/// `TimedOut`.
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
