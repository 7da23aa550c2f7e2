//! Mock transport for testing

use super::Transport;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted outcome for a mock read
#[derive(Debug, Clone)]
pub enum ReadScript {
    /// Bytes delivered by the peer
    Data(Vec<u8>),
    /// Read deadline expires with no data
    TimedOut,
    /// Peer performs an orderly close
    Eof,
}

/// Mock transport for unit testing
///
/// Reads follow an injected script; writes are recorded. An exhausted
/// script behaves like a silent peer (every read times out).
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockInner>>,
}

struct MockInner {
    script: VecDeque<ReadScript>,
    pending: VecDeque<u8>,
    written: Vec<u8>,
    read_timeout: Option<Duration>,
    fail_next_write: bool,
}

impl MockTransport {
    /// Create a new mock transport with an empty script
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockInner {
                script: VecDeque::new(),
                pending: VecDeque::new(),
                written: Vec::new(),
                read_timeout: None,
                fail_next_write: false,
            })),
        }
    }

    /// Queue a reply the peer will deliver
    pub fn push_reply(&self, data: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner.script.push_back(ReadScript::Data(data.to_vec()));
    }

    /// Queue a read-timeout event
    pub fn push_timeout(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.script.push_back(ReadScript::TimedOut);
    }

    /// Queue an orderly peer close
    pub fn push_eof(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.script.push_back(ReadScript::Eof);
    }

    /// Make the next write fail as if the peer reset the connection
    pub fn fail_next_write(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_write = true;
    }

    /// Get all written data
    pub fn written(&self) -> Vec<u8> {
        let inner = self.inner.lock().unwrap();
        inner.written.clone()
    }

    /// Clear recorded writes
    pub fn clear_written(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.written.clear();
    }

    /// The most recently applied read timeout
    pub fn read_timeout(&self) -> Option<Duration> {
        let inner = self.inner.lock().unwrap();
        inner.read_timeout
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock().unwrap();

        if inner.pending.is_empty() {
            match inner.script.pop_front() {
                Some(ReadScript::Data(bytes)) => inner.pending.extend(bytes),
                Some(ReadScript::TimedOut) | None => {
                    return Err(io::Error::new(io::ErrorKind::WouldBlock, "mock timeout"));
                }
                Some(ReadScript::Eof) => return Ok(0),
            }
        }

        let n = inner.pending.len().min(buffer.len());
        for slot in buffer.iter_mut().take(n) {
            *slot = inner.pending.pop_front().unwrap();
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_next_write {
            inner.fail_next_write = false;
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "mock write failure",
            ));
        }
        inner.written.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.read_timeout = timeout;
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}
