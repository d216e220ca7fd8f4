//! Push-transport collaborator contract.
//!
//! The adapter does not own connection establishment; it works against any
//! duplex byte transport that can express this contract:
//!
//! - reading: a non-blocking "next available chunk, or none" operation,
//!   plus `pause`/`resume` to gate further data notifications
//! - writing: `write` returning `false` when the internal buffer is full
//!   (the chunk is still accepted; a drain signal follows once space frees
//!   up), and `end` to signal that no more writes will come
//! - `destroy` for abrupt teardown on either half
//!
//! # Implementations
//!
//! - `MemoryReadTransport`: scripted in-memory readable half for testing
//! - `MemoryWriteTransport`: recording in-memory writable half for testing
//!
//! The TCP halves in [`crate::tcp`] adapt real sockets to the same shape.

use std::collections::VecDeque;

use bytes::Bytes;

/// Readable half of a push-based duplex transport.
pub trait ReadTransport {
    /// Takes the next chunk the transport has made available, or `None`
    /// when nothing is ready right now.
    fn take(&mut self) -> Option<Bytes>;

    /// Stops further data notifications until [`resume`](Self::resume).
    fn pause(&mut self);

    /// Re-enables data notifications.
    fn resume(&mut self);

    /// Tears the transport down abruptly.
    fn destroy(&mut self);
}

/// Writable half of a push-based duplex transport.
pub trait WriteTransport {
    /// Accepts a chunk for writing.
    ///
    /// Returns `false` when the internal buffer is full and the caller
    /// should wait for a drain signal before writing more. The chunk is
    /// buffered either way.
    fn write(&mut self, chunk: Bytes) -> bool;

    /// Signals that no further writes will be issued.
    fn end(&mut self);

    /// Tears the transport down abruptly.
    fn destroy(&mut self);
}

/// In-memory readable transport for testing.
///
/// Chunks are scripted with [`push`](Self::push); the pause and destroy
/// signals are recorded so tests can assert on flow-control behavior.
#[derive(Debug, Default)]
pub struct MemoryReadTransport {
    chunks: VecDeque<Bytes>,
    paused: bool,
    destroyed: bool,
}

impl MemoryReadTransport {
    /// Creates an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a chunk available for the next `take`.
    pub fn push(&mut self, chunk: Bytes) {
        self.chunks.push_back(chunk);
    }

    /// Returns true if the transport is currently paused.
    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Returns true if the transport has been destroyed.
    pub fn destroyed(&self) -> bool {
        self.destroyed
    }
}

impl ReadTransport for MemoryReadTransport {
    fn take(&mut self) -> Option<Bytes> {
        if self.destroyed {
            return None;
        }
        self.chunks.pop_front()
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        self.chunks.clear();
    }
}

/// In-memory writable transport for testing.
///
/// Records every written chunk and reports backpressure once the buffered
/// byte count reaches the high-water mark. Tests clear the buffer with
/// [`drain`](Self::drain) to simulate the drain signal.
#[derive(Debug)]
pub struct MemoryWriteTransport {
    written: Vec<Bytes>,
    buffered: usize,
    high_water: usize,
    ended: bool,
    destroyed: bool,
}

impl MemoryWriteTransport {
    /// Creates a transport that never signals backpressure.
    pub fn new() -> Self {
        Self::with_high_water(usize::MAX)
    }

    /// Creates a transport that signals backpressure once `bytes` are
    /// buffered.
    pub fn with_high_water(bytes: usize) -> Self {
        Self {
            written: Vec::new(),
            buffered: 0,
            high_water: bytes,
            ended: false,
            destroyed: false,
        }
    }

    /// All chunks accepted so far, in write order.
    pub fn written(&self) -> &[Bytes] {
        &self.written
    }

    /// Empties the internal buffer, as a drain event would.
    pub fn drain(&mut self) {
        self.buffered = 0;
    }

    /// Returns true once `end` has been called.
    pub fn ended(&self) -> bool {
        self.ended
    }

    /// Returns true if the transport has been destroyed.
    pub fn destroyed(&self) -> bool {
        self.destroyed
    }
}

impl Default for MemoryWriteTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteTransport for MemoryWriteTransport {
    fn write(&mut self, chunk: Bytes) -> bool {
        self.buffered += chunk.len();
        self.written.push(chunk);
        self.buffered < self.high_water
    }

    fn end(&mut self) {
        self.ended = true;
    }

    fn destroy(&mut self) {
        self.destroyed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_order() {
        let mut transport = MemoryReadTransport::new();
        transport.push(Bytes::from_static(b"one"));
        transport.push(Bytes::from_static(b"two"));

        assert_eq!(transport.take().unwrap().as_ref(), b"one");
        assert_eq!(transport.take().unwrap().as_ref(), b"two");
        assert!(transport.take().is_none());
    }

    #[test]
    fn test_memory_read_destroy_discards() {
        let mut transport = MemoryReadTransport::new();
        transport.push(Bytes::from_static(b"late"));
        transport.destroy();

        assert!(transport.destroyed());
        assert!(transport.take().is_none());
    }

    #[test]
    fn test_memory_write_high_water() {
        let mut transport = MemoryWriteTransport::with_high_water(8);

        assert!(transport.write(Bytes::from_static(b"1234")));
        assert!(!transport.write(Bytes::from_static(b"5678")));
        assert_eq!(transport.written().len(), 2);

        transport.drain();
        assert!(transport.write(Bytes::from_static(b"9")));
    }
}
