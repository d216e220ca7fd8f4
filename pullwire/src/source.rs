//! Pull-based source side of the adapter.
//!
//! [`SourceAdapter`] turns a push-based readable transport into a
//! demand-driven source: transport events are buffered into a pending
//! queue, a single consumer pulls units out one at a time, and the
//! transport is paused whenever buffered units pile up with nobody
//! waiting, so its own flow control propagates upstream.

use std::collections::VecDeque;
use std::future::Future;

use bytes::Bytes;
use log::trace;

use crate::error::{Error, Result};
use crate::transport::ReadTransport;
use crate::unit::Unit;

/// Outcome of a [`Source::read`] call.
///
/// A read either completes on the same call stack or parks until a
/// transport event produces the next unit.
#[derive(Debug)]
pub enum ReadState {
    /// The next unit, delivered synchronously.
    Ready(Unit),

    /// No unit is queued yet; delivery happens through the adapter's
    /// event handlers once the transport produces something.
    Pending,
}

/// Transport flow-control coupling of a source adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// The transport is told to hold back data notifications.
    Paused,

    /// The transport may deliver data notifications.
    Flowing,
}

/// A demand-driven source of [`Unit`]s.
///
/// At most one read may be in flight per source; a second concurrent
/// `read` fails with [`crate::ErrorKind::ReadInFlight`].
pub trait Source {
    /// Requests the next unit.
    fn read(&mut self) -> Result<ReadState>;

    /// Tears the source down. Returns the unit owed to a parked read,
    /// if one was outstanding.
    fn abort(&mut self) -> Option<Unit>;
}

/// Asynchronous pull interface over a source of chunks.
///
/// `Ok(Some(chunk))` is a data unit, `Ok(None)` is clean end, `Err` is the
/// terminal transport error.
pub trait PullSource {
    /// Pulls the next chunk, waiting for it if necessary.
    fn pull(&mut self) -> impl Future<Output = Result<Option<Bytes>>>;
}

/// Adapts a push-based readable transport into a [`Source`].
///
/// Incoming transport events (data, end, error) are translated into units
/// on a pending queue. A pull either takes the queue head synchronously or
/// parks in the single outstanding-pull slot until an event hands a unit
/// over. After every enqueue and dequeue the adapter reconciles the
/// transport's pause state: paused exactly when undelivered units are
/// buffered and no consumer is waiting.
#[derive(Debug)]
pub struct SourceAdapter<T: ReadTransport> {
    transport: T,
    queue: VecDeque<Unit>,

    /// The outstanding-pull slot. Holds at most one parked read.
    waiting: bool,

    flow: FlowState,

    /// A terminal unit has been enqueued; later transport events carry no
    /// payload and are dropped.
    terminated: bool,

    /// A terminal unit has been delivered; further reads yield `End`.
    finished: bool,

    aborted: bool,
}

impl<T: ReadTransport> SourceAdapter<T> {
    /// Wraps the readable half of a transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            queue: VecDeque::new(),
            waiting: false,
            flow: FlowState::Flowing,
            terminated: false,
            finished: false,
            aborted: false,
        }
    }

    /// Handles a "data available" notification.
    ///
    /// Drains the chunks the transport is willing to hand over in this
    /// pass and returns the unit owed to a parked read, if any.
    pub fn handle_readable(&mut self) -> Option<Unit> {
        if self.terminated || self.aborted {
            return None;
        }

        let mut drained = 0usize;
        while let Some(chunk) = self.transport.take() {
            trace!("queued data unit of {} bytes", chunk.len());
            self.queue.push_back(Unit::Data(chunk));
            drained += 1;
        }
        if drained == 0 {
            // Spurious notification, nothing to reconcile.
            return None;
        }

        self.reconcile()
    }

    /// Handles the end-of-stream notification.
    pub fn handle_end(&mut self) -> Option<Unit> {
        if self.terminated || self.aborted {
            return None;
        }

        trace!("queued end unit");
        self.terminated = true;
        self.queue.push_back(Unit::End);
        self.reconcile()
    }

    /// Handles an error notification from the transport.
    pub fn handle_error(&mut self, err: Error) -> Option<Unit> {
        if self.terminated || self.aborted {
            return None;
        }

        trace!("queued error unit: {err}");
        self.terminated = true;
        self.queue.push_back(Unit::Failed(err));
        self.reconcile()
    }

    /// Current flow-control state of the wrapped transport.
    pub fn flow_state(&self) -> FlowState {
        self.flow
    }

    /// Number of units buffered but not yet delivered.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Returns a mutable reference to the wrapped transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Hands the queue head to a parked read, then updates flow control.
    fn reconcile(&mut self) -> Option<Unit> {
        let mut handoff = None;
        if self.waiting {
            if let Some(unit) = self.queue.pop_front() {
                self.waiting = false;
                self.note_delivery(&unit);
                handoff = Some(unit);
            }
        }
        self.update_flow();
        handoff
    }

    fn note_delivery(&mut self, unit: &Unit) {
        if unit.is_terminal() {
            self.finished = true;
        }
    }

    /// Paused exactly when unconsumed units are buffered and no consumer
    /// is waiting; flowing otherwise.
    fn update_flow(&mut self) {
        let next = if !self.queue.is_empty() && !self.waiting {
            FlowState::Paused
        } else {
            FlowState::Flowing
        };
        if next != self.flow {
            self.flow = next;
            match next {
                FlowState::Paused => {
                    trace!("pausing transport, {} unit(s) buffered", self.queue.len());
                    self.transport.pause();
                }
                FlowState::Flowing => {
                    trace!("resuming transport");
                    self.transport.resume();
                }
            }
        }
    }
}

impl<T: ReadTransport> Source for SourceAdapter<T> {
    fn read(&mut self) -> Result<ReadState> {
        if let Some(unit) = self.queue.pop_front() {
            self.note_delivery(&unit);
            self.update_flow();
            return Ok(ReadState::Ready(unit));
        }
        if self.finished {
            // Terminal already delivered; stay fused.
            return Ok(ReadState::Ready(Unit::End));
        }
        if self.aborted {
            return Ok(ReadState::Ready(Unit::Failed(Error::aborted())));
        }
        if self.waiting {
            return Err(Error::read_in_flight());
        }
        self.waiting = true;
        self.update_flow();
        Ok(ReadState::Pending)
    }

    fn abort(&mut self) -> Option<Unit> {
        if self.aborted {
            return None;
        }
        trace!("aborting source, destroying transport");
        self.aborted = true;
        self.queue.clear();
        self.transport.destroy();
        if self.waiting {
            // Resolve the parked read instead of leaving it hanging.
            self.waiting = false;
            self.finished = true;
            return Some(Unit::Failed(Error::aborted()));
        }
        None
    }
}

/// A source over an in-memory list of chunks.
///
/// Yields each chunk as a data unit, then end. Useful for feeding a sink
/// from materialized data.
#[derive(Debug, Default)]
pub struct ChunkSource {
    chunks: VecDeque<Bytes>,
}

impl ChunkSource {
    /// Builds a source over the given chunks.
    pub fn new<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
    {
        Self {
            chunks: chunks.into_iter().collect(),
        }
    }

    /// Builds a source by splitting `data` into chunks of at most
    /// `chunk_size` bytes.
    pub fn from_bytes(data: impl Into<Bytes>, chunk_size: usize) -> Self {
        let data: Bytes = data.into();
        let chunks = (0..data.len())
            .step_by(chunk_size.max(1))
            .map(|at| data.slice(at..data.len().min(at + chunk_size.max(1))))
            .collect();
        Self { chunks }
    }

    /// Number of chunks not yet pulled.
    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }
}

impl Source for ChunkSource {
    fn read(&mut self) -> Result<ReadState> {
        match self.chunks.pop_front() {
            Some(chunk) => Ok(ReadState::Ready(Unit::Data(chunk))),
            None => Ok(ReadState::Ready(Unit::End)),
        }
    }

    fn abort(&mut self) -> Option<Unit> {
        self.chunks.clear();
        None
    }
}

impl PullSource for ChunkSource {
    async fn pull(&mut self) -> Result<Option<Bytes>> {
        Ok(self.chunks.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transport::MemoryReadTransport;

    fn adapter_with_chunks(chunks: &[&'static [u8]]) -> SourceAdapter<MemoryReadTransport> {
        let mut transport = MemoryReadTransport::new();
        for chunk in chunks {
            transport.push(Bytes::from_static(chunk));
        }
        let mut adapter = SourceAdapter::new(transport);
        adapter.handle_readable();
        adapter
    }

    fn expect_data(state: ReadState) -> Bytes {
        match state {
            ReadState::Ready(Unit::Data(chunk)) => chunk,
            other => panic!("expected data unit, got {other:?}"),
        }
    }

    #[test]
    fn test_read_yields_chunks_in_order_then_end() {
        let mut adapter = adapter_with_chunks(&[b"one", b"two", b"three"]);

        assert_eq!(expect_data(adapter.read().unwrap()).as_ref(), b"one");
        assert_eq!(expect_data(adapter.read().unwrap()).as_ref(), b"two");
        assert_eq!(expect_data(adapter.read().unwrap()).as_ref(), b"three");

        assert!(matches!(adapter.read().unwrap(), ReadState::Pending));
        let unit = adapter.handle_end().unwrap();
        assert!(matches!(unit, Unit::End));

        // Fused after the terminal unit.
        assert!(matches!(
            adapter.read().unwrap(),
            ReadState::Ready(Unit::End)
        ));
    }

    #[test]
    fn test_queue_occupancy_drives_pause_and_resume() {
        let mut adapter = adapter_with_chunks(&[b"a", b"b"]);

        // Units buffered, nobody waiting: transport must be paused.
        assert_eq!(adapter.flow_state(), FlowState::Paused);
        assert!(adapter.transport_mut().paused());

        adapter.read().unwrap();
        assert_eq!(adapter.flow_state(), FlowState::Paused);

        // Queue drained: transport resumes.
        adapter.read().unwrap();
        assert_eq!(adapter.flow_state(), FlowState::Flowing);
        assert!(!adapter.transport_mut().paused());
    }

    #[test]
    fn test_concurrent_read_rejected_without_disturbing_first() {
        let mut adapter = SourceAdapter::new(MemoryReadTransport::new());

        assert!(matches!(adapter.read().unwrap(), ReadState::Pending));
        let err = adapter.read().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReadInFlight);

        // The first request still gets its delivery.
        adapter.transport_mut().push(Bytes::from_static(b"late"));
        let unit = adapter.handle_readable().unwrap();
        assert_eq!(unit.as_data().unwrap().as_ref(), b"late");
    }

    #[test]
    fn test_async_handoff_clears_the_slot() {
        let mut adapter = SourceAdapter::new(MemoryReadTransport::new());
        assert!(matches!(adapter.read().unwrap(), ReadState::Pending));

        adapter.transport_mut().push(Bytes::from_static(b"x"));
        assert!(adapter.handle_readable().is_some());

        // Slot is free again; a new read may park.
        assert!(matches!(adapter.read().unwrap(), ReadState::Pending));
    }

    #[test]
    fn test_buffered_data_delivered_before_error() {
        let mut adapter = adapter_with_chunks(&[b"first"]);
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(adapter.handle_error(Error::transport(cause)).is_none());

        assert_eq!(expect_data(adapter.read().unwrap()).as_ref(), b"first");
        match adapter.read().unwrap() {
            ReadState::Ready(Unit::Failed(err)) => {
                assert_eq!(err.kind(), ErrorKind::Transport)
            }
            other => panic!("expected error unit, got {other:?}"),
        }
    }

    #[test]
    fn test_events_after_terminal_are_dropped() {
        let mut adapter = SourceAdapter::new(MemoryReadTransport::new());
        adapter.handle_end();

        adapter.transport_mut().push(Bytes::from_static(b"stale"));
        assert!(adapter.handle_readable().is_none());
        assert!(adapter.handle_end().is_none());
        assert_eq!(adapter.queued(), 1); // just the end unit

        assert!(matches!(
            adapter.read().unwrap(),
            ReadState::Ready(Unit::End)
        ));
    }

    #[test]
    fn test_abort_destroys_transport_and_resolves_parked_read() {
        let mut adapter = SourceAdapter::new(MemoryReadTransport::new());
        assert!(matches!(adapter.read().unwrap(), ReadState::Pending));

        let owed = adapter.abort().unwrap();
        match owed {
            Unit::Failed(err) => assert_eq!(err.kind(), ErrorKind::Aborted),
            other => panic!("expected abort failure, got {other:?}"),
        }
        assert!(adapter.transport_mut().destroyed());

        // Repeated abort is a no-op.
        assert!(adapter.abort().is_none());
    }

    #[test]
    fn test_abort_without_parked_read_owes_nothing() {
        let mut adapter = adapter_with_chunks(&[b"dropped"]);
        assert!(adapter.abort().is_none());
        assert_eq!(adapter.queued(), 0);
    }

    #[test]
    fn test_chunk_source_yields_then_ends() {
        let mut source = ChunkSource::new([
            Bytes::from_static(b"ab"),
            Bytes::from_static(b"cd"),
        ]);

        assert_eq!(expect_data(source.read().unwrap()).as_ref(), b"ab");
        assert_eq!(expect_data(source.read().unwrap()).as_ref(), b"cd");
        assert!(matches!(source.read().unwrap(), ReadState::Ready(Unit::End)));
        assert!(matches!(source.read().unwrap(), ReadState::Ready(Unit::End)));
    }

    #[test]
    fn test_chunk_source_from_bytes_splits_without_loss() {
        let source = ChunkSource::from_bytes(vec![7u8; 10], 4);
        assert_eq!(source.remaining(), 3);

        let mut source = source;
        let mut total = 0;
        while let ReadState::Ready(Unit::Data(chunk)) = source.read().unwrap() {
            assert!(chunk.len() <= 4);
            total += chunk.len();
        }
        assert_eq!(total, 10);
    }
}
