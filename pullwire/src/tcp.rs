//! TCP integration: wraps real sockets into the pull-stream shape.
//!
//! [`wrap`] splits a connected socket into a [`TcpSource`] and a
//! [`TcpSink`]; [`connect`] and [`Listener`] handle dialing and listening.
//!
//! The source reads the socket only while a consumer is waiting on a
//! pull, so pausing collapses into simply not reading and backpressure
//! propagates upstream through the kernel's TCP receive window. The sink
//! runs the sans-io [`SinkDriver`] and maps its parking states onto socket
//! operations: a full outbox is flushed with awaited writes (the drain
//! signal), and finalization becomes a socket shutdown.

use std::collections::VecDeque;
use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use log::{debug, trace};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::sink::{DriveState, SinkDriver};
use crate::source::{PullSource, ReadState, Source, SourceAdapter};
use crate::transport::{ReadTransport, WriteTransport};
use crate::unit::Unit;

/// Wraps a connected socket into a pull source and a sink.
pub fn wrap(stream: TcpStream, config: &Config) -> (TcpSource, TcpSink) {
    let (read_half, write_half) = stream.into_split();
    (
        TcpSource::new(read_half, config),
        TcpSink::new(write_half, config),
    )
}

/// Dials `addr` and wraps the resulting socket.
pub async fn connect(addr: impl ToSocketAddrs) -> Result<(TcpSource, TcpSink)> {
    let stream = TcpStream::connect(addr).await?;
    debug!("connected to {:?}", stream.peer_addr().ok());
    Ok(wrap(stream, &Config::default()))
}

/// Accepts connections and wraps each socket on acceptance.
pub struct Listener {
    inner: TcpListener,
    config: Config,
}

impl Listener {
    /// Binds to `addr` with default configuration.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        Self::bind_with(addr, Config::default()).await
    }

    /// Binds to `addr` with the given configuration.
    pub async fn bind_with(addr: impl ToSocketAddrs, config: Config) -> Result<Self> {
        let inner = TcpListener::bind(addr).await?;
        Ok(Self { inner, config })
    }

    /// Accepts the next connection.
    pub async fn accept(&self) -> Result<(TcpSource, TcpSink, SocketAddr)> {
        let (stream, peer) = self.inner.accept().await?;
        debug!("accepted connection from {peer}");
        let (source, sink) = wrap(stream, &self.config);
        Ok((source, sink, peer))
    }

    /// The locally bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.inner.local_addr()?)
    }
}

/// Readable-half state shared with the source adapter.
///
/// Chunks read from the socket land here before the adapter queues them.
/// Pause needs no bookkeeping beyond the flag: a paused source simply
/// does not read the socket.
#[derive(Debug, Default)]
struct SocketInbox {
    chunks: VecDeque<Bytes>,
    paused: bool,
    destroyed: bool,
}

impl SocketInbox {
    fn push(&mut self, chunk: Bytes) {
        self.chunks.push_back(chunk);
    }
}

impl ReadTransport for SocketInbox {
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

/// Pull source over the readable half of a TCP socket.
pub struct TcpSource {
    adapter: SourceAdapter<SocketInbox>,
    socket: Option<OwnedReadHalf>,
    chunk_size: usize,
}

impl TcpSource {
    fn new(socket: OwnedReadHalf, config: &Config) -> Self {
        Self {
            adapter: SourceAdapter::new(SocketInbox::default()),
            socket: Some(socket),
            chunk_size: config.read_chunk_size,
        }
    }

    /// Tears down the read side. Any buffered chunks are discarded and
    /// later pulls fail with [`crate::ErrorKind::Aborted`].
    pub fn abort(&mut self) {
        debug!("aborting tcp source");
        let _ = self.adapter.abort();
        self.socket = None;
    }

    fn deliver(unit: Unit) -> Result<Option<Bytes>> {
        match unit {
            Unit::Data(chunk) => Ok(Some(chunk)),
            Unit::End => Ok(None),
            Unit::Failed(err) => Err(err),
        }
    }
}

impl PullSource for TcpSource {
    async fn pull(&mut self) -> Result<Option<Bytes>> {
        loop {
            match self.adapter.read()? {
                ReadState::Ready(unit) => return Self::deliver(unit),
                ReadState::Pending => {
                    // A parked consumer means the adapter is flowing;
                    // reading the socket is the "data available" event.
                    debug_assert!(!self.adapter.transport_mut().paused);

                    let Some(socket) = self.socket.as_mut() else {
                        return Err(Error::aborted());
                    };

                    let mut buf = BytesMut::with_capacity(self.chunk_size);
                    let delivered = match socket.read_buf(&mut buf).await {
                        Ok(0) => self.adapter.handle_end(),
                        Ok(n) => {
                            trace!("socket produced {n} bytes");
                            self.adapter.transport_mut().push(buf.freeze());
                            self.adapter.handle_readable()
                        }
                        Err(err) => self.adapter.handle_error(Error::transport(err)),
                    };
                    if let Some(unit) = delivered {
                        return Self::deliver(unit);
                    }
                }
            }
        }
    }
}

/// Writable-half buffer the sink driver pushes into.
///
/// Accepts every chunk and reports backpressure past the high-water mark;
/// the pump flushes it to the socket and raises the drain signal.
#[derive(Debug)]
struct SocketOutbox {
    queue: VecDeque<Bytes>,
    buffered: usize,
    high_water: usize,
}

impl SocketOutbox {
    fn new(high_water: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            buffered: 0,
            high_water,
        }
    }

    fn pop(&mut self) -> Option<Bytes> {
        let chunk = self.queue.pop_front()?;
        self.buffered -= chunk.len();
        Some(chunk)
    }
}

impl WriteTransport for SocketOutbox {
    fn write(&mut self, chunk: Bytes) -> bool {
        self.buffered += chunk.len();
        self.queue.push_back(chunk);
        self.buffered < self.high_water
    }

    fn end(&mut self) {
        // Finalization is the socket shutdown, issued by the pump once
        // the driver parks on close.
    }

    fn destroy(&mut self) {
        self.queue.clear();
        self.buffered = 0;
    }
}

/// Sink over the writable half of a TCP socket.
pub struct TcpSink {
    socket: OwnedWriteHalf,
    high_water: usize,
}

impl TcpSink {
    fn new(socket: OwnedWriteHalf, config: &Config) -> Self {
        Self {
            socket,
            high_water: config.high_water_mark,
        }
    }

    /// Pulls `source` to exhaustion and writes everything into the
    /// socket, then shuts the write side down.
    ///
    /// Completes with `Ok(())` on a clean end, or with the source's
    /// terminal error after the shutdown.
    pub async fn send_all<S: PullSource>(mut self, source: &mut S) -> Result<()> {
        let mut driver = SinkDriver::new(Relay, SocketOutbox::new(self.high_water));

        let terminal = loop {
            match driver.drive()? {
                DriveState::AwaitingUnit => {
                    let unit = match source.pull().await {
                        Ok(Some(chunk)) => Unit::Data(chunk),
                        Ok(None) => Unit::End,
                        Err(err) => Unit::Failed(err),
                    };
                    driver.unit_ready(unit)?;
                }
                DriveState::AwaitingDrain => {
                    self.flush(driver.transport_mut()).await?;
                    driver.drained()?;
                }
                DriveState::AwaitingClose => {
                    self.flush(driver.transport_mut()).await?;
                    self.socket.shutdown().await?;
                    debug!("tcp sink finalized");
                    break driver.closed();
                }
                DriveState::Pulling | DriveState::Done => break driver.closed(),
            }
        };

        match terminal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn flush(&mut self, outbox: &mut SocketOutbox) -> Result<()> {
        while let Some(chunk) = outbox.pop() {
            trace!("flushing {} bytes to socket", chunk.len());
            self.socket.write_all(&chunk).await?;
        }
        Ok(())
    }
}

/// Placeholder source for the sink pump: every read completes
/// asynchronously via [`SinkDriver::unit_ready`], mirroring an adapter
/// whose units always arrive from transport events.
struct Relay;

impl Source for Relay {
    fn read(&mut self) -> Result<ReadState> {
        Ok(ReadState::Pending)
    }

    fn abort(&mut self) -> Option<Unit> {
        None
    }
}
