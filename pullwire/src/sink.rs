//! Sink side of the adapter: drives a pull source into a push-based
//! writable transport.
//!
//! The driver repeatedly pulls units and pushes them into the transport,
//! parking when the transport signals backpressure and resuming on drain,
//! and finalizing the transport once the source is exhausted. The fast
//! path — source and transport both completing synchronously — runs as an
//! explicit loop, so stack depth stays constant no matter how many units
//! are exchanged back to back.

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::source::{ReadState, Source};
use crate::transport::WriteTransport;
use crate::unit::Unit;

/// Where a [`SinkDriver`] is parked between events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveState {
    /// Actively pulling and writing.
    Pulling,

    /// A read is outstanding; waiting for [`SinkDriver::unit_ready`].
    AwaitingUnit,

    /// The transport buffer is full; waiting for [`SinkDriver::drained`].
    AwaitingDrain,

    /// The transport has been finalized; waiting for
    /// [`SinkDriver::closed`].
    AwaitingClose,

    /// The completion has been reported.
    Done,
}

/// Drives a [`Source`] into a [`WriteTransport`].
///
/// One driver instance serves one drive operation: create it with the
/// source and target transport, call [`drive`](Self::drive), and feed it
/// the transport's drain and close signals (and, for sources that complete
/// reads asynchronously, the delivered units) until [`closed`](Self::closed)
/// yields the completion.
#[derive(Debug)]
pub struct SinkDriver<S: Source, W: WriteTransport> {
    source: S,
    transport: W,
    state: DriveState,

    /// Terminal error to report at completion, if the source failed.
    terminal: Option<Error>,
}

impl<S: Source, W: WriteTransport> SinkDriver<S, W> {
    /// Creates a driver pulling from `source` into `transport`.
    pub fn new(source: S, transport: W) -> Self {
        Self {
            source,
            transport,
            state: DriveState::Pulling,
            terminal: None,
        }
    }

    /// Returns the current parking state.
    pub fn state(&self) -> DriveState {
        self.state
    }

    /// Returns a mutable reference to the source being drained.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Returns the target transport.
    pub fn transport(&self) -> &W {
        &self.transport
    }

    /// Returns the target transport mutably.
    pub fn transport_mut(&mut self) -> &mut W {
        &mut self.transport
    }

    /// Runs the pull loop until it parks.
    ///
    /// Issues one read at a time and fully accounts for each unit —
    /// written, parked on backpressure, or terminal — before pulling the
    /// next. Synchronously completing reads keep iterating on this call
    /// stack rather than recursing.
    pub fn drive(&mut self) -> Result<DriveState> {
        while self.state == DriveState::Pulling {
            match self.source.read()? {
                ReadState::Pending => {
                    trace!("read pending, parking until the unit arrives");
                    self.state = DriveState::AwaitingUnit;
                }
                ReadState::Ready(unit) => self.accept(unit),
            }
        }
        Ok(self.state)
    }

    /// Completes an asynchronous read with its unit and re-enters the
    /// pull loop.
    pub fn unit_ready(&mut self, unit: Unit) -> Result<DriveState> {
        if self.state != DriveState::AwaitingUnit {
            debug!("unit delivered while not awaiting one, dropping");
            return Ok(self.state);
        }
        self.state = DriveState::Pulling;
        self.accept(unit);
        self.drive()
    }

    /// Handles the transport's drain signal.
    ///
    /// Resumes pulling only when parked on backpressure; a drain in any
    /// other state must not start an overlapping read.
    pub fn drained(&mut self) -> Result<DriveState> {
        if self.state != DriveState::AwaitingDrain {
            return Ok(self.state);
        }
        trace!("transport drained, resuming pull loop");
        self.state = DriveState::Pulling;
        self.drive()
    }

    /// Handles the transport's close confirmation and reports the
    /// completion: the terminal error, or `None` for a clean end.
    pub fn closed(&mut self) -> Option<Error> {
        self.state = DriveState::Done;
        self.terminal.take()
    }

    fn accept(&mut self, unit: Unit) {
        match unit {
            Unit::Data(chunk) => {
                trace!("writing {} byte chunk", chunk.len());
                if !self.transport.write(chunk) {
                    trace!("transport buffer full, parking until drain");
                    self.state = DriveState::AwaitingDrain;
                }
            }
            Unit::End => {
                debug!("source exhausted, finalizing transport");
                self.transport.end();
                self.state = DriveState::AwaitingClose;
            }
            Unit::Failed(err) => {
                debug!("source failed ({err}), finalizing transport");
                self.terminal = Some(err);
                self.transport.end();
                self.state = DriveState::AwaitingClose;
            }
        }
    }
}
