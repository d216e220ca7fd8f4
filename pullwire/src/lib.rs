//! # Pullwire - Pull-Stream Adaptation for Push Transports
//!
//! Pullwire converts a push-based, event-driven duplex byte transport
//! into a demand-driven interface:
//!
//! - **Pull source**: the consumer explicitly requests the next unit,
//!   one at a time, with at most one read in flight
//! - **Backpressure both ways**: unconsumed data pauses the transport;
//!   a full write buffer pauses the pull loop until drain
//! - **Terminal sentinels**: end and error propagate as tagged units,
//!   never reordered past buffered data
//! - **Bounded stack**: the synchronous fast path runs as an explicit
//!   loop, not recursion
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Consumer                          │
//! ├──────────────────────────────────────────────────────────┤
//! │                     Pull Interface                       │
//! │   ┌───────────────┐              ┌───────────────────┐   │
//! │   │ SourceAdapter │              │    SinkDriver     │   │
//! │   │ queue + slot  │              │ trampoline + park │   │
//! │   └───────────────┘              └───────────────────┘   │
//! ├──────────────────────────────────────────────────────────┤
//! │                   Push Transport Layer                   │
//! │   ┌──────────────────────────────────────────────────┐   │
//! │   │     ReadTransport / WriteTransport (TCP, ...)    │   │
//! │   └──────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use pullwire::{tcp, ChunkSource, PullSource};
//!
//! let (mut source, sink) = tcp::connect(("127.0.0.1", 9000)).await?;
//!
//! // Send data
//! let mut outgoing = ChunkSource::from_bytes(payload, 4096);
//! sink.send_all(&mut outgoing).await?;
//!
//! // Receive data
//! while let Some(chunk) = source.pull().await? {
//!     handle(chunk);
//! }
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod sink;
pub mod source;
pub mod tcp;
pub mod transport;
pub mod unit;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use sink::{DriveState, SinkDriver};
pub use source::{ChunkSource, FlowState, PullSource, ReadState, Source, SourceAdapter};
pub use transport::{ReadTransport, WriteTransport};
pub use unit::Unit;

/// Default maximum bytes requested from a socket per read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8192;

/// Default buffered outbound bytes before the sink signals backpressure.
pub const DEFAULT_HIGH_WATER_MARK: usize = 16 * 1024;
