use crate::{DEFAULT_HIGH_WATER_MARK, DEFAULT_READ_CHUNK_SIZE};

/// Tuning knobs for the TCP integration layer.
pub struct Config {
    /// Maximum bytes requested from the socket per read.
    pub read_chunk_size: usize,

    /// Buffered outbound bytes above which the sink signals backpressure.
    pub high_water_mark: usize,
}

impl Config {
    pub fn new() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }

    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    pub fn with_high_water_mark(mut self, bytes: usize) -> Self {
        self.high_water_mark = bytes;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
