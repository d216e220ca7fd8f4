//! The value flowing through the pull protocol.

use bytes::Bytes;

use crate::error::Error;

/// One unit delivered by a pull source.
///
/// Exactly one of three mutually exclusive shapes. `End` and `Failed` are
/// terminal: once either has been produced, no further units follow.
#[derive(Debug)]
pub enum Unit {
    /// One opaque chunk of bytes.
    Data(Bytes),

    /// Clean exhaustion. No payload.
    End,

    /// The transport failed with the given cause.
    Failed(Error),
}

impl Unit {
    /// Returns true for `End` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Unit::Data(_))
    }

    /// Returns the chunk for a data unit.
    pub fn as_data(&self) -> Option<&Bytes> {
        match self {
            Unit::Data(chunk) => Some(chunk),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_shapes() {
        assert!(!Unit::Data(Bytes::from_static(b"x")).is_terminal());
        assert!(Unit::End.is_terminal());
        assert!(Unit::Failed(Error::aborted()).is_terminal());
    }
}
