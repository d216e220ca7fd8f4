use core::fmt;

/// Categories of failure surfaced by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The underlying transport reported an error. Terminal for that
    /// transport instance; the adapter does not retry.
    Transport,

    /// A second `read` was issued while one was still outstanding.
    /// Reported to the offending caller; the first request is unaffected.
    ReadInFlight,

    /// The source was aborted while the operation was in flight.
    Aborted,
}

/// Error type for pull-stream operations.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<std::io::Error>,
}

impl Error {
    /// Creates an error of the given kind with no underlying cause.
    pub fn new(kind: ErrorKind) -> Self {
        Error { kind, source: None }
    }

    /// Creates a transport error wrapping the I/O cause.
    pub fn transport(source: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Transport,
            source: Some(source),
        }
    }

    /// Creates the concurrent-read usage error.
    pub fn read_in_flight() -> Self {
        Error::new(ErrorKind::ReadInFlight)
    }

    /// Creates the abort error.
    pub fn aborted() -> Self {
        Error::new(ErrorKind::Aborted)
    }

    /// Returns the error category.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Transport => match &self.source {
                Some(cause) => write!(f, "transport error: {cause}"),
                None => write!(f, "transport error"),
            },
            ErrorKind::ReadInFlight => write!(f, "only one read at a time allowed"),
            ErrorKind::Aborted => write!(f, "source aborted"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::transport(err)
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> std::io::Error {
        let kind = match err.kind {
            ErrorKind::Aborted => std::io::ErrorKind::ConnectionAborted,
            _ => std::io::ErrorKind::Other,
        };
        let message = err.to_string();
        match err.source {
            Some(cause) => cause,
            None => std::io::Error::new(kind, message),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
