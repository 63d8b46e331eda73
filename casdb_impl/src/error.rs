use thiserror::Error;

/// Distinguishes the reason a session-state-sensitive call was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StateError {
    /// A `connect()` was issued while a previous `connect()` was still pending.
    #[error("a connect attempt is already pending on this session")]
    ConnectPending,

    /// A query-issuing call was issued while a previous query was still pending.
    #[error("a query is already pending on this session")]
    QueryPending,

    /// `fetch()` or `close_query()` was called with a handle that is not open.
    #[error("no active query with the given handle")]
    NoActiveQuery,
}

/// A list specifying categories of [`CasError`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CasError {
    /// Error occurred in communication with the broker or the database, or the socket
    /// could not be established at all. Terminal for the session.
    #[error(transparent)]
    Transport {
        /// The causing error.
        #[from]
        source: std::io::Error,
    },

    /// A frame or packet did not decode the way the protocol requires: an unexpected
    /// length, an unexpected response code for the request that was sent, or a
    /// truncated frame.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server returned a negative response code; the session remains usable.
    #[error("server error {code}: {message}")]
    Server {
        /// The server's numeric error code.
        code: i32,
        /// The resolved, human-readable error message.
        message: String,
    },

    /// An operation was rejected because of the session's current state.
    #[error("rejected by current session state: {0}")]
    State(#[from] StateError),

    /// Caller-supplied input was rejected before anything was sent on the wire.
    #[error("invalid input: {0}")]
    Validation(&'static str),

    /// An operation's deadline was exceeded before a complete response arrived.
    #[error("operation timed out")]
    Timeout,

    /// A surface that is intentionally not implemented by this crate.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

/// Abbreviation of `Result<T, CasError>`.
pub type CasResult<T> = std::result::Result<T, CasError>;

impl CasError {
    /// Returns `Some((code, message))` if this is a [`CasError::Server`].
    ///
    /// Helps callers who need programmatic access to the server's numeric error code.
    pub fn server_error(&self) -> Option<(i32, &str)> {
        match self {
            Self::Server { code, message } => Some((*code, message.as_str())),
            _ => None,
        }
    }

    /// Returns `true` if this error is terminal for the connection, i.e. the socket
    /// has been (or should be) torn down.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Protocol(_))
    }
}
