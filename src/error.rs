//! Unified error type for all store operations.

use std::fmt;

/// Which record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// No post with this id.
    Post(u32),
    /// No user with this id.
    User(u32),
    /// No user registered under the requested email.
    UserEmail,
    /// No refresh token with the requested value. The token value is
    /// never echoed.
    RefreshToken,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Post(id) => write!(f, "post {id}"),
            Missing::User(id) => write!(f, "user {id}"),
            Missing::UserEmail => f.write_str("user with that email"),
            Missing::RefreshToken => f.write_str("refresh token"),
        }
    }
}

/// Things that can go wrong when using the store.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// File system problem (open, read, write, rename).
    #[error("i/o error: {0}")]
    Io(String),
    /// Failed to serialize the document to bytes.
    #[error("serialization error: {0}")]
    Serialize(String),
    /// The file on disk is not a valid document.
    #[error("deserialization error: {0}")]
    Deserialize(String),
    /// The requested record does not exist.
    #[error("{0} not found")]
    NotFound(Missing),
    /// A new record would land on an id that is already taken.
    #[error("{kind} id {id} already exists")]
    AlreadyExists {
        /// Collection name (`"post"` or `"user"`).
        kind: &'static str,
        /// The colliding id.
        id: u32,
    },
    /// No id is left for a new record in this collection.
    #[error("no {kind} id left to assign")]
    IdsExhausted {
        /// Collection name (`"post"` or `"user"`).
        kind: &'static str,
    },
    /// The refresh token exists but its expiry has passed.
    #[error("refresh token expired")]
    Expired,
    /// Bad configuration (empty path and the like).
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// `true` for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// `true` for [`Error::Expired`].
    pub fn is_expired(&self) -> bool {
        matches!(self, Error::Expired)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Error::Io(err.to_string())
        } else if err.is_syntax() || err.is_eof() || err.is_data() {
            Error::Deserialize(err.to_string())
        } else {
            Error::Serialize(err.to_string())
        }
    }
}

/// Result alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
