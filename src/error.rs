use thiserror::Error;

use crate::config::BackendKind;

/// Errors surfaced by the connection layer.
///
/// Backend-native errors (malformed SQL, constraint violations, ...) pass
/// through unmodified in the per-driver variants; this layer adds no
/// translation over them.
#[derive(Error, Debug)]
pub enum Error {
    /// Backend unreachable, credentials rejected, or target database missing.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A data operation was issued before `connect()` or after `close()`.
    #[error("Not connected")]
    NotConnected,

    /// Handle lifecycle misuse other than the plain absence of a session.
    #[error("Invalid session state: {0}")]
    State(&'static str),

    /// The variant does not implement this operation.
    #[error("{backend} backend does not support {operation}")]
    Unsupported {
        backend: BackendKind,
        operation: &'static str,
    },

    /// Constructor-time rejection of connection parameters.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The backend's cargo feature was not compiled in.
    #[error("Driver not available: {0} (not compiled)")]
    DriverNotAvailable(&'static str),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "odbc")]
    #[error(transparent)]
    Odbc(#[from] odbc_api::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Postgres(#[from] postgres::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
