//! The backend contract and the kind-dispatched factory.

use std::fmt;

use crate::config::{BackendKind, ConnectParams};
use crate::error::{Error, Result};
use crate::surface::ExecutionSurface;

/// One relational backend behind a uniform lifecycle.
///
/// A backend is built cold from [`ConnectParams`], opens its session with
/// [`connect`](Backend::connect), hands out statement execution through
/// [`cursor`](Backend::cursor), and is torn down with
/// [`close`](Backend::close). Closing is idempotent, and a closed backend
/// may connect again, so one value can serve several sequential sessions.
///
/// The introspection operations default to [`Error::Unsupported`]; variants
/// override the ones their engine can answer.
pub trait Backend: fmt::Display {
    /// Which backend family this is.
    fn kind(&self) -> BackendKind;

    /// Open a session. Fails with [`Error::State`] when one is already open.
    fn connect(&mut self) -> Result<()>;

    /// The execution surface of the open session.
    fn cursor(&mut self) -> Result<&mut dyn ExecutionSurface>;

    /// Make the session's work durable.
    fn commit(&mut self) -> Result<()>;

    /// Discard the session's uncommitted work.
    fn rollback(&mut self) -> Result<()>;

    /// Tear the session down. Closing an already-closed backend is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Names of the user tables in the connected database.
    fn list_tablenames(&mut self) -> Result<Vec<String>> {
        Err(Error::Unsupported {
            backend: self.kind(),
            operation: "list_tablenames",
        })
    }

    /// Column names of `table`, in declaration order.
    fn list_attrs(&mut self, table: &str) -> Result<Vec<String>> {
        let _ = table;
        Err(Error::Unsupported {
            backend: self.kind(),
            operation: "list_attrs",
        })
    }

    /// Query text computing the smallest id not yet taken in `table`.`attr`.
    /// The text is returned for the caller to run, so no session is needed.
    fn max_id(&self, table: &str, attr: &str) -> Result<String> {
        let _ = (table, attr);
        Err(Error::Unsupported {
            backend: self.kind(),
            operation: "max_id",
        })
    }
}

/// Build the backend for `kind` from one set of parameters.
///
/// Each arm exists only when its driver feature is compiled in; asking for a
/// compiled-out kind names the feature that would provide it.
pub fn create_backend(kind: BackendKind, params: ConnectParams) -> Result<Box<dyn Backend>> {
    if !kind.is_available() {
        return Err(Error::DriverNotAvailable(kind.feature_name()));
    }

    match kind {
        #[cfg(feature = "sqlite")]
        BackendKind::Sqlite => Ok(Box::new(crate::backends::sqlite::SqliteBackend::new(
            params,
        )?)),
        #[cfg(feature = "odbc")]
        BackendKind::Odbc => Ok(Box::new(crate::backends::odbc::OdbcBackend::new(params)?)),
        #[cfg(feature = "pooled")]
        BackendKind::Pooled => Ok(Box::new(crate::backends::pooled::PooledBackend::new(
            params,
        )?)),
        #[cfg(feature = "postgres")]
        BackendKind::Postgres => Ok(Box::new(crate::backends::postgres::PostgresBackend::new(
            params,
        )?)),
        // Fallback for when the feature is not compiled
        #[allow(unreachable_patterns)]
        _ => {
            let _ = params;
            Err(Error::DriverNotAvailable(kind.feature_name()))
        }
    }
}
