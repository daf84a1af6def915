//! Uniform connections over heterogeneous SQL backends.
//!
//! One [`Backend`] contract covers an embedded SQLite file, SQL Server
//! behind the ODBC driver manager (raw or engine-pooled), and a direct
//! PostgreSQL client. Callers build a variant from [`ConnectParams`], hand
//! it to [`with_session`], and run statements through the session's cursor;
//! the session commits when the closure succeeds, rolls back when it fails,
//! and always closes.
//!
//! ```no_run
//! use manifold::{
//!     create_backend, with_session, Backend, BackendKind, ConnectParams, ExecutionSurface,
//! };
//!
//! fn main() -> manifold::Result<()> {
//!     let mut db = create_backend(BackendKind::Sqlite, ConnectParams::new("orders.db"))?;
//!     let next = with_session(db.as_mut(), |db| {
//!         let query = db.max_id("orders", "id")?;
//!         db.cursor()?.query_scalar(&query)
//!     })?;
//!     println!("next free id: {next:?}");
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod backends;
pub mod config;
pub mod dialect;
pub mod error;
pub mod session;
pub mod surface;

pub use backend::{create_backend, Backend};
pub use config::{BackendKind, ConnectParams, Identity};
pub use error::{Error, Result};
pub use session::with_session;
pub use surface::ExecutionSurface;

#[cfg(feature = "sqlite")]
pub use backends::sqlite::SqliteBackend;

#[cfg(feature = "odbc")]
pub use backends::odbc::OdbcBackend;

#[cfg(feature = "pooled")]
pub use backends::pooled::PooledBackend;

#[cfg(feature = "postgres")]
pub use backends::postgres::PostgresBackend;
