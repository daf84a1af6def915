//! Backend variant implementations
//! Each variant is conditionally compiled based on features

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "odbc")]
pub mod odbc;

#[cfg(feature = "pooled")]
pub mod pooled;

#[cfg(feature = "postgres")]
pub mod postgres;
