//! The execution surface a live session hands out.

use crate::error::Result;

/// Uniform statement-execution contract over one live session.
///
/// Every backend's session type implements this, so callers can run SQL
/// without knowing which engine sits underneath. Results come back as text:
/// each driver renders its native values to strings, and a missing value
/// (SQL NULL, or a scalar query that matched no rows) is `None` rather than
/// an error.
pub trait ExecutionSurface {
    /// Run a statement that produces no rows. Returns the affected-row
    /// count where the driver reports one, 0 otherwise.
    fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Run a query and return the first column of the first row.
    ///
    /// `None` means the query matched no rows or the value was NULL; the
    /// two are deliberately not distinguished.
    fn query_scalar(&mut self, sql: &str) -> Result<Option<String>>;

    /// Run a query and return the first column of every row, in arrival
    /// order.
    fn query_column(&mut self, sql: &str) -> Result<Vec<Option<String>>>;
}
