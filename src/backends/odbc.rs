//! ODBC-routed SQL Server backend implementation

use std::fmt;

use odbc_api::{ConnectionOptions, Cursor, Environment};
use once_cell::sync::Lazy;

use crate::backend::Backend;
use crate::config::{BackendKind, ConnectParams, Identity};
use crate::dialect;
use crate::error::{Error, Result};
use crate::surface::ExecutionSurface;

static ENVIRONMENT: Lazy<std::result::Result<Environment, odbc_api::Error>> =
    Lazy::new(Environment::new);

/// The process-wide driver-manager environment. Building it can fail when no
/// driver manager is installed; that failure is replayed to every caller.
pub(crate) fn environment() -> Result<&'static Environment> {
    match &*ENVIRONMENT {
        Ok(env) => Ok(env),
        Err(err) => Err(Error::Connection(format!(
            "ODBC environment unavailable: {err}"
        ))),
    }
}

/// Run `sql` and collect the first column of every row as text. Shared with
/// the engine-pooled variant, whose metadata queries are identical.
pub(crate) fn query_names(session: &odbc_api::Connection<'_>, sql: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    if let Some(mut cursor) = session.execute(sql, ())? {
        let mut buf = Vec::new();
        while let Some(mut row) = cursor.next_row()? {
            buf.clear();
            row.get_text(1, &mut buf)?;
            names.push(String::from_utf8_lossy(&buf).into_owned());
        }
    }
    Ok(names)
}

/// SQL Server backend routed through the ODBC driver manager.
///
/// This route exists to carry explicit credentials; a trusted identity is
/// rejected at connect time. The server field of the assembled string names
/// the host without a port.
pub struct OdbcBackend {
    params: ConnectParams,
    host: String,
    session: Option<odbc_api::Connection<'static>>,
}

impl OdbcBackend {
    pub fn new(params: ConnectParams) -> Result<Self> {
        let Some(host) = params.host.clone() else {
            return Err(Error::Config("ODBC connections need a server host".into()));
        };
        Ok(Self {
            params,
            host,
            session: None,
        })
    }

    fn live(&mut self) -> Result<&mut odbc_api::Connection<'static>> {
        self.session.as_mut().ok_or(Error::NotConnected)
    }
}

impl fmt::Display for OdbcBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ODBC db {} connected using {}@{}",
            self.params.database, self.params.identity, self.host
        )
    }
}

impl Backend for OdbcBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Odbc
    }

    fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(Error::State("connect on a live session"));
        }
        let Identity::Credentialed { user, password } = &self.params.identity else {
            return Err(Error::Connection(
                "the ODBC route carries explicit credentials; a trusted identity has none".into(),
            ));
        };
        let cnxn = dialect::odbc::routed_connection_string(
            &self.host,
            &self.params.database,
            user,
            password.as_deref(),
        );
        let session = environment()?
            .connect_with_connection_string(&cnxn, ConnectionOptions::default())
            .map_err(|e| Error::Connection(e.to_string()))?;
        self.session = Some(session);
        Ok(())
    }

    fn cursor(&mut self) -> Result<&mut dyn ExecutionSurface> {
        let session = self.live()?;
        Ok(session)
    }

    fn commit(&mut self) -> Result<()> {
        self.live()?.commit()?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.live()?.rollback()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        // Dropping the connection disconnects; the driver manager offers no
        // separate close worth surfacing.
        self.session = None;
        Ok(())
    }

    fn list_tablenames(&mut self) -> Result<Vec<String>> {
        let query = dialect::mssql::table_names();
        log::debug!("{query}");
        let session = self.live()?;
        query_names(session, query)
    }

    fn list_attrs(&mut self, table: &str) -> Result<Vec<String>> {
        let query = dialect::mssql::column_info(table);
        log::debug!("{query}");
        let session = self.live()?;
        query_names(session, &query)
    }

    fn max_id(&self, table: &str, attr: &str) -> Result<String> {
        Ok(dialect::mssql::next_id(table, attr))
    }
}

impl ExecutionSurface for odbc_api::Connection<'static> {
    fn execute(&mut self, sql: &str) -> Result<u64> {
        let mut stmt = self.preallocate()?;
        if let Some(cursor) = stmt.execute(sql, ())? {
            drop(cursor);
        }
        let affected = stmt.row_count()?.unwrap_or(0);
        Ok(affected as u64)
    }

    fn query_scalar(&mut self, sql: &str) -> Result<Option<String>> {
        let Some(mut cursor) = odbc_api::Connection::execute(self, sql, ())? else {
            return Ok(None);
        };
        let Some(mut row) = cursor.next_row()? else {
            return Ok(None);
        };
        let mut buf = Vec::new();
        if row.get_text(1, &mut buf)? {
            Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
        } else {
            Ok(None)
        }
    }

    fn query_column(&mut self, sql: &str) -> Result<Vec<Option<String>>> {
        let mut values = Vec::new();
        if let Some(mut cursor) = odbc_api::Connection::execute(self, sql, ())? {
            let mut buf = Vec::new();
            while let Some(mut row) = cursor.next_row()? {
                buf.clear();
                if row.get_text(1, &mut buf)? {
                    values.push(Some(String::from_utf8_lossy(&buf).into_owned()));
                } else {
                    values.push(None);
                }
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentialed_params() -> ConnectParams {
        ConnectParams::new("sales")
            .host("db.internal")
            .identity(Identity::credentialed("svc", Some("hunter2".into())))
    }

    #[test]
    fn new_requires_a_host() {
        assert!(matches!(
            OdbcBackend::new(ConnectParams::new("sales")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn trusted_identity_is_rejected_at_connect() {
        let mut backend =
            OdbcBackend::new(ConnectParams::new("sales").host("db.internal")).unwrap();
        assert!(matches!(backend.connect(), Err(Error::Connection(_))));
    }

    #[test]
    fn operations_before_connect_are_not_connected() {
        let mut backend = OdbcBackend::new(credentialed_params()).unwrap();
        assert!(matches!(backend.cursor(), Err(Error::NotConnected)));
        assert!(matches!(backend.commit(), Err(Error::NotConnected)));
        assert!(matches!(
            backend.list_tablenames(),
            Err(Error::NotConnected)
        ));
    }

    #[test]
    fn close_without_a_session_is_a_noop() {
        let mut backend = OdbcBackend::new(credentialed_params()).unwrap();
        backend.close().unwrap();
        backend.close().unwrap();
    }

    #[test]
    fn max_id_text_is_null_safe() {
        let backend = OdbcBackend::new(credentialed_params()).unwrap();
        assert_eq!(
            backend.max_id("orders", "id").unwrap(),
            "SELECT ISNULL(MAX(id) + 1, 1) FROM [orders]"
        );
    }

    #[test]
    fn display_never_shows_the_password() {
        let backend = OdbcBackend::new(credentialed_params()).unwrap();
        let rendered = backend.to_string();
        assert_eq!(rendered, "ODBC db sales connected using svc@db.internal");
        assert!(!rendered.contains("hunter2"));
    }
}
