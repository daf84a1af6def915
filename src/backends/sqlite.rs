//! SQLite backend implementation

use std::fmt;

use rusqlite::types::ValueRef;

use crate::backend::Backend;
use crate::config::{BackendKind, ConnectParams};
use crate::dialect;
use crate::error::{Error, Result};
use crate::surface::ExecutionSurface;

/// Embedded file-engine backend.
///
/// `database` in the parameters is a filesystem path; connecting creates the
/// file when it does not exist yet. Commit and rollback act on a transaction
/// the caller began through the cursor and stay out of the way in autocommit
/// mode.
pub struct SqliteBackend {
    params: ConnectParams,
    session: Option<rusqlite::Connection>,
}

impl SqliteBackend {
    pub fn new(params: ConnectParams) -> Result<Self> {
        if params.database.is_empty() {
            return Err(Error::Config(
                "the embedded backend needs a database path".into(),
            ));
        }
        Ok(Self {
            params,
            session: None,
        })
    }

    fn live(&mut self) -> Result<&mut rusqlite::Connection> {
        self.session.as_mut().ok_or(Error::NotConnected)
    }
}

impl fmt::Display for SqliteBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SQLite db {}", self.params.database)
    }
}

impl Backend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(Error::State("connect on a live session"));
        }
        let session = rusqlite::Connection::open(&self.params.database)
            .map_err(|e| Error::Connection(e.to_string()))?;
        self.session = Some(session);
        Ok(())
    }

    fn cursor(&mut self) -> Result<&mut dyn ExecutionSurface> {
        let session = self.live()?;
        Ok(session)
    }

    fn commit(&mut self) -> Result<()> {
        let session = self.live()?;
        if !session.is_autocommit() {
            session.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        let session = self.live()?;
        if !session.is_autocommit() {
            session.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => session.close().map_err(|(session, err)| {
                // The engine refused to let go; the session is still live.
                self.session = Some(session);
                Error::from(err)
            }),
            None => Ok(()),
        }
    }

    fn list_tablenames(&mut self) -> Result<Vec<String>> {
        let query = dialect::sqlite::table_names();
        log::debug!("{query}");
        let session = self.live()?;
        let mut stmt = session.prepare(query)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>("name"))?;
        let names = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    fn list_attrs(&mut self, table: &str) -> Result<Vec<String>> {
        let query = dialect::sqlite::column_info(table);
        log::debug!("{query}");
        let session = self.live()?;
        let mut stmt = session.prepare(&query)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>("name"))?;
        let names = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    fn max_id(&self, table: &str, attr: &str) -> Result<String> {
        Ok(dialect::sqlite::next_id(table, attr))
    }
}

/// Render one engine value as text. NULL is absence, everything else is the
/// value's textual form.
fn text_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(n) => Some(n.to_string()),
        ValueRef::Real(n) => Some(n.to_string()),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
    }
}

impl ExecutionSurface for rusqlite::Connection {
    fn execute(&mut self, sql: &str) -> Result<u64> {
        let affected = rusqlite::Connection::execute(self, sql, [])?;
        Ok(affected as u64)
    }

    fn query_scalar(&mut self, sql: &str) -> Result<Option<String>> {
        let mut stmt = self.prepare(sql)?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(text_value(row.get_ref(0)?)),
            None => Ok(None),
        }
    }

    fn query_column(&mut self, sql: &str) -> Result<Vec<Option<String>>> {
        let mut stmt = self.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            values.push(text_value(row.get_ref(0)?));
        }
        Ok(values)
    }
}
