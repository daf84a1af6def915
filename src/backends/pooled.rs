//! Engine-pooled SQL Server backend implementation

use std::fmt;

use odbc_api::ConnectionOptions;
use once_cell::sync::OnceCell;
use r2d2::{ManageConnection, Pool, PooledConnection};

use crate::backend::Backend;
use crate::backends::odbc::{environment, query_names};
use crate::config::{BackendKind, ConnectParams};
use crate::dialect;
use crate::error::{Error, Result};
use crate::surface::ExecutionSurface;

/// Sessions the engine keeps at most.
const DEFAULT_POOL_SIZE: u32 = 5;

/// r2d2 adapter producing driver-manager connections from one fixed string.
pub struct OdbcConnectionManager {
    cnxn: String,
}

impl OdbcConnectionManager {
    fn new(cnxn: String) -> Self {
        Self { cnxn }
    }
}

impl ManageConnection for OdbcConnectionManager {
    // The raw driver-manager connection is not Send; it crosses into the
    // engine's worker threads only inside the promoted wrapper below.
    type Connection = force_send_sync::Send<odbc_api::Connection<'static>>;
    type Error = Error;

    fn connect(&self) -> Result<Self::Connection> {
        let session = environment()?
            .connect_with_connection_string(&self.cnxn, ConnectionOptions::default())?;
        // SAFETY: ODBC requires drivers to support a connection handle
        // moving between threads. The engine dials sessions on its worker
        // threads and hands each one to a single borrower, so a handle is
        // never used from two threads at once.
        Ok(unsafe { session.promote_to_send() })
    }

    fn is_valid(&self, session: &mut Self::Connection) -> Result<()> {
        if session.is_dead()? {
            return Err(Error::Connection("pooled session went dead".into()));
        }
        Ok(())
    }

    fn has_broken(&self, session: &mut Self::Connection) -> bool {
        session.is_dead().unwrap_or(true)
    }
}

/// SQL Server backend drawing sessions from a connection-pool engine.
///
/// The engine is built on first connect from one assembled string (server
/// field carries the port, credential tail branches on the identity) and
/// lives until the variant is dropped. Connecting draws a session from the
/// engine; closing returns it. The engine manages transactions itself, so
/// commit and rollback are deliberate no-ops on this route.
pub struct PooledBackend {
    params: ConnectParams,
    host: String,
    port: u16,
    engine: OnceCell<Pool<OdbcConnectionManager>>,
    session: Option<PooledConnection<OdbcConnectionManager>>,
}

impl PooledBackend {
    pub fn new(params: ConnectParams) -> Result<Self> {
        let Some(host) = params.host.clone() else {
            return Err(Error::Config(
                "pooled ODBC connections need a server host".into(),
            ));
        };
        let Some(port) = params.port.or(BackendKind::Pooled.default_port()) else {
            return Err(Error::Config(
                "pooled ODBC connections need a server port".into(),
            ));
        };
        Ok(Self {
            params,
            host,
            port,
            engine: OnceCell::new(),
            session: None,
        })
    }

    fn engine(&self) -> Result<&Pool<OdbcConnectionManager>> {
        self.engine.get_or_try_init(|| {
            let cnxn = dialect::odbc::engine_connection_string(
                &self.host,
                self.port,
                &self.params.database,
                &self.params.identity,
            );
            Pool::builder()
                .max_size(DEFAULT_POOL_SIZE)
                .build(OdbcConnectionManager::new(cnxn))
                .map_err(|err| Error::Connection(format!("engine construction failed: {err}")))
        })
    }

    fn live(&mut self) -> Result<&mut odbc_api::Connection<'static>> {
        match self.session.as_mut() {
            Some(session) => Ok(&mut ***session),
            None => Err(Error::NotConnected),
        }
    }
}

impl fmt::Display for PooledBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pooled ODBC db {} connected using {}@{}",
            self.params.database, self.params.identity, self.host
        )
    }
}

impl Backend for PooledBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Pooled
    }

    fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(Error::State("connect on a live session"));
        }
        let session = self
            .engine()?
            .get()
            .map_err(|err| Error::Connection(format!("no session available: {err}")))?;
        self.session = Some(session);
        Ok(())
    }

    fn cursor(&mut self) -> Result<&mut dyn ExecutionSurface> {
        let session = self.live()?;
        Ok(session)
    }

    fn commit(&mut self) -> Result<()> {
        self.live()?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.live()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        // Dropping the session returns it to the engine.
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
