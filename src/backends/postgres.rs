//! PostgreSQL backend implementation

use std::fmt;

use crate::backend::Backend;
use crate::config::{BackendKind, ConnectParams, Identity};
use crate::error::{Error, Result};
use crate::surface::ExecutionSurface;

/// Direct-credential PostgreSQL backend, no driver-manager indirection.
///
/// Sessions are opened with `NoTls`; this route speaks to unencrypted
/// internal servers. The introspection operations are not implemented here
/// and report themselves as unsupported.
pub struct PostgresBackend {
    params: ConnectParams,
    host: String,
    port: u16,
    session: Option<postgres::Client>,
}

impl PostgresBackend {
    pub fn new(params: ConnectParams) -> Result<Self> {
        let Some(host) = params.host.clone() else {
            return Err(Error::Config(
                "PostgreSQL connections need a server host".into(),
            ));
        };
        let Some(port) = params.port.or(BackendKind::Postgres.default_port()) else {
            return Err(Error::Config(
                "PostgreSQL connections need a server port".into(),
            ));
        };
        Ok(Self {
            params,
            host,
            port,
            session: None,
        })
    }

    fn live(&mut self) -> Result<&mut postgres::Client> {
        self.session.as_mut().ok_or(Error::NotConnected)
    }
}

impl fmt::Display for PostgresBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PostgreSQL db {} connected using {}@{}",
            self.params.database, self.params.identity, self.host
        )
    }
}

impl Backend for PostgresBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(Error::State("connect on a live session"));
        }
        let Identity::Credentialed { user, password } = &self.params.identity else {
            return Err(Error::Connection(
                "PostgreSQL connections are direct-credential; a trusted identity has none".into(),
            ));
        };
        let mut config = postgres::Client::configure();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.params.database)
            .user(user);
        if let Some(password) = password {
            config.password(password);
        }
        let session = config
            .connect(postgres::NoTls)
            .map_err(|e| Error::Connection(e.to_string()))?;
        self.session = Some(session);
        Ok(())
    }

    fn cursor(&mut self) -> Result<&mut dyn ExecutionSurface> {
        let session = self.live()?;
        Ok(session)
    }

    fn commit(&mut self) -> Result<()> {
        self.live()?.batch_execute("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.live()?.batch_execute("ROLLBACK")?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => {
                session.close()?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl ExecutionSurface for postgres::Client {
    fn execute(&mut self, sql: &str) -> Result<u64> {
        let mut affected = 0;
        for message in self.simple_query(sql)? {
            if let postgres::SimpleQueryMessage::CommandComplete(count) = message {
                affected = count;
            }
        }
        Ok(affected)
    }

    fn query_scalar(&mut self, sql: &str) -> Result<Option<String>> {
        for message in self.simple_query(sql)? {
            if let postgres::SimpleQueryMessage::Row(row) = message {
                return Ok(row.try_get(0)?.map(str::to_owned));
            }
        }
        Ok(None)
    }

    fn query_column(&mut self, sql: &str) -> Result<Vec<Option<String>>> {
        let mut values = Vec::new();
        for message in self.simple_query(sql)? {
            if let postgres::SimpleQueryMessage::Row(row) = message {
                values.push(row.try_get(0)?.map(str::to_owned));
            }
        }
        Ok(values)
    }
}
