use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported backend variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Embedded file engine (rusqlite).
    Sqlite,
    /// SQL Server routed through the ODBC driver manager.
    Odbc,
    /// SQL Server sessions drawn from an r2d2 engine of ODBC connections.
    Pooled,
    /// Direct PostgreSQL client, no driver-manager indirection.
    Postgres,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "SQLite",
            BackendKind::Odbc => "ODBC",
            BackendKind::Pooled => "pooled ODBC",
            BackendKind::Postgres => "PostgreSQL",
        }
    }

    /// Port dialed when the parameters carry none. The embedded file engine
    /// has no notion of a port.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            BackendKind::Sqlite => None,
            BackendKind::Odbc => Some(1433),
            BackendKind::Pooled => Some(1433),
            BackendKind::Postgres => Some(5432),
        }
    }

    /// Whether the backing driver was compiled in.
    pub fn is_available(&self) -> bool {
        match self {
            BackendKind::Sqlite => cfg!(feature = "sqlite"),
            BackendKind::Odbc => cfg!(feature = "odbc"),
            BackendKind::Pooled => cfg!(feature = "pooled"),
            BackendKind::Postgres => cfg!(feature = "postgres"),
        }
    }

    /// Name of the cargo feature gating this backend.
    pub fn feature_name(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Odbc => "odbc",
            BackendKind::Pooled => "pooled",
            BackendKind::Postgres => "postgres",
        }
    }

    pub fn all() -> &'static [BackendKind] {
        &[
            BackendKind::Sqlite,
            BackendKind::Odbc,
            BackendKind::Pooled,
            BackendKind::Postgres,
        ]
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a server variant authenticates.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identity {
    /// Ambient/integrated authentication; no explicit credentials carried.
    Trusted,
    /// Explicit user, with an optional password.
    Credentialed {
        user: String,
        password: Option<String>,
    },
}

impl Identity {
    pub fn credentialed(user: impl Into<String>, password: Option<String>) -> Self {
        Identity::Credentialed {
            user: user.into(),
            password,
        }
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self, Identity::Trusted)
    }
}

impl Default for Identity {
    fn default() -> Self {
        Identity::Trusted
    }
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Trusted => f.write_str("Trusted"),
            Identity::Credentialed { user, password } => f
                .debug_struct("Credentialed")
                .field("user", user)
                .field("password", &password.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Trusted => f.write_str("trusted"),
            Identity::Credentialed { user, .. } => f.write_str(user),
        }
    }
}

/// Connection parameters shared by every backend variant.
///
/// `database` names the target database, or the filesystem path for the
/// embedded backend. Fields a backend does not use are ignored by it; fields
/// a backend requires (e.g. `host` on server variants) are validated by the
/// variant's constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectParams {
    pub database: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub identity: Identity,
    /// Backend-specific primary-key hint; stored for callers, not consumed
    /// by the core operations.
    pub primary_key: Option<String>,
}

impl ConnectParams {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            host: None,
            port: None,
            identity: Identity::Trusted,
            primary_key: None,
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    pub fn primary_key(mut self, attr: impl Into<String>) -> Self {
        self.primary_key = Some(attr.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_shows_the_password() {
        let identity = Identity::credentialed("svc", Some("hunter2".into()));
        let rendered = format!("{:?}", identity);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("svc"));
    }

    #[test]
    fn display_shows_user_or_trusted() {
        assert_eq!(Identity::Trusted.to_string(), "trusted");
        assert_eq!(Identity::credentialed("svc", None).to_string(), "svc");
    }

    #[test]
    fn params_default_to_trusted_identity() {
        let params = ConnectParams::new("sales");
        assert!(params.identity.is_trusted());
        assert_eq!(params.port, None);
    }

    #[test]
    fn primary_key_hint_is_carried_verbatim() {
        let params = ConnectParams::new("sales").primary_key("id");
        assert_eq!(params.primary_key.as_deref(), Some("id"));
    }

    #[test]
    fn server_kinds_carry_their_default_ports() {
        assert_eq!(BackendKind::Sqlite.default_port(), None);
        assert_eq!(BackendKind::Odbc.default_port(), Some(1433));
        assert_eq!(BackendKind::Pooled.default_port(), Some(1433));
        assert_eq!(BackendKind::Postgres.default_port(), Some(5432));
    }

    #[test]
    fn params_survive_a_serde_round_trip() {
        let params = ConnectParams::new("sales")
            .host("db.internal")
            .port(1433)
            .identity(Identity::credentialed("svc", Some("hunter2".into())))
            .primary_key("id");
        let json = serde_json::to_string(&params).unwrap();
        let back: ConnectParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);

        let kind = serde_json::to_string(&BackendKind::Pooled).unwrap();
        let back: BackendKind = serde_json::from_str(&kind).unwrap();
        assert_eq!(back, BackendKind::Pooled);
    }
}
