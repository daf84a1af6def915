//! Per-backend dialect profiles.
//!
//! A dialect profile is the fixed set of rules one backend family needs:
//! metadata-query templates (table listing, column listing, next-available-id
//! text) and, for the driver-manager routes, connection-string assembly.
//! Everything here is pure string work; executing the produced text is the
//! backend's (or the caller's) business.

/// Rules for the embedded file engine.
pub mod sqlite {
    /// All user tables, from the engine's master catalog.
    pub fn table_names() -> &'static str {
        "SELECT name FROM sqlite_master WHERE type = 'table'"
    }

    /// Table-introspection pragma for one table; one row per column, in
    /// declaration order.
    pub fn column_info(table: &str) -> String {
        format!("PRAGMA table_info([{table}])")
    }

    /// Next-available-id text. `MAX` over an empty table is NULL, so the
    /// whole expression degenerates to NULL there; callers see an absent
    /// scalar, not an error.
    pub fn next_id(table: &str, attr: &str) -> String {
        format!("SELECT MAX({attr}) + 1 FROM [{table}]")
    }
}

/// Rules shared by both SQL Server routes (raw ODBC and engine-pooled).
pub mod mssql {
    pub fn table_names() -> &'static str {
        "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES"
    }

    pub fn column_info(table: &str) -> String {
        format!("SELECT COLUMN_NAME FROM INFORMATION_SCHEMA.COLUMNS WHERE TABLE_NAME = '{table}'")
    }

    /// Null-safe next-available-id text: defaults to 1 on an empty table,
    /// unlike the embedded engine's NULL.
    pub fn next_id(table: &str, attr: &str) -> String {
        format!("SELECT ISNULL(MAX({attr}) + 1, 1) FROM [{table}]")
    }
}

/// Connection-string assembly for the driver-manager routes.
pub mod odbc {
    use crate::config::Identity;

    /// Fixed driver identifier both routes hand to the driver manager.
    pub const DRIVER: &str = "ODBC Driver 18 for SQL Server";

    /// String for the raw driver-manager route: credentials are always
    /// embedded (the variant exists to carry them) and the server field has
    /// no port.
    pub fn routed_connection_string(
        host: &str,
        database: &str,
        user: &str,
        password: Option<&str>,
    ) -> String {
        let mut cnxn = format!(
            "Driver={{{DRIVER}}};Server={host};Database={database};Encrypt=no;UID={user};"
        );
        if let Some(password) = password {
            cnxn.push_str(&format!("PWD={password};"));
        }
        cnxn
    }

    /// String for the engine-pooled route: the server field carries the
    /// port, and the credential tail branches on the identity. Trusted gets
    /// the integrated-authentication flag and no UID/PWD; credentialed gets
    /// UID and, only when a password is present, PWD.
    pub fn engine_connection_string(
        host: &str,
        port: u16,
        database: &str,
        identity: &Identity,
    ) -> String {
        let mut cnxn =
            format!("Driver={{{DRIVER}}};Server={host},{port};Database={database};Encrypt=no;");
        match identity {
            Identity::Trusted => cnxn.push_str("Trusted_Connection=yes;"),
            Identity::Credentialed { user, password } => {
                cnxn.push_str(&format!("UID={user};"));
                if let Some(password) = password {
                    cnxn.push_str(&format!("PWD={password};"));
                }
            }
        }
        cnxn
    }
}
