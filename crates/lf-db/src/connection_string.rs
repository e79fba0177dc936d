//! Connection string parsing for SQL Server targets.
//!
//! Two formats are accepted:
//! - the semicolon-separated `SERVER=..;PORT=..;DATABASE=..;UID=..;PWD=..`
//!   form with upper-case keys (unknown keys are ignored), and
//! - anything else, which is handed to the driver as an ADO.NET string.

use crate::error::{DbError, DbResult};

/// Default SQL Server TCP port
pub const DEFAULT_PORT: u16 = 1433;

/// Settings parsed from a semicolon-separated connection string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// A connection string after format detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionString {
    Settings(ConnectionSettings),
    Ado(String),
}

impl ConnectionString {
    /// Detect the format of `s` and parse it.
    pub fn parse(s: &str) -> DbResult<Self> {
        if s.trim().is_empty() {
            return Err(DbError::InvalidConnectionString(
                "connection string is empty".to_string(),
            ));
        }
        let settings = parse_settings(s)?;
        if settings.server.is_some() {
            Ok(ConnectionString::Settings(settings))
        } else {
            Ok(ConnectionString::Ado(s.to_string()))
        }
    }
}

fn parse_settings(s: &str) -> DbResult<ConnectionSettings> {
    let mut settings = ConnectionSettings::default();

    for pair in s.split(';') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key.trim() {
            "SERVER" => settings.server = Some(value.to_string()),
            "PORT" => {
                let port = value.trim().parse::<u16>().map_err(|_| {
                    DbError::InvalidConnectionString(format!("invalid PORT '{}'", value))
                })?;
                settings.port = Some(port);
            }
            "DATABASE" => settings.database = Some(value.to_string()),
            "UID" => settings.user = Some(value.to_string()),
            "PWD" => settings.password = Some(value.to_string()),
            // Accepted for compatibility and ignored: the driver negotiates
            // the protocol version itself.
            "TDS_VERSION" => {}
            _ => {}
        }
    }
    Ok(settings)
}
