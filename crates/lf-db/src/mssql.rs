//! SQL Server database backend (tiberius over tokio TCP)

use crate::connection_string::{ConnectionString, DEFAULT_PORT};
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::traits::{Connector, Database};
use crate::value::SqlValue;
use async_trait::async_trait;
use lf_core::HistoryRecord;
use tiberius::{AuthMethod, Client, Config, Query, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

type TdsClient = Client<Compat<TcpStream>>;

/// SQL Server database backend
pub struct MssqlBackend {
    client: Option<TdsClient>,
}

impl MssqlBackend {
    /// Open and authenticate a connection described by `connection_string`
    pub async fn connect(connection_string: &str) -> DbResult<Self> {
        let config = build_config(&ConnectionString::parse(connection_string)?)?;

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        tcp.set_nodelay(true)
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            client: Some(client),
        })
    }

    fn client(&mut self) -> DbResult<&mut TdsClient> {
        self.client.as_mut().ok_or(DbError::Closed)
    }

    async fn transaction_control(&mut self, action: &'static str, sql: &str) -> DbResult<()> {
        let client = self.client()?;
        let result = match client.simple_query(sql).await {
            Ok(stream) => stream.into_results().await.map(|_| ()),
            Err(e) => Err(e),
        };
        result.map_err(|e| DbError::TransactionError {
            action,
            message: e.to_string(),
        })
    }
}

fn build_config(connection: &ConnectionString) -> DbResult<Config> {
    match connection {
        ConnectionString::Ado(s) => {
            Config::from_ado_string(s).map_err(|e| DbError::InvalidConnectionString(e.to_string()))
        }
        ConnectionString::Settings(settings) => {
            let mut config = Config::new();
            if let Some(server) = &settings.server {
                config.host(server);
            }
            config.port(settings.port.unwrap_or(DEFAULT_PORT));
            if let Some(database) = &settings.database {
                config.database(database);
            }
            if let (Some(user), Some(password)) = (&settings.user, &settings.password) {
                config.authentication(AuthMethod::sql_server(user, password));
            }
            config.trust_cert();
            Ok(config)
        }
    }
}

fn bind_params<'a>(sql: &'a str, params: &[SqlValue]) -> Query<'a> {
    let mut query = Query::new(sql);
    for param in params {
        match param {
            SqlValue::Null => query.bind(Option::<String>::None),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Timestamp(ts) => query.bind(*ts),
        }
    }
    query
}

fn to_history_record(row: &Row) -> DbResult<HistoryRecord> {
    Ok(HistoryRecord {
        id: i64::from(row.try_get::<i32, _>(0)?.unwrap_or_default()),
        filename: row.try_get::<&str, _>(1)?.unwrap_or_default().to_string(),
        fingerprint: row.try_get::<&str, _>(2)?.unwrap_or_default().to_string(),
        executed_at: row.try_get::<chrono::NaiveDateTime, _>(3)?,
        duration_millis: i64::from(row.try_get::<i32, _>(4)?.unwrap_or_default()),
    })
}

#[async_trait]
impl Database for MssqlBackend {
    async fn execute(&mut self, sql: &str) -> DbResult<()> {
        let client = self.client()?;
        let result = match client.simple_query(sql).await {
            Ok(stream) => stream.into_results().await.map(|_| ()),
            Err(e) => Err(e),
        };
        result.map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    async fn execute_with(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
        let client = self.client()?;
        let result = bind_params(sql, params)
            .execute(client)
            .await
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))?;
        Ok(result.total())
    }

    async fn query_history(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> DbResult<Vec<HistoryRecord>> {
        let client = self.client()?;
        let rows = bind_params(sql, params)
            .query(client)
            .await?
            .into_first_result()
            .await?;
        rows.iter().map(to_history_record).collect()
    }

    async fn relation_exists(&mut self, name: &str) -> DbResult<bool> {
        let client = self.client()?;
        let row = bind_params(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME = @P1",
            &[SqlValue::from(name)],
        )
        .query(client)
        .await?
        .into_row()
        .await?;

        let count = match row {
            Some(row) => row.try_get::<i32, _>(0)?.unwrap_or_default(),
            None => 0,
        };
        Ok(count > 0)
    }

    async fn begin(&mut self) -> DbResult<()> {
        self.transaction_control("begin", "BEGIN TRAN").await
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.transaction_control("commit", "COMMIT TRAN").await
    }

    async fn rollback(&mut self) -> DbResult<()> {
        self.transaction_control("rollback", "ROLLBACK TRAN").await
    }

    async fn close(&mut self) -> DbResult<()> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        }
        Ok(())
    }

    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn db_type(&self) -> &'static str {
        "sqlserver"
    }
}

/// Opens SQL Server connections from a connection string
#[derive(Debug, Clone)]
pub struct MssqlConnector {
    connection_string: String,
}

impl MssqlConnector {
    /// Validate the connection string up front and build a connector
    pub fn new(connection_string: impl Into<String>) -> DbResult<Self> {
        let connection_string = connection_string.into();
        build_config(&ConnectionString::parse(&connection_string)?)?;
        Ok(Self { connection_string })
    }
}

#[async_trait]
impl Connector for MssqlConnector {
    async fn connect(&self) -> DbResult<Box<dyn Database>> {
        Ok(Box::new(MssqlBackend::connect(&self.connection_string).await?))
    }
}
