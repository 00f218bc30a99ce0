use crate::StoreConfig;
use silo_core::{Error, Executor, Result, RowLabeled, RowNames, RowsAffected, Value, truncate_long};
use std::future::Future;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

/// How a driver-level failure should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    /// Uniqueness or foreign-key violation: propagate, never retry.
    Integrity,
    /// Syntax error or unknown column: a query-synthesis bug.
    Schema,
    /// Value does not fit the column type: a schema bug.
    Mismatch,
    /// The store actively refused the connection.
    Refused,
    /// Unclassified; worth one reconnect attempt.
    Other,
}

fn classify_code(code: &SqlState) -> Failure {
    if *code == SqlState::UNIQUE_VIOLATION || *code == SqlState::FOREIGN_KEY_VIOLATION {
        Failure::Integrity
    } else if *code == SqlState::SYNTAX_ERROR || *code == SqlState::UNDEFINED_COLUMN {
        Failure::Schema
    } else if *code == SqlState::DATATYPE_MISMATCH {
        Failure::Mismatch
    } else {
        Failure::Other
    }
}

fn connection_refused(error: &tokio_postgres::Error) -> bool {
    let mut source = std::error::Error::source(error);
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = current.source();
    }
    false
}

fn classify(error: &tokio_postgres::Error) -> Failure {
    if let Some(code) = error.code() {
        return classify_code(code);
    }
    if connection_refused(error) {
        Failure::Refused
    } else {
        Failure::Other
    }
}

/// Removes semicolons from the statement text, a crude single-statement
/// guard.
fn sanitize(sql: &str) -> String {
    sql.replace(';', "")
}

fn default_notify(message: &str) {
    eprintln!("{}", message);
}

/// The connection-resilience wrapper: owns one lazily-established client
/// and runs synthesized statements over the simple query protocol, so every
/// result column comes back in its text form.
///
/// Unclassified failures drop the client and retry the statement exactly
/// once; there is no backoff and no timeout.
pub struct PostgresConnection {
    config: StoreConfig,
    client: Option<Client>,
    notify: fn(&str),
}

impl PostgresConnection {
    /// No connection is established until the first statement runs.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            client: None,
            notify: default_notify,
        }
    }

    /// Replaces the operator-notification sink (defaults to stderr).
    pub fn with_notify(mut self, notify: fn(&str)) -> Self {
        self.notify = notify;
        self
    }

    async fn query_once(
        &mut self,
        sql: &str,
    ) -> core::result::Result<(Vec<RowLabeled>, u64), tokio_postgres::Error> {
        if self.client.is_none() {
            let (client, connection) = self.config.pg_config().connect(NoTls).await?;
            tokio::spawn(async move {
                if let Err(error) = connection.await {
                    if !error.is_closed() {
                        log::error!("postgres connection error: {}", error);
                    }
                }
            });
            self.client = Some(client);
        }
        let Some(client) = &self.client else {
            unreachable!("connection was just established");
        };
        let messages = client.simple_query(sql).await?;
        let mut rows = Vec::new();
        let mut affected = 0;
        for message in messages {
            match message {
                SimpleQueryMessage::Row(row) => {
                    let labels: RowNames = row
                        .columns()
                        .iter()
                        .map(|column| column.name().to_string())
                        .collect::<Vec<_>>()
                        .into();
                    let values = (0..row.len())
                        .map(|i| match row.get(i) {
                            Some(text) => Value::Varchar(Some(text.into())),
                            None => Value::Null,
                        })
                        .collect::<Vec<_>>();
                    rows.push(RowLabeled::new(labels, values.into()));
                }
                SimpleQueryMessage::CommandComplete(count) => affected += count,
                _ => {}
            }
        }
        Ok((rows, affected))
    }

    /// Runs one statement through the classification and retry policy.
    pub async fn run(&mut self, sql: &str) -> Result<(Vec<RowLabeled>, u64)> {
        let sql = sanitize(sql);
        let mut retried = false;
        loop {
            let error = match self.query_once(&sql).await {
                Ok(out) => return Ok(out),
                Err(error) => error,
            };
            match classify(&error) {
                Failure::Integrity => return Err(Error::IntegrityViolation(error.to_string())),
                Failure::Schema => {
                    log::warn!("querying the store: {}: {}", truncate_long(&sql), error);
                    return Err(Error::Schema(error.to_string()));
                }
                Failure::Mismatch => {
                    log::error!("querying the store: {}: {}", truncate_long(&sql), error);
                    return Err(Error::Schema(error.to_string()));
                }
                Failure::Refused => {
                    log::error!("database is not reachable");
                    (self.notify)("database is not reachable");
                    return Err(Error::Transient(error.to_string()));
                }
                Failure::Other => {
                    self.client = None;
                    if retried {
                        log::error!("giving up after one reconnect attempt: {}", error);
                        return Err(Error::Transient(error.to_string()));
                    }
                    retried = true;
                }
            }
        }
    }
}

impl Executor for PostgresConnection {
    fn fetch(&mut self, sql: String) -> impl Future<Output = Result<Vec<RowLabeled>>> + Send {
        async move { self.run(&sql).await.map(|(rows, ..)| rows) }
    }

    fn execute(&mut self, sql: String) -> impl Future<Output = Result<RowsAffected>> + Send {
        async move {
            self.run(&sql).await.map(|(.., affected)| RowsAffected {
                rows_affected: affected,
            })
        }
    }
}
