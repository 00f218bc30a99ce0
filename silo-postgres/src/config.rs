use std::env;

/// Credentials and address of the relational store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl StoreConfig {
    /// Reads the standard `PG*` environment variables, falling back to the
    /// usual local defaults.
    pub fn from_env() -> Self {
        Self {
            user: env::var("PGUSER").unwrap_or_else(|_| "postgres".into()),
            password: env::var("PGPASSWORD").unwrap_or_default(),
            host: env::var("PGHOST").unwrap_or_else(|_| "localhost".into()),
            port: env::var("PGPORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(5432),
            database: env::var("PGDATABASE").unwrap_or_else(|_| "postgres".into()),
        }
    }

    pub fn pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .user(&self.user)
            .password(&self.password)
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database);
        config
    }
}
