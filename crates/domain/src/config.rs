//! Service configuration loaded from environment variables.

use std::time::Duration;

use sequence::PostgresSequenceCounter;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Order service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `ORDER_COUNTER_TIMEOUT_MS`: sequence counter timeout (default: `2000`)
/// - `ORDER_CATALOG_TIMEOUT_MS`: catalog lookup timeout (default: `2000`)
/// - `ORDER_REPOSITORY_TIMEOUT_MS`: repository timeout (default: `5000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: Postgres connection string for the counter store (optional)
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub counter_timeout: Duration,
    pub catalog_timeout: Duration,
    pub repository_timeout: Duration,
    pub log_level: String,
    pub database_url: Option<String>,
}

fn millis_from_env(name: &str, default: u64) -> Duration {
    let millis = std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default);
    Duration::from_millis(millis)
}

impl ServiceConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            counter_timeout: millis_from_env("ORDER_COUNTER_TIMEOUT_MS", 2000),
            catalog_timeout: millis_from_env("ORDER_CATALOG_TIMEOUT_MS", 2000),
            repository_timeout: millis_from_env("ORDER_REPOSITORY_TIMEOUT_MS", 5000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
        }
    }

    /// Sets all three collaborator timeouts at once.
    pub fn with_timeouts(mut self, timeout: Duration) -> Self {
        self.counter_timeout = timeout;
        self.catalog_timeout = timeout;
        self.repository_timeout = timeout;
        self
    }

    /// Connects a Postgres sequence counter to `database_url` and runs the
    /// migrations.
    ///
    /// Returns `None` when no database is configured.
    pub async fn connect_counter(&self) -> Option<sequence::Result<PostgresSequenceCounter>> {
        let url = self.database_url.as_deref()?;
        Some(connect_and_migrate(url).await)
    }

    /// Installs a global `fmt` subscriber filtered by `RUST_LOG`, falling back
    /// to the configured level.
    ///
    /// Fails if a global subscriber is already installed.
    pub fn init_tracing(&self) -> Result<(), tracing_subscriber::util::TryInitError> {
        tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(&self.log_level)),
            )
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    }
}

async fn connect_and_migrate(url: &str) -> sequence::Result<PostgresSequenceCounter> {
    let counter = PostgresSequenceCounter::connect(url).await?;
    counter.run_migrations().await?;
    info!("sequence counter connected");
    Ok(counter)
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            counter_timeout: Duration::from_millis(2000),
            catalog_timeout: Duration::from_millis(2000),
            repository_timeout: Duration::from_millis(5000),
            log_level: "info".to_string(),
            database_url: None,
        }
    }
}
