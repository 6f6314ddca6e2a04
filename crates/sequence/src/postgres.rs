use async_trait::async_trait;
use sqlx::PgPool;

use crate::{CounterScope, Result, SequenceCounter, SequenceError};

/// PostgreSQL-backed sequence counter.
///
/// Each increment is a single `UPDATE ... RETURNING` statement, so the row
/// lock taken by PostgreSQL serializes concurrent callers and the returned
/// value is the one this statement wrote.
#[derive(Clone)]
pub struct PostgresSequenceCounter {
    pool: PgPool,
}

impl PostgresSequenceCounter {
    /// Creates a new PostgreSQL sequence counter.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

fn to_i64(scope: &CounterScope, value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| SequenceError::Exhausted {
        scope: scope.clone(),
        value,
        max: i64::MAX as u64,
    })
}

fn to_u64(value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| SequenceError::Unavailable(format!("negative counter value {value}")))
}

#[async_trait]
impl SequenceCounter for PostgresSequenceCounter {
    #[tracing::instrument(skip(self), fields(scope = %scope))]
    async fn increment(&self, scope: &CounterScope) -> Result<u64> {
        let value: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE counters
            SET value = value + 1, updated_at = NOW()
            WHERE scope = $1
            RETURNING value
            "#,
        )
        .bind(scope.key())
        .fetch_optional(&self.pool)
        .await?;

        let value = value.ok_or_else(|| SequenceError::CounterNotFound(scope.clone()))?;
        metrics::counter!("sequence_increments_total").increment(1);
        to_u64(value)
    }

    async fn current(&self, scope: &CounterScope) -> Result<Option<u64>> {
        let value: Option<i64> = sqlx::query_scalar("SELECT value FROM counters WHERE scope = $1")
            .bind(scope.key())
            .fetch_optional(&self.pool)
            .await?;

        value.map(to_u64).transpose()
    }

    #[tracing::instrument(skip(self), fields(scope = %scope))]
    async fn provision(&self, scope: &CounterScope, initial: u64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO counters (scope, value, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            ON CONFLICT (scope) DO NOTHING
            "#,
        )
        .bind(scope.key())
        .bind(to_i64(scope, initial)?)
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() == 1;
        if created {
            tracing::info!(initial, "counter provisioned");
        }
        Ok(created)
    }
}
