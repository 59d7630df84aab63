pub mod decode;
pub mod params;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::DatabaseSettings;
use crate::errors::{AppError, DataAccessError};
use crate::models::candidate::RawRow;

pub use params::QueryParams;

/// Read-only row source. Implement this to serve rows from something other
/// than Postgres; handlers only ever see `Arc<dyn RowFetcher>`.
#[async_trait]
pub trait RowFetcher: Send + Sync {
    /// Runs `query` with `:name` placeholders bound from `params` and returns
    /// every selected column of every row, in result order.
    async fn fetch(&self, query: &str, params: &QueryParams) -> Result<Vec<RawRow>, AppError>;
}

/// Postgres-backed [`RowFetcher`].
///
/// The pool is built on first use, so missing connection settings surface on
/// the first request instead of at startup. Each fetch holds one pooled
/// connection for the duration of the query.
pub struct PgRowFetcher {
    settings: DatabaseSettings,
    pool: OnceCell<PgPool>,
}

impl PgRowFetcher {
    pub fn new(settings: DatabaseSettings) -> Self {
        Self {
            settings,
            pool: OnceCell::new(),
        }
    }

    async fn pool(&self) -> Result<&PgPool, AppError> {
        self.pool
            .get_or_try_init(|| async {
                let options = self.settings.connect_options()?;
                Ok::<_, AppError>(create_pool(options, &self.settings))
            })
            .await
    }
}

#[async_trait]
impl RowFetcher for PgRowFetcher {
    async fn fetch(&self, query: &str, params: &QueryParams) -> Result<Vec<RawRow>, AppError> {
        let compiled = params::compile_named(query, params)?;
        let pool = self.pool().await?;

        let mut conn = pool.acquire().await.map_err(DataAccessError::Connect)?;
        debug!("Executing: {}", compiled.sql);

        let mut bound = sqlx::query(&compiled.sql);
        for value in &compiled.binds {
            bound = bind_value(bound, value);
        }
        let rows = bound
            .fetch_all(&mut *conn)
            .await
            .map_err(DataAccessError::Query)?;

        let raw = rows
            .iter()
            .map(decode::decode_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(raw)
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(sqlx::types::Json(other.clone())),
    }
}

/// Creates a lazily connecting PostgreSQL pool.
pub fn create_pool(options: PgConnectOptions, settings: &DatabaseSettings) -> PgPool {
    info!(
        "Configuring PostgreSQL pool (max_connections={})",
        settings.max_connections
    );

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_lazy_with(options)
}
