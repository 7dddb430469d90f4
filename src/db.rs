use std::{future::Future, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::DbConfig;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("database operation timed out")]
    Timeout,
    #[error("unique constraint violated")]
    Conflict,
    #[error("referenced row does not exist")]
    MissingReference,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        let code = match &e {
            sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
            _ => None,
        };
        match (e, code.as_deref()) {
            (sqlx::Error::PoolTimedOut, _) => RepoError::Timeout,
            (_, Some(UNIQUE_VIOLATION)) => RepoError::Conflict,
            (_, Some(FOREIGN_KEY_VIOLATION)) => RepoError::MissingReference,
            (other, _) => RepoError::Database(other),
        }
    }
}

/// Runs a query future with an upper bound on how long it may take.
pub async fn timed<T, F>(limit: Duration, fut: F) -> Result<T, RepoError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res.map_err(RepoError::from),
        Err(_) => Err(RepoError::Timeout),
    }
}

/// Postgres-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pub pool: PgPool,
    pub timeout: Duration,
}

impl PgStore {
    pub async fn connect(cfg: &DbConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(cfg.timeout())
            .connect(&cfg.url)
            .await
            .context("connect to database")?;
        Ok(Self {
            pool,
            timeout: cfg.timeout(),
        })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}
