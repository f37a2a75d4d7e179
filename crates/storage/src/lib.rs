use std::{borrow::Cow, str::FromStr, time::Duration};

use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use thiserror::Error;

pub mod companies;
pub mod jobs;
pub mod query;

pub use companies::{CompanyError, CompanyRepository};
pub use jobs::{JobError, JobRepository};
pub use query::{PartialUpdate, QueryError, SqlValue, WhereClause};

/// SQLite extended result code for a violated `UNIQUE` constraint.
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";
/// SQLite extended result code for a duplicate primary key.
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";
/// SQLite extended result code for a violated foreign key.
const SQLITE_CONSTRAINT_FOREIGNKEY: &str = "787";

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    ///
    /// Every pooled connection enforces foreign keys and runs in WAL mode.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = connect_options(database_url)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle to operate on job postings.
    pub fn jobs(&self) -> JobRepository {
        JobRepository::new(self.pool.clone())
    }

    /// Returns a handle for reading and seeding companies.
    pub fn companies(&self) -> CompanyRepository {
        CompanyRepository::new(self.pool.clone())
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, StorageError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(StorageError::InvalidUrl)?
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_millis(5000));
    Ok(options)
}

/// Outcome of matching a database error against the constraints we map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintViolation {
    Unique,
    ForeignKey,
}

fn constraint_violation(err: &sqlx::Error) -> Option<ConstraintViolation> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    match db_err.code() {
        Some(code)
            if code == Cow::Borrowed(SQLITE_CONSTRAINT_UNIQUE)
                || code == Cow::Borrowed(SQLITE_CONSTRAINT_PRIMARYKEY) =>
        {
            Some(ConstraintViolation::Unique)
        }
        Some(code) if code == Cow::Borrowed(SQLITE_CONSTRAINT_FOREIGNKEY) => {
            Some(ConstraintViolation::ForeignKey)
        }
        _ => None,
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid database url: {0}")]
    InvalidUrl(sqlx::Error),
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
