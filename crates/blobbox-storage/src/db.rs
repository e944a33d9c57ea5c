//! Database connection and migrations

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::{debug, info};

use crate::Result;

const DB_FILE_NAME: &str = "blobbox.db";

/// Owns the SQLite connection pool. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Open (creating if needed) the database at `db_path`, or at the
    /// default data directory when `None`, and run migrations.
    pub async fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(path) => path,
            None => Self::default_db_path()?,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        info!(path = %path.display(), "opened database");
        Self::migrate(pool).await
    }

    /// Private in-memory database. The pool holds a single connection that
    /// is never recycled, since closing it would drop the data.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!("migrations applied");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// `<data dir>/blobbox.db`
    pub fn default_db_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "blobbox", "blobbox")
            .ok_or_else(|| anyhow::anyhow!("could not determine a data directory"))?;
        Ok(dirs.data_dir().join(DB_FILE_NAME))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
