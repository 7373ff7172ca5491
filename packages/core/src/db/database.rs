//! Database Connection Management
//!
//! This module provides the libsql connection and schema initialization used
//! by `TursoStore`.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf, or an in-memory database
//! - **WAL mode**: Write-Ahead Logging for concurrent readers during writes
//! - **No parent foreign key**: `parent_id` is a weak reference, checked by the
//!   hierarchy at write time rather than enforced by the store
//! - **Unique slugs**: `(collection_id, slug)` carries a unique index as a
//!   last line of defence behind the slug registry
//!
//! # Database Connection Patterns
//!
//! **Use `connect_with_timeout()` in async functions.** The 5-second busy
//! timeout lets a writer wait for another writer's `BEGIN IMMEDIATE`
//! transaction instead of failing with `SQLITE_BUSY`.

use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Busy timeout applied to every connection (milliseconds)
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Content schema, applied in order on every open
const SCHEMA: [(&str, &str); 4] = [
    (
        "content_nodes table",
        "CREATE TABLE IF NOT EXISTS content_nodes (
            id TEXT PRIMARY KEY,
            collection_id TEXT NOT NULL,
            title TEXT NOT NULL,
            slug TEXT NOT NULL,
            parent_id TEXT,
            status TEXT NOT NULL DEFAULT 'DRAFT',
            published_at TEXT,
            fields TEXT NOT NULL DEFAULT '{}',
            version INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            modified_at TEXT NOT NULL
        )",
    ),
    (
        "slug index",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_content_nodes_slug
         ON content_nodes(collection_id, slug)",
    ),
    (
        "parent index",
        "CREATE INDEX IF NOT EXISTS idx_content_nodes_parent
         ON content_nodes(parent_id, title)",
    ),
    (
        "roots index",
        "CREATE INDEX IF NOT EXISTS idx_content_nodes_roots
         ON content_nodes(collection_id, parent_id, title)",
    ),
];

/// Database service for managing the libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use folio_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_path = PathBuf::from("./data/folio.db");
///     let db_service = DatabaseService::new(db_path).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| {
                    DatabaseError::CreateDirectory {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|source| DatabaseError::Open {
                path: db_path.clone(),
                source,
            })?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema().await?;

        tracing::info!("Opened content database at {}", service.db_path.display());

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn
            .prepare(pragma)
            .await
            .map_err(|e| DatabaseError::setting(pragma, e))?;
        let _ = stmt
            .query(())
            .await
            .map_err(|e| DatabaseError::setting(pragma, e))?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Idempotent: safe to call against an existing database.
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        for (object, statement) in SCHEMA {
            conn.execute(statement, ())
                .await
                .map_err(|e| DatabaseError::schema(object, e))?;
        }

        Ok(())
    }

    /// Get a raw connection
    ///
    /// Prefer `connect_with_timeout()` in async code.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        Ok(self.db.connect()?)
    }

    /// Get an async connection with busy timeout configured
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS))
            .await?;

        Ok(conn)
    }
}
