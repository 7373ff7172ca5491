//! Errors raised while opening and preparing the libsql content database.
//!
//! Query failures after startup travel as `anyhow` errors through
//! `NodeStore`; hierarchy rule violations belong to `HierarchyError`.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of `DatabaseService`
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The database file's directory could not be created
    #[error("Failed to create directory for database {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// libsql could not open the database file
    #[error("Failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        source: libsql::Error,
    },

    #[error("Failed to connect to database: {0}")]
    Connect(#[from] libsql::Error),

    /// A connection setting (PRAGMA) was rejected
    #[error("Failed to apply '{statement}': {source}")]
    Setting {
        statement: String,
        source: libsql::Error,
    },

    /// A table or index of the content schema could not be created
    #[error("Failed to create {object}: {source}")]
    Schema {
        object: &'static str,
        source: libsql::Error,
    },
}

impl DatabaseError {
    pub fn setting(statement: impl Into<String>, source: libsql::Error) -> Self {
        Self::Setting {
            statement: statement.into(),
            source,
        }
    }

    pub fn schema(object: &'static str, source: libsql::Error) -> Self {
        Self::Schema { object, source }
    }
}
