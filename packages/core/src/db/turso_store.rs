//! TursoStore - NodeStore Implementation for the libsql Backend
//!
//! Persists content nodes in the `content_nodes` table created by
//! `DatabaseService`.
//!
//! # Design Principles
//!
//! 1. **Row Conversion**: a single `row_to_node` handles libsql::Row → ContentNode
//! 2. **Shared SQL**: the same query helpers serve plain reads and transactions
//! 3. **Serializable writes**: transactions open with `BEGIN IMMEDIATE`, which
//!    takes SQLite's write lock up front so concurrent writers queue behind it
//!
//! # Examples
//!
//! ```rust,no_run
//! use folio_core::db::{DatabaseService, NodeStore, TursoStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/folio.db")).await?);
//!     let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));
//!
//!     let node = store.get_node("node-123").await?;
//!     Ok(())
//! }
//! ```

use crate::db::node_store::{NodeStore, NodeTransaction};
use crate::db::DatabaseService;
use crate::models::{ContentNode, NodeStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::params::Params;
use libsql::{Connection, Row, Value};
use std::sync::Arc;

const NODE_COLUMNS: &str = "id, collection_id, title, slug, parent_id, status, published_at, \
                            fields, version, created_at, modified_at";

/// TursoStore implements NodeStore for the libsql backend
#[derive(Debug, Clone)]
pub struct TursoStore {
    db: Arc<DatabaseService>,
}

impl TursoStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    async fn connection(&self) -> Result<Connection> {
        self.db
            .connect_with_timeout()
            .await
            .context("Failed to open database connection")
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Unable to parse timestamp '{}' as RFC3339", s))
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn optional_text(value: Option<&str>) -> Value {
    match value {
        Some(v) => Value::Text(v.to_string()),
        None => Value::Null,
    }
}

/// Convert libsql::Row to ContentNode
///
/// Expected columns are `NODE_COLUMNS`, in order.
fn row_to_node(row: &Row) -> Result<ContentNode> {
    let id: String = row.get(0).context("Failed to get id")?;
    let collection_id: String = row.get(1).context("Failed to get collection_id")?;
    let title: String = row.get(2).context("Failed to get title")?;
    let slug: String = row.get(3).context("Failed to get slug")?;
    let parent_id: Option<String> = row.get(4).context("Failed to get parent_id")?;
    let status_str: String = row.get(5).context("Failed to get status")?;
    let published_at_str: Option<String> = row.get(6).context("Failed to get published_at")?;
    let fields_json: String = row.get(7).context("Failed to get fields")?;
    let version: i64 = row.get(8).context("Failed to get version")?;
    let created_at_str: String = row.get(9).context("Failed to get created_at")?;
    let modified_at_str: String = row.get(10).context("Failed to get modified_at")?;

    let status: NodeStatus = status_str
        .parse()
        .with_context(|| format!("Invalid status stored for node {}", id))?;
    let published_at = published_at_str
        .as_deref()
        .map(parse_timestamp)
        .transpose()
        .context("Failed to parse published_at")?;
    let fields = serde_json::from_str(&fields_json).context("Failed to parse fields JSON")?;

    Ok(ContentNode {
        id,
        collection_id,
        title,
        slug,
        parent_id,
        status,
        published_at,
        fields,
        version,
        created_at: parse_timestamp(&created_at_str).context("Failed to parse created_at")?,
        modified_at: parse_timestamp(&modified_at_str).context("Failed to parse modified_at")?,
    })
}

async fn query_nodes(conn: &Connection, sql: &str, params: Vec<Value>) -> Result<Vec<ContentNode>> {
    let mut rows = conn
        .query(sql, Params::Positional(params))
        .await
        .with_context(|| format!("Query failed: {}", sql))?;

    let mut nodes = Vec::new();
    while let Some(row) = rows.next().await.context("Failed to read row")? {
        nodes.push(row_to_node(&row)?);
    }
    Ok(nodes)
}

async fn select_node(conn: &Connection, id: &str) -> Result<Option<ContentNode>> {
    let sql = format!("SELECT {} FROM content_nodes WHERE id = ?", NODE_COLUMNS);
    Ok(query_nodes(conn, &sql, vec![text(id)]).await?.into_iter().next())
}

async fn select_children(conn: &Connection, parent_id: &str) -> Result<Vec<ContentNode>> {
    let sql = format!(
        "SELECT {} FROM content_nodes WHERE parent_id = ? ORDER BY title, id",
        NODE_COLUMNS
    );
    query_nodes(conn, &sql, vec![text(parent_id)]).await
}

async fn select_by_slug(
    conn: &Connection,
    collection_id: &str,
    slug: &str,
) -> Result<Option<ContentNode>> {
    let sql = format!(
        "SELECT {} FROM content_nodes WHERE collection_id = ? AND slug = ?",
        NODE_COLUMNS
    );
    Ok(query_nodes(conn, &sql, vec![text(collection_id), text(slug)])
        .await?
        .into_iter()
        .next())
}

fn node_params(node: &ContentNode) -> Result<Vec<Value>> {
    let fields = serde_json::to_string(&node.fields).context("Failed to serialize fields")?;

    Ok(vec![
        text(&node.collection_id),
        text(&node.title),
        text(&node.slug),
        optional_text(node.parent_id.as_deref()),
        text(node.status.as_str()),
        optional_text(node.published_at.as_ref().map(format_timestamp).as_deref()),
        Value::Text(fields),
        Value::Integer(node.version),
        text(&format_timestamp(&node.created_at)),
        text(&format_timestamp(&node.modified_at)),
        text(&node.id),
    ])
}

#[async_trait]
impl NodeStore for TursoStore {
    async fn get_node(&self, id: &str) -> Result<Option<ContentNode>> {
        let conn = self.connection().await?;
        select_node(&conn, id).await
    }

    async fn get_children(&self, parent_id: &str) -> Result<Vec<ContentNode>> {
        let conn = self.connection().await?;
        select_children(&conn, parent_id).await
    }

    async fn get_roots(&self, collection_id: &str) -> Result<Vec<ContentNode>> {
        let conn = self.connection().await?;
        let sql = format!(
            "SELECT {} FROM content_nodes WHERE collection_id = ? AND parent_id IS NULL ORDER BY title, id",
            NODE_COLUMNS
        );
        query_nodes(&conn, &sql, vec![text(collection_id)]).await
    }

    async fn find_by_slug(&self, collection_id: &str, slug: &str) -> Result<Option<ContentNode>> {
        let conn = self.connection().await?;
        select_by_slug(&conn, collection_id, slug).await
    }

    async fn begin(&self) -> Result<Box<dyn NodeTransaction>> {
        let conn = self.connection().await?;
        conn.execute("BEGIN IMMEDIATE", ())
            .await
            .context("Failed to begin transaction")?;

        Ok(Box::new(TursoTransaction { conn }))
    }
}

/// Open `BEGIN IMMEDIATE` transaction on a dedicated connection
///
/// If dropped without commit, closing the connection rolls the transaction back.
struct TursoTransaction {
    conn: Connection,
}

#[async_trait]
impl NodeTransaction for TursoTransaction {
    async fn get_node(&mut self, id: &str) -> Result<Option<ContentNode>> {
        select_node(&self.conn, id).await
    }

    async fn get_children(&mut self, parent_id: &str) -> Result<Vec<ContentNode>> {
        select_children(&self.conn, parent_id).await
    }

    async fn count_children(&mut self, parent_id: &str) -> Result<usize> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM content_nodes WHERE parent_id = ?",
                Params::Positional(vec![text(parent_id)]),
            )
            .await
            .context("Failed to count children")?;

        let count: i64 = match rows.next().await.context("Failed to read count")? {
            Some(row) => row.get(0).context("Failed to get count")?,
            None => 0,
        };
        Ok(count.max(0) as usize)
    }

    async fn find_by_slug(
        &mut self,
        collection_id: &str,
        slug: &str,
    ) -> Result<Option<ContentNode>> {
        select_by_slug(&self.conn, collection_id, slug).await
    }

    async fn insert_node(&mut self, node: &ContentNode) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO content_nodes (collection_id, title, slug, parent_id, status, published_at,
                                            fields, version, created_at, modified_at, id)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                Params::Positional(node_params(node)?),
            )
            .await
            .with_context(|| format!("Failed to insert node {}", node.id))?;
        Ok(())
    }

    async fn update_node(&mut self, node: &ContentNode) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE content_nodes
                 SET collection_id = ?, title = ?, slug = ?, parent_id = ?, status = ?, published_at = ?,
                     fields = ?, version = ?, created_at = ?, modified_at = ?
                 WHERE id = ?",
                Params::Positional(node_params(node)?),
            )
            .await
            .with_context(|| format!("Failed to update node {}", node.id))?;

        if changed == 0 {
            anyhow::bail!("Node {} not found for update", node.id);
        }
        Ok(())
    }

    async fn delete_node(&mut self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM content_nodes WHERE id = ?",
                Params::Positional(vec![text(id)]),
            )
            .await
            .with_context(|| format!("Failed to delete node {}", id))?;
        Ok(changed > 0)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            let _rollback = self.conn.execute("ROLLBACK", ()).await;
            return Err(anyhow::Error::new(e).context("Failed to commit transaction"));
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.conn
            .execute("ROLLBACK", ())
            .await
            .context("Failed to roll back transaction")?;
        Ok(())
    }
}
