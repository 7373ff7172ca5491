//! Hierarchy endpoints for the HTTP dev server
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check endpoint
//! - `POST /api/collections/:collection_id/nodes` - Create a node
//! - `GET /api/collections/:collection_id/tree?maxDepth=&all=` - Bounded tree
//! - `GET /api/nodes/:id` - Get a node by ID
//! - `PATCH /api/nodes/:id` - Update a node (optional `expectedVersion`)
//! - `DELETE /api/nodes/:id` - Delete a childless node
//! - `GET /api/nodes/:id/children` - Child nodes, ordered by title
//! - `GET /api/nodes/:id/breadcrumbs` - Root-first path to a node

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use folio_core::models::{Breadcrumb, ContentNode, CreateNodeParams, NodeUpdate, TreeNode};
use folio_core::services::AllStatuses;
use serde::{Deserialize, Serialize};

use crate::{AppState, HttpError};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Query parameters for tree requests
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeQuery {
    /// Levels below the roots; server default and ceiling apply
    pub max_depth: Option<usize>,
    /// Include every status instead of the published view
    #[serde(default)]
    pub all: bool,
}

/// PATCH body: a `NodeUpdate` plus optional optimistic-concurrency version
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodeRequest {
    #[serde(flatten)]
    pub update: NodeUpdate,
    pub expected_version: Option<i64>,
}

/// Health check endpoint
///
/// ```bash
/// curl http://localhost:3001/api/health
/// ```
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create a node in a collection
///
/// ```bash
/// curl -X POST http://localhost:3001/api/collections/wiki/nodes \
///   -H "Content-Type: application/json" \
///   -d '{"title": "Setup Guide", "parentId": null, "status": "PUBLISHED"}'
/// ```
async fn create_node(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
    Json(params): Json<CreateNodeParams>,
) -> Result<(StatusCode, Json<ContentNode>), HttpError> {
    let node = state
        .hierarchy
        .create_node(&collection_id, params)
        .await
        .map_err(|e| {
            tracing::debug!("Node creation in {} rejected: {}", collection_id, e);
            HttpError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(node)))
}

/// Tree of a collection
///
/// ```bash
/// curl "http://localhost:3001/api/collections/wiki/tree?maxDepth=2"
/// curl "http://localhost:3001/api/collections/wiki/tree?all=true"
/// ```
async fn get_tree(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
    Query(query): Query<TreeQuery>,
) -> Result<Json<Vec<TreeNode>>, HttpError> {
    let tree = if query.all {
        state
            .hierarchy
            .get_tree_with_filter(&collection_id, query.max_depth, &AllStatuses)
            .await?
    } else {
        state
            .hierarchy
            .get_tree(&collection_id, query.max_depth)
            .await?
    };

    Ok(Json(tree))
}

async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContentNode>, HttpError> {
    state
        .hierarchy
        .get_node(&id)
        .await?
        .map(Json)
        .ok_or_else(|| HttpError::node_not_found(&id))
}

/// Update a node (partial update)
///
/// ```bash
/// curl -X PATCH http://localhost:3001/api/nodes/<id> \
///   -H "Content-Type: application/json" \
///   -d '{"title": "Install Guide", "parentId": null, "expectedVersion": 3}'
/// ```
async fn update_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateNodeRequest>,
) -> Result<Json<ContentNode>, HttpError> {
    let node = match request.expected_version {
        Some(version) => {
            state
                .hierarchy
                .update_node_with_version_check(&id, version, request.update)
                .await?
        }
        None => state.hierarchy.update_node(&id, request.update).await?,
    };

    Ok(Json(node))
}

async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    state.hierarchy.delete_node(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_children(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ContentNode>>, HttpError> {
    Ok(Json(state.hierarchy.get_children(&id).await?))
}

async fn get_breadcrumbs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Breadcrumb>>, HttpError> {
    Ok(Json(state.hierarchy.get_breadcrumbs(&id).await?))
}

/// Router with every hierarchy endpoint
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/collections/:collection_id/nodes", post(create_node))
        .route("/api/collections/:collection_id/tree", get(get_tree))
        .route(
            "/api/nodes/:id",
            get(get_node).patch(update_node).delete(delete_node),
        )
        .route("/api/nodes/:id/children", get(get_children))
        .route("/api/nodes/:id/breadcrumbs", get(get_breadcrumbs))
        .with_state(state)
}
