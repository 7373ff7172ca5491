//! HTTP error handling for the dev server
//!
//! Every failure leaves the server as the same JSON shape, with a stable
//! machine-readable `code` that also selects the status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use folio_core::services::{ErrorKind, HierarchyError};
use serde::{Deserialize, Serialize};

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn node_not_found(id: &str) -> Self {
        Self::new(format!("Node not found: {}", id), "NODE_NOT_FOUND")
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "NODE_NOT_FOUND" => StatusCode::NOT_FOUND,
            "INVALID_PARENT" | "SELF_PARENT" | "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CIRCULAR_REFERENCE" | "SLUG_CONFLICT" | "HAS_CHILDREN" | "VERSION_CONFLICT" => {
                StatusCode::CONFLICT
            }
            "STORE_UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn error_code(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "NODE_NOT_FOUND",
        ErrorKind::InvalidParent => "INVALID_PARENT",
        ErrorKind::SelfParent => "SELF_PARENT",
        ErrorKind::CircularReference => "CIRCULAR_REFERENCE",
        ErrorKind::SlugConflict => "SLUG_CONFLICT",
        ErrorKind::HasChildren => "HAS_CHILDREN",
        ErrorKind::Validation => "VALIDATION_ERROR",
        ErrorKind::VersionConflict => "VERSION_CONFLICT",
        ErrorKind::CorruptHierarchy => "CORRUPT_HIERARCHY",
        ErrorKind::StoreUnavailable => "STORE_UNAVAILABLE",
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<HierarchyError> for HttpError {
    fn from(err: HierarchyError) -> Self {
        let code = error_code(err.kind());

        match &err {
            HierarchyError::SlugConflict { existing_id, .. } => HttpError::with_details(
                err.to_string(),
                code,
                format!("existing_id: {}", existing_id),
            ),
            HierarchyError::VersionConflict {
                node_id,
                expected_version,
                actual_version,
            } => HttpError::with_details(
                err.to_string(),
                code,
                format!(
                    "node_id: {}, expected: {}, actual: {}",
                    node_id, expected_version, actual_version
                ),
            ),
            HierarchyError::StoreUnavailable(_) | HierarchyError::CorruptHierarchy { .. } => {
                tracing::error!("Hierarchy request failed: {}", err);
                HttpError::new(err.to_string(), code)
            }
            _ => HttpError::new(err.to_string(), code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_per_kind() {
        let cases = [
            (HierarchyError::node_not_found("n"), StatusCode::NOT_FOUND),
            (HierarchyError::invalid_parent("p"), StatusCode::BAD_REQUEST),
            (HierarchyError::self_parent("n"), StatusCode::BAD_REQUEST),
            (HierarchyError::circular_reference("a", "b"), StatusCode::CONFLICT),
            (HierarchyError::slug_conflict("wiki", "faq", "n"), StatusCode::CONFLICT),
            (HierarchyError::has_children("n", 1), StatusCode::CONFLICT),
            (HierarchyError::version_conflict("n", 1, 2), StatusCode::CONFLICT),
            (HierarchyError::corrupt_hierarchy("n", "loop"), StatusCode::INTERNAL_SERVER_ERROR),
            (
                HierarchyError::store_unavailable(anyhow::anyhow!("disk full")),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, expected) in cases {
            let http: HttpError = err.into();
            assert_eq!(http.status(), expected, "code {}", http.code);
        }
    }

    #[test]
    fn test_slug_conflict_carries_holder() {
        let http: HttpError = HierarchyError::slug_conflict("wiki", "faq", "n-7").into();
        assert_eq!(http.code, "SLUG_CONFLICT");
        assert_eq!(http.details.as_deref(), Some("existing_id: n-7"));
    }
}
