//! Router Integration Tests
//!
//! Drives the dev server router in-process with `oneshot` requests against an
//! in-memory store, checking status codes and JSON shapes.

#[cfg(test)]
mod router_tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use folio_core::db::MemoryStore;
    use folio_core::services::HierarchyService;
    use folio_dev_server::{create_router, AppState};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_router() -> Router {
        let hierarchy = HierarchyService::new(Arc::new(MemoryStore::new()));
        create_router(AppState { hierarchy })
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(router: &Router, body: Value) -> Value {
        let (status, node) = send(router, Method::POST, "/api/collections/wiki/nodes", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", node);
        node
    }

    #[tokio::test]
    async fn test_health() {
        let router = create_test_router();
        let (status, body) = send(&router, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_and_navigate() {
        let router = create_test_router();
        let docs = create(&router, json!({"title": "Docs", "status": "PUBLISHED"})).await;
        let install = create(
            &router,
            json!({"title": "Installation", "parentId": docs["id"], "status": "PUBLISHED"}),
        )
        .await;

        assert_eq!(docs["slug"], "docs");
        assert_eq!(install["parentId"], docs["id"]);
        assert!(install["publishedAt"].is_string());

        let uri = format!("/api/nodes/{}/breadcrumbs", install["id"].as_str().unwrap());
        let (status, trail) = send(&router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(trail[0]["slug"], "docs");
        assert_eq!(trail[1]["slug"], "installation");

        let uri = format!("/api/nodes/{}/children", docs["id"].as_str().unwrap());
        let (_, children) = send(&router, Method::GET, &uri, None).await;
        assert_eq!(children.as_array().unwrap().len(), 1);

        let (status, tree) = send(&router, Method::GET, "/api/collections/wiki/tree?maxDepth=0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tree[0]["id"], docs["id"]);
        assert_eq!(tree[0]["hasMoreChildren"], true);
        assert!(tree[0]["children"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tree_all_statuses() {
        let router = create_test_router();
        create(&router, json!({"title": "Draft Page"})).await;

        let (_, public) = send(&router, Method::GET, "/api/collections/wiki/tree", None).await;
        assert!(public.as_array().unwrap().is_empty());

        let (_, all) = send(&router, Method::GET, "/api/collections/wiki/tree?all=true", None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let router = create_test_router();
        let a = create(&router, json!({"title": "A"})).await;
        let b = create(&router, json!({"title": "B", "parentId": a["id"]})).await;
        let a_uri = format!("/api/nodes/{}", a["id"].as_str().unwrap());
        let b_uri = format!("/api/nodes/{}", b["id"].as_str().unwrap());

        let (status, err) = send(&router, Method::POST, "/api/collections/wiki/nodes", Some(json!({"title": "a"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "SLUG_CONFLICT");

        let (status, err) = send(&router, Method::PATCH, &a_uri, Some(json!({"parentId": b["id"]}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "CIRCULAR_REFERENCE");

        let (status, err) = send(&router, Method::PATCH, &a_uri, Some(json!({"parentId": a["id"]}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "SELF_PARENT");

        let (status, err) = send(
            &router,
            Method::POST,
            "/api/collections/wiki/nodes",
            Some(json!({"title": "Orphan", "parentId": "missing"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "INVALID_PARENT");

        let (status, err) = send(&router, Method::DELETE, &a_uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "HAS_CHILDREN");

        let (status, _) = send(&router, Method::GET, "/api/nodes/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&router, Method::DELETE, &b_uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&router, Method::DELETE, &a_uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_patch_detach_and_version_check() {
        let router = create_test_router();
        let a = create(&router, json!({"title": "A"})).await;
        let b = create(&router, json!({"title": "B", "parentId": a["id"]})).await;
        let b_uri = format!("/api/nodes/{}", b["id"].as_str().unwrap());

        // Explicit null detaches; absent parentId leaves it alone
        let (status, detached) = send(&router, Method::PATCH, &b_uri, Some(json!({"parentId": null, "expectedVersion": 1}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(detached["parentId"].is_null());
        assert_eq!(detached["version"], 2);

        let (status, err) = send(&router, Method::PATCH, &b_uri, Some(json!({"title": "Bee", "expectedVersion": 1}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "VERSION_CONFLICT");

        let (status, renamed) = send(&router, Method::PATCH, &b_uri, Some(json!({"title": "Bee"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(renamed["slug"], "bee");
        assert!(renamed["parentId"].is_null());
    }
}
