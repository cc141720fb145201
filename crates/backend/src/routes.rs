use axum::http::{header, Method};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::shared::state::AppState;
use crate::system::auth::middleware::require_token;
use crate::system::middleware::request_logger::request_logger;
use crate::handlers;

/// All application routes. `/health` and static files stay public; every
/// `/api` route goes through the bearer token check.
pub fn configure_routes(state: AppState, static_dir: Option<&str>) -> Router {
    let api = Router::new()
        // Categories
        .route(
            "/api/products/categories",
            get(handlers::a001_category::list_all).post(handlers::a001_category::create),
        )
        .route(
            "/api/products/categories/tree",
            get(handlers::a001_category::tree),
        )
        .route(
            "/api/products/categories/testdata",
            post(handlers::a001_category::insert_test_data),
        )
        .route(
            "/api/products/categories/:id",
            get(handlers::a001_category::get_by_id)
                .put(handlers::a001_category::update)
                .delete(handlers::a001_category::delete),
        )
        // Logs
        .route(
            "/api/logs",
            get(handlers::logs::list_all)
                .post(handlers::logs::create)
                .delete(handlers::logs::clear_all),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    let mut app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(api);

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(middleware::from_fn(request_logger))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::AuthConfig;
    use crate::shared::data::db::connect_in_memory;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use contracts::domain::a001_category::{CategoryRecord, CategoryTreeNode};
    use contracts::shared::error::{ApiErrorBody, ErrorKind};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app_with_tokens(tokens: Vec<String>) -> Router {
        let db = connect_in_memory().await.unwrap();
        configure_routes(AppState::with_auth(db, AuthConfig { tokens }), None)
    }

    async fn app() -> Router {
        app_with_tokens(Vec::new()).await
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create(app: &Router, body: Value) -> CategoryRecord {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/products/categories", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        read_json(response).await
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = app_with_tokens(vec!["secret".into()]).await;
        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let app = app().await;
        let root = create(&app, json!({ "name": "Shoes" })).await;
        create(&app, json!({ "name": "Boots", "parent": root.id })).await;

        let response = app
            .clone()
            .oneshot(get_request("/api/products/categories?expand=parent"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let list: Value = read_json(response).await;
        assert_eq!(list.as_array().unwrap().len(), 2);
        assert_eq!(list[1]["parent"], json!({ "id": 1, "name": "Shoes" }));
    }

    #[tokio::test]
    async fn test_create_accepts_embedded_parent() {
        let app = app().await;
        create(&app, json!({ "name": "Root" })).await;
        let child = create(&app, json!({ "name": "Child", "parent": { "id": 1 } })).await;
        assert_eq!(child.parent_id(), Some(&1.into()));
    }

    #[tokio::test]
    async fn test_missing_category_is_not_found() {
        let app = app().await;
        let response = app
            .oneshot(get_request("/api/products/categories/42"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ApiErrorBody = read_json(response).await;
        assert_eq!(body.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_payloads() {
        let app = app().await;
        let blank = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/products/categories",
                json!({ "name": "   " }),
            ))
            .await
            .unwrap();
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
        let body: ApiErrorBody = read_json(blank).await;
        assert_eq!(body.kind, ErrorKind::Validation);

        let missing_name = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/products/categories",
                json!({ "description": "x" }),
            ))
            .await
            .unwrap();
        assert_eq!(missing_name.status(), StatusCode::BAD_REQUEST);
        let body: ApiErrorBody = read_json(missing_name).await;
        assert_eq!(body.kind, ErrorKind::Validation);
        assert!(body.message.contains("name"), "{}", body.message);

        let not_json = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/products/categories/1")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);
        let body: ApiErrorBody = read_json(not_json).await;
        assert_eq!(body.kind, ErrorKind::Validation);

        let bad_id = app
            .oneshot(get_request("/api/products/categories/abc"))
            .await
            .unwrap();
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_into_own_subtree_conflicts() {
        let app = app().await;
        let a = create(&app, json!({ "name": "A" })).await;
        let b = create(&app, json!({ "name": "B", "parent": a.id })).await;

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/products/categories/1",
                json!({ "name": "A", "parent": b.id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: ApiErrorBody = read_json(response).await;
        assert_eq!(body.kind, ErrorKind::CyclicHierarchy);
        assert_eq!(body.ids, vec![1.into(), 2.into(), 1.into()]);
    }

    #[tokio::test]
    async fn test_delete_returns_no_content() {
        let app = app().await;
        create(&app, json!({ "name": "Temp" })).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/products/categories/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let gone = app
            .oneshot(get_request("/api/products/categories/1"))
            .await
            .unwrap();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tree_endpoint() {
        let app = app().await;
        let seeded = app
            .clone()
            .oneshot(json_request("POST", "/api/products/categories/testdata", json!({})))
            .await
            .unwrap();
        assert_eq!(seeded.status(), StatusCode::OK);

        let response = app
            .oneshot(get_request(
                "/api/products/categories/tree?policy=parent_only&sort=alphabetical",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let tree: Vec<CategoryTreeNode> = read_json(response).await;
        let titles: Vec<&str> = tree.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Clothing", "Electronics", "Home & Garden"]);
        assert!(tree.iter().all(|n| n.selectable));
    }

    #[tokio::test]
    async fn test_tree_requires_policy() {
        let app = app().await;
        for uri in [
            "/api/products/categories/tree",
            "/api/products/categories/tree?policy=bogus",
        ] {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body: ApiErrorBody = read_json(response).await;
            assert_eq!(body.kind, ErrorKind::Validation, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_token_required_when_configured() {
        let app = app_with_tokens(vec!["secret".into()]).await;

        let anonymous = app
            .clone()
            .oneshot(get_request("/api/products/categories"))
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
        let body: ApiErrorBody = read_json(anonymous).await;
        assert_eq!(body.kind, ErrorKind::Unauthorized);

        let wrong = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/products/categories")
                    .header(header::AUTHORIZATION, "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let ok = app
            .oneshot(
                Request::builder()
                    .uri("/api/products/categories")
                    .header(header::AUTHORIZATION, "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_unauthorized() {
        let app = app_with_tokens(vec!["secret".into()]).await;
        let response = app.oneshot(get_request("/api/unknown")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_client_logs() {
        let app = app().await;
        let created = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/logs",
                json!({ "source": "client", "category": "category_tree", "message": "boom" }),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        let list = app.oneshot(get_request("/api/logs?limit=10")).await.unwrap();
        let logs: Value = read_json(list).await;
        assert_eq!(logs[0]["message"], "boom");
        assert_eq!(logs[0]["source"], "client");
    }

    /// Full HTTP round trip over a real socket.
    #[tokio::test]
    async fn test_served_over_http() {
        let app = app_with_tokens(vec!["secret".into()]).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base = format!("http://{}/api/products/categories", addr);
        let client = reqwest::Client::new();

        let created: CategoryRecord = client
            .post(&base)
            .bearer_auth("secret")
            .json(&json!({ "name": "Toys" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(created.name, "Toys");

        let unauthorized = client.get(&base).send().await.unwrap();
        assert_eq!(unauthorized.status().as_u16(), 401);

        let records: Vec<CategoryRecord> = client
            .get(&base)
            .bearer_auth("secret")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(records, vec![created]);
    }
}
