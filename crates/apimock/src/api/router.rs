//! Route dispatch for the HTTP API.
//!
//! `/health` and `/mocks[/:id]` are the admin surface; every other request
//! is handed to the mock dispatcher.

use crate::api::handlers::{dispatch, mocks, system};
use crate::api::types::method_not_allowed;
use crate::store::InMemoryStore;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;
use tracing::debug;

/// Parsed admin route under `/mocks`
#[derive(Debug, PartialEq, Eq)]
enum MockRoute {
    /// GET/POST /mocks
    Collection,
    /// GET/PUT/DELETE /mocks/:id
    ById(String),
}

impl MockRoute {
    fn parse(path: &str) -> Option<Self> {
        let rest = path.strip_prefix("/mocks")?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }
        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Some(MockRoute::Collection),
            [id] => Some(MockRoute::ById((*id).to_string())),
            _ => None,
        }
    }
}

/// Main request router
pub async fn route_request<B>(
    req: Request<B>,
    store: Arc<InMemoryStore>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("{} {}", method, path);

    Ok(route_by_path(&method, &path, req, &store).await)
}

async fn route_by_path<B>(
    method: &Method,
    path: &str,
    req: Request<B>,
    store: &InMemoryStore,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    if (method, path) == (&Method::GET, "/health") {
        return system::handle_health();
    }

    let Some(route) = MockRoute::parse(path) else {
        return dispatch::handle_dispatch(req, store).await;
    };

    match (method, route) {
        (&Method::GET, MockRoute::Collection) => mocks::handle_list(store),
        (&Method::POST, MockRoute::Collection) => mocks::handle_create(req, store).await,
        (&Method::GET, MockRoute::ById(id)) => mocks::handle_get(&id, store),
        (&Method::PUT, MockRoute::ById(id)) => mocks::handle_update(&id, req, store).await,
        (&Method::DELETE, MockRoute::ById(id)) => mocks::handle_delete(&id, store),
        _ => method_not_allowed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use serde_json::{json, Value};

    fn request(method: Method, uri: &str, body: impl Into<Bytes>) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(body.into()))
            .unwrap()
    }

    async fn send(store: &Arc<InMemoryStore>, req: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
        route_request(req, Arc::clone(store)).await.unwrap()
    }

    async fn body_string(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn users_api() -> Value {
        json!({
            "name": "Users API",
            "basePath": "/users-api",
            "operations": [{
                "method": "GET",
                "path": "/users/{id}",
                "scenarios": [
                    {
                        "name": "Admin",
                        "conditions": "$path.id == 1",
                        "httpCode": 200,
                        "order": 1,
                        "contentType": "JSON",
                        "body": "{\"role\":\"admin\"}",
                        "headers": {"server": "apimock"}
                    },
                    {
                        "name": "Missing",
                        "httpCode": 404,
                        "order": 2,
                        "isDefault": true
                    }
                ]
            }, {
                "method": "POST",
                "path": "/users",
                "scenarios": [
                    {
                        "name": "Created",
                        "conditions": "$body.name == 'john' && $header['x-tenant'] == 'acme'",
                        "httpCode": 201,
                        "order": 1,
                        "contentType": "PLAIN_TEXT",
                        "body": "created"
                    },
                    {
                        "name": "Rejected",
                        "httpCode": 400,
                        "order": 1,
                        "isDefault": true
                    }
                ]
            }]
        })
    }

    async fn create_users_api(store: &Arc<InMemoryStore>) -> String {
        let resp = send(store, request(Method::POST, "/mocks", users_api().to_string())).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let location = resp.headers()["location"].to_str().unwrap().to_string();
        let json: Value = serde_json::from_str(&body_string(resp).await).unwrap();
        let id = json["id"].as_str().unwrap().to_string();
        assert_eq!(location, format!("/mocks/{id}"));
        id
    }

    #[test]
    fn test_mock_route_parse() {
        assert_eq!(MockRoute::parse("/mocks"), Some(MockRoute::Collection));
        assert_eq!(MockRoute::parse("/mocks/"), Some(MockRoute::Collection));
        assert_eq!(
            MockRoute::parse("/mocks/abc"),
            Some(MockRoute::ById("abc".into()))
        );
        assert_eq!(MockRoute::parse("/mocks/abc/def"), None);
        assert_eq!(MockRoute::parse("/mocksy"), None);
        assert_eq!(MockRoute::parse("/users"), None);
    }

    #[tokio::test]
    async fn test_health() {
        let store = Arc::new(InMemoryStore::new());
        let resp = send(&store, request(Method::GET, "/health", Bytes::new())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("ok"));
    }

    #[tokio::test]
    async fn test_crud_lifecycle() {
        let store = Arc::new(InMemoryStore::new());
        let id = create_users_api(&store).await;

        let resp = send(&store, request(Method::GET, &format!("/mocks/{id}"), Bytes::new())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json: Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(json["name"], "Users API");
        assert_eq!(json["operations"][0]["fullPath"], "/users-api/users/{id}");

        let resp = send(&store, request(Method::GET, "/mocks", Bytes::new())).await;
        let json: Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);

        let mut updated = users_api();
        updated["name"] = json!("Renamed");
        let resp = send(
            &store,
            request(Method::PUT, &format!("/mocks/{id}"), updated.to_string()),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(store.get(&id).unwrap().name, "Renamed");

        let resp = send(&store, request(Method::DELETE, &format!("/mocks/{id}"), Bytes::new())).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = send(&store, request(Method::GET, &format!("/mocks/{id}"), Bytes::new())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_errors() {
        let store = Arc::new(InMemoryStore::new());

        let resp = send(&store, request(Method::POST, "/mocks", "{not json")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let mut invalid = users_api();
        invalid["basePath"] = json!("users-api");
        let resp = send(&store, request(Method::POST, "/mocks", invalid.to_string())).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json: Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(json["type"], "Unprocessable Entity");
        assert_eq!(json["errors"].as_array().unwrap().len(), 1);

        let resp = send(
            &store,
            request(Method::PUT, "/mocks/unknown", users_api().to_string()),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&store, request(Method::DELETE, "/mocks", Bytes::new())).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_dispatch_scenarios() {
        let store = Arc::new(InMemoryStore::new());
        create_users_api(&store).await;

        let resp = send(&store, request(Method::GET, "/users-api/users/1", Bytes::new())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["server"], "apimock");
        assert_eq!(resp.headers()["content-type"], "application/json");
        assert_eq!(body_string(resp).await, r#"{"role":"admin"}"#);

        let resp = send(&store, request(Method::GET, "/users-api/users/2", Bytes::new())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(resp).await, "");
    }

    #[tokio::test]
    async fn test_dispatch_reads_headers_and_body() {
        let store = Arc::new(InMemoryStore::new());
        create_users_api(&store).await;

        let req = Request::builder()
            .method(Method::POST)
            .uri("/users-api/users?source=test")
            .header("Content-Type", "application/json; charset=utf-8")
            .header("X-Tenant", "acme")
            .body(Full::new(Bytes::from(r#"{"name":"john"}"#)))
            .unwrap();
        let resp = send(&store, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers()["content-type"], "text/plain");
        assert_eq!(body_string(resp).await, "created");
    }

    #[tokio::test]
    async fn test_dispatch_errors() {
        let store = Arc::new(InMemoryStore::new());
        create_users_api(&store).await;

        let resp = send(&store, request(Method::GET, "/users-api/users/1/extra", Bytes::new())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json: Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(json["type"], "Not Found");

        let req = Request::builder()
            .method(Method::POST)
            .uri("/users-api/users")
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from("{broken")))
            .unwrap();
        let resp = send(&store, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(&store, request(Method::OPTIONS, "/users-api/users", Bytes::new())).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
