//! Mock API CRUD handlers.

use crate::api::types::*;
use crate::model::MockApiDefinition;
use crate::store::InMemoryStore;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use std::fmt::Display;
use tracing::warn;

/// GET /mocks - List all mock APIs
pub fn handle_list(store: &InMemoryStore) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &store.list())
}

/// POST /mocks - Create a mock API
pub async fn handle_create<B>(req: Request<B>, store: &InMemoryStore) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let definition = match read_definition(req).await {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    match store.create(definition) {
        Ok(api) => build_response_with_headers(
            StatusCode::CREATED,
            [
                ("Location", format!("/mocks/{}", api.id)),
                ("Content-Type", "application/json".to_string()),
            ],
            serde_json::json!({"id": api.id}).to_string(),
        ),
        Err(e) => {
            warn!("Rejected mock API: {}", e);
            store_error_response(&e)
        }
    }
}

/// GET /mocks/:id - Get one mock API
pub fn handle_get(id: &str, store: &InMemoryStore) -> Response<Full<Bytes>> {
    match store.get(id) {
        Ok(api) => json_response(StatusCode::OK, &api),
        Err(e) => store_error_response(&e),
    }
}

/// PUT /mocks/:id - Replace a mock API
pub async fn handle_update<B>(
    id: &str,
    req: Request<B>,
    store: &InMemoryStore,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let definition = match read_definition(req).await {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    match store.update(id, definition) {
        Ok(_) => build_response(StatusCode::NO_CONTENT, Bytes::new()),
        Err(e) => {
            warn!(api_id = %id, "Rejected mock API update: {}", e);
            store_error_response(&e)
        }
    }
}

/// DELETE /mocks/:id - Delete a mock API
pub fn handle_delete(id: &str, store: &InMemoryStore) -> Response<Full<Bytes>> {
    match store.delete(id) {
        Ok(()) => build_response(StatusCode::NO_CONTENT, Bytes::new()),
        Err(e) => store_error_response(&e),
    }
}

async fn read_definition<B>(req: Request<B>) -> Result<MockApiDefinition, Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let body = collect_body(req.into_body())
        .await
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, &e))?;

    serde_json::from_slice(&body).map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            &format!("Invalid mock API JSON: {e}"),
        )
    })
}
