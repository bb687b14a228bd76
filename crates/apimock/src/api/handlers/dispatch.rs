//! Mock dispatcher: answers every non-admin request from the stored mocks.

use crate::api::types::*;
use crate::body::ContentType;
use crate::model::Scenario;
use crate::resolver::{resolve, ResolveRequest};
use crate::store::OperationStore;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use std::collections::HashMap;
use std::fmt::Display;
use tracing::{debug, warn};

/// Resolve a request against the stored mocks and write the chosen scenario.
pub async fn handle_dispatch<B, S>(req: Request<B>, store: &S) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
    S: OperationStore + ?Sized,
{
    if !matches!(
        *req.method(),
        Method::GET | Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    ) {
        return method_not_allowed();
    }

    let (parts, body) = req.into_parts();
    let raw = match collect_body(body).await {
        Ok(b) => String::from_utf8_lossy(&b).into_owned(),
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let request = resolve_request(&parts.method, &parts.uri, &parts.headers, raw);
    match resolve(store, request) {
        Ok(scenario) => scenario_response(&scenario),
        Err(e) => {
            warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                "Mock resolution failed: {}",
                e
            );
            resolve_error_response(&e)
        }
    }
}

fn resolve_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    raw_body: String,
) -> ResolveRequest {
    ResolveRequest {
        method: method.as_str().to_string(),
        url: uri.path().to_string(),
        headers: header_map(headers),
        query_params: parse_query(uri.query()),
        raw_body,
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ContentType::from_header),
    }
}

/// Header names lower-cased; the first value of a repeated header wins.
fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (name, value) in headers {
        map.entry(name.as_str().to_ascii_lowercase())
            .or_insert_with(|| String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}

/// Decode a query string; the first value of a repeated parameter wins.
fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let Some(query) = query else {
        return params;
    };
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(decode_component(key))
            .or_insert_with(|| decode_component(value));
    }
    params
}

fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn scenario_response(scenario: &Scenario) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(scenario.http_code).unwrap_or_else(|_| {
        warn!(
            scenario = %scenario.name,
            http_code = scenario.http_code,
            "Invalid scenario status code"
        );
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let body = scenario.body.clone().unwrap_or_default();
    let mut response = build_response(status, body);
    let headers = response.headers_mut();

    for (name, value) in &scenario.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => debug!(header = %name, "Skipping invalid scenario header"),
        }
    }
    if let Some(content_type) = scenario.content_type {
        headers.append(CONTENT_TYPE, HeaderValue::from_static(content_type.mime()));
    }

    response
}
