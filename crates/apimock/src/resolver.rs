//! Request resolution: inbound call in, response scenario out.

use crate::body::{self, ContentType};
use crate::error::ResolveError;
use crate::matcher::match_operation;
use crate::model::{RequestContext, Scenario};
use crate::scenario;
use crate::store::OperationStore;
use std::collections::HashMap;
use tracing::{debug, error};

/// Transport-independent view of an inbound call.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    pub method: String,
    /// Request path; a `?query` suffix is ignored for matching
    pub url: String,
    pub headers: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    pub raw_body: String,
    /// From the `Content-Type` header; `None` when absent
    pub content_type: Option<ContentType>,
}

impl ResolveRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, content_type: Option<ContentType>, raw: impl Into<String>) -> Self {
        self.content_type = content_type;
        self.raw_body = raw.into();
        self
    }
}

/// Resolve an inbound call to the scenario that should answer it.
///
/// The body is normalized first, so a malformed body is rejected before any
/// operation lookup or condition evaluation.
pub fn resolve<S>(store: &S, request: ResolveRequest) -> Result<Scenario, ResolveError>
where
    S: OperationStore + ?Sized,
{
    let normalized = body::normalize(&request.raw_body, request.content_type)?;

    let operations = store.find_all_operations();
    let (matched, path_params) = match_operation(&operations, &request.method, &request.url)?;

    let operation = store.find_operation_by_id(&matched.id).ok_or_else(|| {
        error!(operation_id = %matched.id, "Matched operation could not be loaded");
        ResolveError::Internal(
            "The requested operation was found but could not be loaded".to_string(),
        )
    })?;

    let context = RequestContext {
        url: request.url,
        method: request.method,
        content_type: request.content_type,
        raw_body: request.raw_body,
        body: normalized,
        headers: request.headers,
        query_params: request.query_params,
        path_params,
    };

    let scenario = scenario::select(&operation, &context)?;
    debug!(
        operation_id = %operation.id,
        scenario = %scenario.name,
        http_code = scenario.http_code,
        "Resolved {} {}",
        context.method,
        context.url
    );
    Ok(scenario.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MockApiDefinition, Operation, OperationDefinition};
    use crate::store::InMemoryStore;

    fn scenario(name: &str, order: i32, conditions: Option<&str>, is_default: bool) -> Scenario {
        Scenario {
            name: name.to_string(),
            conditions: conditions.map(str::to_string),
            http_code: if is_default { 200 } else { 201 },
            order,
            is_default,
            content_type: Some(ContentType::Json),
            body: Some(format!(r#"{{"scenario":"{name}"}}"#)),
            headers: HashMap::new(),
        }
    }

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .create(MockApiDefinition {
                name: "Users".into(),
                base_path: "/api".into(),
                operations: vec![
                    OperationDefinition {
                        id: None,
                        method: "GET".into(),
                        path: "/users/{id}".into(),
                        scenarios: vec![
                            scenario("default", 1, None, true),
                            scenario("admin", 1, Some("$path.id == 1"), false),
                            scenario("tomcat", 2, Some("$header.server == 'Tomcat'"), false),
                        ],
                    },
                    OperationDefinition {
                        id: None,
                        method: "POST".into(),
                        path: "/users".into(),
                        scenarios: vec![
                            scenario("default", 1, None, true),
                            scenario("married", 1, Some("$body.married == true"), false),
                        ],
                    },
                ],
            })
            .unwrap();
        store
    }

    #[test]
    fn test_path_condition() {
        let s = resolve(&store(), ResolveRequest::new("GET", "/api/users/1")).unwrap();
        assert_eq!(s.name, "admin");
        assert_eq!(s.http_code, 201);
    }

    #[test]
    fn test_header_condition_and_default() {
        let store = store();
        let req = ResolveRequest::new("GET", "/api/users/2").header("server", "Tomcat");
        assert_eq!(resolve(&store, req).unwrap().name, "tomcat");

        let req = ResolveRequest::new("GET", "/api/users/2");
        assert_eq!(resolve(&store, req).unwrap().name, "default");
    }

    #[test]
    fn test_body_conditions_per_content_type() {
        let store = store();
        let req = ResolveRequest::new("POST", "/api/users")
            .body(Some(ContentType::Json), r#"{"married": true}"#);
        assert_eq!(resolve(&store, req).unwrap().name, "married");

        let req = ResolveRequest::new("POST", "/api/users")
            .body(Some(ContentType::UrlEncoded), "name=john&married=true");
        assert_eq!(resolve(&store, req).unwrap().name, "married");

        // XML leaves are strings, so a boolean comparison does not hold
        let req = ResolveRequest::new("POST", "/api/users")
            .body(Some(ContentType::Xml), "<married>true</married>");
        assert_eq!(resolve(&store, req).unwrap().name, "default");
    }

    #[test]
    fn test_malformed_body_is_bad_request_even_without_match() {
        let req = ResolveRequest::new("POST", "/nowhere").body(Some(ContentType::Json), "{");
        assert!(matches!(
            resolve(&store(), req),
            Err(ResolveError::BadRequest(_))
        ));
    }

    #[test]
    fn test_unmatched_url_is_not_found() {
        let store = store();
        for (method, url) in [
            ("GET", "/api/users/42/extra"),
            ("DELETE", "/api/users/1"),
            ("GET", "/other"),
        ] {
            assert!(matches!(
                resolve(&store, ResolveRequest::new(method, url)),
                Err(ResolveError::NotFound(_))
            ));
        }
    }

    /// Lists operations that it then fails to load by id.
    struct StaleStore {
        operations: Vec<Operation>,
    }

    impl OperationStore for StaleStore {
        fn find_all_operations(&self) -> Vec<Operation> {
            self.operations.clone()
        }

        fn find_operation_by_id(&self, _id: &str) -> Option<Operation> {
            None
        }
    }

    #[test]
    fn test_stale_lookup_is_internal_error() {
        let stale = StaleStore {
            operations: store().find_all_operations(),
        };
        assert!(matches!(
            resolve(&stale, ResolveRequest::new("GET", "/api/users/1")),
            Err(ResolveError::Internal(_))
        ));
    }

    #[test]
    fn test_resolve_through_trait_object() {
        let store: Box<dyn OperationStore> = Box::new(store());
        let s = resolve(store.as_ref(), ResolveRequest::new("GET", "/api/users/1")).unwrap();
        assert_eq!(s.name, "admin");
    }
}
