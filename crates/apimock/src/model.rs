//! Mock API data model.
//!
//! Definitions (`MockApiDefinition`, `OperationDefinition`) are what clients
//! and config files author. Stored values (`MockApi`, `Operation`) are built
//! only by the store and always carry a matcher compiled from the current
//! full path.

use crate::body::ContentType;
use crate::condition::Scope;
use crate::pattern::{sanitize, RouteKey, UrlMatcher};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// Authoring Types
// ============================================================================

/// One conditional response of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    /// Condition expression; required unless this is the default scenario
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
    #[serde(default)]
    pub http_code: u16,
    /// Evaluation priority, ascending
    #[serde(default)]
    pub order: i32,
    #[serde(default, alias = "default")]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl Scenario {
    /// The condition text, if present and not blank.
    pub fn condition(&self) -> Option<&str> {
        self.conditions
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDefinition {
    /// Kept on update when it already belongs to the same API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub method: String,
    /// Path template relative to the API base path, e.g. `/users/{id}`
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockApiDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_path: String,
    #[serde(default)]
    pub operations: Vec<OperationDefinition>,
}

// ============================================================================
// Stored Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockApi {
    pub id: String,
    pub name: String,
    pub base_path: String,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    pub method: String,
    pub path: String,
    /// `sanitize(base_path + "/" + path)`
    pub full_path: String,
    pub scenarios: Vec<Scenario>,
    #[serde(skip)]
    matcher: UrlMatcher,
    #[serde(skip)]
    route_key: RouteKey,
}

impl Operation {
    /// Build a stored operation, deriving its full path and matcher.
    pub fn build(
        id: String,
        base_path: &str,
        definition: OperationDefinition,
    ) -> Result<Self, regex::Error> {
        let method = definition.method.trim().to_ascii_uppercase();
        let full_path = sanitize(&format!("{}/{}", base_path, definition.path));
        let matcher = UrlMatcher::compile(&full_path)?;
        let route_key = matcher.route_key(&method)?;

        Ok(Self {
            id,
            method,
            path: definition.path,
            full_path,
            scenarios: definition.scenarios,
            matcher,
            route_key,
        })
    }

    pub fn matcher(&self) -> &UrlMatcher {
        &self.matcher
    }

    pub fn route_key(&self) -> &RouteKey {
        &self.route_key
    }
}

// ============================================================================
// Per-request Context
// ============================================================================

/// Everything known about one inbound call while it is being resolved.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub url: String,
    pub method: String,
    pub content_type: Option<ContentType>,
    pub raw_body: String,
    pub body: Value,
    pub headers: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    /// Filled once the matching operation is known
    pub path_params: HashMap<String, String>,
}

impl RequestContext {
    pub fn scope(&self) -> Scope<'_> {
        Scope {
            header: &self.headers,
            query: &self.query_params,
            path: &self.path_params,
            body: &self.body,
        }
    }
}
