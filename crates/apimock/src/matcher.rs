//! Operation lookup: route keys against the inbound method and URL, then
//! path parameter binding.

use crate::error::ResolveError;
use crate::model::Operation;
use crate::pattern::sanitize;
use std::collections::HashMap;
use tracing::debug;

/// Find the first operation whose route key matches `method + sanitize(url)`
/// and bind its path parameters.
///
/// Operations are tried in the order given; there is no further precedence
/// between overlapping templates.
pub fn match_operation<'a>(
    operations: &'a [Operation],
    method: &str,
    url: &str,
) -> Result<(&'a Operation, HashMap<String, String>), ResolveError> {
    let path = sanitize(url);

    let operation = operations
        .iter()
        .find(|op| op.route_key().matches(method, &path))
        .ok_or_else(|| ResolveError::no_operation(method, url))?;

    debug!(
        operation_id = %operation.id,
        template = %operation.full_path,
        "Matched {} {}",
        method,
        path
    );

    Ok((operation, extract_path_params(operation, method, &path)))
}

/// Bind `param_names[i]` to capture group `i + 2` of the route key.
pub fn extract_path_params(
    operation: &Operation,
    method: &str,
    sanitized_url: &str,
) -> HashMap<String, String> {
    let Some(groups) = operation.route_key().captures(method, sanitized_url) else {
        return HashMap::new();
    };

    operation
        .matcher()
        .param_names()
        .iter()
        .enumerate()
        .filter_map(|(i, name)| {
            let raw = groups.get(i + 2)?.as_deref()?;
            Some((name.clone(), decode_param(raw)))
        })
        .collect()
}

/// Percent-decode a captured value, keeping it verbatim if it is not valid
/// percent-encoding.
fn decode_param(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OperationDefinition;

    fn operation(id: &str, method: &str, base_path: &str, path: &str) -> Operation {
        let definition = OperationDefinition {
            id: None,
            method: method.to_string(),
            path: path.to_string(),
            scenarios: Vec::new(),
        };
        Operation::build(id.to_string(), base_path, definition).unwrap()
    }

    #[test]
    fn test_single_placeholder() {
        let ops = vec![operation("a", "GET", "/api", "/users/{id}")];

        let (op, params) = match_operation(&ops, "GET", "/api/users/42").unwrap();
        assert_eq!(op.id, "a");
        assert_eq!(params.len(), 1);
        assert_eq!(params["id"], "42");

        assert!(matches!(
            match_operation(&ops, "GET", "/api/users/42/extra"),
            Err(ResolveError::NotFound(_))
        ));
    }

    #[test]
    fn test_multiple_placeholders_in_order() {
        let ops = vec![operation("a", "GET", "/api", "/users/{id}/addr/{cep}")];
        let (_, params) = match_operation(&ops, "GET", "/api/users/7/addr/01311-000").unwrap();
        assert_eq!(params["id"], "7");
        assert_eq!(params["cep"], "01311-000");
    }

    #[test]
    fn test_method_is_part_of_the_key() {
        let ops = vec![
            operation("get", "GET", "/api", "/items"),
            operation("post", "POST", "/api", "/items"),
        ];
        assert_eq!(match_operation(&ops, "POST", "/api/items").unwrap().0.id, "post");
        assert_eq!(match_operation(&ops, "GET", "/api/items").unwrap().0.id, "get");
        assert!(match_operation(&ops, "DELETE", "/api/items").is_err());
    }

    #[test]
    fn test_url_is_sanitized_before_matching() {
        let ops = vec![operation("a", "GET", "/api", "/users/{id}")];
        let (_, params) = match_operation(&ops, "GET", "//api///users/42/?page=1").unwrap();
        assert_eq!(params["id"], "42");
    }

    #[test]
    fn test_first_match_wins() {
        let ops = vec![
            operation("template", "GET", "/api", "/users/{id}"),
            operation("literal", "GET", "/api", "/users/me"),
        ];
        assert_eq!(match_operation(&ops, "GET", "/api/users/me").unwrap().0.id, "template");
    }

    #[test]
    fn test_path_params_are_percent_decoded() {
        let ops = vec![operation("a", "GET", "/api", "/files/{name}")];
        let (_, params) = match_operation(&ops, "GET", "/api/files/my%20file.txt").unwrap();
        assert_eq!(params["name"], "my file.txt");

        let (_, params) = match_operation(&ops, "GET", "/api/files/100%").unwrap();
        assert_eq!(params["name"], "100%");
    }

    #[test]
    fn test_literal_dots_do_not_match_any_character() {
        let ops = vec![operation("a", "GET", "/api", "/v1.0/status")];
        assert!(match_operation(&ops, "GET", "/api/v1.0/status").is_ok());
        assert!(match_operation(&ops, "GET", "/api/v1x0/status").is_err());
    }
}
