use super::StoreError;
use crate::condition;
use crate::model::{MockApiDefinition, OperationDefinition};
use crate::pattern::sanitize;
use std::collections::HashSet;
use tracing::warn;

const ALLOWED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Validate a mock API definition, collecting every violation.
pub fn validate(definition: &MockApiDefinition) -> Result<(), StoreError> {
    let mut errors = Vec::new();

    if definition.name.trim().is_empty() {
        errors.push("The property 'name' cannot be empty".to_string());
    }
    if !definition.base_path.starts_with('/') {
        errors.push("The property 'basePath' should start with a slash".to_string());
    } else if definition.base_path.len() < 2 {
        errors.push(
            "The property 'basePath' should contain at least one character after the slash"
                .to_string(),
        );
    }
    if definition.operations.is_empty() {
        errors.push("At least one operation is required".to_string());
    }

    let mut seen = HashSet::new();
    for operation in &definition.operations {
        let method = operation.method.trim().to_ascii_uppercase();
        if !seen.insert((method, sanitize(&operation.path))) {
            errors.push(format!(
                "Duplicate operation {} {}",
                operation.method, operation.path
            ));
        }
        validate_operation(operation, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(StoreError::Validation(errors))
    }
}

fn validate_operation(operation: &OperationDefinition, errors: &mut Vec<String>) {
    let path = &operation.path;
    let method = operation.method.trim().to_ascii_uppercase();

    if !ALLOWED_METHODS.contains(&method.as_str()) {
        errors.push(format!(
            "Operation {path}: method '{}' is not one of {}",
            operation.method,
            ALLOWED_METHODS.join(", ")
        ));
    }
    if !path.starts_with('/') {
        errors.push(format!("Operation {path}: 'path' should start with a slash"));
    }
    if operation.scenarios.is_empty() {
        errors.push(format!("Operation {path}: at least one scenario is required"));
        return;
    }

    let defaults = operation.scenarios.iter().filter(|s| s.is_default).count();
    if defaults != 1 {
        errors.push(format!(
            "Operation {path}: there should be exactly one default scenario, found {defaults}"
        ));
    }

    for scenario in &operation.scenarios {
        let name = &scenario.name;
        if name.trim().is_empty() {
            errors.push(format!("Operation {path}: scenario 'name' cannot be empty"));
        }
        if !(100..=599).contains(&scenario.http_code) {
            errors.push(format!(
                "Operation {path}, scenario '{name}': 'httpCode' should be between 100 and 599"
            ));
        }
        if scenario.order <= 0 {
            errors.push(format!(
                "Operation {path}, scenario '{name}': 'order' should be a positive number"
            ));
        }
        if scenario.is_default {
            continue;
        }
        match scenario.condition() {
            None => errors.push(format!(
                "Operation {path}, scenario '{name}': only the default scenario may have empty 'conditions'"
            )),
            // Accepted as authored; such a scenario simply never matches.
            Some(expression) => {
                if let Err(e) = condition::check(expression) {
                    warn!(
                        operation = %path,
                        scenario = %name,
                        error = %e,
                        "Scenario condition does not parse and will never match"
                    );
                }
            }
        }
    }
}
