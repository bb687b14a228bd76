//! Scenario selection within a matched operation.

use crate::condition;
use crate::error::ResolveError;
use crate::model::{Operation, RequestContext, Scenario};
use tracing::debug;

/// Pick the response scenario of an operation for a request.
///
/// Non-default scenarios are tried by ascending `order` (ties keep their
/// authored order) and the first whose condition holds wins. Otherwise the
/// default scenario is returned.
pub fn select<'a>(
    operation: &'a Operation,
    context: &RequestContext,
) -> Result<&'a Scenario, ResolveError> {
    let mut candidates: Vec<&Scenario> = operation
        .scenarios
        .iter()
        .filter(|s| !s.is_default)
        .collect();
    candidates.sort_by_key(|s| s.order);

    let scope = context.scope();
    for scenario in candidates {
        let Some(condition) = scenario.condition() else {
            continue;
        };
        if condition::evaluate(condition, &scope) {
            debug!(
                operation_id = %operation.id,
                scenario = %scenario.name,
                "Scenario condition matched"
            );
            return Ok(scenario);
        }
    }

    operation
        .scenarios
        .iter()
        .find(|s| s.is_default)
        .inspect(|s| debug!(operation_id = %operation.id, scenario = %s.name, "Using default scenario"))
        .ok_or_else(|| ResolveError::no_default_scenario(&operation.id))
}
