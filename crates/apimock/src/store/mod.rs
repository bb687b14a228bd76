//! Mock API storage.
//!
//! Resolution only needs read access to operations, through
//! [`OperationStore`]. The admin API and startup config write through
//! [`InMemoryStore`].

mod inmemory;
mod validation;

pub use inmemory::InMemoryStore;
pub use validation::validate;

use crate::model::Operation;

/// Read access to stored operations.
///
/// Implementations hand out clones; callers never hold a lock while
/// evaluating conditions.
pub trait OperationStore: Send + Sync {
    /// All operations, in API insertion order then operation order.
    fn find_all_operations(&self) -> Vec<Operation>;

    /// Load one operation by its identifier.
    fn find_operation_by_id(&self, id: &str) -> Option<Operation>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Mock API {0} not found")]
    NotFound(String),
    #[error("Invalid mock API definition: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Failed to compile path template: {0}")]
    Pattern(#[from] regex::Error),
}
