//! apimock: an API mocking engine.
//!
//! Mock APIs are stored as operations (method + URL template) carrying
//! ordered response scenarios. An inbound request is matched to an
//! operation, its body is normalized into a JSON tree, and the first
//! scenario whose condition holds is returned, falling back to the
//! operation's default scenario.

pub mod api;
pub mod body;
pub mod condition;
pub mod config;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod pattern;
pub mod resolver;
pub mod scenario;
pub mod store;

pub use error::ResolveError;
pub use model::{MockApi, MockApiDefinition, Operation, Scenario};
pub use resolver::{resolve, ResolveRequest};
pub use store::{InMemoryStore, OperationStore, StoreError};
