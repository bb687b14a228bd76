//! Request handlers for the HTTP API.

pub mod dispatch;
pub mod mocks;
pub mod system;
