//! HTTP API: mock administration under `/mocks` plus the mock dispatcher.
//!
//! - `GET /health`
//! - `GET /mocks`, `POST /mocks`
//! - `GET /mocks/:id`, `PUT /mocks/:id`, `DELETE /mocks/:id`
//! - anything else is answered from the stored mocks

mod handlers;
mod router;
mod server;
mod types;

pub use router::route_request;
pub use server::MockServer;
pub use types::ErrorMessage;
