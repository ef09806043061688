//! Observability module - tracing and request IDs.

mod request_id;

pub use request_id::RequestIdMiddleware;
