//! HTTP plumbing shared by campus services.

pub mod health;
pub mod middleware;
pub mod response;
pub mod serde;
pub mod tracing;
