//! Authentication: API-key presence gate at the edge.

pub mod middleware;

pub use middleware::auth_middleware;
