//! HTTP routes for the aggregation service.

pub mod routes;

pub use routes::{get_product, health, service_descriptor};
