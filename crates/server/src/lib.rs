//! HTTP layer: axum router, request extractors, error mapping and the
//! process startup sequence.

pub mod errors;
pub mod extract;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod startup;
pub mod state;

pub use startup::{run, Application};
