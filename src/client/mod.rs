//! HTTP adapter for the external prediction service.

mod builder;
mod http;

pub use builder::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, PredictionClientBuilder};
pub use http::{Endpoint, NO_DESCRIPTION, PredictionClient};
