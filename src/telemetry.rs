//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder (e.g. prometheus, statsd);
//! without a recorder installed, all metric calls are no-ops.
//!
//! All metrics are prefixed with `nutriscope_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `endpoint`: service path (e.g. "/analyze-meal")
//! - `flow`: wizard flow (e.g. "meal_analysis", "gut_health")
//! - `status`: "ok" or "error"; `outcome`: "ok", "error" or "discarded"
//! - `severity`: notification severity

/// Total HTTP requests issued to the prediction service.
///
/// Labels: `endpoint`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "nutriscope_requests_total";

/// Request duration in seconds.
///
/// Labels: `endpoint`.
pub const REQUEST_DURATION_SECONDS: &str = "nutriscope_request_duration_seconds";

/// Total wizard submissions that reached the network.
///
/// Labels: `flow`, `outcome` ("ok" | "error" | "discarded").
pub const SUBMISSIONS_TOTAL: &str = "nutriscope_submissions_total";

/// Total notifications enqueued.
///
/// Labels: `severity`.
pub const NOTIFICATIONS_TOTAL: &str = "nutriscope_notifications_total";
