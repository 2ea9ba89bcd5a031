//! HTTP client for the prediction service.
//!
//! File-bearing endpoints are called with `multipart/form-data`, the rest
//! with JSON bodies. Response bodies are passed through as decoded JSON.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::builder::PredictionClientBuilder;
use crate::session::SessionStore;
use crate::telemetry;
use crate::traits::{GlucoseRequest, PredictionService};
use crate::types::{MealRecord, RecommendationRequest, UploadFile};
use crate::{NutriscopeError, Result};

/// Value sent for `description` when the user gave none.
pub const NO_DESCRIPTION: &str = "none";

/// Service endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    AnalyzeMeal,
    PredictGlucose,
    PredictGutHealth,
    RecommendMeal,
    SaveMeal,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::AnalyzeMeal => "/analyze-meal",
            Self::PredictGlucose => "/predict-glucose-from-all",
            Self::PredictGutHealth => "/predict-gut-health",
            Self::RecommendMeal => "/recommend-meal",
            Self::SaveMeal => "/api/meals/save",
        }
    }

    /// Message used when a failure carries no server-provided message.
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::AnalyzeMeal => "Failed to analyze meal",
            Self::PredictGlucose => "Failed to predict glucose response",
            Self::PredictGutHealth => "Failed to analyze microbiome data",
            Self::RecommendMeal => "Failed to get meal recommendations",
            Self::SaveMeal => "Failed to save meal",
        }
    }
}

enum Body {
    Multipart(Form),
    Json(Value),
}

/// Client for the nutrition prediction service.
///
/// Attaches `Authorization: Bearer <token>` when the attached session holds
/// a token. A `401` signs the session out and yields
/// [`NutriscopeError::SessionExpired`].
#[derive(Clone)]
pub struct PredictionClient {
    pub(super) http: Client,
    pub(super) base_url: String,
    pub(super) session: Option<SessionStore>,
}

impl PredictionClient {
    pub fn builder() -> PredictionClientBuilder {
        PredictionClientBuilder::new()
    }

    /// Client with default settings against `base_url` (for testing with wiremock).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::builder().base_url(base_url).build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, endpoint: Endpoint, body: Body, cancel: &CancellationToken) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        let mut request = self.http.post(&url).header(header::ACCEPT, "application/json");
        request = match body {
            Body::Multipart(form) => request.multipart(form),
            Body::Json(json) => request.json(&json),
        };
        if let Some(token) = self.session.as_ref().and_then(SessionStore::token) {
            request = request.bearer_auth(token);
        }

        debug!(endpoint = endpoint.path(), "sending request");
        let start = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(NutriscopeError::Cancelled),
            result = self.execute(request, endpoint) => result,
        };
        record_request(endpoint, start, outcome.is_ok());
        if let Err(ref e) = outcome {
            debug!(endpoint = endpoint.path(), error = %e, "request failed");
        }
        outcome
    }

    async fn execute(&self, request: RequestBuilder, endpoint: Endpoint) -> Result<Value> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.expire_session();
            return Err(NutriscopeError::SessionExpired);
        }

        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = server_message(&body)
                .unwrap_or_else(|| endpoint.fallback_message().to_string());
            return Err(NutriscopeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| NutriscopeError::Schema(format!("invalid JSON body: {e}")))?;

        if let Some(message) = flagged_error(&value, endpoint) {
            return Err(NutriscopeError::ServerReported { message });
        }

        Ok(value)
    }

    fn expire_session(&self) {
        let Some(session) = &self.session else {
            return;
        };
        warn!("service rejected credentials; signing out");
        if let Err(e) = session.logout() {
            warn!(error = %e, "failed to clear persisted session");
        }
    }
}

/// Check a response status/transport failure and map to our error type.
fn transport_error(err: reqwest::Error) -> NutriscopeError {
    if err.is_timeout() {
        NutriscopeError::Timeout
    } else {
        NutriscopeError::Http(err.to_string())
    }
}

/// Extract a message from an error body: `error`, then `message`, then `detail`.
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message", "detail"]
        .iter()
        .find_map(|key| non_empty_str(value.get(key)))
}

/// A 2xx body with a truthy `error` field is a failure.
fn flagged_error(value: &Value, endpoint: Endpoint) -> Option<String> {
    let error = value.get("error").filter(|e| is_truthy(e))?;
    Some(
        non_empty_str(Some(error))
            .or_else(|| non_empty_str(value.get("message")))
            .unwrap_or_else(|| endpoint.fallback_message().to_string()),
    )
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `false`, `0`, `""` and `null` do not flag a response.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn file_part(file: &UploadFile) -> Result<Part> {
    Part::bytes(file.bytes().to_vec())
        .file_name(file.name().to_string())
        .mime_str(file.mime())
        .map_err(|e| {
            NutriscopeError::Validation(format!("invalid MIME type {:?}: {e}", file.mime()))
        })
}

fn description_field(description: Option<&str>) -> String {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(NO_DESCRIPTION)
        .to_string()
}

fn record_request(endpoint: Endpoint, start: Instant, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!(telemetry::REQUESTS_TOTAL,
        "endpoint" => endpoint.path(),
        "status" => status,
    )
    .increment(1);
    metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
        "endpoint" => endpoint.path(),
    )
    .record(start.elapsed().as_secs_f64());
}

#[async_trait]
impl PredictionService for PredictionClient {
    async fn analyze_meal(
        &self,
        image: &UploadFile,
        description: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let form = Form::new()
            .part("image", file_part(image)?)
            .text("description", description_field(description));
        self.send(Endpoint::AnalyzeMeal, Body::Multipart(form), cancel)
            .await
    }

    async fn predict_glucose(
        &self,
        request: &GlucoseRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let form = Form::new()
            .part("image", file_part(request.image)?)
            .part("bio_file", file_part(request.biomarkers)?)
            .part("micro_file", file_part(request.microbiome)?)
            .text("meal_category", request.meal_category.as_str())
            .text("description", description_field(request.description));
        self.send(Endpoint::PredictGlucose, Body::Multipart(form), cancel)
            .await
    }

    async fn predict_gut_health(
        &self,
        microbiome: &UploadFile,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let form = Form::new().part("file", file_part(microbiome)?);
        self.send(Endpoint::PredictGutHealth, Body::Multipart(form), cancel)
            .await
    }

    async fn recommend_meal(
        &self,
        request: &RecommendationRequest,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let body = serde_json::to_value(request)?;
        self.send(Endpoint::RecommendMeal, Body::Json(body), cancel)
            .await
    }

    async fn save_meal(&self, record: &MealRecord, cancel: &CancellationToken) -> Result<Value> {
        let body = serde_json::to_value(record)?;
        self.send(Endpoint::SaveMeal, Body::Json(body), cancel).await
    }
}
