//! Core PredictionService trait

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::types::{MealCategory, MealRecord, RecommendationRequest, UploadFile};
use crate::Result;

/// The external prediction endpoints, as seen by the wizards.
///
/// Every method issues exactly one request and returns the decoded JSON body
/// unmodified. Implementations never retry, cache, or queue. Cancelling the
/// token abandons the request and yields [`crate::NutriscopeError::Cancelled`].
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// `POST /analyze-meal`. A missing description is sent as `"none"`.
    async fn analyze_meal(
        &self,
        image: &UploadFile,
        description: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Value>;

    /// `POST /predict-glucose-from-all`.
    async fn predict_glucose(
        &self,
        request: &GlucoseRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<Value>;

    /// `POST /predict-gut-health`.
    async fn predict_gut_health(
        &self,
        microbiome: &UploadFile,
        cancel: &CancellationToken,
    ) -> Result<Value>;

    /// `POST /recommend-meal` (JSON body).
    async fn recommend_meal(
        &self,
        request: &RecommendationRequest,
        cancel: &CancellationToken,
    ) -> Result<Value>;

    /// `POST /api/meals/save` (JSON body).
    async fn save_meal(&self, record: &MealRecord, cancel: &CancellationToken) -> Result<Value>;
}

/// Inputs of a glucose-response prediction.
#[derive(Debug, Clone, Copy)]
pub struct GlucoseRequest<'a> {
    pub image: &'a UploadFile,
    pub biomarkers: &'a UploadFile,
    pub microbiome: &'a UploadFile,
    pub meal_category: MealCategory,
    pub description: Option<&'a str>,
}
