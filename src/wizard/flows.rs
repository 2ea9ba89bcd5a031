//! The three prediction flows

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{Flow, FormData, Step};
use crate::traits::{GlucoseRequest, PredictionService};
use crate::types::{GlucosePrediction, GutHealthAssessment, MealAnalysis, SlotKey};
use crate::Result;

/// Meal photo (plus optional description) → nutrient breakdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct MealAnalysisFlow;

const MEAL_STEPS: &[Step] = &[
    Step {
        title: "Upload Meal Photo",
        required: &[SlotKey::MealImage],
    },
    Step {
        title: "Analysis Results",
        required: &[],
    },
];

#[async_trait]
impl Flow for MealAnalysisFlow {
    type Output = MealAnalysis;

    fn name(&self) -> &'static str {
        "meal_analysis"
    }

    fn steps(&self) -> &'static [Step] {
        MEAL_STEPS
    }

    fn missing_message(&self) -> &'static str {
        "Please upload an image of your meal"
    }

    fn success_message(&self) -> &'static str {
        "Meal analyzed successfully!"
    }

    fn failure_message(&self) -> &'static str {
        "Failed to analyze meal"
    }

    async fn run(
        &self,
        service: &dyn PredictionService,
        form: &FormData,
        cancel: &CancellationToken,
    ) -> Result<MealAnalysis> {
        let image = form.require(SlotKey::MealImage)?;
        let raw = service
            .analyze_meal(image, form.description.as_deref(), cancel)
            .await?;
        MealAnalysis::from_response(&raw)
    }
}

/// Clinical data, microbiome data, and a meal photo → glucose response.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlucoseFlow;

const GLUCOSE_STEPS: &[Step] = &[
    Step {
        title: "Upload User Data",
        required: &[SlotKey::Biomarkers, SlotKey::Microbiome],
    },
    Step {
        title: "Meal Information",
        required: &[SlotKey::MealImage],
    },
    Step {
        title: "Prediction Results",
        required: &[],
    },
];

#[async_trait]
impl Flow for GlucoseFlow {
    type Output = GlucosePrediction;

    fn name(&self) -> &'static str {
        "glucose_prediction"
    }

    fn steps(&self) -> &'static [Step] {
        GLUCOSE_STEPS
    }

    fn missing_message(&self) -> &'static str {
        "Please provide all required files"
    }

    fn success_message(&self) -> &'static str {
        "Glucose prediction complete!"
    }

    fn failure_message(&self) -> &'static str {
        "Failed to predict glucose response"
    }

    async fn run(
        &self,
        service: &dyn PredictionService,
        form: &FormData,
        cancel: &CancellationToken,
    ) -> Result<GlucosePrediction> {
        let request = GlucoseRequest {
            image: form.require(SlotKey::MealImage)?,
            biomarkers: form.require(SlotKey::Biomarkers)?,
            microbiome: form.require(SlotKey::Microbiome)?,
            meal_category: form.meal_category,
            description: form.description.as_deref(),
        };
        let raw = service.predict_glucose(&request, cancel).await?;
        GlucosePrediction::from_response(&raw)
    }
}

/// Microbiome CSV → gut-health classification.
#[derive(Debug, Clone, Copy, Default)]
pub struct GutHealthFlow;

const GUT_STEPS: &[Step] = &[
    Step {
        title: "Upload Microbiome Data",
        required: &[SlotKey::Microbiome],
    },
    Step {
        title: "Gut Health Results",
        required: &[],
    },
];

#[async_trait]
impl Flow for GutHealthFlow {
    type Output = GutHealthAssessment;

    fn name(&self) -> &'static str {
        "gut_health"
    }

    fn steps(&self) -> &'static [Step] {
        GUT_STEPS
    }

    fn missing_message(&self) -> &'static str {
        "Please upload your microbiome data file"
    }

    fn success_message(&self) -> &'static str {
        "Gut health analysis completed successfully!"
    }

    fn failure_message(&self) -> &'static str {
        "Failed to analyze microbiome data"
    }

    async fn run(
        &self,
        service: &dyn PredictionService,
        form: &FormData,
        cancel: &CancellationToken,
    ) -> Result<GutHealthAssessment> {
        let file = form.require(SlotKey::Microbiome)?;
        let raw = service.predict_gut_health(file, cancel).await?;
        GutHealthAssessment::from_response(&raw)
    }
}
