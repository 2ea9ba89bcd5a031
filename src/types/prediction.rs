//! Prediction response schemas.
//!
//! The services return loosely shaped JSON. Each flow normalizes the raw
//! body exactly once through the `from_response` constructors below, so
//! rendering code only ever sees these types. Required fields are plain
//! values; everything the services may omit is an `Option` (or an empty
//! `Vec`) and gets its display fallback in [`crate::render`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{NutriscopeError, Result};

/// Macronutrient split and health flags for a meal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_pct: Option<f64>,
    /// `1` when refined carbohydrates were detected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refined_carb: Option<f64>,
    /// `1` when the meal carries a high sugar risk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar_risk: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl MacroBreakdown {
    pub fn has_refined_carbs(&self) -> bool {
        self.refined_carb == Some(1.0)
    }

    pub fn has_sugar_risk(&self) -> bool {
        self.sugar_risk == Some(1.0)
    }

    /// Parse a nutrition object, unwrapping one level of `nutrition` nesting.
    ///
    /// `/analyze-meal` answers `{nutrition: {nutrition: {...}}}` while
    /// `/predict-glucose-from-all` answers `{nutrition: {...}}`.
    fn from_nutrition_value(value: Option<&Value>) -> Result<Self> {
        let Some(value) = value else {
            return Ok(Self::default());
        };
        let inner = match value.get("nutrition") {
            Some(nested) if nested.is_object() => nested,
            _ => value,
        };
        if inner.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(inner.clone())
            .map_err(|e| NutriscopeError::Schema(format!("nutrition: {e}")))
    }
}

/// Normalized `/analyze-meal` result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealAnalysis {
    pub nutrition: MacroBreakdown,
}

impl MealAnalysis {
    pub fn from_response(value: &Value) -> Result<Self> {
        let body = expect_object(value)?;
        Ok(Self {
            nutrition: MacroBreakdown::from_nutrition_value(body.get("nutrition"))?,
        })
    }
}

/// Predicted glucose curve for one meal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlucoseCurve {
    /// Rise over baseline after 30 minutes, mg/dL.
    #[serde(default)]
    pub spike_30min: Option<f64>,
    /// Rise over baseline after 60 minutes, mg/dL.
    #[serde(default)]
    pub spike_60min: Option<f64>,
    /// Overall impact on a 0–10 scale.
    #[serde(default)]
    pub impact_score: Option<f64>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub factors: Vec<String>,
}

/// Normalized `/predict-glucose-from-all` result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlucosePrediction {
    pub caption: Option<String>,
    pub nutrition: MacroBreakdown,
    pub glucose: GlucoseCurve,
}

impl GlucosePrediction {
    pub fn from_response(value: &Value) -> Result<Self> {
        let body = expect_object(value)?;
        let curve = body
            .get("glucose_prediction")
            .filter(|v| !v.is_null())
            .ok_or_else(|| NutriscopeError::Schema("missing glucose_prediction".to_string()))?;
        let glucose: GlucoseCurve = serde_json::from_value(curve.clone())
            .map_err(|e| NutriscopeError::Schema(format!("glucose_prediction: {e}")))?;
        let caption = body
            .get("caption")
            .and_then(Value::as_str)
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string);

        Ok(Self {
            caption,
            nutrition: MacroBreakdown::from_nutrition_value(body.get("nutrition"))?,
            glucose,
        })
    }
}

/// Normalized `/predict-gut-health` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GutHealthAssessment {
    /// Category label, e.g. `Good` or `Bad`.
    pub prediction: String,
    /// Probability of the `Good` class, 0–1.
    #[serde(default)]
    pub probability_good: Option<f64>,
}

impl GutHealthAssessment {
    pub fn from_response(value: &Value) -> Result<Self> {
        expect_object(value)?;
        serde_json::from_value(value.clone())
            .map_err(|e| NutriscopeError::Schema(format!("gut health: {e}")))
    }

    pub fn is_good(&self) -> bool {
        self.prediction == "Good"
    }
}

fn expect_object(value: &Value) -> Result<&serde_json::Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| NutriscopeError::Schema("expected a JSON object".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meal_analysis_unwraps_double_nesting() {
        let raw = json!({"nutrition": {"nutrition": {"carbs_pct": 40, "protein_pct": 30, "fat_pct": 30}}});
        let meal = MealAnalysis::from_response(&raw).unwrap();
        assert_eq!(meal.nutrition.carbs_pct, Some(40.0));
        assert_eq!(meal.nutrition.fat_pct, Some(30.0));
        assert_eq!(meal.nutrition.recommendation, None);
    }

    #[test]
    fn meal_analysis_without_nutrition_is_empty() {
        let meal = MealAnalysis::from_response(&json!({})).unwrap();
        assert_eq!(meal, MealAnalysis::default());
    }

    #[test]
    fn flags_compare_against_one() {
        let raw = json!({"nutrition": {"nutrition": {"refined_carb": 1, "sugar_risk": 0}}});
        let meal = MealAnalysis::from_response(&raw).unwrap();
        assert!(meal.nutrition.has_refined_carbs());
        assert!(!meal.nutrition.has_sugar_risk());
    }

    #[test]
    fn glucose_prediction_reads_flat_nutrition() {
        let raw = json!({
            "caption": "A dish containing rice (91.0%)",
            "nutrition": {"carbs_pct": 55, "protein_pct": 20, "fat_pct": 25},
            "gut_health": "good",
            "glucose_prediction": {"spike_30min": 32.5, "spike_60min": 18, "impact_score": 6, "factors": ["age"]}
        });
        let prediction = GlucosePrediction::from_response(&raw).unwrap();
        assert_eq!(prediction.caption.as_deref(), Some("A dish containing rice (91.0%)"));
        assert_eq!(prediction.nutrition.carbs_pct, Some(55.0));
        assert_eq!(prediction.glucose.spike_30min, Some(32.5));
        assert_eq!(prediction.glucose.factors, vec!["age".to_string()]);
    }

    #[test]
    fn glucose_prediction_requires_curve() {
        let err = GlucosePrediction::from_response(&json!({"caption": "x"})).unwrap_err();
        assert!(matches!(err, NutriscopeError::Schema(_)));
    }

    #[test]
    fn gut_health_probability_optional() {
        let bad = GutHealthAssessment::from_response(&json!({"prediction": "Bad"})).unwrap();
        assert_eq!(bad.probability_good, None);
        assert!(!bad.is_good());
    }

    #[test]
    fn gut_health_requires_prediction() {
        let err = GutHealthAssessment::from_response(&json!({"probability_good": 0.4})).unwrap_err();
        assert!(matches!(err, NutriscopeError::Schema(_)));
    }
}
