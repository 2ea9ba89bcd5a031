//! Text rendering of prediction results.
//!
//! Each report wraps a normalized result and renders it with `Display`.
//! All display fallbacks live here: missing percentages render as `0%`,
//! a missing probability as `N/A`, missing advice as the default text.

use std::fmt;

use crate::types::{GlucosePrediction, GutHealthAssessment, MacroBreakdown, MealAnalysis};

pub const DEFAULT_MEAL_ADVICE: &str = "This meal appears balanced. It contains a good mix of nutrients and should provide sustained energy.";

pub const DEFAULT_GLUCOSE_ADVICE: &str = "Based on your unique profile, this meal will produce a moderate glucose response. Consider balancing with physical activity after eating.";

pub const NO_FACTORS: &str = "Standard metabolic response expected";

pub const GUT_HEALTH_ADVICE: &str = "Based on your gut microbiome profile, consider increasing your intake of diverse plant-based foods to enhance microbial diversity. Fermented foods like yogurt and sauerkraut may help improve beneficial bacteria levels.";

pub const NOT_AVAILABLE: &str = "N/A";

/// `40` → `40%`, `12.5` → `12.5%`, missing → `0%`.
pub fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v}%"),
        None => "0%".to_string(),
    }
}

/// Probability in 0–1 as a percentage with one decimal, or `N/A`.
pub fn probability(value: Option<f64>) -> String {
    match value {
        Some(p) if p.is_finite() => format!("{:.1}%", p * 100.0),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// `carbs%/protein%/fat%`.
pub fn macros_line(nutrition: &MacroBreakdown) -> String {
    format!(
        "{}/{}/{}",
        percent(nutrition.carbs_pct),
        percent(nutrition.protein_pct),
        percent(nutrition.fat_pct)
    )
}

/// Severity band of a glucose rise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpikeLevel {
    Normal,
    Elevated,
    High,
}

impl SpikeLevel {
    /// `> 40` mg/dL high, `> 20` elevated.
    pub fn classify(mg_dl: f64) -> Self {
        if mg_dl > 40.0 {
            Self::High
        } else if mg_dl > 20.0 {
            Self::Elevated
        } else {
            Self::Normal
        }
    }
}

impl fmt::Display for SpikeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Elevated => "elevated",
            Self::High => "high",
        })
    }
}

/// Severity band of the 0–10 impact score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactLevel {
    Low,
    Moderate,
    High,
}

impl ImpactLevel {
    /// `> 7` high, `> 4` moderate.
    pub fn classify(score: f64) -> Self {
        if score > 7.0 {
            Self::High
        } else if score > 4.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        })
    }
}

/// Impact score scaled to a 0–100 progress bar.
pub fn impact_bar(score: f64) -> f64 {
    (score * 10.0).clamp(0.0, 100.0)
}

/// Nutrient breakdown of an analyzed meal.
pub struct MealReport<'a>(pub &'a MealAnalysis);

impl MealReport<'_> {
    pub fn macros(&self) -> String {
        macros_line(&self.0.nutrition)
    }

    pub fn refined_carbs(&self) -> &'static str {
        if self.0.nutrition.has_refined_carbs() {
            "present"
        } else {
            "not present"
        }
    }

    pub fn sugar_risk(&self) -> &'static str {
        if self.0.nutrition.has_sugar_risk() {
            "high"
        } else {
            "low"
        }
    }

    pub fn recommendation(&self) -> &str {
        self.0
            .nutrition
            .recommendation
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(DEFAULT_MEAL_ADVICE)
    }
}

impl fmt::Display for MealReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = &self.0.nutrition;
        writeln!(f, "Analysis Results")?;
        writeln!(f, "  Macronutrients (carbs/protein/fat): {}", self.macros())?;
        writeln!(f, "    Carbohydrates: {}", percent(n.carbs_pct))?;
        writeln!(f, "    Protein:       {}", percent(n.protein_pct))?;
        writeln!(f, "    Fat:           {}", percent(n.fat_pct))?;
        writeln!(f, "  Refined carbs: {}", self.refined_carbs())?;
        writeln!(f, "  Sugar risk:    {}", self.sugar_risk())?;
        write!(f, "  Recommendation: {}", self.recommendation())
    }
}

/// Predicted glucose response for a meal.
pub struct GlucoseReport<'a>(pub &'a GlucosePrediction);

impl GlucoseReport<'_> {
    pub fn caption(&self) -> &str {
        self.0.caption.as_deref().unwrap_or("Analyzed Meal")
    }

    pub fn macros(&self) -> String {
        macros_line(&self.0.nutrition)
    }

    /// `32.5 mg/dL (elevated)` or `N/A`.
    pub fn spike(value: Option<f64>) -> String {
        match value {
            Some(v) => format!("{v} mg/dL ({})", SpikeLevel::classify(v)),
            None => NOT_AVAILABLE.to_string(),
        }
    }

    /// `6/10 (moderate)` or `N/A`.
    pub fn impact(&self) -> String {
        match self.0.glucose.impact_score {
            Some(score) => format!("{score}/10 ({})", ImpactLevel::classify(score)),
            None => NOT_AVAILABLE.to_string(),
        }
    }

    pub fn recommendation(&self) -> &str {
        self.0
            .glucose
            .recommendation
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(DEFAULT_GLUCOSE_ADVICE)
    }

    pub fn factors(&self) -> String {
        if self.0.glucose.factors.is_empty() {
            NO_FACTORS.to_string()
        } else {
            self.0.glucose.factors.join(", ")
        }
    }
}

impl fmt::Display for GlucoseReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let curve = &self.0.glucose;
        writeln!(f, "Glucose Response Prediction")?;
        writeln!(f, "  Meal: {}", self.caption())?;
        writeln!(f, "  Macronutrients (carbs/protein/fat): {}", self.macros())?;
        writeln!(f, "  After 30 minutes: {}", Self::spike(curve.spike_30min))?;
        writeln!(f, "  After 60 minutes: {}", Self::spike(curve.spike_60min))?;
        writeln!(f, "  Impact score:     {}", self.impact())?;
        writeln!(f, "  Personal factors: {}", self.factors())?;
        write!(f, "  Recommendation: {}", self.recommendation())
    }
}

/// Gut-health classification.
pub struct GutHealthReport<'a>(pub &'a GutHealthAssessment);

impl GutHealthReport<'_> {
    pub fn label(&self) -> &str {
        &self.0.prediction
    }

    pub fn probability(&self) -> String {
        probability(self.0.probability_good)
    }

    /// Diet advice, shown only when the result is not `Good`.
    pub fn advice(&self) -> Option<&'static str> {
        (!self.0.is_good()).then_some(GUT_HEALTH_ADVICE)
    }
}

impl fmt::Display for GutHealthReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Your Gut Health Analysis")?;
        writeln!(f, "  Prediction: {}", self.label())?;
        write!(f, "  Probability of good gut health: {}", self.probability())?;
        if let Some(advice) = self.advice() {
            write!(f, "\n  {advice}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_drops_trailing_zero() {
        assert_eq!(percent(Some(40.0)), "40%");
        assert_eq!(percent(Some(12.5)), "12.5%");
        assert_eq!(percent(None), "0%");
    }

    #[test]
    fn probability_one_decimal() {
        assert_eq!(probability(Some(0.82)), "82.0%");
        assert_eq!(probability(Some(0.3333)), "33.3%");
        assert_eq!(probability(None), "N/A");
        assert_eq!(probability(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn spike_levels() {
        assert_eq!(SpikeLevel::classify(20.0), SpikeLevel::Normal);
        assert_eq!(SpikeLevel::classify(20.5), SpikeLevel::Elevated);
        assert_eq!(SpikeLevel::classify(41.0), SpikeLevel::High);
    }

    #[test]
    fn impact_levels_and_bar() {
        assert_eq!(ImpactLevel::classify(4.0), ImpactLevel::Low);
        assert_eq!(ImpactLevel::classify(5.0), ImpactLevel::Moderate);
        assert_eq!(ImpactLevel::classify(7.5), ImpactLevel::High);
        assert_eq!(impact_bar(12.0), 100.0);
        assert_eq!(impact_bar(6.5), 65.0);
    }
}
