//! Meal categories, goals, and JSON request bodies

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::prediction::MacroBreakdown;
use crate::NutriscopeError;

/// User id sent with recommendation requests when nobody is signed in.
pub const ANONYMOUS_USER_ID: &str = "default-user";

/// When the meal is eaten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum MealCategory {
    Breakfast,
    #[default]
    Lunch,
    Dinner,
    Snack,
}

impl MealCategory {
    pub const ALL: [MealCategory; 4] = [Self::Breakfast, Self::Lunch, Self::Dinner, Self::Snack];

    /// Wire value, e.g. `lunch`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }

    /// Display label, e.g. `Lunch`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Lunch => "Lunch",
            Self::Dinner => "Dinner",
            Self::Snack => "Snack",
        }
    }
}

impl fmt::Display for MealCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealCategory {
    type Err = NutriscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| NutriscopeError::Validation(format!("unknown meal category: {s}")))
    }
}

/// What the user is trying to achieve with their diet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum NutritionGoal {
    Bulking,
    Cutting,
    #[default]
    Maintaining,
}

impl fmt::Display for NutritionGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bulking => "bulking",
            Self::Cutting => "cutting",
            Self::Maintaining => "maintaining",
        })
    }
}

/// Body of `POST /recommend-meal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub meal_type: MealCategory,
    pub nutrition_goal: NutritionGoal,
    pub caption: String,
}

impl RecommendationRequest {
    pub fn new(
        caption: impl Into<String>,
        meal_type: MealCategory,
        nutrition_goal: NutritionGoal,
    ) -> Self {
        Self {
            user_id: ANONYMOUS_USER_ID.to_string(),
            meal_type,
            nutrition_goal,
            caption: caption.into(),
        }
    }

    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }
}

/// Body of `POST /api/meals/save`: one entry of the user's meal history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub meal_category: MealCategory,
    #[serde(default)]
    pub nutrition: MacroBreakdown,
    /// Raw glucose prediction, kept as returned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glucose_prediction: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
}
