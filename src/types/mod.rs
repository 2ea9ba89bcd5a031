//! Public types for the Nutriscope API.

mod meal;
mod notification;
mod prediction;
mod session;
mod upload;

pub use meal::{ANONYMOUS_USER_ID, MealCategory, MealRecord, NutritionGoal, RecommendationRequest};
pub use notification::{Notification, NotificationId, Severity};
pub use prediction::{GlucoseCurve, GlucosePrediction, GutHealthAssessment, MacroBreakdown, MealAnalysis};
pub use session::SessionUser;
pub use upload::{FileConstraints, MediaKind, SlotKey, UploadFile, UploadSlot, mime_for_extension};
