//! Nutriscope - client for nutrition prediction services
//!
//! This crate drives the upload/prediction workflows of a nutrition and
//! health-tracking product: meal photo analysis, glucose-response
//! prediction, and gut-health classification. All inference happens behind
//! external HTTP endpoints; this crate collects the inputs, issues the
//! requests, and renders the results.
//!
//! # Example
//!
//! ```rust,no_run
//! use nutriscope::{AppContext, Config, SlotKey};
//! use nutriscope::render::GutHealthReport;
//!
//! #[tokio::main]
//! async fn main() -> nutriscope::Result<()> {
//!     let context = AppContext::init(Config::load(None)?)?;
//!     let wizard = context.gut_health_wizard()?;
//!
//!     wizard.select_path(SlotKey::Microbiome, "subject.csv".as_ref())?;
//!     let assessment = wizard.submit().await?;
//!
//!     println!("{}", GutHealthReport(&assessment));
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod notify;
pub mod render;
pub mod session;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod wizard;

// Re-export main types at crate root
pub use client::{PredictionClient, PredictionClientBuilder};
pub use config::Config;
pub use context::{AppContext, Route};
pub use error::{ErrorKind, NutriscopeError, Result};
pub use notify::NotificationQueue;
pub use session::{AuthMode, SessionStore};
pub use traits::{GlucoseRequest, PredictionService};
pub use wizard::{Flow, Phase, Wizard};

// Re-export all types
pub use types::{
    FileConstraints, GlucoseCurve, GlucosePrediction, GutHealthAssessment, MacroBreakdown,
    MealAnalysis, MealCategory, MealRecord, MediaKind, Notification, NotificationId,
    NutritionGoal, RecommendationRequest, SessionUser, Severity, SlotKey, UploadFile, UploadSlot,
};
