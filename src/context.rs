//! Application context: the composition root.
//!
//! Owns the session store, the notification queue, and the prediction
//! service, and hands them to the wizards it creates. Nothing here is
//! global; a front end creates one context on boot and tears it down on
//! sign-out.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::PredictionClientBuilder;
use crate::config::Config;
use crate::notify::NotificationQueue;
use crate::session::SessionStore;
use crate::traits::PredictionService;
use crate::types::{MealRecord, RecommendationRequest};
use crate::wizard::{
    GlucoseFlow, GlucoseWizard, GutHealthFlow, GutHealthWizard, MealAnalysisFlow, MealWizard,
    Wizard,
};
use crate::{NutriscopeError, Result};

/// Which view a front end should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    /// The session was torn down (sign-out or a `401`); ask for credentials.
    Login,
}

pub struct AppContext {
    config: Config,
    session: SessionStore,
    alerts: NotificationQueue,
    service: Arc<dyn PredictionService>,
}

impl AppContext {
    /// Build the context from configuration: open the persisted session and
    /// construct the HTTP client bound to it.
    pub fn init(config: Config) -> Result<Self> {
        let session = SessionStore::open(config.session.resolved_path(), config.session.auth_mode);
        let client = PredictionClientBuilder::from_config(&config.api)
            .session(session.clone())
            .build()?;
        info!(base_url = client.base_url(), "context initialised");
        Ok(Self::with_service(config, session, Arc::new(client)))
    }

    /// Assemble a context from already-built parts.
    pub fn with_service(
        config: Config,
        session: SessionStore,
        service: Arc<dyn PredictionService>,
    ) -> Self {
        let alerts = NotificationQueue::with_default_timeout(config.notifications.timeout());
        Self {
            config,
            session,
            alerts,
            service,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn alerts(&self) -> &NotificationQueue {
        &self.alerts
    }

    pub fn service(&self) -> Arc<dyn PredictionService> {
        Arc::clone(&self.service)
    }

    pub fn route(&self) -> Route {
        if self.session.is_authenticated() {
            Route::Home
        } else {
            Route::Login
        }
    }

    pub fn meal_wizard(&self) -> Result<MealWizard> {
        self.require_feature(self.config.features.meal_analysis, "meal analysis")?;
        Ok(self.wizard(MealAnalysisFlow))
    }

    pub fn glucose_wizard(&self) -> Result<GlucoseWizard> {
        self.require_feature(self.config.features.glucose_prediction, "glucose prediction")?;
        Ok(self.wizard(GlucoseFlow))
    }

    pub fn gut_health_wizard(&self) -> Result<GutHealthWizard> {
        self.require_feature(self.config.features.microbiome_analysis, "microbiome analysis")?;
        Ok(self.wizard(GutHealthFlow))
    }

    /// Ask for meal suggestions, tagged with the signed-in user's id.
    pub async fn recommend_meal(&self, request: RecommendationRequest) -> Result<Value> {
        self.require_feature(self.config.features.meal_recommendations, "meal recommendations")?;
        let request = match self.session.current() {
            Some(user) => request.for_user(user.id),
            None => request,
        };
        let outcome = self
            .service
            .recommend_meal(&request, &CancellationToken::new())
            .await;
        self.report(outcome, None, "Failed to get meal recommendations")
    }

    /// Store a meal in the user's history.
    pub async fn save_meal(&self, record: &MealRecord) -> Result<Value> {
        let outcome = self
            .service
            .save_meal(record, &CancellationToken::new())
            .await;
        self.report(outcome, Some("Meal saved to history"), "Failed to save meal")
    }

    /// Sign out and drop pending notifications.
    pub fn teardown(&self) -> Result<()> {
        self.alerts.clear();
        self.session.logout()
    }

    fn wizard<F: crate::wizard::Flow>(&self, flow: F) -> Wizard<F> {
        Wizard::new(
            flow,
            self.service(),
            self.alerts.clone(),
            self.config.uploads.clone(),
        )
    }

    fn require_feature(&self, enabled: bool, name: &str) -> Result<()> {
        if enabled {
            Ok(())
        } else {
            Err(NutriscopeError::Configuration(format!("{name} is disabled")))
        }
    }

    fn report(&self, outcome: Result<Value>, success: Option<&str>, fallback: &str) -> Result<Value> {
        match outcome {
            Ok(value) => {
                if let Some(message) = success {
                    self.alerts.success(message);
                }
                Ok(value)
            }
            Err(e) => {
                self.alerts.error(e.user_message(fallback));
                Err(e)
            }
        }
    }
}
