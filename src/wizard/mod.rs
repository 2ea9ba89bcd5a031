//! Multi-step upload/prediction workflows.
//!
//! A [`Wizard`] walks the user through a fixed list of [`Step`]s. Every step
//! but the last collects files; the last shows the result and is reachable
//! only through a successful [`Wizard::submit`]:
//!
//! ```text
//! Collecting(step 0..N-2) ──submit──▶ Submitting ──ok──▶ Succeeded(step N-1)
//!          ▲                               │
//!          └──────────── error ────────────┘   (step unchanged)
//! ```
//!
//! What to collect and which endpoint to call is described by a [`Flow`].
//! Three flows exist: [`MealAnalysisFlow`], [`GlucoseFlow`], and
//! [`GutHealthFlow`].

mod controller;
mod flows;

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::traits::PredictionService;
use crate::types::{MealCategory, SlotKey, UploadFile, UploadSlot};
use crate::{NutriscopeError, Result};

pub use controller::{Phase, Wizard};
pub use flows::{GlucoseFlow, GutHealthFlow, MealAnalysisFlow};

pub type MealWizard = Wizard<MealAnalysisFlow>;
pub type GlucoseWizard = Wizard<GlucoseFlow>;
pub type GutHealthWizard = Wizard<GutHealthFlow>;

/// One screen of a wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub title: &'static str,
    /// Slots that must be filled before leaving this step.
    pub required: &'static [SlotKey],
}

/// Everything the user has entered so far.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    slots: BTreeMap<SlotKey, UploadSlot>,
    pub description: Option<String>,
    pub meal_category: MealCategory,
}

impl FormData {
    pub fn slot(&self, key: SlotKey) -> Option<&UploadSlot> {
        self.slots.get(&key)
    }

    pub fn file(&self, key: SlotKey) -> Option<&UploadFile> {
        self.slots.get(&key).map(|s| &s.file)
    }

    /// The file in `key`, or a validation error naming the slot.
    pub fn require(&self, key: SlotKey) -> Result<&UploadFile> {
        self.file(key)
            .ok_or_else(|| NutriscopeError::Validation(format!("missing {key}")))
    }

    pub fn has(&self, key: SlotKey) -> bool {
        self.slots.contains_key(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn insert(&mut self, key: SlotKey, slot: UploadSlot) {
        self.slots.insert(key, slot);
    }

    pub(crate) fn remove(&mut self, key: SlotKey) -> bool {
        self.slots.remove(&key).is_some()
    }
}

/// What a wizard collects and how it turns the form into a prediction.
#[async_trait]
pub trait Flow: Send + Sync + 'static {
    /// Normalized result shown on the last step.
    type Output: Clone + Send + Sync + 'static;

    /// Short identifier used in logs and metrics.
    fn name(&self) -> &'static str;

    /// All steps, the last being the results step. At least two.
    fn steps(&self) -> &'static [Step];

    /// Notification shown when submitting with required files missing.
    fn missing_message(&self) -> &'static str;

    fn success_message(&self) -> &'static str;

    /// Notification shown when a failure carries no server message.
    fn failure_message(&self) -> &'static str;

    /// Issue the single service call and normalize its response.
    async fn run(
        &self,
        service: &dyn PredictionService,
        form: &FormData,
        cancel: &CancellationToken,
    ) -> Result<Self::Output>;

    /// Whether any step collects `key`.
    fn uses(&self, key: SlotKey) -> bool {
        self.steps().iter().any(|s| s.required.contains(&key))
    }
}
