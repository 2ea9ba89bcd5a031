//! Wizard state machine

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Flow, FormData, Step};
use crate::config::UploadLimits;
use crate::notify::NotificationQueue;
use crate::telemetry;
use crate::traits::PredictionService;
use crate::types::{MealCategory, SlotKey, UploadFile, UploadSlot};
use crate::{NutriscopeError, Result};

/// Where the wizard is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Editable; the user is filling in steps.
    Collecting,
    /// One request is outstanding; submit is disabled.
    Submitting,
    /// Result available on the last step. Only `reset` leaves this phase.
    Succeeded,
}

struct WizardState<O> {
    step: usize,
    form: FormData,
    phase: Phase,
    result: Option<O>,
    /// Bumped by `reset`; a submission only applies its outcome if the
    /// generation it started in is still current.
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl<O> Default for WizardState<O> {
    fn default() -> Self {
        Self {
            step: 0,
            form: FormData::default(),
            phase: Phase::Collecting,
            result: None,
            generation: 0,
            cancel: None,
        }
    }
}

/// Controller for one wizard instance.
///
/// Cheap to clone; clones drive the same instance. State is behind a mutex
/// that is never held across an await, so the submit future can run on a
/// spawned task while other handles observe [`Phase::Submitting`].
pub struct Wizard<F: Flow> {
    flow: Arc<F>,
    service: Arc<dyn PredictionService>,
    alerts: NotificationQueue,
    limits: Arc<UploadLimits>,
    state: Arc<Mutex<WizardState<F::Output>>>,
}

impl<F: Flow> Clone for Wizard<F> {
    fn clone(&self) -> Self {
        Self {
            flow: Arc::clone(&self.flow),
            service: Arc::clone(&self.service),
            alerts: self.alerts.clone(),
            limits: Arc::clone(&self.limits),
            state: Arc::clone(&self.state),
        }
    }
}

impl<F: Flow> Wizard<F> {
    pub fn new(
        flow: F,
        service: Arc<dyn PredictionService>,
        alerts: NotificationQueue,
        limits: UploadLimits,
    ) -> Self {
        debug_assert!(flow.steps().len() >= 2, "a flow needs a collecting and a results step");
        Self {
            flow: Arc::new(flow),
            service,
            alerts,
            limits: Arc::new(limits),
            state: Arc::new(Mutex::new(WizardState::default())),
        }
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    pub fn steps(&self) -> &'static [Step] {
        self.flow.steps()
    }

    pub fn current_step(&self) -> usize {
        self.lock().step
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn is_submitting(&self) -> bool {
        self.phase() == Phase::Submitting
    }

    pub fn result(&self) -> Option<F::Output> {
        self.lock().result.clone()
    }

    pub fn slot(&self, key: SlotKey) -> Option<UploadSlot> {
        self.lock().form.slot(key).cloned()
    }

    pub fn form(&self) -> FormData {
        self.lock().form.clone()
    }

    /// Whether `step` has everything it requires. Steps without requirements
    /// (including the results step and out-of-range indices) are valid.
    pub fn is_step_valid(&self, step: usize) -> bool {
        step_valid(self.flow.steps(), &self.lock().form, step)
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        let state = self.lock();
        state.phase == Phase::Collecting && self.first_missing(&state.form).is_none()
    }

    /// Store a file in `key` after checking it against the slot's constraints.
    ///
    /// On rejection a warning notification is raised and stored uploads are
    /// left untouched.
    pub fn select_file(&self, key: SlotKey, file: UploadFile) -> Result<()> {
        let checked = self.check_selection(key, &file);
        if let Err(ref e) = checked {
            if matches!(e, NutriscopeError::Validation(_)) {
                self.alerts.warning(e.to_string());
            }
            return checked;
        }

        let slot = UploadSlot::new(file);
        let mut state = self.lock();
        // Re-check under the lock: a submit may have started meanwhile.
        if state.phase != Phase::Collecting {
            return Err(busy_error(state.phase));
        }
        debug!(flow = self.flow.name(), slot = %key, file = slot.file.name(), "file selected");
        state.form.insert(key, slot);
        Ok(())
    }

    /// Read `path` from disk and store it in `key`.
    ///
    /// The slot's size limit is applied before the file is read; failures
    /// raise a warning like [`select_file`](Self::select_file).
    pub fn select_path(&self, key: SlotKey, path: &Path) -> Result<()> {
        let limit = self.limits.constraints(key.media_kind()).max_size_bytes;
        match UploadFile::from_path(path, limit) {
            Ok(file) => self.select_file(key, file),
            Err(e) => {
                self.alerts.warning(e.to_string());
                Err(e)
            }
        }
    }

    /// Remove the file in `key`. Returns whether anything was removed.
    pub fn clear_file(&self, key: SlotKey) -> bool {
        let mut state = self.lock();
        state.phase == Phase::Collecting && state.form.remove(key)
    }

    pub fn set_description(&self, description: Option<String>) {
        let mut state = self.lock();
        if state.phase == Phase::Collecting {
            state.form.description = description.filter(|d| !d.trim().is_empty());
        }
    }

    pub fn set_meal_category(&self, category: MealCategory) {
        let mut state = self.lock();
        if state.phase == Phase::Collecting {
            state.form.meal_category = category;
        }
    }

    /// Move to the next collecting step. Returns whether the step changed.
    pub fn advance(&self) -> bool {
        let steps = self.flow.steps();
        let mut state = self.lock();
        let last_collecting = steps.len().saturating_sub(2);
        if state.phase != Phase::Collecting
            || state.step >= last_collecting
            || !step_valid(steps, &state.form, state.step)
        {
            return false;
        }
        state.step += 1;
        true
    }

    /// Move to the previous step. Returns whether the step changed.
    pub fn retreat(&self) -> bool {
        let steps = self.flow.steps();
        let mut state = self.lock();
        if state.phase != Phase::Collecting
            || state.step == 0
            || !step_valid(steps, &state.form, state.step)
        {
            return false;
        }
        state.step -= 1;
        true
    }

    /// Submit the form: exactly one service call.
    ///
    /// On success the wizard moves to the results step and stores the
    /// result; on failure an error notification is raised and the wizard
    /// returns to the step it was on. If [`reset`](Self::reset) runs while
    /// the request is outstanding, the outcome is discarded and
    /// [`NutriscopeError::Cancelled`] returned. Dropping the future before it
    /// completes cancels the request and makes the form editable again.
    pub async fn submit(&self) -> Result<F::Output> {
        let (form, cancel, generation) = {
            let mut state = self.lock();
            if state.phase != Phase::Collecting {
                return Err(busy_error(state.phase));
            }
            if self.first_missing(&state.form).is_some() {
                drop(state);
                let message = self.flow.missing_message();
                self.alerts.error(message);
                return Err(NutriscopeError::Validation(message.to_string()));
            }
            let cancel = CancellationToken::new();
            state.phase = Phase::Submitting;
            state.cancel = Some(cancel.clone());
            (state.form.clone(), cancel, state.generation)
        };

        debug!(flow = self.flow.name(), "submitting");
        let in_flight = InFlight {
            state: self.state.as_ref(),
            flow: self.flow.name(),
            generation,
            armed: true,
        };
        let outcome = self.flow.run(self.service.as_ref(), &form, &cancel).await;
        in_flight.disarm();

        let mut state = self.lock();
        if state.generation != generation {
            record_submission(self.flow.name(), "discarded");
            debug!(flow = self.flow.name(), "wizard was reset; discarding outcome");
            return Err(NutriscopeError::Cancelled);
        }
        state.cancel = None;

        match outcome {
            Ok(output) => {
                state.phase = Phase::Succeeded;
                state.step = self.flow.steps().len() - 1;
                state.result = Some(output.clone());
                drop(state);
                record_submission(self.flow.name(), "ok");
                info!(flow = self.flow.name(), "prediction received");
                self.alerts.success(self.flow.success_message());
                Ok(output)
            }
            Err(e) => {
                state.phase = Phase::Collecting;
                drop(state);
                record_submission(self.flow.name(), "error");
                warn!(flow = self.flow.name(), error = %e, "submission failed");
                self.alerts
                    .error(e.user_message(self.flow.failure_message()));
                Err(e)
            }
        }
    }

    /// Discard everything: uploads, fields, result, and interest in any
    /// in-flight request.
    pub fn reset(&self) {
        let mut state = self.lock();
        if let Some(cancel) = state.cancel.take() {
            cancel.cancel();
        }
        let generation = state.generation + 1;
        *state = WizardState {
            generation,
            ..WizardState::default()
        };
        debug!(flow = self.flow.name(), "wizard reset");
    }

    fn check_selection(&self, key: SlotKey, file: &UploadFile) -> Result<()> {
        let phase = self.phase();
        if phase != Phase::Collecting {
            return Err(busy_error(phase));
        }
        if !self.flow.uses(key) {
            return Err(NutriscopeError::Validation(format!(
                "this form does not take {key}"
            )));
        }
        self.limits
            .constraints(key.media_kind())
            .check(file, key.rejection_message())
    }

    fn first_missing(&self, form: &FormData) -> Option<SlotKey> {
        let steps = self.flow.steps();
        steps[..steps.len() - 1]
            .iter()
            .flat_map(|s| s.required.iter().copied())
            .find(|key| !form.has(*key))
    }

    fn lock(&self) -> MutexGuard<'_, WizardState<F::Output>> {
        lock_state(&self.state)
    }
}

fn lock_state<O>(state: &Mutex<WizardState<O>>) -> MutexGuard<'_, WizardState<O>> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Returns an abandoned submission to [`Phase::Collecting`].
///
/// Lives across the service call in [`Wizard::submit`]. If the submit future
/// is dropped before the call finishes, the request is cancelled and the
/// form becomes editable again, unless a reset already started a new
/// generation.
struct InFlight<'a, O> {
    state: &'a Mutex<WizardState<O>>,
    flow: &'static str,
    generation: u64,
    armed: bool,
}

impl<O> InFlight<'_, O> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<O> Drop for InFlight<'_, O> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock_state(self.state);
        if state.generation != self.generation || state.phase != Phase::Submitting {
            return;
        }
        if let Some(cancel) = state.cancel.take() {
            cancel.cancel();
        }
        state.phase = Phase::Collecting;
        drop(state);
        record_submission(self.flow, "discarded");
        debug!(flow = self.flow, "submission abandoned");
    }
}

fn step_valid(steps: &[Step], form: &FormData, step: usize) -> bool {
    steps
        .get(step)
        .is_none_or(|s| s.required.iter().all(|key| form.has(*key)))
}

fn busy_error(phase: Phase) -> NutriscopeError {
    match phase {
        Phase::Submitting => NutriscopeError::SubmissionInFlight,
        _ => NutriscopeError::Validation(
            "This analysis is complete; start a new one first".to_string(),
        ),
    }
}

fn record_submission(flow: &'static str, outcome: &'static str) {
    metrics::counter!(telemetry::SUBMISSIONS_TOTAL, "flow" => flow, "outcome" => outcome)
        .increment(1);
}
