//! Flow evaluation engine — completion, progress, and manual overrides.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::FlowError;
use crate::events::{EventSink, OnboardingEvent};
use crate::step::Step;

/// A single user's onboarding flow.
///
/// A flow pairs one user (borrowed) with an ordered sequence of steps and
/// an optional context value, and tracks which steps were manually
/// completed. Predicate-based completion is re-evaluated on every call;
/// manual completions are sticky and never re-evaluated.
///
/// Flows are created fresh per unit of work (by
/// [`OnboardingManager::start`](crate::manager::OnboardingManager::start)
/// or [`for_user`](crate::manager::OnboardingManager::for_user)) and are
/// never persisted. Independent flow instances do not share manual
/// completions.
pub struct Flow<'u, U, C = ()> {
    name: String,
    user: &'u U,
    context: Option<&'u C>,
    steps: Vec<Arc<Step<U, C>>>,
    manual_completions: HashSet<String>,
    sink: Arc<dyn EventSink<U>>,
}

impl<'u, U, C> Flow<'u, U, C> {
    pub(crate) fn new(
        name: impl Into<String>,
        user: &'u U,
        steps: Vec<Arc<Step<U, C>>>,
        context: Option<&'u C>,
        sink: Arc<dyn EventSink<U>>,
    ) -> Self {
        Self {
            name: name.into(),
            user,
            context,
            steps,
            manual_completions: HashSet::new(),
            sink,
        }
    }

    /// The name of the flow definition this instance was built from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The user associated with this flow.
    pub fn user(&self) -> &U {
        self.user
    }

    /// The context value shared across this flow's predicates, if any.
    pub fn context(&self) -> Option<&C> {
        self.context
    }

    /// Append a step to the flow dynamically.
    pub fn add_step(&mut self, step: Step<U, C>) -> &mut Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// All steps within this flow, in declaration order.
    pub fn steps(&self) -> &[Arc<Step<U, C>>] {
        &self.steps
    }

    /// Find a step by slug. Returns the first match;
    /// [`FlowError::StepNotFound`] if no step carries the slug.
    pub fn find_step(&self, slug: &str) -> Result<&Step<U, C>, FlowError> {
        self.steps
            .iter()
            .find(|step| step.slug() == slug)
            .map(Arc::as_ref)
            .ok_or_else(|| FlowError::StepNotFound {
                slug: slug.to_string(),
                flow: self.name.clone(),
            })
    }

    fn step_completed(&self, step: &Step<U, C>) -> bool {
        self.manual_completions.contains(step.slug()) || step.evaluate(self.user, self.context)
    }

    /// Whether a specific step is completed, by manual override or by its
    /// predicate.
    pub fn is_step_completed(&self, slug: &str) -> Result<bool, FlowError> {
        let step = self.find_step(slug)?;
        Ok(self.step_completed(step))
    }

    /// All completed steps, preserving declaration order. Recomputed on
    /// every call.
    pub fn completed_steps(&self) -> Vec<&Step<U, C>> {
        self.steps
            .iter()
            .map(Arc::as_ref)
            .filter(|step| self.step_completed(step))
            .collect()
    }

    /// All incomplete (remaining) steps, preserving declaration order.
    /// Recomputed on every call.
    pub fn incomplete_steps(&self) -> Vec<&Step<U, C>> {
        self.steps
            .iter()
            .map(Arc::as_ref)
            .filter(|step| !self.step_completed(step))
            .collect()
    }

    /// The current (next) step to complete, or `None` if all are done.
    pub fn current(&self) -> Option<&Step<U, C>> {
        self.incomplete_steps().into_iter().next()
    }

    /// Whether all steps are completed.
    ///
    /// A flow with zero steps is vacuously complete by this method. The
    /// access gate applies a stricter policy and treats empty flows as
    /// incomplete — see [`OnboardingGate`](crate::gate::OnboardingGate).
    pub fn is_completed(&self) -> bool {
        self.incomplete_steps().is_empty()
    }

    /// Completion progress as a percentage between 0.00 and 100.00,
    /// rounded to two decimal places. Exactly `0.0` for a zero-step flow.
    pub fn progress(&self) -> f64 {
        let total = self.steps.len();
        if total == 0 {
            return 0.0;
        }
        let completed = self.completed_steps().len();
        (completed as f64 / total as f64 * 10_000.0).round() / 100.0
    }

    /// Manually mark a step as completed.
    ///
    /// No-op if the step is already completed (by predicate or prior
    /// override). Otherwise the override is recorded and a
    /// [`StepCompleted`](OnboardingEvent::StepCompleted) event is emitted,
    /// followed by [`OnboardingCompleted`](OnboardingEvent::OnboardingCompleted)
    /// if the flow is now fully complete. Both events are emitted at most
    /// once per slug/flow instance.
    pub fn complete_step(&mut self, slug: &str) -> Result<(), FlowError> {
        if self.is_step_completed(slug)? {
            return Ok(());
        }

        self.manual_completions.insert(slug.to_string());
        tracing::debug!(flow = %self.name, step = slug, "step manually completed");
        self.sink
            .emit(self.user, OnboardingEvent::step_completed(&self.name, slug));

        if self.is_completed() {
            tracing::debug!(flow = %self.name, "onboarding completed");
            self.sink
                .emit(self.user, OnboardingEvent::completed(&self.name));
        }

        Ok(())
    }
}
