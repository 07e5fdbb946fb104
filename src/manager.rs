//! Entry point and factory for onboarding flows.

use std::sync::Arc;

use crate::error::ConfigError;
use crate::events::{EventSink, NullSink, OnboardingEvent};
use crate::flow::Flow;
use crate::registry::FlowRegistry;

/// Flow name used when none is specified.
pub const DEFAULT_FLOW: &str = "default";

/// Name given to flows built ad-hoc via [`OnboardingManager::for_user`].
pub const ADHOC_FLOW: &str = "adhoc";

/// Resolves named flow definitions from the registry, instantiates flows,
/// and emits lifecycle notifications through the injected sink.
///
/// There is no caching across calls: every [`start`](Self::start) builds a
/// fresh, independent [`Flow`], so manual completions on one instance never
/// propagate to another. Callers must retain the returned flow for the
/// duration of a logical unit of work (e.g. one request).
pub struct OnboardingManager<U, C = ()> {
    registry: Arc<FlowRegistry<U, C>>,
    sink: Arc<dyn EventSink<U>>,
}

impl<U, C> OnboardingManager<U, C> {
    /// Create a manager with no event sink (events are discarded).
    pub fn new(registry: Arc<FlowRegistry<U, C>>) -> Self {
        Self::with_sink(registry, Arc::new(NullSink))
    }

    /// Create a manager that dispatches lifecycle events to `sink`.
    pub fn with_sink(registry: Arc<FlowRegistry<U, C>>, sink: Arc<dyn EventSink<U>>) -> Self {
        Self { registry, sink }
    }

    /// The registry this manager resolves flow names against.
    pub fn registry(&self) -> &FlowRegistry<U, C> {
        &self.registry
    }

    /// Create a new, empty flow for the given user, for building flows
    /// programmatically without the registry.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use user_onboarding::{FlowRegistry, OnboardingManager, Step};
    ///
    /// struct User { name: Option<String> }
    ///
    /// let manager = OnboardingManager::new(Arc::new(
    ///     FlowRegistry::<User>::builder().build().unwrap(),
    /// ));
    /// let user = User { name: Some("Alice".into()) };
    /// let mut flow = manager.for_user(&user);
    /// flow.add_step(Step::new("profile").check(|u: &User, _| u.name.is_some()));
    /// assert!(flow.is_completed());
    /// ```
    pub fn for_user<'u>(&self, user: &'u U) -> Flow<'u, U, C> {
        Flow::new(ADHOC_FLOW, user, Vec::new(), None, Arc::clone(&self.sink))
    }

    /// Start a named onboarding flow for the given user.
    ///
    /// Resolves `flow_name` in the registry, builds a fresh flow bound to
    /// `user` and the optional `context`, and emits an
    /// [`OnboardingStarted`](OnboardingEvent::OnboardingStarted) event.
    ///
    /// Fails with [`ConfigError::FlowNotDefined`] if the name was never
    /// registered — a deployment bug, not a runtime condition.
    pub fn start<'u>(
        &self,
        user: &'u U,
        flow_name: &str,
        context: Option<&'u C>,
    ) -> Result<Flow<'u, U, C>, ConfigError> {
        let steps = self
            .registry
            .definition(flow_name)
            .ok_or_else(|| ConfigError::FlowNotDefined {
                name: flow_name.to_string(),
            })?;

        let flow = Flow::new(
            flow_name,
            user,
            steps.to_vec(),
            context,
            Arc::clone(&self.sink),
        );

        tracing::debug!(flow = flow_name, steps = flow.steps().len(), "onboarding flow started");
        self.sink.emit(user, OnboardingEvent::started(flow_name));

        Ok(flow)
    }
}
