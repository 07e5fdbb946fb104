//! Lifecycle notifications, dispatched through an explicitly injected sink.
//!
//! There is no ambient global dispatcher: the [`OnboardingManager`] and
//! every [`Flow`] it produces share one [`EventSink`] supplied at
//! construction. Dispatch is synchronous, within the same unit of work.
//!
//! [`OnboardingManager`]: crate::manager::OnboardingManager
//! [`Flow`]: crate::flow::Flow

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A lifecycle notification emitted by a flow or the manager.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OnboardingEvent {
    /// A named flow was started for a user.
    OnboardingStarted {
        flow: String,
        occurred_at: DateTime<Utc>,
    },
    /// A step was manually completed.
    StepCompleted {
        flow: String,
        step: String,
        occurred_at: DateTime<Utc>,
    },
    /// The last incomplete step of a flow was completed.
    OnboardingCompleted {
        flow: String,
        occurred_at: DateTime<Utc>,
    },
}

impl OnboardingEvent {
    pub(crate) fn started(flow: &str) -> Self {
        Self::OnboardingStarted {
            flow: flow.to_string(),
            occurred_at: Utc::now(),
        }
    }

    pub(crate) fn step_completed(flow: &str, step: &str) -> Self {
        Self::StepCompleted {
            flow: flow.to_string(),
            step: step.to_string(),
            occurred_at: Utc::now(),
        }
    }

    pub(crate) fn completed(flow: &str) -> Self {
        Self::OnboardingCompleted {
            flow: flow.to_string(),
            occurred_at: Utc::now(),
        }
    }

    /// The name of the flow this event belongs to.
    pub fn flow(&self) -> &str {
        match self {
            Self::OnboardingStarted { flow, .. }
            | Self::StepCompleted { flow, .. }
            | Self::OnboardingCompleted { flow, .. } => flow,
        }
    }
}

/// Receives lifecycle notifications for a user.
///
/// Hosts implement this to bridge into their own event bus, job queue, or
/// metrics pipeline. Dispatch is synchronous; implementations should be
/// cheap and must not block.
pub trait EventSink<U>: Send + Sync {
    fn emit(&self, user: &U, event: OnboardingEvent);
}

/// Sink that discards every event. The default when none is injected.
pub struct NullSink;

impl<U> EventSink<U> for NullSink {
    fn emit(&self, _user: &U, _event: OnboardingEvent) {}
}

/// Sink that records events in memory, in dispatch order.
///
/// Useful in tests and for hosts that want to inspect what a single unit
/// of work emitted.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<OnboardingEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, in the order they were emitted.
    pub fn events(&self) -> Vec<OnboardingEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<U> EventSink<U> for MemorySink {
    fn emit(&self, _user: &U, event: OnboardingEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
