//! User onboarding — step-based flows with an axum access gate.
//!
//! Tracks a user's progress through a named sequence of onboarding steps
//! and gates access to protected routes until the sequence is complete.
//! Step completion is delegated to caller-supplied predicates evaluated
//! against a user and an optional context value; the crate is generic over
//! both types.
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use user_onboarding::{FlowRegistry, OnboardingManager, Step};
//!
//! #[derive(Clone)]
//! struct User { name: Option<String>, email_verified: bool }
//!
//! let registry = FlowRegistry::<User>::builder()
//!     .flow("default", [
//!         Step::new("profile")
//!             .check(|user: &User, _| user.name.is_some())
//!             .meta([("label", json!("Complete your profile"))]),
//!         Step::new("verify_email")
//!             .check(|user: &User, _| user.email_verified),
//!     ])
//!     .build()
//!     .unwrap();
//!
//! let manager = OnboardingManager::new(Arc::new(registry));
//! let user = User { name: Some("Alice".into()), email_verified: false };
//!
//! let flow = manager.start(&user, "default", None).unwrap();
//! assert!(!flow.is_completed());
//! assert_eq!(flow.progress(), 50.0);
//! assert_eq!(flow.current().unwrap().slug(), "verify_email");
//! ```

pub mod error;
pub mod events;
pub mod flow;
pub mod gate;
pub mod manager;
pub mod registry;
pub mod step;

pub use error::{ConfigError, Error, FlowError, Result};
pub use events::{EventSink, MemorySink, NullSink, OnboardingEvent};
pub use flow::Flow;
pub use gate::{
    CONTEXT_PLACEHOLDER, ContextResolver, GateService, Identify, NoContext, OnboardingGate,
    OnboardingGateLayer,
};
pub use manager::{ADHOC_FLOW, DEFAULT_FLOW, OnboardingManager};
pub use registry::{DEFAULT_REDIRECT, FlowRegistry, FlowRegistryBuilder, RedirectConfig};
pub use step::Step;
