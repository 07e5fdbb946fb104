//! Flow definitions and redirect mapping, registered explicitly at startup.
//!
//! The registry is the configuration boundary of the crate: flow
//! definitions are plain data plus predicate functions, registered through
//! builder calls rather than loaded from a file (predicates are code, not
//! config). Redirect paths carry no code and may be deserialized from the
//! host's own configuration via [`RedirectConfig`]. The registry is
//! read-only after [`build`](FlowRegistryBuilder::build) and is meant to be
//! shared process-wide behind an `Arc`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::step::Step;

/// Fallback redirect path used when a flow has no entry in the mapping.
pub const DEFAULT_REDIRECT: &str = "/onboarding";

/// Named flow definitions plus the redirect mapping for denied requests.
pub struct FlowRegistry<U, C = ()> {
    flows: HashMap<String, Vec<Arc<Step<U, C>>>>,
    redirects: HashMap<String, String>,
    default_redirect: String,
}

impl<U, C> FlowRegistry<U, C> {
    pub fn builder() -> FlowRegistryBuilder<U, C> {
        FlowRegistryBuilder {
            flows: HashMap::new(),
            redirects: HashMap::new(),
            default_redirect: DEFAULT_REDIRECT.to_string(),
        }
    }

    /// The step sequence registered under `name`, if any.
    pub fn definition(&self, name: &str) -> Option<&[Arc<Step<U, C>>]> {
        self.flows.get(name).map(Vec::as_slice)
    }

    /// Whether a flow is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.flows.contains_key(name)
    }

    /// Names of all registered flows, in no particular order.
    pub fn flow_names(&self) -> Vec<&str> {
        self.flows.keys().map(String::as_str).collect()
    }

    /// The redirect path for a flow, falling back to the default path.
    /// The pattern may contain a `{context}` placeholder; the gate fills
    /// it from the resolved context's identity.
    pub fn redirect_for(&self, flow_name: &str) -> &str {
        self.redirects
            .get(flow_name)
            .map(String::as_str)
            .unwrap_or(&self.default_redirect)
    }
}

/// Builder for [`FlowRegistry`].
pub struct FlowRegistryBuilder<U, C = ()> {
    flows: HashMap<String, Vec<Arc<Step<U, C>>>>,
    redirects: HashMap<String, String>,
    default_redirect: String,
}

impl<U, C> FlowRegistryBuilder<U, C> {
    /// Register a named flow with its ordered step sequence. Re-registering
    /// a name replaces the previous sequence.
    pub fn flow(
        mut self,
        name: impl Into<String>,
        steps: impl IntoIterator<Item = Step<U, C>>,
    ) -> Self {
        self.flows.insert(
            name.into(),
            steps.into_iter().map(Arc::new).collect(),
        );
        self
    }

    /// Set the redirect path for a single flow.
    pub fn redirect(mut self, flow_name: impl Into<String>, path: impl Into<String>) -> Self {
        self.redirects.insert(flow_name.into(), path.into());
        self
    }

    /// Set the fallback redirect path.
    pub fn default_redirect(mut self, path: impl Into<String>) -> Self {
        self.default_redirect = path.into();
        self
    }

    /// Merge a deserialized redirect mapping (per-flow entries plus the
    /// default path).
    pub fn redirects(mut self, config: RedirectConfig) -> Self {
        self.default_redirect = config.default;
        self.redirects.extend(config.flows);
        self
    }

    /// Finalize the registry. Fails if any flow declares the same step slug
    /// more than once — lookup by slug would silently shadow the later one.
    pub fn build(self) -> Result<FlowRegistry<U, C>, ConfigError> {
        for (flow_name, steps) in &self.flows {
            let mut seen = HashSet::new();
            for step in steps {
                if !seen.insert(step.slug()) {
                    return Err(ConfigError::DuplicateSlug {
                        flow: flow_name.clone(),
                        slug: step.slug().to_string(),
                    });
                }
            }
        }

        tracing::debug!(flows = self.flows.len(), "flow registry built");
        Ok(FlowRegistry {
            flows: self.flows,
            redirects: self.redirects,
            default_redirect: self.default_redirect,
        })
    }
}

/// Redirect mapping in a serde-loadable shape, so hosts can keep redirect
/// paths in their own configuration files.
///
/// ```
/// use user_onboarding::RedirectConfig;
///
/// let config: RedirectConfig = serde_json::from_str(
///     r#"{ "default": "/onboarding", "company_setup": "/onboarding/{context}" }"#,
/// ).unwrap();
/// assert_eq!(config.default, "/onboarding");
/// assert_eq!(config.flows["company_setup"], "/onboarding/{context}");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RedirectConfig {
    /// Fallback path for flows without their own entry.
    #[serde(default = "default_redirect_path")]
    pub default: String,
    /// Per-flow redirect paths, keyed by flow name.
    #[serde(flatten)]
    pub flows: HashMap<String, String>,
}

fn default_redirect_path() -> String {
    DEFAULT_REDIRECT.to_string()
}
