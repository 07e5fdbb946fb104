//! Error types for user onboarding.

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),
}

/// Configuration-related errors.
///
/// These indicate a deployment bug (a flow referenced but never registered,
/// or a malformed definition), not a runtime condition to retry.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Onboarding flow [{name}] is not defined in the registry")]
    FlowNotDefined { name: String },

    #[error("Flow [{flow}] declares step [{slug}] more than once")]
    DuplicateSlug { flow: String, slug: String },
}

/// Flow evaluation errors.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Step [{slug}] not found in flow [{flow}]")]
    StepNotFound { slug: String, flow: String },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
