//! Onboarding step — a named completion check plus display metadata.

use std::collections::HashMap;
use std::fmt;

/// Completion predicate: receives the user and the optional flow context.
type Predicate<U, C> = Box<dyn Fn(&U, Option<&C>) -> bool + Send + Sync>;

/// A single onboarding step within a flow.
///
/// Each step defines a unique slug, a predicate that determines whether the
/// step is completed for a given user/context pair, and optional metadata
/// for UI or descriptive purposes.
///
/// Predicates are assumed pure and side-effect-free; the crate does not
/// enforce this. A panicking predicate propagates to the caller — there is
/// no isolation between steps.
///
/// ```
/// use serde_json::json;
/// use user_onboarding::Step;
///
/// struct User { name: Option<String> }
///
/// let step = Step::<User>::new("profile")
///     .check(|user, _| user.name.is_some())
///     .meta([("label", json!("Complete your profile"))]);
///
/// assert_eq!(step.slug(), "profile");
/// ```
pub struct Step<U, C = ()> {
    slug: String,
    check: Predicate<U, C>,
    meta: HashMap<String, serde_json::Value>,
}

impl<U, C> Step<U, C> {
    /// Create a new step. The default predicate always evaluates false
    /// until [`check`](Self::check) is called: nothing is complete until
    /// explicitly defined.
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            check: Box::new(|_: &U, _: Option<&C>| false),
            meta: HashMap::new(),
        }
    }

    /// Replace the completion predicate.
    ///
    /// The callback receives the user and the optional flow context (e.g.
    /// a company or team record).
    pub fn check<F>(mut self, callback: F) -> Self
    where
        F: Fn(&U, Option<&C>) -> bool + Send + Sync + 'static,
    {
        self.check = Box::new(callback);
        self
    }

    /// Replace the attached metadata wholesale (not merged).
    pub fn meta<I, K>(mut self, meta: I) -> Self
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: Into<String>,
    {
        self.meta = meta.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self
    }

    /// The unique identifier for this step within its flow.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// All metadata attached to this step.
    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.meta
    }

    /// Evaluate whether this step is completed for the given user and
    /// context.
    pub fn evaluate(&self, user: &U, context: Option<&C>) -> bool {
        (self.check)(user, context)
    }
}

impl<U, C> fmt::Debug for Step<U, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("slug", &self.slug)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}
