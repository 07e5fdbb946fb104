//! Access gate — tower middleware that denies protected routes until the
//! user's onboarding flow is complete.
//!
//! The gate reads the authenticated user from the request's extensions
//! (placed there by the host's auth layer), starts the configured flow,
//! and either passes the request through or denies it. Unauthenticated
//! requests are always denied with 401 — the gate protects onboarding-
//! gated routes, it does not replace authentication.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::Json;
use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};

use crate::manager::{DEFAULT_FLOW, OnboardingManager};

/// Placeholder token in redirect path patterns, replaced by the resolved
/// context's identity.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Stable identity accessor for context values, used to fill the
/// [`CONTEXT_PLACEHOLDER`] in redirect paths.
pub trait Identify {
    fn identity(&self) -> String;
}

impl Identify for () {
    fn identity(&self) -> String {
        String::new()
    }
}

/// Resolves the optional flow context from the incoming request.
///
/// Blanket-implemented for closures, so a host can pull a record out of
/// request extensions or parse a path segment inline:
///
/// ```ignore
/// let gate = OnboardingGate::new(manager)
///     .flow("company_setup")
///     .resolve_context_with(|req: &Request| req.extensions().get::<Company>().cloned());
/// ```
pub trait ContextResolver<C>: Send + Sync {
    fn resolve(&self, request: &Request) -> Option<C>;
}

impl<C, F> ContextResolver<C> for F
where
    F: Fn(&Request) -> Option<C> + Send + Sync,
{
    fn resolve(&self, request: &Request) -> Option<C> {
        self(request)
    }
}

/// Resolver that never yields a context. The default.
pub struct NoContext;

impl<C> ContextResolver<C> for NoContext {
    fn resolve(&self, _request: &Request) -> Option<C> {
        None
    }
}

/// Gate configuration: which flow to check, and optionally which single
/// step must be complete instead of the whole flow.
///
/// ```ignore
/// let app = Router::new()
///     .route("/dashboard", get(dashboard))
///     .layer(OnboardingGate::new(manager).flow("default").layer());
/// ```
pub struct OnboardingGate<U, C = ()> {
    manager: Arc<OnboardingManager<U, C>>,
    flow_name: String,
    required_step: Option<String>,
    resolver: Arc<dyn ContextResolver<C>>,
}

impl<U, C> OnboardingGate<U, C> {
    /// Create a gate checking the `"default"` flow, with no required step
    /// and no context resolution.
    pub fn new(manager: Arc<OnboardingManager<U, C>>) -> Self {
        Self {
            manager,
            flow_name: DEFAULT_FLOW.to_string(),
            required_step: None,
            resolver: Arc::new(NoContext),
        }
    }

    /// Check a specific named flow instead of `"default"`.
    pub fn flow(mut self, name: impl Into<String>) -> Self {
        self.flow_name = name.into();
        self
    }

    /// Require only a single step to be complete instead of the whole flow.
    pub fn required_step(mut self, slug: impl Into<String>) -> Self {
        self.required_step = Some(slug.into());
        self
    }

    /// Install a context resolver, run once per request before the flow is
    /// started.
    pub fn resolve_context_with(mut self, resolver: impl ContextResolver<C> + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Turn the gate into a [`tower::Layer`] for an axum router.
    pub fn layer(self) -> OnboardingGateLayer<U, C> {
        OnboardingGateLayer {
            gate: Arc::new(self),
        }
    }
}

impl<U, C> OnboardingGate<U, C>
where
    U: Clone + Send + Sync + 'static,
    C: Identify + Send + Sync + 'static,
{
    /// Decide whether the request may pass. `Err` carries the finished
    /// denial response. Synchronous: flow evaluation is all in-memory.
    fn check(&self, request: &Request) -> Result<(), Response> {
        let Some(user) = request.extensions().get::<U>() else {
            return Err((StatusCode::UNAUTHORIZED, "Unauthorized").into_response());
        };

        let context = self.resolver.resolve(request);

        let flow = match self.manager.start(user, &self.flow_name, context.as_ref()) {
            Ok(flow) => flow,
            Err(e) => {
                tracing::error!(flow = %self.flow_name, error = %e, "onboarding gate misconfigured");
                return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }
        };

        let satisfied = match &self.required_step {
            Some(slug) => match flow.is_step_completed(slug) {
                Ok(done) => done,
                Err(e) => {
                    tracing::error!(flow = %self.flow_name, error = %e, "onboarding gate misconfigured");
                    return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
                }
            },
            // Zero-step flows never satisfy the gate, even though
            // Flow::is_completed() treats them as vacuously complete.
            None => !flow.steps().is_empty() && flow.is_completed(),
        };

        if satisfied {
            Ok(())
        } else {
            tracing::debug!(flow = %self.flow_name, "request denied: onboarding incomplete");
            Err(self.deny(request, context.as_ref()))
        }
    }

    /// Build the denial response: 403 JSON for clients that ask for JSON,
    /// a redirect to the configured onboarding path otherwise.
    fn deny(&self, request: &Request, context: Option<&C>) -> Response {
        let wants_json = request
            .headers()
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|accept| accept.contains("application/json"));

        if wants_json {
            let message = format!("Onboarding not completed for flow: {}.", self.flow_name);
            return (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({ "message": message })),
            )
                .into_response();
        }

        let mut target = self
            .manager
            .registry()
            .redirect_for(&self.flow_name)
            .to_string();
        if let Some(ctx) = context {
            target = target.replace(CONTEXT_PLACEHOLDER, &ctx.identity());
        }
        Redirect::to(&target).into_response()
    }
}

/// [`tower::Layer`] wrapping routes with an [`OnboardingGate`].
pub struct OnboardingGateLayer<U, C = ()> {
    gate: Arc<OnboardingGate<U, C>>,
}

impl<U, C> Clone for OnboardingGateLayer<U, C> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<S, U, C> Layer<S> for OnboardingGateLayer<U, C> {
    type Service = GateService<S, U, C>;

    fn layer(&self, inner: S) -> Self::Service {
        GateService {
            inner,
            gate: Arc::clone(&self.gate),
        }
    }
}

/// The middleware service produced by [`OnboardingGateLayer`].
pub struct GateService<S, U, C = ()> {
    inner: S,
    gate: Arc<OnboardingGate<U, C>>,
}

impl<S: Clone, U, C> Clone for GateService<S, U, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<S, U, C> Service<Request> for GateService<S, U, C>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    U: Clone + Send + Sync + 'static,
    C: Identify + Send + Sync + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let decision = self.gate.check(&request);
        // Take the service that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match decision {
                Ok(()) => inner.call(request).await,
                Err(denial) => Ok(denial),
            }
        })
    }
}
