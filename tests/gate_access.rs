//! Integration tests for the onboarding access gate.
//!
//! Each test builds a real axum `Router` wrapped in the gate layer and
//! drives it through `tower::ServiceExt::oneshot`, exercising the full
//! allow / redirect / 403-JSON / 401 contract.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::routing::get;
use serde_json::Value;
use tower::ServiceExt;

use user_onboarding::{
    EventSink, FlowRegistry, Identify, MemorySink, OnboardingGate, OnboardingManager, Step,
};

/// Initialize tracing once so gate denial logs are capturable with
/// `RUST_LOG=debug cargo test -- --nocapture`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone)]
struct TestUser {
    profile_done: bool,
    email_verified: bool,
}

#[derive(Debug, Clone)]
struct Company {
    id: String,
    name: Option<String>,
}

impl Identify for Company {
    fn identity(&self) -> String {
        self.id.clone()
    }
}

fn onboarded_user() -> TestUser {
    TestUser {
        profile_done: true,
        email_verified: true,
    }
}

fn fresh_user() -> TestUser {
    TestUser {
        profile_done: false,
        email_verified: false,
    }
}

fn registry() -> Arc<FlowRegistry<TestUser>> {
    Arc::new(
        FlowRegistry::<TestUser>::builder()
            .flow(
                "default",
                [
                    Step::new("profile").check(|u: &TestUser, _| u.profile_done),
                    Step::new("verify_email").check(|u: &TestUser, _| u.email_verified),
                ],
            )
            .flow(
                "billing",
                [
                    Step::new("payment_method").check(|u: &TestUser, _| u.profile_done),
                    Step::new("first_invoice").check(|_, _| false),
                ],
            )
            .flow("empty", [])
            .build()
            .unwrap(),
    )
}

fn company_registry() -> Arc<FlowRegistry<TestUser, Company>> {
    Arc::new(
        FlowRegistry::<TestUser, Company>::builder()
            .flow(
                "company_setup",
                [Step::new("has_name").check(|_, company: Option<&Company>| {
                    company.is_some_and(|c| c.name.is_some())
                })],
            )
            .redirect("company_setup", "/onboarding/{context}")
            .build()
            .unwrap(),
    )
}

/// Router with a single protected route behind the given gate.
fn protected_app(gate: OnboardingGate<TestUser>) -> Router {
    init_tracing();
    Router::new()
        .route("/protected", get(|| async { "ok" }))
        .layer(gate.layer())
}

fn request(user: Option<TestUser>) -> Request {
    let mut builder = Request::builder().uri("/protected");
    if let Some(user) = user {
        builder = builder.extension(user);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn denies_unauthenticated_requests() {
    let app = protected_app(OnboardingGate::new(Arc::new(OnboardingManager::new(registry()))));

    let response = app.oneshot(request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn redirects_when_onboarding_incomplete() {
    let app = protected_app(OnboardingGate::new(Arc::new(OnboardingManager::new(registry()))));

    let response = app.oneshot(request(Some(fresh_user()))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/onboarding"
    );
}

#[tokio::test]
async fn allows_when_onboarding_complete() {
    let app = protected_app(OnboardingGate::new(Arc::new(OnboardingManager::new(registry()))));

    let response = app.oneshot(request(Some(onboarded_user()))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn json_clients_get_403_with_message() {
    let app = protected_app(OnboardingGate::new(Arc::new(OnboardingManager::new(registry()))));

    let req = Request::builder()
        .uri("/protected")
        .header(header::ACCEPT, "application/json")
        .extension(fresh_user())
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body["message"],
        "Onboarding not completed for flow: default."
    );
}

#[tokio::test]
async fn required_step_met_passes_even_if_flow_incomplete() {
    // "payment_method" is satisfied but "first_invoice" never is.
    let gate = OnboardingGate::new(Arc::new(OnboardingManager::new(registry())))
        .flow("billing")
        .required_step("payment_method");
    let app = protected_app(gate);

    let response = app.oneshot(request(Some(onboarded_user()))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn required_step_unmet_denies() {
    let gate = OnboardingGate::new(Arc::new(OnboardingManager::new(registry())))
        .flow("billing")
        .required_step("first_invoice");
    let app = protected_app(gate);

    let response = app.oneshot(request(Some(onboarded_user()))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn empty_flow_is_denied_despite_vacuous_completion() {
    let gate = OnboardingGate::new(Arc::new(OnboardingManager::new(registry()))).flow("empty");
    let app = protected_app(gate);

    let response = app.oneshot(request(Some(onboarded_user()))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn unregistered_flow_is_a_server_error() {
    let gate = OnboardingGate::new(Arc::new(OnboardingManager::new(registry()))).flow("missing");
    let app = protected_app(gate);

    let response = app.oneshot(request(Some(onboarded_user()))).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn context_identity_fills_redirect_placeholder() {
    init_tracing();
    let gate = OnboardingGate::new(Arc::new(OnboardingManager::new(company_registry())))
        .flow("company_setup")
        .resolve_context_with(|req: &Request| req.extensions().get::<Company>().cloned());

    let app = Router::new()
        .route("/company/dashboard", get(|| async { "ok" }))
        .layer(gate.layer());

    let company = Company {
        id: "cmp_123".to_string(),
        name: None,
    };
    let req = Request::builder()
        .uri("/company/dashboard")
        .extension(fresh_user())
        .extension(company)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/onboarding/cmp_123"
    );
}

#[tokio::test]
async fn completed_context_flow_passes() {
    init_tracing();
    let gate = OnboardingGate::new(Arc::new(OnboardingManager::new(company_registry())))
        .flow("company_setup")
        .resolve_context_with(|req: &Request| req.extensions().get::<Company>().cloned());

    let app = Router::new()
        .route("/company/dashboard", get(|| async { "ok" }))
        .layer(gate.layer());

    let company = Company {
        id: "cmp_999".to_string(),
        name: Some("Acme Ltd".to_string()),
    };
    let req = Request::builder()
        .uri("/company/dashboard")
        .extension(fresh_user())
        .extension(company)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn gate_emits_started_event_per_request() {
    let sink = Arc::new(MemorySink::new());
    let manager = OnboardingManager::with_sink(
        registry(),
        Arc::clone(&sink) as Arc<dyn EventSink<TestUser>>,
    );
    let app = protected_app(OnboardingGate::new(Arc::new(manager)));

    app.oneshot(request(Some(onboarded_user()))).await.unwrap();
    assert_eq!(sink.len(), 1);
}
