pub mod contact;
pub mod health;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use formrelay_mailer::Mailer;

/// Path of the liveness endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Shared application state passed to all handlers.
///
/// Read-only for the lifetime of the server; cloned per request.
#[derive(Clone)]
pub struct AppState {
    /// The mailer that renders and relays submissions.
    pub mailer: Arc<Mailer>,
    /// Log the underlying cause of failed submissions.
    pub log_errors: bool,
    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
}

/// Build the Axum router: the contact-form endpoint at `contact_path` and
/// the health check, both wrapped in request tracing.
pub fn router(state: AppState, contact_path: &str) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health::health))
        .route(contact_path, post(contact::submit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
