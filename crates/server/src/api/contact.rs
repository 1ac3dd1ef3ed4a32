//! Contact-form endpoint.

use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, instrument};

use formrelay_mailer::Submission;

use crate::error::ApiError;

use super::AppState;

/// `POST {path}` -- relay a contact-form submission by email.
///
/// Expects a JSON object with optional string fields `name`, `email` and
/// `message`. Responds `200` with an empty body once the message has been
/// handed to the SMTP server. Any failure stops processing at that step and
/// responds `400` with `{"message": ...}`.
#[instrument(skip_all)]
pub async fn submit(State(state): State<AppState>, body: Body) -> Response {
    match relay(&state, body).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            if state.log_errors {
                error!(error = %e.detail(), "contact form submission failed");
            }
            e.into_response()
        }
    }
}

async fn relay(state: &AppState, body: Body) -> Result<(), ApiError> {
    let bytes = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| ApiError::BodyRead(e.to_string()))?;

    let submission: Submission =
        serde_json::from_slice(&bytes).map_err(|e| ApiError::BodyDecode(e.to_string()))?;

    state.mailer.send(&submission).await?;
    Ok(())
}
