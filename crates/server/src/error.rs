use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use formrelay_mailer::MailerError;

/// Response text for any failure reading or decoding the request body.
pub const INVALID_BODY_MESSAGE: &str = "invalid request body";

/// Response text for any failure rendering or relaying the message.
pub const SEND_FAILED_MESSAGE: &str = "unable to send message";

/// Errors that can occur when starting the formrelay server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The mailer could not be built from the configuration.
    #[error("mailer error: {0}")]
    Mailer(#[from] MailerError),
}

/// Errors produced while handling a contact-form request.
///
/// Every variant is reported to the client as HTTP 400 with a fixed message;
/// the underlying cause only ever reaches the log.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body could not be read (I/O failure or too large).
    #[error("failed to read request body: {0}")]
    BodyRead(String),

    /// The request body is not a valid submission document.
    #[error("failed to decode request body: {0}")]
    BodyDecode(String),

    /// Rendering or delivery failed.
    #[error(transparent)]
    Mail(#[from] MailerError),
}

impl ApiError {
    /// The underlying cause, for logging.
    pub fn detail(&self) -> String {
        match self {
            Self::BodyRead(detail) | Self::BodyDecode(detail) => detail.clone(),
            Self::Mail(e @ MailerError::Template(_)) => format!("{e}: {}", e.detail()),
            Self::Mail(e) => e.to_string(),
        }
    }

    /// The client-facing message for this error.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::BodyRead(_) | Self::BodyDecode(_) => INVALID_BODY_MESSAGE,
            Self::Mail(_) => SEND_FAILED_MESSAGE,
        }
    }
}

/// JSON body written on failure.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorPayload {
            message: self.public_message().to_owned(),
        };
        (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
    }
}
