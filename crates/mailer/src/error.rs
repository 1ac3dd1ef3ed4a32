use thiserror::Error;

/// Errors that can occur while rendering or relaying a contact message.
#[derive(Debug, Error)]
pub enum MailerError {
    /// The mailer was given invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The body template could not be parsed or rendered.
    ///
    /// The display string is fixed regardless of the cause; the cause itself
    /// is available through [`MailerError::detail`].
    #[error("unable to parse email template")]
    Template(String),

    /// The SMTP transaction failed (connection, authentication or protocol).
    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl MailerError {
    /// The underlying cause, suitable for logs but not for HTTP responses.
    pub fn detail(&self) -> &str {
        match self {
            Self::Configuration(detail) | Self::Template(detail) | Self::Delivery(detail) => detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_error_hides_cause_in_display() {
        let err = MailerError::Template("syntax error: unexpected end of input".into());
        assert_eq!(err.to_string(), "unable to parse email template");
        assert_eq!(err.detail(), "syntax error: unexpected end of input");
    }

    #[test]
    fn error_display() {
        let err = MailerError::Configuration("no recipients".into());
        assert_eq!(err.to_string(), "invalid configuration: no recipients");

        let err = MailerError::Delivery("connection refused".into());
        assert_eq!(err.to_string(), "delivery failed: connection refused");
    }
}
