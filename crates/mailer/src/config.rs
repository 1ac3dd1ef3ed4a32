use lettre::Address;
use serde::{Deserialize, Serialize};

use crate::error::MailerError;
use crate::template::BodyFormat;

/// Configuration for relaying contact-form submissions.
///
/// Constructed once at startup and shared read-only across requests. The
/// sender address doubles as the SMTP username and the envelope-from.
///
/// # Examples
///
/// ```
/// use formrelay_mailer::MailerConfig;
///
/// let config = MailerConfig::new("smtp.example.com", "forms@example.com")
///     .with_recipients(["team@example.com"])
///     .with_password("secret");
/// assert_eq!(config.smtp_port, 587);
/// assert!(config.tls);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    /// Addresses that receive every submission.
    #[serde(default)]
    pub recipients: Vec<String>,

    /// Sender address, used as SMTP username and envelope-from.
    pub from_address: String,

    /// SMTP password or app secret for the sender.
    #[serde(default)]
    pub password: String,

    /// SMTP server hostname.
    pub smtp_host: String,

    /// SMTP server port. Defaults to 587 (STARTTLS submission port).
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Whether to upgrade the connection with STARTTLS. Defaults to `true`.
    #[serde(default = "default_tls")]
    pub tls: bool,

    /// Subject override. When unset the subject is derived from the
    /// submitter's name.
    #[serde(default)]
    pub subject: Option<String>,

    /// Inline body template override (`MiniJinja` syntax).
    #[serde(default)]
    pub template: Option<String>,

    /// Path of a file holding the body template. Read by the config loader
    /// into `template` when no inline template is given.
    #[serde(default)]
    pub template_path: Option<String>,

    /// Body format of the outgoing message.
    #[serde(default)]
    pub format: BodyFormat,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_tls() -> bool {
    true
}

impl std::fmt::Debug for MailerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailerConfig")
            .field("recipients", &self.recipients)
            .field("from_address", &self.from_address)
            .field(
                "password",
                &if self.password.is_empty() {
                    ""
                } else {
                    "[REDACTED]"
                },
            )
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("tls", &self.tls)
            .field("subject", &self.subject)
            .field("template", &self.template.as_ref().map(|_| "<custom>"))
            .field("template_path", &self.template_path)
            .field("format", &self.format)
            .finish()
    }
}

impl MailerConfig {
    /// Create a new `MailerConfig` with the given SMTP host and sender.
    ///
    /// Uses port 587 with STARTTLS, plain-text bodies, no recipients and an
    /// empty password.
    pub fn new(smtp_host: impl Into<String>, from_address: impl Into<String>) -> Self {
        Self {
            recipients: Vec::new(),
            from_address: from_address.into(),
            password: String::new(),
            smtp_host: smtp_host.into(),
            smtp_port: default_smtp_port(),
            tls: default_tls(),
            subject: None,
            template: None,
            template_path: None,
            format: BodyFormat::default(),
        }
    }

    /// Replace the recipient list.
    #[must_use]
    pub fn with_recipients<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipients = recipients.into_iter().map(Into::into).collect();
        self
    }

    /// Set the sender's SMTP password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Override the default SMTP port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.smtp_port = port;
        self
    }

    /// Set whether STARTTLS should be used.
    #[must_use]
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Set a fixed subject line.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set a custom body template.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set the body format.
    #[must_use]
    pub fn with_format(mut self, format: BodyFormat) -> Self {
        self.format = format;
        self
    }

    /// The configured subject, if set and non-empty.
    pub fn subject_override(&self) -> Option<&str> {
        self.subject.as_deref().filter(|s| !s.is_empty())
    }

    /// The configured template, if set and non-empty.
    pub fn template_override(&self) -> Option<&str> {
        self.template.as_deref().filter(|t| !t.is_empty())
    }

    /// Check that the configuration can address an SMTP transaction.
    pub fn validate(&self) -> Result<(), MailerError> {
        if self.smtp_host.trim().is_empty() {
            return Err(MailerError::Configuration(
                "smtp_host must not be empty".to_owned(),
            ));
        }
        if self.recipients.is_empty() {
            return Err(MailerError::Configuration(
                "at least one recipient is required".to_owned(),
            ));
        }
        parse_address(&self.from_address, "from address")?;
        for recipient in &self.recipients {
            parse_address(recipient, "recipient address")?;
        }
        Ok(())
    }
}

/// Parse an address, tagging failures with what the address is for.
pub(crate) fn parse_address(raw: &str, role: &str) -> Result<Address, MailerError> {
    raw.trim()
        .parse()
        .map_err(|e| MailerError::Configuration(format!("invalid {role} '{raw}': {e}")))
}
