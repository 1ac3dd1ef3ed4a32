use tracing::{debug, info, instrument};

use crate::config::MailerConfig;
use crate::error::MailerError;
use crate::message::{assemble, subject_for};
use crate::submission::Submission;
use crate::template::{MiniJinjaRenderer, TemplateRenderer};
use crate::transport::{Envelope, MailTransport, SmtpTransport, envelope_for};

/// Renders contact-form submissions and relays them to the configured
/// recipients.
///
/// Each call to [`Mailer::send`] is one linear pass: render the body,
/// assemble the message, hand it to the transport once. Nothing is retried
/// and nothing is kept after the call returns.
///
/// # Examples
///
/// ```no_run
/// use formrelay_mailer::{Mailer, MailerConfig, Submission};
///
/// # async fn run() -> Result<(), formrelay_mailer::MailerError> {
/// let config = MailerConfig::new("smtp.example.com", "forms@example.com")
///     .with_recipients(["team@example.com"])
///     .with_password("secret");
/// let mailer = Mailer::smtp(config)?;
/// mailer
///     .send(&Submission::new("Ann", "ann@example.com", "Hi"))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Mailer {
    config: MailerConfig,
    envelope: Envelope,
    renderer: Box<dyn TemplateRenderer>,
    transport: Box<dyn MailTransport>,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("config", &self.config)
            .field("renderer", &self.renderer)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl Mailer {
    /// Create a `Mailer` that delivers through the given transport.
    ///
    /// Validates the configuration and pre-computes the envelope. The
    /// renderer follows the configured body format.
    pub fn new(
        config: MailerConfig,
        transport: Box<dyn MailTransport>,
    ) -> Result<Self, MailerError> {
        config.validate()?;
        let envelope = envelope_for(&config)?;
        let renderer = Box::new(MiniJinjaRenderer::new(config.format));
        Ok(Self {
            config,
            envelope,
            renderer,
            transport,
        })
    }

    /// Create a `Mailer` with an SMTP transport built from `config`.
    pub fn smtp(config: MailerConfig) -> Result<Self, MailerError> {
        let transport = SmtpTransport::new(&config)?;
        Self::new(config, Box::new(transport))
    }

    /// Replace the template renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Box<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// The template in effect: the configured override, else the built-in
    /// default for the body format.
    pub fn template(&self) -> &str {
        self.config
            .template_override()
            .unwrap_or_else(|| self.config.format.default_template())
    }

    /// Render the message body for a submission without sending it.
    pub fn render_body(&self, submission: &Submission) -> Result<String, MailerError> {
        self.renderer.render(self.template(), submission)
    }

    /// Render, assemble and relay a submission.
    #[instrument(
        skip_all,
        fields(
            backend = self.transport.backend_name(),
            recipients = self.envelope.to().len()
        )
    )]
    pub async fn send(&self, submission: &Submission) -> Result<(), MailerError> {
        debug!("rendering message body");
        let body = self.render_body(submission)?;

        let subject = subject_for(&self.config, submission);
        let message = assemble(&subject, self.config.format, &body);

        debug!(bytes = message.len(), "relaying message");
        self.transport.send_raw(&self.envelope, &message).await?;

        info!("contact form submission relayed");
        Ok(())
    }
}
