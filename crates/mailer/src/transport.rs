use async_trait::async_trait;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::debug;

pub use lettre::address::Envelope;

use crate::config::{MailerConfig, parse_address};
use crate::error::MailerError;

/// Trait for pluggable message delivery.
///
/// Implementations move an already-assembled message to its recipients; the
/// [`Mailer`](crate::mailer::Mailer) owns rendering and assembly.
#[async_trait]
pub trait MailTransport: Send + Sync + std::fmt::Debug {
    /// Deliver `message` to every recipient in `envelope`. One attempt, no
    /// retry.
    async fn send_raw(&self, envelope: &Envelope, message: &[u8]) -> Result<(), MailerError>;

    /// Return the transport name (e.g. `"smtp"`).
    fn backend_name(&self) -> &'static str;
}

/// SMTP delivery using `lettre`, authenticating with the PLAIN mechanism.
pub struct SmtpTransport {
    host: String,
    port: u16,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpTransport")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("transport", &"<AsyncSmtpTransport>")
            .finish()
    }
}

impl SmtpTransport {
    /// Create a new `SmtpTransport` from the mailer configuration.
    pub fn new(config: &MailerConfig) -> Result<Self, MailerError> {
        let transport = build_transport(config)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Create a `SmtpTransport` with a pre-built transport (for testing).
    pub fn with_transport(
        config: &MailerConfig,
        transport: AsyncSmtpTransport<Tokio1Executor>,
    ) -> Self {
        Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            transport,
        }
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send_raw(&self, envelope: &Envelope, message: &[u8]) -> Result<(), MailerError> {
        debug!(
            host = %self.host,
            port = self.port,
            recipients = envelope.to().len(),
            "opening SMTP transaction"
        );
        self.transport
            .send_raw(envelope, message)
            .await
            .map_err(|e| map_smtp_error(&e))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "smtp"
    }
}

/// Envelope for every submission: the sender address as envelope-from and
/// one `RCPT TO` per configured recipient.
pub fn envelope_for(config: &MailerConfig) -> Result<Envelope, MailerError> {
    let from = parse_address(&config.from_address, "from address")?;
    let to = config
        .recipients
        .iter()
        .map(|r| parse_address(r, "recipient address"))
        .collect::<Result<Vec<_>, _>>()?;
    Envelope::new(Some(from), to)
        .map_err(|e| MailerError::Configuration(format!("invalid envelope: {e}")))
}

/// Build an async SMTP transport from the given configuration.
///
/// Credentials are the sender address and password; a configuration without
/// a password connects unauthenticated (local relays and test sinks).
fn build_transport(
    config: &MailerConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailerError> {
    let builder = if config.tls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| MailerError::Configuration(format!("SMTP TLS relay error: {e}")))?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
    };

    let builder = builder.port(config.smtp_port);

    let builder = if config.password.is_empty() {
        builder
    } else {
        builder
            .credentials(Credentials::new(
                config.from_address.clone(),
                config.password.clone(),
            ))
            .authentication(vec![Mechanism::Plain])
    };

    Ok(builder.build())
}

/// Map a lettre SMTP error to a [`MailerError::Delivery`].
///
/// The cause travels in the error only. Whether it is logged is up to the
/// caller.
fn map_smtp_error(error: &lettre::transport::smtp::Error) -> MailerError {
    let message = error.to_string();

    if error.is_transient() {
        MailerError::Delivery(format!("transient SMTP error: {message}"))
    } else if error.is_permanent() {
        MailerError::Delivery(format!("permanent SMTP error: {message}"))
    } else {
        MailerError::Delivery(format!("SMTP error: {message}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> MailerConfig {
        MailerConfig::new("localhost", "forms@example.com")
            .with_recipients(["team@example.com", "owner@example.com"])
            .with_port(2525)
            .with_tls(false)
    }

    #[test]
    fn envelope_uses_sender_and_all_recipients() {
        let envelope = envelope_for(&test_config()).unwrap();
        assert_eq!(
            envelope.from().map(ToString::to_string).as_deref(),
            Some("forms@example.com")
        );
        let to: Vec<String> = envelope.to().iter().map(ToString::to_string).collect();
        assert_eq!(to, vec!["team@example.com", "owner@example.com"]);
    }

    #[test]
    fn envelope_requires_recipients() {
        let config = MailerConfig::new("localhost", "forms@example.com");
        let err = envelope_for(&config).unwrap_err();
        assert!(matches!(err, MailerError::Configuration(_)));
    }

    #[test]
    fn envelope_rejects_invalid_from() {
        let mut config = test_config();
        config.from_address = "nope".to_owned();
        assert!(matches!(
            envelope_for(&config),
            Err(MailerError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn build_transport_no_tls() {
        assert!(build_transport(&test_config()).is_ok());
    }

    #[tokio::test]
    async fn build_transport_with_password() {
        let config = test_config().with_password("secret");
        assert!(build_transport(&config).is_ok());
    }

    #[tokio::test]
    async fn build_transport_with_tls() {
        let config = test_config().with_tls(true);
        assert!(build_transport(&config).is_ok());
    }

    #[tokio::test]
    async fn smtp_transport_name_and_debug() {
        let transport = SmtpTransport::new(&test_config()).unwrap();
        assert_eq!(transport.backend_name(), "smtp");
        let debug = format!("{transport:?}");
        assert!(debug.contains("SmtpTransport"));
        assert!(debug.contains("2525"));
    }

    #[tokio::test]
    async fn unreachable_server_is_delivery_error() {
        // Port 1 on localhost is not an SMTP server.
        let config = test_config().with_port(1);
        let transport = SmtpTransport::new(&config).unwrap();
        let envelope = envelope_for(&config).unwrap();
        let err = transport
            .send_raw(&envelope, b"Subject: test\r\n\r\nbody")
            .await
            .unwrap_err();
        assert!(matches!(err, MailerError::Delivery(_)));
    }
}
