pub mod config;
pub mod error;
pub mod mailer;
pub mod message;
pub mod submission;
pub mod template;
pub mod transport;

pub use config::MailerConfig;
pub use error::MailerError;
pub use mailer::Mailer;
pub use submission::Submission;
pub use template::{BodyFormat, MiniJinjaRenderer, TemplateRenderer};

// Re-export the transport seam for external use.
pub use transport::{Envelope, MailTransport, SmtpTransport};
