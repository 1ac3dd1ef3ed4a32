//! Body template rendering.
//!
//! Templates use `MiniJinja` (Jinja2-compatible) syntax and bind the
//! submission's `name`, `email` and `message` fields. The HTML format
//! escapes every substituted value; the plain format substitutes verbatim.

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::{Deserialize, Serialize};

use crate::error::MailerError;
use crate::submission::Submission;

/// Fuel limit for `MiniJinja` template evaluation (denial-of-service protection).
const FUEL_LIMIT: u64 = 100_000;

/// Built-in body for plain-text messages.
pub const DEFAULT_PLAIN_TEMPLATE: &str = "\
Name: {{ name }}
Email: {{ email }}
Message: {{ message }}
";

/// Built-in body for HTML messages.
pub const DEFAULT_HTML_TEMPLATE: &str = "\
<html>
<body>
<p><strong>Name:</strong> {{ name }}</p>
<p><strong>Email:</strong> {{ email }}</p>
<p><strong>Message:</strong></p>
<p>{{ message }}</p>
</body>
</html>
";

/// Body format of an outgoing message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    /// `text/plain`, no escaping.
    #[default]
    Plain,
    /// `text/html`, values are HTML-escaped.
    Html,
}

impl BodyFormat {
    /// MIME type used in the `Content-Type` header.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Plain => "text/plain",
            Self::Html => "text/html",
        }
    }

    /// The built-in template for this format.
    pub fn default_template(self) -> &'static str {
        match self {
            Self::Plain => DEFAULT_PLAIN_TEMPLATE,
            Self::Html => DEFAULT_HTML_TEMPLATE,
        }
    }

    fn auto_escape(self) -> AutoEscape {
        match self {
            Self::Plain => AutoEscape::None,
            Self::Html => AutoEscape::Html,
        }
    }
}

/// Renders a body template against a submission.
///
/// Rendering must be a pure function of its inputs. Any failure is reported
/// as [`MailerError::Template`].
pub trait TemplateRenderer: Send + Sync + std::fmt::Debug {
    fn render(&self, template: &str, submission: &Submission) -> Result<String, MailerError>;
}

/// [`TemplateRenderer`] backed by `MiniJinja`.
///
/// Placeholders that do not name a submission field are rendering errors
/// rather than empty strings.
#[derive(Debug, Clone, Copy)]
pub struct MiniJinjaRenderer {
    format: BodyFormat,
}

impl MiniJinjaRenderer {
    pub fn new(format: BodyFormat) -> Self {
        Self { format }
    }

    fn environment(&self) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_fuel(Some(FUEL_LIMIT));
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        let format = self.format;
        env.set_auto_escape_callback(move |_| format.auto_escape());
        env
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, template: &str, submission: &Submission) -> Result<String, MailerError> {
        self.environment()
            .render_str(template, submission)
            .map_err(|e| MailerError::Template(e.to_string()))
    }
}
