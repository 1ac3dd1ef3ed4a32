mod server;


pub use server::*;

use std::path::Path;

use serde::Deserialize;

use formrelay_mailer::MailerConfig;

use crate::api::HEALTH_PATH;
use crate::error::ServerError;

/// Environment variable that overrides `mailer.password` when set.
pub const PASSWORD_ENV: &str = "FORMRELAY_SMTP_PASSWORD";

/// Top-level configuration for the formrelay server, loaded from a TOML file.
#[derive(Debug, Deserialize)]
pub struct FormRelayConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Contact-form endpoint configuration.
    #[serde(default)]
    pub handler: HandlerConfig,
    /// Mail rendering and SMTP relay configuration.
    pub mailer: MailerConfig,
}

impl FormRelayConfig {
    /// Parse a configuration document.
    pub fn from_toml(contents: &str) -> Result<Self, ServerError> {
        toml::from_str(contents)
            .map_err(|e| ServerError::Config(format!("failed to parse config: {e}")))
    }

    /// Read and parse the configuration file at `path`.
    ///
    /// A `mailer.template_path` is resolved relative to the config file's
    /// directory and read into `mailer.template` unless an inline template
    /// is already set.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("failed to read config at {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml(&contents)?;
        config.resolve_template(path.parent().unwrap_or(Path::new(".")))?;
        Ok(config)
    }

    /// Replace the SMTP password with `value` when one is given.
    pub fn apply_password_override(&mut self, value: Option<String>) {
        if let Some(password) = value.filter(|p| !p.is_empty()) {
            self.mailer.password = password;
        }
    }

    /// Check the endpoint and mailer settings before serving.
    pub fn validate(&self) -> Result<(), ServerError> {
        let path = &self.handler.path;
        if !path.starts_with('/') {
            return Err(ServerError::Config(format!(
                "handler.path must start with '/', got '{path}'"
            )));
        }
        if path == HEALTH_PATH {
            return Err(ServerError::Config(format!(
                "handler.path must not be {HEALTH_PATH}"
            )));
        }
        if self.handler.max_body_bytes == 0 {
            return Err(ServerError::Config(
                "handler.max_body_bytes must be greater than zero".to_owned(),
            ));
        }
        self.mailer.validate()?;
        Ok(())
    }

    fn resolve_template(&mut self, base: &Path) -> Result<(), ServerError> {
        if self.mailer.template_override().is_some() {
            return Ok(());
        }
        let Some(template_path) = self.mailer.template_path.as_deref() else {
            return Ok(());
        };

        let template_path = if Path::new(template_path).is_relative() {
            base.join(template_path)
        } else {
            Path::new(template_path).to_path_buf()
        };

        let template = std::fs::read_to_string(&template_path).map_err(|e| {
            ServerError::Config(format!(
                "failed to read template at {}: {e}",
                template_path.display()
            ))
        })?;
        self.mailer.template = Some(template);
        Ok(())
    }
}
