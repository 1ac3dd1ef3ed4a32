use serde::Deserialize;

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds to wait for in-flight requests after a shutdown signal.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Contact-form endpoint configuration.
#[derive(Debug, Deserialize)]
pub struct HandlerConfig {
    /// Path the contact-form endpoint is mounted at (`POST` only).
    #[serde(default = "default_path")]
    pub path: String,
    /// Log the underlying cause of failed submissions.
    ///
    /// The client response never carries the cause either way.
    #[serde(default)]
    pub log_errors: bool,
    /// Largest request body accepted, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            log_errors: false,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_path() -> String {
    "/contact".to_owned()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}
