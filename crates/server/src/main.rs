use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use formrelay_mailer::Mailer;
use formrelay_server::api::{self, AppState};
use formrelay_server::config::{FormRelayConfig, PASSWORD_ENV};

/// formrelay contact-form HTTP server.
#[derive(Parser, Debug)]
#[command(
    name = "formrelay-server",
    about = "Relay contact-form submissions to a mailbox over SMTP"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "formrelay.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    formrelay_server::telemetry::init();

    let mut config = FormRelayConfig::load(Path::new(&cli.config))?;
    config.apply_password_override(std::env::var(PASSWORD_ENV).ok());
    config.validate()?;

    let FormRelayConfig {
        server,
        handler,
        mailer,
    } = config;

    info!(
        smtp_host = %mailer.smtp_host,
        smtp_port = mailer.smtp_port,
        tls = mailer.tls,
        recipients = mailer.recipients.len(),
        format = ?mailer.format,
        "building SMTP mailer"
    );
    let mailer = Mailer::smtp(mailer)?;

    let state = AppState {
        mailer: Arc::new(mailer),
        log_errors: handler.log_errors,
        max_body_bytes: handler.max_body_bytes,
    };
    let app = api::router(state, &handler.path);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(server.host);
    let port = cli.port.unwrap_or(server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, path = %handler.path, "formrelay-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM. In-flight requests
    // get `shutdown_timeout_seconds` to finish once the signal arrives.
    let signalled = Arc::new(tokio::sync::Notify::new());
    let serve = axum::serve(listener, app)
        .with_graceful_shutdown({
            let signalled = Arc::clone(&signalled);
            async move {
                shutdown_signal().await;
                signalled.notify_one();
            }
        })
        .into_future();
    tokio::pin!(serve);

    tokio::select! {
        result = &mut serve => result?,
        () = signalled.notified() => {
            let shutdown_timeout = Duration::from_secs(server.shutdown_timeout_seconds);
            info!(
                timeout_secs = server.shutdown_timeout_seconds,
                "waiting for in-flight requests..."
            );
            match tokio::time::timeout(shutdown_timeout, &mut serve).await {
                Ok(result) => result?,
                Err(_) => warn!(
                    timeout_secs = server.shutdown_timeout_seconds,
                    "shutdown timeout exceeded, abandoning in-flight requests"
                ),
            }
        }
    }

    info!("formrelay-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
