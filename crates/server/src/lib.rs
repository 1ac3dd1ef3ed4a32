//! formrelay server library.
//!
//! Modules:
//! - `api`: Axum router and the contact-form handler
//! - `config`: TOML configuration file
//! - `error`: startup and request error types
//! - `telemetry`: tracing subscriber setup

pub mod api;
pub mod config;
pub mod error;
pub mod telemetry;
