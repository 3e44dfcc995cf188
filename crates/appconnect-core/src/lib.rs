//! appconnect core - credentials and configuration
//!
//! This crate owns the credential bundle used to talk to App Store Connect
//! and everything needed to assemble it: config file discovery, `.env`
//! loading, environment overrides, and validation. It performs no network
//! I/O.

pub mod config;
pub mod error;

pub use config::{ConnectConfig, Credentials, TlsMode, UploadRetryConfig};
pub use error::{ConfigError, Result};
