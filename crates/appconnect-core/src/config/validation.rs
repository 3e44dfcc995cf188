//! Configuration validation
//!
//! Runs once when a client is built, before any request is made.

use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::defaults::*;
use super::types::{ConnectConfig, Credentials};

/// Validate a full client configuration
pub fn validate_config(config: &ConnectConfig) -> Result<()> {
    debug!("validating configuration");
    validate_credentials(&config.credentials)?;

    if config.upload.attempts == 0 {
        return Err(ConfigError::invalid("upload.attempts", "must be at least 1"));
    }
    validate_base_url("api_base_url", &config.api_base_url)?;
    validate_base_url("web_base_url", &config.web_base_url)?;

    debug!("configuration validation passed");
    Ok(())
}

/// Validate the credential bundle: required fields are present, optional
/// fields are not blank, and the key file exists and is readable.
pub fn validate_credentials(credentials: &Credentials) -> Result<()> {
    require(ENV_KEY_ID, &credentials.key_id)?;
    require(ENV_ISSUER_ID, &credentials.issuer_id)?;
    require(
        ENV_PRIVATE_KEY_PATH,
        &credentials.private_key_path.to_string_lossy(),
    )?;

    not_blank(ENV_APP_ID, credentials.app_id.as_deref())?;
    not_blank(ENV_BUNDLE_ID, credentials.bundle_id.as_deref())?;

    read_private_key(&credentials.private_key_path).map(|_| ())
}

/// Read the PEM contents of the private key file
pub fn read_private_key(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(ConfigError::KeyFileNotFound(path.to_path_buf()));
    }

    std::fs::read_to_string(path).map_err(|source| ConfigError::KeyFileUnreadable {
        path: path.to_path_buf(),
        source,
    })
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField(field.to_string()));
    }
    Ok(())
}

fn not_blank(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ConfigError::invalid(field, "cannot be blank")),
        _ => Ok(()),
    }
}

fn validate_base_url(field: &str, value: &str) -> Result<()> {
    if !(value.starts_with("https://") || value.starts_with("http://")) {
        return Err(ConfigError::invalid(field, "must be an http(s) URL"));
    }
    Ok(())
}
