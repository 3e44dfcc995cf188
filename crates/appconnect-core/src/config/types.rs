//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

/// Credential bundle for the App Store Connect API
///
/// Immutable once a client has been built from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// API key ID (the `kid` header of the token)
    pub key_id: String,

    /// Issuer ID (the `iss` claim)
    pub issuer_id: String,

    /// Path to the `.p8` private key
    pub private_key_path: PathBuf,

    /// App Store Connect app ID used by app-scoped calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,

    /// Bundle identifier of the app
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
}

/// TLS certificate verification mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    /// Verify server certificates (default)
    #[default]
    Verify,
    /// Accept any certificate, for hosts behind intercepting proxies
    AcceptInvalidCerts,
}

impl TlsMode {
    /// Parse the `APP_STORE_CONNECT_SSL_VERIFY` flag
    pub fn from_flag(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(Self::Verify),
            "0" | "false" | "no" | "off" => Some(Self::AcceptInvalidCerts),
            _ => None,
        }
    }

    pub fn verifies(&self) -> bool {
        matches!(self, Self::Verify)
    }
}

/// Retry settings for multipart asset uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadRetryConfig {
    /// Attempts per chunk, including the first
    pub attempts: u32,

    /// Fixed pause between attempts
    pub sleep_secs: u64,
}

impl Default for UploadRetryConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_UPLOAD_ATTEMPTS,
            sleep_secs: DEFAULT_UPLOAD_RETRY_SLEEP_SECS,
        }
    }
}

/// Everything needed to build a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectConfig {
    /// API credentials
    pub credentials: Credentials,

    /// TLS verification mode
    pub tls: TlsMode,

    /// Request timeout in seconds; `None` keeps the HTTP client default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Upload retry settings
    pub upload: UploadRetryConfig,

    /// Web session string for the Resolution Center
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,

    /// Public API base URL
    pub api_base_url: String,

    /// Web API base URL
    pub web_base_url: String,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            tls: TlsMode::default(),
            timeout_secs: None,
            upload: UploadRetryConfig::default(),
            session: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            web_base_url: DEFAULT_WEB_BASE_URL.to_string(),
        }
    }
}

impl ConnectConfig {
    /// Config with the given credentials and defaults elsewhere
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials,
            ..Default::default()
        }
    }
}
