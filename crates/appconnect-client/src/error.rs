//! Client error types

use appconnect_core::ConfigError;
use thiserror::Error;

/// Classified App Store Connect API failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 401: the token was rejected
    #[error("Unauthorized: {detail}")]
    Unauthorized { detail: String },

    /// 403: the key lacks access to the resource
    #[error("Forbidden: {detail}")]
    Forbidden { detail: String },

    /// 404 for the requested path
    #[error("Resource not found: {path}")]
    NotFound { path: String, detail: String },

    /// 429
    #[error("Rate limited by App Store Connect{}", retry_hint(.retry_after))]
    RateLimited {
        retry_after: Option<u64>,
        detail: String,
    },

    /// Any other failure, carrying the upstream detail
    #[error("API error ({status}): {detail}")]
    Generic { status: u16, detail: String },

    /// A web-session endpoint rejected the request
    #[error("{message}")]
    SessionRequired { status: u16, message: String },
}

fn retry_hint(retry_after: &Option<u64>) -> String {
    match retry_after {
        Some(secs) => format!(", retry after {} seconds", secs),
        None => String::new(),
    }
}

/// Kind of an [`ApiError`], without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimited,
    Generic,
    SessionRequired,
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::Unauthorized { .. } => ApiErrorKind::Unauthorized,
            Self::Forbidden { .. } => ApiErrorKind::Forbidden,
            Self::NotFound { .. } => ApiErrorKind::NotFound,
            Self::RateLimited { .. } => ApiErrorKind::RateLimited,
            Self::Generic { .. } => ApiErrorKind::Generic,
            Self::SessionRequired { .. } => ApiErrorKind::SessionRequired,
        }
    }

    /// HTTP status the error was classified from
    pub fn status(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 401,
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::RateLimited { .. } => 429,
            Self::Generic { status, .. } | Self::SessionRequired { status, .. } => *status,
        }
    }

    /// Upstream detail text
    pub fn detail(&self) -> &str {
        match self {
            Self::Unauthorized { detail }
            | Self::Forbidden { detail }
            | Self::NotFound { detail, .. }
            | Self::RateLimited { detail, .. }
            | Self::Generic { detail, .. } => detail,
            Self::SessionRequired { message, .. } => message,
        }
    }
}

/// Errors returned by the client
#[derive(Debug, Error)]
pub enum Error {
    /// Bad or missing credentials, raised before any request
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Classified API failure
    #[error(transparent)]
    Api(#[from] ApiError),

    /// No app matched a bundle identifier
    #[error("App not found: {0}")]
    AppNotFound(String),

    /// Caller passed an argument the API would reject
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Asset upload failed
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Response did not have the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL error
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this is a configuration problem rather than a request failure
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Kind of the underlying API error, if any
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Self::Api(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_message() {
        let err = ApiError::RateLimited {
            retry_after: Some(30),
            detail: String::new(),
        };
        assert_eq!(err.to_string(), "Rate limited by App Store Connect, retry after 30 seconds");

        let err = ApiError::RateLimited {
            retry_after: None,
            detail: String::new(),
        };
        assert_eq!(err.to_string(), "Rate limited by App Store Connect");
    }

    #[test]
    fn test_status_and_kind() {
        let err = ApiError::NotFound {
            path: "/apps/1".to_string(),
            detail: "gone".to_string(),
        };
        assert_eq!(err.status(), 404);
        assert_eq!(err.kind(), ApiErrorKind::NotFound);
        assert_eq!(err.detail(), "gone");

        let wrapped = Error::from(err);
        assert_eq!(wrapped.api_kind(), Some(ApiErrorKind::NotFound));
        assert!(!wrapped.is_config());
    }

    #[test]
    fn test_config_errors_are_flagged() {
        let err = Error::from(ConfigError::MissingField("APP_STORE_CONNECT_KEY_ID".to_string()));
        assert!(err.is_config());
        assert!(err.to_string().contains("APP_STORE_CONNECT_KEY_ID"));
    }
}
