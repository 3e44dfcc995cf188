//! ES256 token generation for the App Store Connect API

use std::fmt;
use std::path::Path;
use std::sync::Mutex;

use appconnect_core::config::read_private_key;
use appconnect_core::{ConfigError, Credentials};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Lifetime of a generated token
pub const TOKEN_LIFETIME_SECS: i64 = 20 * 60;

/// `aud` claim expected by App Store Connect
pub const AUDIENCE: &str = "appstoreconnect-v1";

/// Cached tokens are replaced this long before they expire
const REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// JWT claims for App Store Connect API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
}

/// Signs bearer tokens with an API key
pub struct TokenGenerator {
    key_id: String,
    issuer_id: String,
    key: EncodingKey,
}

impl fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGenerator")
            .field("key_id", &self.key_id)
            .field("issuer_id", &self.issuer_id)
            .finish_non_exhaustive()
    }
}

impl TokenGenerator {
    /// Create a generator from PEM (PKCS8) key bytes
    pub fn new(
        key_id: impl Into<String>,
        issuer_id: impl Into<String>,
        pem: &[u8],
    ) -> Result<Self> {
        let key = EncodingKey::from_ec_pem(pem)?;
        Ok(Self {
            key_id: key_id.into(),
            issuer_id: issuer_id.into(),
            key,
        })
    }

    /// Load the key named by the credentials and check that it can sign.
    ///
    /// Every failure here is a [`ConfigError`].
    pub fn from_credentials(credentials: &Credentials) -> std::result::Result<Self, ConfigError> {
        let path = &credentials.private_key_path;
        let pem = read_private_key(path)?;

        let generator = Self::new(&credentials.key_id, &credentials.issuer_id, pem.as_bytes())
            .map_err(|e| invalid_key(path, e))?;
        generator.generate().map_err(|e| invalid_key(path, e))?;

        Ok(generator)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Claims for a token issued at `now`
    pub fn claims_at(&self, now: DateTime<Utc>) -> Claims {
        let iat = now.timestamp();
        Claims {
            iss: self.issuer_id.clone(),
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
            aud: AUDIENCE.to_string(),
        }
    }

    /// Sign a token issued at `now`
    pub fn generate_at(&self, now: DateTime<Utc>) -> Result<String> {
        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.key_id.clone());

        Ok(encode(&header, &self.claims_at(now), &self.key)?)
    }

    /// Sign a token issued now
    pub fn generate(&self) -> Result<String> {
        self.generate_at(Utc::now())
    }
}

fn invalid_key(path: &Path, err: impl fmt::Display) -> ConfigError {
    ConfigError::InvalidKey {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Reuses a token until it is close to expiry
pub struct TokenCache {
    generator: TokenGenerator,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(generator: TokenGenerator) -> Self {
        Self {
            generator,
            cached: Mutex::new(None),
        }
    }

    pub fn generator(&self) -> &TokenGenerator {
        &self.generator
    }

    /// Current bearer token, regenerated when within the refresh margin
    pub fn bearer(&self) -> Result<String> {
        self.bearer_at(Utc::now())
    }

    pub fn bearer_at(&self, now: DateTime<Utc>) -> Result<String> {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(ref current) = *cached {
            if now < current.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) {
                return Ok(current.token.clone());
            }
        }

        debug!(kid = %self.generator.key_id, "generating API token");
        let token = self.generator.generate_at(now)?;
        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at: now + Duration::seconds(TOKEN_LIFETIME_SECS),
        });

        Ok(token)
    }
}
