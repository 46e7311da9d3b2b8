//! Google service-account credentials.
//!
//! The key is supplied either as raw JSON or as a path to the key file, and
//! is exchanged for an OAuth access token with the JWT-bearer grant.

use std::path::Path;

use analytics_core::error::{AnalyticsError, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::{check_status, transport};

/// Read-only Drive scope.
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account key file this crate needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ServiceAccountKey {
    /// Load a key from `value`: JSON text if it parses as JSON, otherwise a
    /// path to a key file.
    pub fn load(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
            return Self::from_json(trimmed);
        }
        Self::from_file(Path::new(trimmed))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AnalyticsError::Config(format!(
                "cannot read service account key {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let key: Self = serde_json::from_str(text).map_err(|e| {
            AnalyticsError::Config(format!("invalid service account key: {}", e))
        })?;
        if key.client_email.trim().is_empty() || key.private_key.trim().is_empty() {
            return Err(AnalyticsError::Config(
                "service account key needs client_email and private_key".to_string(),
            ));
        }
        Ok(key)
    }

    /// Build the signed RS256 assertion for `scope`, issued at `now`.
    pub fn assertion(&self, scope: &str, now: DateTime<Utc>) -> Result<String> {
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: scope.to_string(),
            aud: self.token_uri.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| AnalyticsError::Credential(format!("invalid private key: {}", e)))?;

        jsonwebtoken::encode(&header, &claims, &key)
            .map_err(|e| AnalyticsError::Credential(format!("cannot sign assertion: {}", e)))
    }

    /// Exchange a fresh assertion for an access token at `token_uri`.
    pub fn fetch_access_token(&self, client: &Client, scope: &str) -> Result<String> {
        let assertion = self.assertion(scope, Utc::now())?;
        debug!("Requesting access token for {}", self.client_email);

        let resp = client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .map_err(transport)?;

        let token: TokenResponse = check_status(resp)?.json().map_err(|e| {
            AnalyticsError::Credential(format!("unexpected token response: {}", e))
        })?;
        Ok(token.access_token)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
