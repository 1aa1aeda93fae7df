//! Authenticator implementation
//!
//! Handles applying authentication to requests and managing key-pair token refresh.

use super::types::{AuthConfig, CachedToken};
use crate::error::{Error, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::RequestBuilder;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Header telling the SQL API which kind of bearer token is sent
pub const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";

/// Authenticator handles applying authentication to HTTP requests
pub struct Authenticator {
    /// Auth configuration
    config: AuthConfig,
    /// Cached key-pair JWT
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            cached_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = match &self.config {
            AuthConfig::OAuth { token } | AuthConfig::ProgrammaticAccessToken { token } => {
                token.clone()
            }
            AuthConfig::KeyPair { .. } => self.get_or_refresh_token().await?,
        };

        Ok(req
            .bearer_auth(token)
            .header(TOKEN_TYPE_HEADER, self.config.token_type()))
    }

    /// Get a valid token, refreshing if necessary
    async fn get_or_refresh_token(&self) -> Result<String> {
        // Check if we have a valid cached token
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Another task may have refreshed while we waited for the write lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let new_token = self.generate_jwt()?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Sign a key-pair JWT
    fn generate_jwt(&self) -> Result<CachedToken> {
        let AuthConfig::KeyPair {
            account,
            user,
            private_key,
            public_key_fingerprint,
            token_lifetime_seconds,
        } = &self.config
        else {
            return Err(Error::auth("JWT generation requires key-pair auth"));
        };

        let subject = qualified_user(account, user);
        let fingerprint = if public_key_fingerprint.starts_with("SHA256:") {
            public_key_fingerprint.clone()
        } else {
            format!("SHA256:{public_key_fingerprint}")
        };

        let now = Utc::now().timestamp();
        #[allow(clippy::cast_possible_wrap)]
        let lifetime = *token_lifetime_seconds as i64;

        let claims = JwtClaims {
            iss: format!("{subject}.{fingerprint}"),
            sub: subject,
            iat: now,
            exp: now + lifetime,
        };

        let encoding_key = EncodingKey::from_rsa_pem(private_key.as_bytes()).map_err(|e| {
            Error::JwtGeneration {
                message: format!("Invalid private key: {e}"),
            }
        })?;

        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key).map_err(|e| {
            Error::JwtGeneration {
                message: format!("Failed to encode JWT: {e}"),
            }
        })?;

        Ok(CachedToken::expires_in(jwt, lifetime))
    }

    /// Clear the cached token
    pub async fn clear_cache(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    /// Get the current auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// `<ACCOUNT>.<USER>` as used in key-pair JWT claims.
///
/// The account is upper-cased and cut at its first `.`, dropping any region suffix.
pub fn qualified_user(account: &str, user: &str) -> String {
    let account = account.split('.').next().unwrap_or(account);
    format!(
        "{}.{}",
        account.to_ascii_uppercase(),
        user.to_ascii_uppercase()
    )
}

/// JWT claims structure
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    sub: String,
    iat: i64,
    exp: i64,
}
