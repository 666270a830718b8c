use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use snakelab_protocol::UserClaims;
use tokio::sync::RwLock;

use crate::auth::AuthError;
use crate::config::{ConfigError, required};

pub const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Issuers Google signs ID tokens as.
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Minimum age of the cached key set before an unknown key id triggers a refetch.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Raw payload of a Google ID token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub aud: String,
    #[serde(default)]
    pub sub: String,
    pub exp: u64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Checks a token's signature against the identity provider's keys.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn decode(&self, token: &str) -> Result<IdTokenClaims, AuthError>;
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Verifies RS256 ID tokens against Google's published JWKS.
pub struct GoogleIdentityProvider {
    client: Client,
    certs_url: String,
    cache_ttl: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

impl GoogleIdentityProvider {
    pub fn new(client: Client, certs_url: impl Into<String>, cache_ttl: Duration) -> Self {
        Self {
            client,
            certs_url: certs_url.into(),
            cache_ttl,
            cache: RwLock::new(None),
        }
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                let age = cached.fetched_at.elapsed();
                if age < self.cache_ttl {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return DecodingKey::from_jwk(jwk).map_err(AuthError::from);
                    }
                    if age < MIN_REFRESH_INTERVAL {
                        return Err(AuthError::UnknownKey(kid.to_string()));
                    }
                }
            }
        }

        let keys = self.fetch_keys().await?;
        let key = keys
            .find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()?
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()));

        *self.cache.write().await = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        key
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        tracing::debug!(url = %self.certs_url, "Fetching identity provider keys");

        let response = self
            .client
            .get(&self.certs_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn decode(&self, token: &str) -> Result<IdTokenClaims, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::Malformed(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::Malformed("token header has no key id".to_string()))?;

        let key = self.key_for(&kid).await?;

        // Audience and issuer are checked by `TokenVerifier`.
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_aud = false;

        let token_data = decode::<IdTokenClaims>(token, &key, &validation)?;
        Ok(token_data.claims)
    }
}

/// Gate between a bearer token and the user it belongs to.
pub struct TokenVerifier {
    provider: Arc<dyn IdentityProvider>,
    client_id: String,
}

impl TokenVerifier {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        client_id: Option<String>,
    ) -> Result<Self, ConfigError> {
        let client_id = required(&client_id, "GOOGLE_CLIENT_ID")?.to_string();
        Ok(Self {
            provider,
            client_id,
        })
    }

    pub async fn verify(&self, token: &str) -> Result<UserClaims, AuthError> {
        let claims = self.provider.decode(token).await?;

        if !GOOGLE_ISSUERS.contains(&claims.iss.as_str()) {
            return Err(AuthError::InvalidIssuer(claims.iss));
        }
        if claims.aud != self.client_id {
            return Err(AuthError::InvalidAudience);
        }
        if claims.exp <= now_secs() {
            return Err(AuthError::Expired);
        }

        let email = claims
            .email
            .filter(|email| !email.is_empty())
            .ok_or(AuthError::MissingClaim("email"))?;

        Ok(UserClaims {
            email,
            name: claims.name,
            picture: claims.picture,
            email_verified: claims.email_verified,
        })
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
