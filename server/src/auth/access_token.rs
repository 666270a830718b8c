use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use snakelab_protocol::UserClaims;

use crate::auth::AuthError;

/// Lifetime used when none is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    pub sub: String, // User email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub exp: usize,
}

impl From<AccessClaims> for UserClaims {
    fn from(claims: AccessClaims) -> Self {
        UserClaims {
            email: claims.sub,
            name: claims.name,
            picture: claims.picture,
            email_verified: claims.email_verified,
        }
    }
}

/// Issues and verifies HS256 access tokens signed with a shared secret.
pub struct AccessTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl AccessTokenIssuer {
    pub const ALGORITHM: Algorithm = Algorithm::HS256;

    pub fn new(secret: &str, ttl: Option<Duration>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: ttl.unwrap_or(DEFAULT_TTL),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &UserClaims) -> Result<String, AuthError> {
        let expiration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AuthError::Signing(e.to_string()))?
            + self.ttl;

        let claims = AccessClaims {
            sub: user.email.clone(),
            name: user.name.clone(),
            picture: user.picture.clone(),
            email_verified: user.email_verified,
            exp: expiration.as_secs() as usize,
        };

        encode(&Header::new(Self::ALGORITHM), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<UserClaims, AuthError> {
        let validation = Validation::new(Self::ALGORITHM);
        let token_data = decode::<AccessClaims>(token, &self.decoding, &validation)?;

        if token_data.claims.sub.is_empty() {
            return Err(AuthError::MissingClaim("sub"));
        }
        Ok(token_data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserClaims {
        UserClaims {
            email: "lab@example.com".to_string(),
            name: Some("Lab".to_string()),
            picture: None,
            email_verified: true,
        }
    }

    #[test]
    fn test_issue_then_verify_returns_profile() {
        let issuer = AccessTokenIssuer::new("secret", Some(Duration::from_secs(1800)));
        let token = issuer.issue(&user()).unwrap();

        assert_eq!(issuer.verify(&token).unwrap(), user());
    }

    #[test]
    fn test_default_ttl_is_fifteen_minutes() {
        let issuer = AccessTokenIssuer::new("secret", None);
        assert_eq!(issuer.ttl(), Duration::from_secs(900));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = AccessTokenIssuer::new("secret", None).issue(&user()).unwrap();
        let other = AccessTokenIssuer::new("other-secret", None);

        assert!(matches!(
            other.verify(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize;
        let claims = AccessClaims {
            sub: "lab@example.com".to_string(),
            name: None,
            picture: None,
            email_verified: false,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let issuer = AccessTokenIssuer::new("secret", None);
        assert!(matches!(issuer.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn test_empty_subject_rejected() {
        let mut anonymous = user();
        anonymous.email = String::new();
        let issuer = AccessTokenIssuer::new("secret", None);
        let token = issuer.issue(&anonymous).unwrap();

        assert!(matches!(
            issuer.verify(&token),
            Err(AuthError::MissingClaim("sub"))
        ));
    }
}
