pub mod access_token;
pub mod google;

use jsonwebtoken::{Algorithm, decode_header, errors::ErrorKind};
use snakelab_protocol::UserClaims;

use crate::auth::access_token::AccessTokenIssuer;
use crate::auth::google::TokenVerifier;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingToken,
    #[error("Invalid authorization header format")]
    InvalidScheme,
    #[error("Malformed token: {0}")]
    Malformed(String),
    #[error("Unsupported token algorithm {0:?}")]
    UnsupportedAlgorithm(Algorithm),
    #[error("No signing key with id {0}")]
    UnknownKey(String),
    #[error("Failed to fetch signing keys: {0}")]
    KeyFetch(String),
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Token expired")]
    Expired,
    #[error("Invalid issuer: {0}")]
    InvalidIssuer(String),
    #[error("Invalid audience")]
    InvalidAudience,
    #[error("Token is missing the {0} claim")]
    MissingClaim(&'static str),
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
            _ => AuthError::Malformed(err.to_string()),
        }
    }
}

/// Returns the token part of an `Authorization: Bearer <token>` header value.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidScheme)?;

    if token.is_empty() {
        return Err(AuthError::InvalidScheme);
    }
    Ok(token)
}

/// Accepts Google ID tokens and, when configured, locally issued access tokens.
pub struct Authenticator {
    pub verifier: TokenVerifier,
    pub access_tokens: Option<AccessTokenIssuer>,
}

impl Authenticator {
    pub fn new(verifier: TokenVerifier, access_tokens: Option<AccessTokenIssuer>) -> Self {
        Self {
            verifier,
            access_tokens,
        }
    }

    pub async fn authenticate(&self, token: &str) -> Result<UserClaims, AuthError> {
        if let Some(issuer) = &self.access_tokens
            && is_local_token(token)
        {
            return issuer.verify(token);
        }

        self.verifier.verify(token).await
    }
}

fn is_local_token(token: &str) -> bool {
    decode_header(token)
        .map(|header| header.alg == AccessTokenIssuer::ALGORITHM)
        .unwrap_or(false)
}
