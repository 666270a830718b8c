#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::{body::Body, http::Response};
use serde::de::DeserializeOwned;
use snakelab_server::auth::access_token::AccessTokenIssuer;
use snakelab_server::auth::google::{IdTokenClaims, IdentityProvider, TokenVerifier};
use snakelab_server::auth::{AuthError, Authenticator};
use snakelab_server::logic::image::{ImageGenerator, UpstreamError};
use snakelab_server::logic::prompt::{PromptGenerator, PromptTemplate};
use snakelab_server::{AppState, AppStateInner};

pub const CLIENT_ID: &str = "client-123.apps.googleusercontent.com";
pub const GOOGLE_TOKEN: &str = "google-id-token";
pub const JWT_SECRET: &str = "test-jwt-secret";

pub const TEMPLATE: &str = r#"
base_prompt:
  subject: A black lab
  modification: with a snake head
  integration: Seamless blend
  posture: Natural stance
activities:
  - running
  - swimming
"#;

/// Identity provider that knows a fixed set of tokens and rejects the rest
/// as badly signed.
pub struct StaticIdentityProvider {
    tokens: HashMap<String, IdTokenClaims>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self {
            tokens: HashMap::new(),
        }
    }

    pub fn with_token(mut self, token: &str, claims: IdTokenClaims) -> Self {
        self.tokens.insert(token.to_string(), claims);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn decode(&self, token: &str) -> Result<IdTokenClaims, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidSignature)
    }
}

/// Image generator returning a canned outcome and recording prompts.
pub struct StubImageGenerator {
    outcome: Result<String, String>,
    delay: Duration,
    pub prompts: Mutex<Vec<String>>,
}

impl StubImageGenerator {
    pub fn succeeding(url: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(url.to_string()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Succeeds only after sleeping for `delay`.
    pub fn slow(url: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(url.to_string()),
            delay,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(message.to_string()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn recorded(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for StubImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone().map_err(|message| UpstreamError::Api {
            status: 500,
            message,
        })
    }
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub fn google_claims(email: &str) -> IdTokenClaims {
    IdTokenClaims {
        iss: "accounts.google.com".to_string(),
        aud: CLIENT_ID.to_string(),
        sub: "1234567890".to_string(),
        exp: now_secs() + 600,
        email: Some(email.to_string()),
        email_verified: true,
        name: Some("Snake Lab".to_string()),
        picture: None,
    }
}

pub fn test_state_with(
    provider: StaticIdentityProvider,
    images: Arc<StubImageGenerator>,
    jwt_secret: Option<&str>,
) -> AppState {
    build_test_state(provider, images, jwt_secret, Duration::from_secs(30))
}

fn build_test_state(
    provider: StaticIdentityProvider,
    images: Arc<StubImageGenerator>,
    jwt_secret: Option<&str>,
    request_timeout: Duration,
) -> AppState {
    let prompts = PromptGenerator::new(PromptTemplate::from_yaml(TEMPLATE).unwrap()).unwrap();
    let verifier = TokenVerifier::new(Arc::new(provider), Some(CLIENT_ID.to_string())).unwrap();
    let access_tokens =
        jwt_secret.map(|secret| AccessTokenIssuer::new(secret, Some(Duration::from_secs(1800))));

    Arc::new(AppStateInner {
        prompts,
        auth: Authenticator::new(verifier, access_tokens),
        images,
        request_timeout,
    })
}

/// State accepting `GOOGLE_TOKEN` for `lab@example.com`.
pub fn test_state(images: Arc<StubImageGenerator>) -> AppState {
    let provider =
        StaticIdentityProvider::new().with_token(GOOGLE_TOKEN, google_claims("lab@example.com"));
    test_state_with(provider, images, None)
}

/// Like `test_state`, with a custom whole-request timeout.
pub fn test_state_with_timeout(
    images: Arc<StubImageGenerator>,
    request_timeout: Duration,
) -> AppState {
    let provider =
        StaticIdentityProvider::new().with_token(GOOGLE_TOKEN, google_claims("lab@example.com"));
    build_test_state(provider, images, None, request_timeout)
}

pub async fn body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
