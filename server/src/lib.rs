use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    http::header,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logic;
pub mod middleware_layer;
pub mod server;

use crate::auth::Authenticator;
use crate::auth::access_token::AccessTokenIssuer;
use crate::auth::google::{GoogleIdentityProvider, TokenVerifier};
use crate::config::{ConfigError, ServerConfig};
use crate::error::ApiError;
use crate::handlers::{auth_handler, image_handler, status_handler};
use crate::logic::image::{ImageGenerator, OpenAiImageGenerator};
use crate::logic::prompt::{PromptGenerator, PromptTemplate};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub prompts: PromptGenerator,
    pub auth: Authenticator,
    pub images: Arc<dyn ImageGenerator>,
    pub request_timeout: Duration,
}

/// Wires the production collaborators from configuration.
pub fn build_state(config: &ServerConfig) -> Result<AppState, ConfigError> {
    let prompts = PromptGenerator::new(PromptTemplate::load(&config.prompts_path)?)?;

    let http = reqwest::Client::builder()
        .timeout(config.upstream_timeout())
        .build()?;

    let provider = GoogleIdentityProvider::new(
        http.clone(),
        config.google_certs_url.clone(),
        config.jwks_cache_ttl(),
    );
    let verifier = TokenVerifier::new(Arc::new(provider), config.google_client_id.clone())?;
    let access_tokens = config
        .jwt_secret_key
        .as_deref()
        .filter(|secret| !secret.is_empty())
        .map(|secret| AccessTokenIssuer::new(secret, Some(config.access_token_ttl())));

    let images = OpenAiImageGenerator::new(
        http,
        config.openai_api_key()?,
        config.openai_base_url.clone(),
    );

    Ok(Arc::new(AppStateInner {
        prompts,
        auth: Authenticator::new(verifier, access_tokens),
        images: Arc::new(images),
        request_timeout: config.request_timeout(),
    }))
}

pub fn create_app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/generate-image", post(image_handler::generate_image))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_layer::auth_middleware,
        ));

    let mut app = Router::new()
        .route("/", get(status_handler::root))
        .merge(protected_routes);

    if state.auth.access_tokens.is_some() {
        app = app.merge(auth_handler::router());
    }

    let request_timeout = state.request_timeout;
    app.layer(
        tower::ServiceBuilder::new()
            .layer(tower_http::request_id::SetRequestIdLayer::x_request_id(
                tower_http::request_id::MakeRequestUuid,
            ))
            .layer(
                tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer::new(
                    std::iter::once(header::AUTHORIZATION),
                ),
            )
            .layer(tower_http::trace::TraceLayer::new_for_http())
            .layer(tower_http::request_id::PropagateRequestIdLayer::x_request_id())
            .layer(HandleErrorLayer::new(move |err: BoxError| {
                handle_layer_error(request_timeout, err)
            }))
            .layer(tower::timeout::TimeoutLayer::new(request_timeout))
            .layer(tower_http::cors::CorsLayer::very_permissive()),
    )
    .with_state(state)
}

async fn handle_layer_error(request_timeout: Duration, err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::Timeout(request_timeout)
    } else {
        ApiError::InternalError(anyhow::anyhow!("Unhandled middleware error: {err}"))
    }
}
