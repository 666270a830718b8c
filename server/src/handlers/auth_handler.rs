use crate::AppState;
use crate::auth::AuthError;
use crate::error::ApiError;
use crate::middleware_layer::BearerToken;
use axum::{Json, Router, extract::State, routing::post};
use snakelab_protocol::AccessTokenResponse;

/// Exchanges a Google ID token for a locally signed access token.
pub async fn issue_token(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let Some(issuer) = &state.auth.access_tokens else {
        return Err(ApiError::InternalError(anyhow::anyhow!(
            "access tokens are not configured"
        )));
    };

    let user = state.auth.verifier.verify(&token).await?;
    let access_token = issuer.issue(&user).map_err(|e| match e {
        AuthError::Signing(msg) => ApiError::InternalError(anyhow::anyhow!(msg)),
        other => ApiError::Unauthorized(other),
    })?;
    tracing::info!(email = %user.email, "Issued access token");

    Ok(Json(AccessTokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: issuer.ttl().as_secs(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/auth/token", post(issue_token))
}
