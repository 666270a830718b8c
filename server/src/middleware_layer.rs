use crate::AppState;
use crate::auth::parse_bearer;
use crate::error::ApiError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

/// Raw bearer token from the `Authorization` header.
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok());

        let token = parse_bearer(auth_header)?;
        Ok(BearerToken(token.to_string()))
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = state.auth.authenticate(&token).await?;
    tracing::debug!(email = %claims.email, "Authenticated request");

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
