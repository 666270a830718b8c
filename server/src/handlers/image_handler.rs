use crate::AppState;
use crate::error::ApiError;
use axum::{Extension, Json, extract::State};
use snakelab_protocol::{ImageResponse, UserClaims};

pub async fn generate_image(
    State(state): State<AppState>,
    Extension(user): Extension<UserClaims>,
) -> Result<Json<ImageResponse>, ApiError> {
    let prompt = state.prompts.generate()?;
    tracing::info!(email = %user.email, %prompt, "Generating image");

    let image_url = state.images.generate(&prompt).await?;
    tracing::info!(email = %user.email, %image_url, "Image generated");

    Ok(Json(ImageResponse { image_url }))
}
