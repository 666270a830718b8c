use axum::Json;
use snakelab_protocol::StatusResponse;

pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse::default())
}
