use axum::Json;

use crate::auth::{RequestIdentity, SessionResponse};
use crate::error::ErrorResponse;

/// The signed-in caller, as shown in the sidebar user section
#[utoipa::path(
    get,
    path = "/api/session",
    tag = "session",
    responses(
        (status = 200, description = "Current identity", body = SessionResponse),
        (status = 401, description = "No verified session", body = ErrorResponse)
    )
)]
pub async fn get_session(identity: RequestIdentity) -> Json<SessionResponse> {
    Json(SessionResponse::from(identity))
}
