use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn bad_request(message: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Redeem a verification token for session credentials.
///
/// Every token problem (missing row, expired, already used) answers with
/// the same "Invalid or expired token" message so the endpoint leaks
/// nothing about which check failed.
pub async fn verify_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<VerifyRequest>,
) -> axum::response::Response {
    let Some(token) = request.token.filter(|t| !t.is_empty()) else {
        return bad_request("Verification token is required");
    };

    match state.authenticator.verify_and_login(&token).await {
        Ok(Some(result)) => (StatusCode::OK, Json(result)).into_response(),
        Ok(None) => bad_request("Invalid or expired token"),
        Err(e) => {
            error!(error = %e, "verify_and_login failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Rotate a refresh token into a fresh credential pair
pub async fn refresh_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<RefreshRequest>,
) -> axum::response::Response {
    let Some(refresh_token) = request.refresh_token.filter(|t| !t.is_empty()) else {
        return bad_request("Refresh token is required");
    };

    match state.authenticator.refresh_session(&refresh_token).await {
        Ok(Some(result)) => (StatusCode::OK, Json(result)).into_response(),
        Ok(None) => bad_request("Invalid or expired refresh token"),
        Err(e) => {
            error!(error = %e, "refresh_session failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                }),
            )
                .into_response()
        }
    }
}
