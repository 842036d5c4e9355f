use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::common::normalize_phone_number;
use crate::domains::webhook::{ProcessingState, WebhookPayload};
use crate::server::app::AppState;

/// Subscription handshake: the chat provider probes the endpoint with
/// `hub.mode=subscribe` and expects the challenge echoed back when the
/// verify token matches.
pub async fn webhook_challenge_handler(
    Extension(state): Extension<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let mode = params.get("hub.mode").map(String::as_str);
    let verify_token = params.get("hub.verify_token").map(String::as_str);
    let challenge = params.get("hub.challenge").cloned().unwrap_or_default();

    if mode == Some("subscribe") && verify_token == Some(state.webhook_verify_token.as_str()) {
        info!("Webhook subscription verified");
        (StatusCode::OK, challenge).into_response()
    } else {
        warn!("Webhook subscription verification failed");
        StatusCode::FORBIDDEN.into_response()
    }
}

/// Partition key for an inbound delivery: the normalized sender phone
/// number, so all events of one conversation land on one actor.
fn partition_key(payload: &WebhookPayload) -> String {
    payload
        .entry
        .first()
        .and_then(|entry| entry.changes.first())
        .and_then(|change| change.value.contacts.first())
        .map(|contact| normalize_phone_number(&contact.wa_id))
        .unwrap_or_else(|| "default".to_string())
}

/// Inbound event delivery. Business-logic non-matches still acknowledge
/// with 200; only structurally broken input answers 400.
pub async fn webhook_handler(
    Extension(state): Extension<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> axum::response::Response {
    let partition = partition_key(&payload);
    let processor = state.hub.processor_for(&partition).await;
    let result = processor.process_webhook(payload).await;

    let status_code = match result.status {
        ProcessingState::Error => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };
    (status_code, Json(result)).into_response()
}

/// Last processing snapshot for one conversation partition
pub async fn webhook_status_handler(
    Extension(state): Extension<AppState>,
    Path(partition): Path<String>,
) -> axum::response::Response {
    let processor = state.hub.processor_for(&partition).await;
    match processor.get_status().await {
        Ok(Some(status)) => (StatusCode::OK, Json(status)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to read processing status");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::to_bytes;
    use sqlx::postgres::PgPoolOptions;

    use crate::domains::auth::{Authenticator, JwtService};
    use crate::domains::webhook::ProcessorHub;
    use crate::kernel::test_dependencies::{
        InMemoryArenaFactory, InMemoryTokenStore, MockMessagingGateway, MockSignupService,
    };

    const VERIFY_TOKEN: &str = "hook-secret";

    fn test_state() -> AppState {
        // Lazy pool: never connects, the handshake does not touch the db
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let authenticator = Arc::new(Authenticator::new(
            Arc::new(InMemoryTokenStore::new()),
            Arc::new(JwtService::new("test_secret_key", "test_issuer".to_string())),
        ));
        let hub = Arc::new(ProcessorHub::new(
            Arc::new(MockMessagingGateway::new()),
            Arc::new(MockSignupService::new()),
            Arc::new(InMemoryArenaFactory::new()),
            "https://app.example.com".to_string(),
        ));
        AppState {
            db_pool: pool,
            authenticator,
            hub,
            webhook_verify_token: VERIFY_TOKEN.to_string(),
        }
    }

    fn challenge_params(
        mode: &str,
        verify_token: &str,
        challenge: &str,
    ) -> Query<HashMap<String, String>> {
        let mut params = HashMap::new();
        params.insert("hub.mode".to_string(), mode.to_string());
        params.insert("hub.verify_token".to_string(), verify_token.to_string());
        params.insert("hub.challenge".to_string(), challenge.to_string());
        Query(params)
    }

    #[tokio::test]
    async fn test_challenge_is_echoed_on_matching_token() {
        let response = webhook_challenge_handler(
            Extension(test_state()),
            challenge_params("subscribe", VERIFY_TOKEN, "1158201444"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"1158201444");
    }

    #[tokio::test]
    async fn test_wrong_verify_token_is_forbidden() {
        let response = webhook_challenge_handler(
            Extension(test_state()),
            challenge_params("subscribe", "not-the-token", "1158201444"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_non_subscribe_mode_is_forbidden() {
        let response = webhook_challenge_handler(
            Extension(test_state()),
            challenge_params("unsubscribe", VERIFY_TOKEN, "1158201444"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
