//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use whatsapp::{WhatsAppClient, WhatsAppOptions};

use crate::config::Config;
use crate::domains::auth::{Authenticator, JwtService, PgTokenStore};
use crate::domains::webhook::{PgArenaFactory, ProcessorHub};
use crate::kernel::{
    BaseArenaFactory, BaseMessagingGateway, BaseSignupService, BaseTokenStore, WhatsAppAdapter,
};
use crate::server::routes::{
    health_handler, refresh_handler, verify_handler, webhook_challenge_handler, webhook_handler,
    webhook_status_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub authenticator: Arc<Authenticator>,
    pub hub: Arc<ProcessorHub>,
    pub webhook_verify_token: String,
}

/// Build the Axum application router
pub fn build_app(pool: PgPool, config: &Config) -> Router {
    let store: Arc<dyn BaseTokenStore> = Arc::new(PgTokenStore::new(pool.clone()));
    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));

    let whatsapp_client = Arc::new(WhatsAppClient::new(WhatsAppOptions {
        api_version: config.whatsapp_api_version.clone(),
        phone_number_id: config.whatsapp_phone_number_id.clone(),
        access_token: config.whatsapp_api_token.clone(),
    }));
    let gateway: Arc<dyn BaseMessagingGateway> =
        Arc::new(WhatsAppAdapter::new(whatsapp_client));

    let authenticator = Arc::new(Authenticator::new(store, jwt_service));
    let signup: Arc<dyn BaseSignupService> = authenticator.clone();

    let arenas: Arc<dyn BaseArenaFactory> = Arc::new(PgArenaFactory::new(pool.clone()));
    let hub = Arc::new(ProcessorHub::new(
        gateway,
        signup,
        arenas,
        config.verification_base_url.clone(),
    ));

    let app_state = AppState {
        db_pool: pool,
        authenticator,
        hub,
        webhook_verify_token: config.webhook_verify_token.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .route("/auth/verify", post(verify_handler))
        .route("/auth/refresh", post(refresh_handler))
        .route(
            "/webhook",
            get(webhook_challenge_handler).post(webhook_handler),
        )
        .route("/webhook/status/:partition", get(webhook_status_handler))
        .route("/health", get(health_handler))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
