//! Adapters that connect external clients to the kernel traits.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use whatsapp::models::CtaUrlInteractive;
use whatsapp::WhatsAppClient;

use crate::kernel::{BaseMessagingGateway, CtaMessage};

// =============================================================================
// WhatsAppClient Adapter (implements BaseMessagingGateway trait)
// =============================================================================

/// Wrapper around WhatsAppClient that implements BaseMessagingGateway
pub struct WhatsAppAdapter(pub Arc<WhatsAppClient>);

impl WhatsAppAdapter {
    pub fn new(client: Arc<WhatsAppClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseMessagingGateway for WhatsAppAdapter {
    async fn mark_message_as_read(&self, message_id: &str) -> Result<()> {
        self.0
            .mark_message_as_read(message_id)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
    }

    async fn send_typing_indicator(&self, message_id: &str) -> Result<()> {
        self.0
            .send_typing_indicator(message_id)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        self.0
            .send_text_message(to, body)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }

    async fn send_cta_url(&self, to: &str, cta: &CtaMessage) -> Result<()> {
        let interactive = CtaUrlInteractive::new(
            cta.body.clone(),
            cta.display_text.clone(),
            cta.url.clone(),
            cta.footer.clone(),
        );
        self.0
            .send_cta_url_message(to, interactive)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}
