//! Webhook message actor: validates inbound chat events, records
//! processing state durably, classifies intent and triggers the
//! verification flow.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::common::normalize_phone_number;
use crate::domains::webhook::arena::PROCESSING_STATUS_KEY;
use crate::domains::webhook::models::{
    ActorStatus, ProcessingRecord, ProcessingResult, WebhookPayload,
};
use crate::kernel::{BaseMessagingGateway, BaseSignupService, CtaMessage, ProcessingArena};

lazy_static! {
    /// Signup intent: "create account" or "join" anywhere in the body
    static ref SIGNUP_INTENT: Regex =
        Regex::new(r"(?i)create account|join").expect("signup intent pattern is valid");
}

const GREETING_RETURNING: &str = "Welcome back! 👋";
const GREETING_FIRST_TIME: &str = "Thank you for signing up!";
const FALLBACK_REPLY: &str =
    "I'm sorry, I didn't understand that. Please type 'create account' to begin.";
const CTA_DISPLAY_TEXT: &str = "Create Account";
const CTA_FOOTER: &str = "Tap the button to finish signing up";

/// Returns true when the message body expresses account-creation intent
pub fn is_signup_intent(body: &str) -> bool {
    SIGNUP_INTENT.is_match(body)
}

/// Stateful per-conversation processor.
///
/// One instance per partition key (normalized sender phone); the internal
/// mutex serializes events so the status transitions of a single
/// conversation never interleave. Cross-partition concurrency is
/// unbounded - instances share nothing but the durable store.
pub struct WebhookProcessor {
    partition_key: String,
    arena: Arc<dyn ProcessingArena>,
    gateway: Arc<dyn BaseMessagingGateway>,
    signup: Arc<dyn BaseSignupService>,
    verification_base_url: String,
    serialize: tokio::sync::Mutex<()>,
}

impl WebhookProcessor {
    pub fn new(
        partition_key: String,
        arena: Arc<dyn ProcessingArena>,
        gateway: Arc<dyn BaseMessagingGateway>,
        signup: Arc<dyn BaseSignupService>,
        verification_base_url: String,
    ) -> Self {
        Self {
            partition_key,
            arena,
            gateway,
            signup,
            verification_base_url,
            serialize: tokio::sync::Mutex::new(()),
        }
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    /// Single entry point. Always reaches a terminal success/error result;
    /// failures anywhere in the pipeline are caught here, written into the
    /// status snapshot and returned - never re-thrown to the caller.
    pub async fn process_webhook(&self, payload: WebhookPayload) -> ProcessingResult {
        let _guard = self.serialize.lock().await;

        match self.process_message(payload).await {
            Ok(result) => result,
            Err(e) => {
                let message = e.to_string();
                error!(partition = %self.partition_key, error = %message, "Webhook processing failed");

                let status = ActorStatus::error(&message);
                if let Ok(value) = serde_json::to_value(&status) {
                    if let Err(put_err) = self.arena.put(PROCESSING_STATUS_KEY, value).await {
                        error!(error = %put_err, "Failed to record error status");
                    }
                }

                ProcessingResult::error(message)
            }
        }
    }

    /// Read-only introspection of the last-handled event
    pub async fn get_status(&self) -> Result<Option<ActorStatus>> {
        let Some(value) = self.arena.get(PROCESSING_STATUS_KEY).await? else {
            return Ok(None);
        };
        let status = serde_json::from_value(value).context("stored status is malformed")?;
        Ok(Some(status))
    }

    /// True when a durable record exists for this message id, i.e. a
    /// previous delivery of the same message already completed.
    pub async fn already_processed(&self, message_id: &str) -> Result<bool> {
        let record = self.arena.get(&format!("message:{}", message_id)).await?;
        Ok(record.is_some())
    }

    async fn process_message(&self, payload: WebhookPayload) -> Result<ProcessingResult> {
        let entry = payload.entry.first().context("payload has no entry")?;
        let change = entry.changes.first().context("entry has no changes")?;

        // Webhook senders emit many event types (statuses, template
        // updates, ...); only "messages" is actionable and the rest are a
        // normal no-op, not a fault.
        if change.field != "messages" {
            info!(field = %change.field, "Non-message event, skipping");
            return Ok(ProcessingResult::success("Non-message event processed", None));
        }

        let message = change
            .value
            .messages
            .first()
            .cloned()
            .context("incomplete message data: missing message")?;
        let contact = change
            .value
            .contacts
            .first()
            .cloned()
            .context("incomplete message data: missing contact")?;

        info!(
            message_id = %message.id,
            from = %contact.wa_id,
            kind = %message.kind,
            "Processing inbound message"
        );

        // Observable in-flight marker, written before any external I/O so
        // a crash mid-pipeline leaves evidence.
        self.arena
            .put(
                PROCESSING_STATUS_KEY,
                serde_json::to_value(ActorStatus::processing(&message, &contact))?,
            )
            .await?;

        if !message.is_text() {
            warn!(kind = %message.kind, "Non-text message, skipping");
            self.arena
                .put(
                    PROCESSING_STATUS_KEY,
                    serde_json::to_value(ActorStatus::success(&message, &contact))?,
                )
                .await?;
            return Ok(ProcessingResult::success(
                "Non-text message skipped",
                Some(message.id.clone()),
            ));
        }

        // Acknowledge receipt before doing any real work
        self.gateway.mark_message_as_read(&message.id).await?;
        self.gateway.send_typing_indicator(&message.id).await?;

        let phone_number = normalize_phone_number(&contact.wa_id);

        if is_signup_intent(message.body()) {
            self.handle_signup(&phone_number).await?;
        } else {
            info!(from = %phone_number, "No intent matched, sending fallback");
            self.gateway.send_text(&phone_number, FALLBACK_REPLY).await?;
        }

        // Durable completion record for replay detection
        self.arena
            .put(
                &format!("message:{}", message.id),
                serde_json::to_value(ProcessingRecord::completed(&message, &contact))?,
            )
            .await?;
        self.arena
            .put(
                PROCESSING_STATUS_KEY,
                serde_json::to_value(ActorStatus::success(&message, &contact))?,
            )
            .await?;

        info!(message_id = %message.id, "Webhook processed");
        Ok(ProcessingResult::success(
            "Webhook processed",
            Some(message.id),
        ))
    }

    /// Send a verification link. The pre-lookup only selects the greeting
    /// text; token issuance itself is not gated on an existing user.
    async fn handle_signup(&self, phone_number: &str) -> Result<()> {
        let user = self.signup.find_user_by_phone(phone_number).await?;
        let greeting = if user.is_some() {
            GREETING_RETURNING
        } else {
            GREETING_FIRST_TIME
        };

        let token = self.signup.create_verification_token(phone_number).await?;
        let verification_url = format!("{}/verify?token={}", self.verification_base_url, token);
        info!(to = %phone_number, "Sending verification link");

        self.gateway
            .send_cta_url(
                phone_number,
                &CtaMessage {
                    body: greeting.to_string(),
                    display_text: CTA_DISPLAY_TEXT.to_string(),
                    url: verification_url,
                    footer: Some(CTA_FOOTER.to_string()),
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_intent_keywords() {
        assert!(is_signup_intent("create account"));
        assert!(is_signup_intent("Create Account"));
        assert!(is_signup_intent("I want to join now"));
        assert!(is_signup_intent("please let me JOIN"));
    }

    #[test]
    fn test_no_intent_for_small_talk() {
        assert!(!is_signup_intent("hello"));
        assert!(!is_signup_intent("what is this?"));
        assert!(!is_signup_intent(""));
    }
}
