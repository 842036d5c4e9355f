//! Integration tests for the webhook message actor, driven through the
//! mock gateway and signup service.

use std::sync::Arc;

use server_core::domains::auth::models::User;
use server_core::domains::webhook::{
    Change, ChangeValue, Contact, Entry, Message, ProcessingState, ProcessorHub, TextBody,
    WebhookPayload, WebhookProcessor,
};
use server_core::kernel::test_dependencies::{
    InMemoryArena, InMemoryArenaFactory, MockMessagingGateway, MockSignupService,
};

const WA_ID: &str = "15551234567";
const PHONE: &str = "+15551234567";
const BASE_URL: &str = "https://app.example.com";

struct Harness {
    processor: WebhookProcessor,
    gateway: Arc<MockMessagingGateway>,
    signup: Arc<MockSignupService>,
}

fn harness_with(gateway: MockMessagingGateway, signup: MockSignupService) -> Harness {
    let gateway = Arc::new(gateway);
    let signup = Arc::new(signup);
    let processor = WebhookProcessor::new(
        PHONE.to_string(),
        Arc::new(InMemoryArena::new()),
        gateway.clone(),
        signup.clone(),
        BASE_URL.to_string(),
    );
    Harness {
        processor,
        gateway,
        signup,
    }
}

fn harness() -> Harness {
    harness_with(MockMessagingGateway::new(), MockSignupService::new())
}

fn text_payload(message_id: &str, body: &str) -> WebhookPayload {
    WebhookPayload {
        object: Some("whatsapp_business_account".to_string()),
        entry: vec![Entry {
            id: Some("entry-1".to_string()),
            changes: vec![Change {
                field: "messages".to_string(),
                value: ChangeValue {
                    messaging_product: Some("whatsapp".to_string()),
                    messages: vec![Message {
                        id: message_id.to_string(),
                        from: Some(WA_ID.to_string()),
                        timestamp: Some("1700000000".to_string()),
                        kind: "text".to_string(),
                        text: Some(TextBody {
                            body: body.to_string(),
                        }),
                    }],
                    contacts: vec![Contact {
                        wa_id: WA_ID.to_string(),
                        profile: None,
                    }],
                },
            }],
        }],
    }
}

#[tokio::test]
async fn test_non_message_event_is_a_quiet_success() {
    let h = harness();
    let mut payload = text_payload("wamid.1", "create account");
    payload.entry[0].changes[0].field = "statuses".to_string();

    let result = h.processor.process_webhook(payload).await;

    assert_eq!(result.status, ProcessingState::Success);
    assert_eq!(h.gateway.call_count(), 0);
    assert!(h.signup.token_requests().is_empty());
}

#[tokio::test]
async fn test_signup_intent_sends_one_cta_with_the_token() {
    let h = harness_with(
        MockMessagingGateway::new(),
        MockSignupService::new().with_plaintext_token("tok-abc-123"),
    );

    let result = h
        .processor
        .process_webhook(text_payload("wamid.2", "I want to join now"))
        .await;

    assert_eq!(result.status, ProcessingState::Success);
    assert_eq!(result.message_id.as_deref(), Some("wamid.2"));
    assert_eq!(h.signup.token_requests(), vec![PHONE.to_string()]);

    let ctas = h.gateway.cta_sends();
    assert_eq!(ctas.len(), 1);
    let (to, cta) = &ctas[0];
    assert_eq!(to, PHONE);
    assert_eq!(cta.url, format!("{}/verify?token=tok-abc-123", BASE_URL));
    assert_eq!(cta.display_text, "Create Account");
    assert!(h.gateway.text_sends().is_empty());
}

#[tokio::test]
async fn test_inbound_message_is_acknowledged_before_reply() {
    let h = harness();
    h.processor
        .process_webhook(text_payload("wamid.3", "create account"))
        .await;

    assert_eq!(h.gateway.read_receipts(), vec!["wamid.3".to_string()]);
    assert_eq!(h.gateway.typing_indicators(), vec!["wamid.3".to_string()]);
}

#[tokio::test]
async fn test_unrecognized_text_gets_the_fallback_reply() {
    let h = harness();
    let result = h
        .processor
        .process_webhook(text_payload("wamid.4", "hello"))
        .await;

    assert_eq!(result.status, ProcessingState::Success);
    assert!(h.signup.token_requests().is_empty());
    assert!(h.gateway.cta_sends().is_empty());

    let texts = h.gateway.text_sends();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].0, PHONE);
    assert_eq!(
        texts[0].1,
        "I'm sorry, I didn't understand that. Please type 'create account' to begin."
    );
}

#[tokio::test]
async fn test_first_time_sender_gets_the_signup_greeting() {
    let h = harness();
    h.processor
        .process_webhook(text_payload("wamid.5", "create account"))
        .await;

    let ctas = h.gateway.cta_sends();
    assert_eq!(ctas.len(), 1);
    assert_eq!(ctas[0].1.body, "Thank you for signing up!");
}

#[tokio::test]
async fn test_known_sender_gets_the_returning_greeting() {
    let h = harness_with(
        MockMessagingGateway::new(),
        MockSignupService::new().with_user(User::new(PHONE.to_string())),
    );

    h.processor
        .process_webhook(text_payload("wamid.6", "create account"))
        .await;

    let ctas = h.gateway.cta_sends();
    assert_eq!(ctas.len(), 1);
    assert_eq!(ctas[0].1.body, "Welcome back! 👋");
    // A known sender still gets a fresh token
    assert_eq!(h.signup.token_requests(), vec![PHONE.to_string()]);
}

#[tokio::test]
async fn test_non_text_message_is_skipped_without_gateway_traffic() {
    let h = harness();
    let mut payload = text_payload("wamid.7", "");
    payload.entry[0].changes[0].value.messages[0].kind = "image".to_string();
    payload.entry[0].changes[0].value.messages[0].text = None;

    let result = h.processor.process_webhook(payload).await;

    assert_eq!(result.status, ProcessingState::Success);
    assert_eq!(h.gateway.call_count(), 0);

    let status = h.processor.get_status().await.unwrap().unwrap();
    assert_eq!(status.status, ProcessingState::Success);
    assert_eq!(status.message_type.as_deref(), Some("image"));
}

#[tokio::test]
async fn test_missing_contact_records_an_error_status() {
    let h = harness();
    let mut payload = text_payload("wamid.8", "create account");
    payload.entry[0].changes[0].value.contacts.clear();

    let result = h.processor.process_webhook(payload).await;

    assert_eq!(result.status, ProcessingState::Error);
    assert!(!result.message.is_empty());
    assert_eq!(h.gateway.call_count(), 0);

    let status = h.processor.get_status().await.unwrap().unwrap();
    assert_eq!(status.status, ProcessingState::Error);
    assert!(status.error.is_some());
}

#[tokio::test]
async fn test_empty_payload_is_an_error_not_a_panic() {
    let h = harness();
    let result = h.processor.process_webhook(WebhookPayload::default()).await;

    assert_eq!(result.status, ProcessingState::Error);
    assert_eq!(h.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_gateway_failure_surfaces_as_error_result() {
    let h = harness_with(MockMessagingGateway::failing(), MockSignupService::new());

    let result = h
        .processor
        .process_webhook(text_payload("wamid.9", "create account"))
        .await;

    assert_eq!(result.status, ProcessingState::Error);
    let status = h.processor.get_status().await.unwrap().unwrap();
    assert_eq!(status.status, ProcessingState::Error);
}

#[tokio::test]
async fn test_completed_messages_are_recorded_for_replay_detection() {
    let h = harness();
    assert!(!h.processor.already_processed("wamid.10").await.unwrap());

    h.processor
        .process_webhook(text_payload("wamid.10", "hello"))
        .await;

    assert!(h.processor.already_processed("wamid.10").await.unwrap());
    assert!(!h.processor.already_processed("wamid.11").await.unwrap());
}

#[tokio::test]
async fn test_status_starts_empty_and_ends_in_success() {
    let h = harness();
    assert!(h.processor.get_status().await.unwrap().is_none());

    h.processor
        .process_webhook(text_payload("wamid.12", "join"))
        .await;

    let status = h.processor.get_status().await.unwrap().unwrap();
    assert_eq!(status.status, ProcessingState::Success);
    assert_eq!(status.message_id.as_deref(), Some("wamid.12"));
    assert_eq!(status.from.as_deref(), Some(WA_ID));
}

#[tokio::test]
async fn test_hub_reuses_one_processor_per_partition() {
    let hub = ProcessorHub::new(
        Arc::new(MockMessagingGateway::new()),
        Arc::new(MockSignupService::new()),
        Arc::new(InMemoryArenaFactory::new()),
        BASE_URL.to_string(),
    );

    let a = hub.processor_for(PHONE).await;
    let b = hub.processor_for(PHONE).await;
    let other = hub.processor_for("+15559876543").await;

    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &other));
    assert_eq!(other.partition_key(), "+15559876543");
}

#[tokio::test]
async fn test_concurrent_events_on_one_partition_both_complete() {
    let hub = Arc::new(ProcessorHub::new(
        Arc::new(MockMessagingGateway::new()),
        Arc::new(MockSignupService::new()),
        Arc::new(InMemoryArenaFactory::new()),
        BASE_URL.to_string(),
    ));

    let processor = hub.processor_for(PHONE).await;
    let (a, b) = tokio::join!(
        processor.process_webhook(text_payload("wamid.13", "hello")),
        processor.process_webhook(text_payload("wamid.14", "hello")),
    );

    assert_eq!(a.status, ProcessingState::Success);
    assert_eq!(b.status, ProcessingState::Success);
    assert!(processor.already_processed("wamid.13").await.unwrap());
    assert!(processor.already_processed("wamid.14").await.unwrap());
}
