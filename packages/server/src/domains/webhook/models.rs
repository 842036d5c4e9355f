use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Inbound webhook envelope (WhatsApp Cloud API shape)
// ---------------------------------------------------------------------------
//
// Every field below the top level is defaulted so that structural
// validation happens in the processor (which turns problems into a
// recorded error status) instead of failing silently at deserialization.

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Entry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Change {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messaging_product: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Message {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextBody>,
}

impl Message {
    /// Only text messages are actionable in this service
    pub fn is_text(&self) -> bool {
        self.kind == "text" && self.text.is_some()
    }

    pub fn body(&self) -> &str {
        self.text.as_ref().map(|t| t.body.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Contact {
    #[serde(default)]
    pub wa_id: String,
    #[serde(default)]
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Processing outcomes and bookkeeping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingState {
    Processing,
    Success,
    Error,
}

/// Terminal outcome of one `process_webhook` invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub status: ProcessingState,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl ProcessingResult {
    pub fn success(message: impl Into<String>, message_id: Option<String>) -> Self {
        Self {
            status: ProcessingState::Success,
            message: message.into(),
            message_id,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ProcessingState::Error,
            message: message.into(),
            message_id: None,
        }
    }
}

/// Most recent processing snapshot for one actor instance.
/// Overwritten on every inbound event - last write wins, not a history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorStatus {
    pub status: ProcessingState,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActorStatus {
    /// In-flight marker written before any external I/O
    pub fn processing(message: &Message, contact: &Contact) -> Self {
        Self {
            status: ProcessingState::Processing,
            timestamp: Utc::now(),
            message_id: Some(message.id.clone()),
            from: Some(contact.wa_id.clone()),
            message_type: Some(message.kind.clone()),
            error: None,
        }
    }

    pub fn success(message: &Message, contact: &Contact) -> Self {
        Self {
            status: ProcessingState::Success,
            timestamp: Utc::now(),
            message_id: Some(message.id.clone()),
            from: Some(contact.wa_id.clone()),
            message_type: Some(message.kind.clone()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ProcessingState::Error,
            timestamp: Utc::now(),
            message_id: None,
            from: None,
            message_type: None,
            error: Some(message.into()),
        }
    }
}

/// Durable per-message record, keyed `message:<messageId>` in the arena.
/// Advisory bookkeeping: lets an operator or a wrapping layer detect
/// replayed deliveries before re-invoking business logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingRecord {
    pub message_id: String,
    pub from: String,
    pub message_type: String,
    pub processed_at: DateTime<Utc>,
    pub status: String,
}

impl ProcessingRecord {
    pub fn completed(message: &Message, contact: &Contact) -> Self {
        Self {
            message_id: message.id.clone(),
            from: contact.wa_id.clone(),
            message_type: message.kind.clone(),
            processed_at: Utc::now(),
            status: "completed".to_string(),
        }
    }
}
