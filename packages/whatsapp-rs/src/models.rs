use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MarkReadRequest {
    pub messaging_product: String,
    pub status: String,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typing_indicator: Option<TypingIndicator>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypingIndicator {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextMessageRequest {
    pub messaging_product: String,
    pub recipient_type: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: TextContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextContent {
    pub preview_url: bool,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractiveMessageRequest {
    pub messaging_product: String,
    pub recipient_type: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub interactive: CtaUrlInteractive,
}

/// Interactive object for `cta_url` messages: a body, a single URL button,
/// and optional header/footer text.
#[derive(Debug, Clone, Serialize)]
pub struct CtaUrlInteractive {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<InteractiveText>,
    pub body: InteractiveText,
    pub action: CtaUrlAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<InteractiveText>,
}

impl CtaUrlInteractive {
    pub fn new(body: String, display_text: String, url: String, footer: Option<String>) -> Self {
        Self {
            kind: "cta_url".to_string(),
            header: None,
            body: InteractiveText { text: body },
            action: CtaUrlAction {
                name: "cta_url".to_string(),
                parameters: CtaUrlParameters { display_text, url },
            },
            footer: footer.map(|text| InteractiveText { text }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractiveText {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CtaUrlAction {
    pub name: String,
    pub parameters: CtaUrlParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct CtaUrlParameters {
    pub display_text: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub messaging_product: Option<String>,
    #[serde(default)]
    pub contacts: Vec<SentContact>,
    #[serde(default)]
    pub messages: Vec<SentMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentContact {
    pub input: Option<String>,
    pub wa_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub id: String,
}
