// Thin client for the WhatsApp Cloud API (graph.facebook.com).
// https://developers.facebook.com/docs/whatsapp/cloud-api/reference/messages

pub mod models;

use reqwest::{header, Client};

use crate::models::{
    CtaUrlInteractive, InteractiveMessageRequest, MarkReadRequest, SendMessageResponse,
    TextContent, TextMessageRequest, TypingIndicator,
};

#[derive(Debug, Clone)]
pub struct WhatsAppOptions {
    pub api_version: String,
    pub phone_number_id: String,
    pub access_token: String,
}

#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    options: WhatsAppOptions,
}

impl WhatsAppClient {
    pub fn new(options: WhatsAppOptions) -> Self {
        Self { options }
    }

    /// Messages endpoint for the configured business phone number
    fn messages_url(&self) -> String {
        format!(
            "https://graph.facebook.com/{version}/{phone_id}/messages",
            version = self.options.api_version,
            phone_id = self.options.phone_number_id,
        )
    }

    fn headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "Content-Type",
            "application/json"
                .parse()
                .expect("Header value should parse correctly"),
        );
        headers
    }

    pub async fn mark_message_as_read(&self, message_id: &str) -> Result<(), &'static str> {
        let request = MarkReadRequest {
            messaging_product: "whatsapp".to_string(),
            status: "read".to_string(),
            message_id: message_id.to_string(),
            typing_indicator: None,
        };
        self.post_status(request).await
    }

    /// Shows a typing indicator in the conversation for up to 25 seconds.
    /// The Cloud API piggybacks this on the mark-as-read request.
    pub async fn send_typing_indicator(&self, message_id: &str) -> Result<(), &'static str> {
        let request = MarkReadRequest {
            messaging_product: "whatsapp".to_string(),
            status: "read".to_string(),
            message_id: message_id.to_string(),
            typing_indicator: Some(TypingIndicator {
                kind: "text".to_string(),
            }),
        };
        self.post_status(request).await
    }

    pub async fn send_text_message(
        &self,
        to: &str,
        body: &str,
    ) -> Result<SendMessageResponse, &'static str> {
        let request = TextMessageRequest {
            messaging_product: "whatsapp".to_string(),
            recipient_type: "individual".to_string(),
            to: to.to_string(),
            kind: "text".to_string(),
            text: TextContent {
                preview_url: false,
                body: body.to_string(),
            },
        };

        let client = Client::new();
        let res = client
            .post(self.messages_url())
            .bearer_auth(&self.options.access_token)
            .headers(self.headers())
            .json(&request)
            .send()
            .await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    let error_body = response.text().await.unwrap_or_default();
                    eprintln!("WhatsApp API error ({}): {}", status, error_body);
                    return Err("WhatsApp API returned an error");
                }

                match response.json::<SendMessageResponse>().await {
                    Ok(data) => Ok(data),
                    Err(e) => {
                        eprintln!("Failed to parse WhatsApp response: {}", e);
                        Err("Error parsing send-message response")
                    }
                }
            }
            Err(e) => {
                eprintln!("Request to WhatsApp failed: {}", e);
                Err("Error sending text message")
            }
        }
    }

    /// Send an interactive call-to-action message with a URL button.
    pub async fn send_cta_url_message(
        &self,
        to: &str,
        interactive: CtaUrlInteractive,
    ) -> Result<SendMessageResponse, &'static str> {
        let request = InteractiveMessageRequest {
            messaging_product: "whatsapp".to_string(),
            recipient_type: "individual".to_string(),
            to: to.to_string(),
            kind: "interactive".to_string(),
            interactive,
        };

        let client = Client::new();
        let res = client
            .post(self.messages_url())
            .bearer_auth(&self.options.access_token)
            .headers(self.headers())
            .json(&request)
            .send()
            .await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    let error_body = response.text().await.unwrap_or_default();
                    eprintln!("WhatsApp API error ({}): {}", status, error_body);
                    return Err("WhatsApp API returned an error");
                }

                match response.json::<SendMessageResponse>().await {
                    Ok(data) => Ok(data),
                    Err(e) => {
                        eprintln!("Failed to parse WhatsApp response: {}", e);
                        Err("Error parsing send-message response")
                    }
                }
            }
            Err(e) => {
                eprintln!("Request to WhatsApp failed: {}", e);
                Err("Error sending CTA message")
            }
        }
    }

    async fn post_status(&self, request: MarkReadRequest) -> Result<(), &'static str> {
        let client = Client::new();
        let res = client
            .post(self.messages_url())
            .bearer_auth(&self.options.access_token)
            .headers(self.headers())
            .json(&request)
            .send()
            .await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    let error_body = response.text().await.unwrap_or_default();
                    eprintln!("WhatsApp API error ({}): {}", status, error_body);
                    return Err("WhatsApp API returned an error");
                }
                Ok(())
            }
            Err(e) => {
                eprintln!("Request to WhatsApp failed: {}", e);
                Err("Error sending status update")
            }
        }
    }
}
