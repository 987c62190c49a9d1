//! JSON webhook notification transport

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::notify::{AlertMessage, Notifier, NotifyError};

#[derive(Serialize)]
struct Embed<'a> {
    title: &'a str,
    url: &'a str,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    channel_id: &'a str,
    content: &'a str,
    embeds: Vec<Embed<'a>>,
}

/// Posts alerts as JSON to a chat-bridge endpoint.
pub struct WebhookNotifier {
    client: Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(client: Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, channel_id: &str, message: &AlertMessage) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            channel_id,
            content: &message.text,
            embeds: vec![Embed {
                title: &message.title,
                url: &message.url,
            }],
        };

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
