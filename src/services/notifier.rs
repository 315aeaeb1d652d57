//! Push notifications through the LINE Messaging API

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::config::LineConfig;
use crate::error::NotifyError;

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

pub struct LineNotifier {
    push_url: String,
    channel_access_token: String,
    target_id: String,
    client: Client,
}

impl LineNotifier {
    pub fn new(config: &LineConfig, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self::with_client(
            &config.base_url,
            config.channel_access_token.clone(),
            config.target_id.clone(),
            client,
        ))
    }

    pub fn with_client(
        base_url: &str,
        channel_access_token: impl Into<String>,
        target_id: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            push_url: format!("{}/v2/bot/message/push", base_url.trim_end_matches('/')),
            channel_access_token: channel_access_token.into(),
            target_id: target_id.into(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for LineNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let body = PushRequest {
            to: &self.target_id,
            messages: vec![TextMessage {
                kind: "text",
                text: message,
            }],
        };

        let response = self
            .client
            .post(&self.push_url)
            .bearer_auth(&self.channel_access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!(message = %message, "LINE message delivered");
        Ok(())
    }
}
