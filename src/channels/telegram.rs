use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::policy::is_any_user_allowed;
use super::traits::{Channel, ChannelMessage};

/// Hard cap Telegram puts on one message.
pub const TELEGRAM_MAX_MESSAGE_CHARS: usize = 4096;
/// Hard cap Telegram puts on a photo caption.
pub const TELEGRAM_MAX_CAPTION_CHARS: usize = 1024;

const LONG_POLL_SECS: u64 = 50;

/// Telegram channel — long-polls the Bot API for updates
pub struct TelegramChannel {
    bot_token: String,
    allowed_users: Vec<String>,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: String, allowed_users: Vec<String>) -> Self {
        Self {
            bot_token,
            allowed_users,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }
}

/// One text message lifted out of a `getUpdates` batch.
struct Inbound {
    chat_id: String,
    username: Option<String>,
    user_id: Option<String>,
    text: String,
}

/// Highest update id in the batch, over all updates. The offset must move
/// past non-text updates too or the same batch comes back forever.
fn last_update_id(body: &Value) -> Option<i64> {
    body.get("result")?
        .as_array()?
        .iter()
        .filter_map(|update| update.get("update_id").and_then(Value::as_i64))
        .max()
}

fn parse_updates(body: &Value) -> Vec<Inbound> {
    let Some(result) = body.get("result").and_then(Value::as_array) else {
        return Vec::new();
    };

    result
        .iter()
        .filter_map(|update| {
            let message = update.get("message")?;
            let text = message.get("text").and_then(Value::as_str)?;
            if text.is_empty() {
                return None;
            }
            let chat_id = message
                .get("chat")
                .and_then(|chat| chat.get("id"))
                .and_then(Value::as_i64)?;
            let from = message.get("from");
            let username = from
                .and_then(|f| f.get("username"))
                .and_then(Value::as_str)
                .map(String::from);
            let user_id = from
                .and_then(|f| f.get("id"))
                .and_then(Value::as_i64)
                .map(|id| id.to_string());

            Some(Inbound {
                chat_id: chat_id.to_string(),
                username,
                user_id,
                text: text.to_string(),
            })
        })
        .collect()
}

async fn check_api_response(method: &str, resp: reqwest::Response) -> anyhow::Result<()> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));

    if !status.is_success() {
        anyhow::bail!("Telegram {method} failed ({status}): {body}");
    }

    // Telegram reports some errors with HTTP 200; check the "ok" field
    let parsed: Value = serde_json::from_str(&body).unwrap_or_default();
    if parsed.get("ok") == Some(&Value::Bool(false)) {
        let description = parsed
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        anyhow::bail!("Telegram {method} failed: {description}");
    }

    Ok(())
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn max_message_length(&self) -> usize {
        TELEGRAM_MAX_MESSAGE_CHARS
    }

    fn max_caption_length(&self) -> usize {
        TELEGRAM_MAX_CAPTION_CHARS
    }

    async fn send(&self, message: &str, recipient: &str) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "chat_id": recipient,
            "text": message,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await?;
        check_api_response("sendMessage", resp).await
    }

    async fn send_photo(
        &self,
        photo_url: &str,
        caption: &str,
        recipient: &str,
    ) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "chat_id": recipient,
            "photo": photo_url,
            "caption": caption,
            "parse_mode": "Markdown",
        });

        let resp = self
            .client
            .post(self.api_url("sendPhoto"))
            .json(&body)
            .send()
            .await?;
        check_api_response("sendPhoto", resp).await
    }

    async fn send_typing(&self, recipient: &str) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "chat_id": recipient,
            "action": "typing",
        });

        let resp = self
            .client
            .post(self.api_url("sendChatAction"))
            .json(&body)
            .send()
            .await?;
        check_api_response("sendChatAction", resp).await
    }

    async fn listen(&self, tx: tokio::sync::mpsc::Sender<ChannelMessage>) -> anyhow::Result<()> {
        let mut offset: i64 = 0;

        tracing::info!("Telegram channel listening...");

        loop {
            let params = [
                ("offset", offset.to_string()),
                ("timeout", LONG_POLL_SECS.to_string()),
            ];

            let resp = match self
                .client
                .get(self.api_url("getUpdates"))
                .query(&params)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Telegram poll error: {e}");
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    continue;
                }
            };

            let body: Value = match resp.json().await {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!("Telegram parse error: {e}");
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    continue;
                }
            };

            // ok=false here means the token is bad or another consumer holds
            // getUpdates; bail and let the supervisor restart with backoff.
            if body.get("ok") != Some(&Value::Bool(true)) {
                let description = body
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                anyhow::bail!("Telegram getUpdates failed: {description}");
            }

            if let Some(last) = last_update_id(&body) {
                offset = last + 1;
            }

            for inbound in parse_updates(&body) {
                if !self.allowed_users.is_empty() {
                    let identities = [inbound.username.as_deref(), inbound.user_id.as_deref()]
                        .into_iter()
                        .flatten();
                    if !is_any_user_allowed(&self.allowed_users, identities) {
                        tracing::warn!(
                            chat = %inbound.chat_id,
                            "Telegram: ignoring message from unauthorized user"
                        );
                        continue;
                    }
                }

                let msg = ChannelMessage {
                    id: Uuid::new_v4().to_string(),
                    sender: inbound.chat_id,
                    content: inbound.text,
                    channel: "telegram".to_string(),
                    timestamp: std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .unwrap_or_default()
                        .as_secs(),
                };

                if tx.send(msg).await.is_err() {
                    return Ok(());
                }
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
