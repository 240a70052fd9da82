use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::config::TelegramConfig;
use crate::streaks::MessagingGateway;

pub mod poller;
pub mod types;

pub use self::types::{Chat, ChatMember, Message, Update, User};

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("telegram http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram api error: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

const ADMIN_STATUSES: [&str; 2] = ["administrator", "creator"];

/// Bot API client used both for long polling and for replies. The base
/// URL already carries the bot token.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        // request timeout must outlast the long-poll hold time
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()?;

        Ok(Self {
            http,
            base_url: format!(
                "{}/bot{}",
                config.api_base_url.trim_end_matches('/'),
                config.bot_token
            ),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
    ) -> Result<T, TelegramError> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(payload)
            .send()
            .await?;

        let body: ApiResponse<T> = response.json().await?;
        if !body.ok {
            return Err(TelegramError::Api(
                body.description
                    .unwrap_or_else(|| format!("{method} failed without description")),
            ));
        }
        body.result
            .ok_or_else(|| TelegramError::Api(format!("{method} returned no result")))
    }

    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<(), TelegramError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(mode) = parse_mode {
            payload["parse_mode"] = mode.into();
        }

        debug!(chat_id, "sending message");
        let _: Value = self.call("sendMessage", &payload).await?;
        Ok(())
    }

    pub async fn get_chat_member(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<ChatMember, TelegramError> {
        self.call(
            "getChatMember",
            &json!({
                "chat_id": chat_id,
                "user_id": user_id,
            }),
        )
        .await
    }
}

#[async_trait]
impl MessagingGateway for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        self.send_message(chat_id, text, None).await?;
        Ok(())
    }

    async fn send_html(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        self.send_message(chat_id, text, Some("HTML")).await?;
        Ok(())
    }

    async fn is_admin(&self, chat_id: i64, user_id: i64) -> anyhow::Result<bool> {
        let member = self.get_chat_member(chat_id, user_id).await?;
        Ok(ADMIN_STATUSES.contains(&member.status.as_str()))
    }
}
