//! Telegram adapter (teloxide).
//!
//! This crate implements the `idf-core` ChatLookup port over the Bot API and
//! wires the update handlers.

use std::time::Duration;

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::Recipient,
    ApiError, RequestError,
};

use tokio::time::{sleep, timeout};

pub mod decode;
pub mod handlers;
pub mod router;

use idf_core::{
    origin::ChatInfo,
    ports::{ChatLookup, LookupError, LookupKey},
};

/// `getChat`-backed lookup with a per-call timeout.
#[derive(Clone)]
pub struct TelegramLookup {
    bot: Bot,
    timeout: Duration,
}

impl TelegramLookup {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self { bot, timeout }
    }

    fn recipient(key: &LookupKey) -> Recipient {
        match key {
            LookupKey::Text(s) => Recipient::ChannelUsername(s.clone()),
            LookupKey::Id(id) => Recipient::Id(teloxide::types::ChatId(*id)),
        }
    }

    fn map_err(e: RequestError) -> LookupError {
        match e {
            RequestError::Api(ApiError::ChatNotFound | ApiError::UserNotFound) => {
                LookupError::NotFound(e.to_string())
            }
            other => LookupError::Api(other.to_string()),
        }
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T, LookupError>
    where
        Fut: std::future::IntoFuture<Output = Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    RequestError::RetryAfter(secs) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        tracing::warn!(retry_after = ?secs.duration(), "flood control on getChat");
                        sleep(secs.duration()).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl ChatLookup for TelegramLookup {
    async fn get_chat(&self, key: &LookupKey) -> Result<ChatInfo, LookupError> {
        let recipient = Self::recipient(key);
        let call = self.with_retry(|| self.bot.get_chat(recipient.clone()));

        let chat = timeout(self.timeout, call)
            .await
            .map_err(|_| LookupError::Timeout)??;

        let value =
            serde_json::to_value(&chat).map_err(|e| LookupError::Decode(e.to_string()))?;
        decode::chat_info(value)
    }
}
