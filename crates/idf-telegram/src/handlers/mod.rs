//! Telegram update handlers.
//!
//! Private chats get lookups, groups get ID commands and moderation, and inline
//! queries are resolved in place. Non-group public chats (channels) are ignored.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{InlineQuery, Message, ParseMode, User},
};

use idf_core::{
    domain::UserId,
    formatting::{format_response, Outcome},
    origin::OriginUser,
    resolve::resolve_identifier,
    security::RateDecision,
};

use crate::router::AppState;

use commands::{FIND_USAGE, INVALID_ID};

mod commands;
mod group;
mod inline;
mod private;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.chat.is_private() {
        return private::handle_private(bot, msg, state).await;
    }
    if msg.chat.is_group() || msg.chat.is_supergroup() {
        return group::handle_group(bot, msg, state).await;
    }
    Ok(())
}

pub async fn handle_inline_query(
    bot: Bot,
    q: InlineQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    inline::handle_inline_query(bot, q, state).await
}

async fn reply_html(bot: &Bot, msg: &Message, text: impl Into<String>) {
    if let Err(e) = bot
        .send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await
    {
        tracing::warn!(chat_id = msg.chat.id.0, error = %e, "failed to send reply");
    }
}

/// Take a lookup token for `user`; `Err` carries the user-facing wait notice.
async fn take_lookup_token(state: &AppState, user: Option<&User>) -> Result<(), String> {
    let Some(user) = user else {
        return Ok(());
    };
    let decision = state
        .rate_limiter
        .lock()
        .await
        .check(UserId(user.id.0 as i64));

    match decision {
        RateDecision::Allowed => Ok(()),
        RateDecision::Limited { retry_after } => {
            let secs = retry_after.as_secs_f64().ceil() as u64;
            tracing::info!(user_id = user.id.0, retry_after_secs = secs, "lookup rate limited");
            Err(format!(
                "⏳ Too many lookups. Please wait {}s and try again.",
                secs.max(1)
            ))
        }
    }
}

async fn lookup_and_reply(bot: &Bot, msg: &Message, state: &AppState, text: &str) {
    if let Err(notice) = take_lookup_token(state, msg.from.as_ref()).await {
        reply_html(bot, msg, notice).await;
        return;
    }

    let outcome = Outcome::from(resolve_identifier(state.lookup.as_ref(), text).await);
    reply_html(bot, msg, format_response(&outcome)).await;
}

/// `/find <id>` in private chats and groups alike.
async fn find_by_id(bot: &Bot, msg: &Message, state: &AppState, args: &str) {
    match args.split_whitespace().next() {
        None => reply_html(bot, msg, FIND_USAGE).await,
        Some(id) if id.parse::<i64>().is_err() => reply_html(bot, msg, INVALID_ID).await,
        Some(id) => lookup_and_reply(bot, msg, state, id).await,
    }
}

fn origin_user(user: &User) -> OriginUser {
    OriginUser {
        id: user.id.0 as i64,
        is_bot: user.is_bot,
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}
