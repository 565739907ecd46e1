use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use idf_core::{
    classify::{classify_contact, classify_forward, classify_user},
    formatting::{format_response, Outcome},
};

use crate::{decode, router::AppState};

use super::{
    commands::{
        parse_command, welcome_text, Command, FORWARD_HINT, GROUP_ONLY, HELP_TEXT,
        USERNAME_PROMPT,
    },
    find_by_id, lookup_and_reply, origin_user, reply_html,
};

pub(super) async fn handle_private(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            let cmd = parse_command(text);
            if !cmd.is_for(state.bot_username.as_deref()) {
                return Ok(());
            }
            return handle_command(&bot, &msg, &state, &cmd).await;
        }
    }

    let Some(raw) = decode::to_json(&msg) else {
        return Ok(());
    };

    if decode::is_forwarded(&raw) {
        let origin = decode::forward_origin(&raw);
        tracing::info!(?origin, "forwarded message");
        let outcome = Outcome::from(origin.as_ref().and_then(classify_forward));
        reply_html(&bot, &msg, format_response(&outcome)).await;
        return Ok(());
    }

    if let Some(contact) = decode::contact(&raw) {
        let outcome = Outcome::from(classify_contact(&contact));
        reply_html(&bot, &msg, format_response(&outcome)).await;
        return Ok(());
    }

    match msg.text() {
        Some(text) => lookup_and_reply(&bot, &msg, &state, text).await,
        None => reply_html(&bot, &msg, FORWARD_HINT).await,
    }
    Ok(())
}

async fn handle_command(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    cmd: &Command,
) -> ResponseResult<()> {
    let args = cmd.args.as_str();
    match cmd.name.as_str() {
        "start" => {
            let name = msg.from.as_ref().map(|u| u.first_name.as_str()).unwrap_or("");
            reply_html(bot, msg, welcome_text(name)).await;
        }
        "help" => reply_html(bot, msg, HELP_TEXT).await,
        "id" => {
            let outcome = Outcome::from(msg.from.as_ref().map(|u| classify_user(&origin_user(u))));
            reply_html(bot, msg, format_response(&outcome)).await;
        }
        "username" => {
            if args.is_empty() {
                reply_html(bot, msg, USERNAME_PROMPT).await;
            } else {
                lookup_and_reply(bot, msg, state, args).await;
            }
        }
        "find" => find_by_id(bot, msg, state, args).await,
        "ids" | "whois" | "mentionid" | "mute" | "unmute" | "kick" | "ban" | "unban" | "mem"
        | "pin" | "groupinfo" | "listadmins" => {
            reply_html(bot, msg, GROUP_ONLY).await;
        }
        other => {
            tracing::debug!(command = other, "unknown private command");
            reply_html(bot, msg, HELP_TEXT).await;
        }
    }
    Ok(())
}
