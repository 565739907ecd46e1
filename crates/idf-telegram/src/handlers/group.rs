use std::sync::Arc;

use chrono::Utc;
use teloxide::{
    prelude::*,
    types::{ChatMember, ChatPermissions, Message, User, UserId},
    RequestError,
};

use idf_core::{
    formatting::{
        escape_html, format_admin_roster, format_group_card, format_group_stats,
        format_member_info, format_member_status, format_mention, format_user_card,
    },
    moderation::{
        format_done, format_pinned, is_privileged_status, parse_args, select_target,
        ModerationAction, MuteWindow, Target, ADMIN_ONLY, BOT_NOT_ADMIN, PIN_USAGE,
    },
    resolve::resolve_identifier,
};

use crate::{decode, router::AppState};

use super::{
    commands::{parse_command, Command, HELP_TEXT},
    find_by_id, reply_html, take_lookup_token,
};

const MEM_USAGE: &str = "❌ Please provide a user ID, a username or reply to a message.\n\
    Usage: <code>/mem 123456789</code>, <code>/mem @username</code> or reply with <code>/mem</code>";

pub(super) async fn handle_group(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if !text.starts_with('/') {
        return Ok(());
    }
    let cmd = parse_command(text);
    if !cmd.is_for(state.bot_username.as_deref()) {
        tracing::debug!(command = %cmd.name, mention = ?cmd.mention, "command for another bot");
        return Ok(());
    }
    handle_command(&bot, &msg, &state, &cmd).await;
    Ok(())
}

async fn handle_command(bot: &Bot, msg: &Message, state: &AppState, cmd: &Command) {
    let args = cmd.args.as_str();
    match cmd.name.as_str() {
        "id" => {
            if let Some(user) = msg.from.as_ref() {
                let card = format_user_card(
                    "👤 <b>Your Telegram ID</b>",
                    user.id.0 as i64,
                    &user.first_name,
                    user.last_name.as_deref(),
                    user.username.as_deref(),
                );
                reply_html(bot, msg, card).await;
            }
        }
        "ids" => {
            let card = format_group_card(msg.chat.id.0, msg.chat.title(), msg.chat.username());
            reply_html(bot, msg, card).await;
        }
        "find" => find_by_id(bot, msg, state, args).await,
        "whois" => whois(bot, msg, args).await,
        "mentionid" => mention(bot, msg, args).await,
        "help" => reply_html(bot, msg, HELP_TEXT).await,
        "mem" => member_info(bot, msg, state, args).await,
        "pin" => pin(bot, msg).await,
        "groupinfo" => group_info(bot, msg).await,
        "listadmins" => list_admins(bot, msg).await,
        other => match ModerationAction::from_command(other) {
            Some(action) => moderate(bot, msg, state, action, args).await,
            None => tracing::debug!(command = other, "unknown group command"),
        },
    }
}

fn replied_user(msg: &Message) -> Option<&User> {
    msg.reply_to_message().and_then(|r| r.from.as_ref())
}

/// Replied-to user, or a positive numeric id passed as the first argument.
fn target_user_id(msg: &Message, args: &str) -> Option<UserId> {
    let reply = replied_user(msg).map(|u| u.id.0 as i64);
    select_target(reply, args)
        .and_then(|id| u64::try_from(id).ok())
        .map(UserId)
}

fn lookup_usage(cmd: &str) -> String {
    format!(
        "❌ Please reply to a user's message or pass their numeric ID.\n\
         Usage: <code>/{cmd} 123456789</code> or reply to a message with <code>/{cmd}</code>"
    )
}

/// Send permissions only: unmuting never grants info, invite or pin rights.
fn unmute_permissions() -> ChatPermissions {
    ChatPermissions::SEND_MESSAGES
        | ChatPermissions::SEND_MEDIA_MESSAGES
        | ChatPermissions::SEND_POLLS
        | ChatPermissions::SEND_OTHER_MESSAGES
        | ChatPermissions::ADD_WEB_PAGE_PREVIEWS
}

async fn fetch_member(bot: &Bot, msg: &Message, user_id: UserId) -> Option<ChatMember> {
    match bot.get_chat_member(msg.chat.id, user_id).await {
        Ok(member) => Some(member),
        Err(e) => {
            tracing::warn!(
                chat_id = msg.chat.id.0,
                user_id = user_id.0,
                error = %e,
                "getChatMember failed"
            );
            None
        }
    }
}

fn status_of(member: &ChatMember) -> Option<String> {
    decode::to_json(member).and_then(|v| decode::member_status(&v))
}

async fn is_admin(bot: &Bot, msg: &Message, user_id: UserId) -> bool {
    fetch_member(bot, msg, user_id)
        .await
        .and_then(|m| status_of(&m))
        .is_some_and(|s| is_privileged_status(&s))
}

/// The calling admin, or `None` after telling a non-admin off.
async fn require_admin<'a>(bot: &Bot, msg: &'a Message) -> Option<&'a User> {
    let caller = msg.from.as_ref()?;
    if is_admin(bot, msg, caller.id).await {
        return Some(caller);
    }
    reply_html(bot, msg, ADMIN_ONLY).await;
    None
}

async fn whois(bot: &Bot, msg: &Message, args: &str) {
    let Some(user_id) = target_user_id(msg, args) else {
        reply_html(bot, msg, lookup_usage("whois")).await;
        return;
    };
    let Some(member) = fetch_member(bot, msg, user_id).await else {
        reply_html(
            bot,
            msg,
            "❌ Could not retrieve user information. Make sure the user is in this group.",
        )
        .await;
        return;
    };

    let user = &member.user;
    let mut text = format_user_card(
        "👤 <b>User Information</b>",
        user.id.0 as i64,
        &user.first_name,
        user.last_name.as_deref(),
        user.username.as_deref(),
    );
    if let Some(status) = status_of(&member) {
        text.push('\n');
        text.push_str(&format_member_status(&status));
    }
    if user.is_bot {
        text.push_str("\n🤖 <b>Type:</b> Bot");
    }
    reply_html(bot, msg, text).await;
}

async fn mention(bot: &Bot, msg: &Message, args: &str) {
    let Some(user_id) = target_user_id(msg, args) else {
        reply_html(bot, msg, lookup_usage("mentionid")).await;
        return;
    };
    match fetch_member(bot, msg, user_id).await {
        Some(member) => {
            let text = format_mention(member.user.id.0 as i64, &member.user.first_name);
            reply_html(bot, msg, text).await;
        }
        None => {
            reply_html(
                bot,
                msg,
                "❌ Could not create mention. Make sure the user is in this group.",
            )
            .await;
        }
    }
}

/// `/mem`: by reply, numeric id, or a username resolved through `getChat`.
async fn member_info(bot: &Bot, msg: &Message, state: &AppState, args: &str) {
    if require_admin(bot, msg).await.is_none() {
        return;
    }

    let arg = args.split_whitespace().next();
    let user_id = match (target_user_id(msg, args), arg) {
        (Some(id), _) => Some(id),
        (None, None) => {
            reply_html(bot, msg, MEM_USAGE).await;
            return;
        }
        (None, Some(identifier)) => {
            if let Err(notice) = take_lookup_token(state, msg.from.as_ref()).await {
                reply_html(bot, msg, notice).await;
                return;
            }
            resolve_identifier(state.lookup.as_ref(), identifier)
                .await
                .ok()
                .and_then(|rec| rec.id.numeric())
                .and_then(|id| u64::try_from(id).ok())
                .map(UserId)
        }
    };

    let member = match user_id {
        Some(id) => fetch_member(bot, msg, id).await,
        None => None,
    };
    let Some(member) = member else {
        let shown = arg.unwrap_or("replied user");
        reply_html(
            bot,
            msg,
            format!(
                "❌ Could not find member with identifier '{}' in this group.",
                escape_html(shown)
            ),
        )
        .await;
        return;
    };

    let user = &member.user;
    let status = status_of(&member).unwrap_or_else(|| "unknown".to_string());
    let text = format_member_info(
        user.id.0 as i64,
        &user.first_name,
        user.last_name.as_deref(),
        user.username.as_deref(),
        &status,
    );
    reply_html(bot, msg, text).await;
}

async fn pin(bot: &Bot, msg: &Message) {
    let Some(admin) = require_admin(bot, msg).await else {
        return;
    };
    let Some(reply) = msg.reply_to_message() else {
        reply_html(bot, msg, PIN_USAGE).await;
        return;
    };

    match bot.pin_chat_message(msg.chat.id, reply.id).await {
        Ok(_) => {
            tracing::info!(
                chat_id = msg.chat.id.0,
                message_id = reply.id.0,
                admin = admin.id.0,
                "message pinned"
            );
            reply_html(bot, msg, format_pinned(&admin.first_name)).await;
        }
        Err(e) => {
            tracing::warn!(chat_id = msg.chat.id.0, error = %e, "pinChatMessage failed");
            let text = format!("❌ Failed to pin message: {}", escape_html(&e.to_string()));
            reply_html(bot, msg, text).await;
        }
    }
}

async fn group_info(bot: &Bot, msg: &Message) {
    if require_admin(bot, msg).await.is_none() {
        return;
    }

    let chat_id = msg.chat.id;
    let stats = async {
        let chat = bot.get_chat(chat_id).await?;
        let members = bot.get_chat_member_count(chat_id).await?;
        let admins = bot.get_chat_administrators(chat_id).await?;
        Ok::<_, RequestError>(
            decode::to_json(&chat).and_then(|v| decode::group_stats(&v, members, admins.len())),
        )
    }
    .await;

    match stats {
        Ok(Some(stats)) => reply_html(bot, msg, format_group_stats(&stats)).await,
        Ok(None) => {
            reply_html(bot, msg, "❌ Could not read this group's information.").await;
        }
        Err(e) => {
            tracing::warn!(chat_id = chat_id.0, error = %e, "group info failed");
            let text = format!("❌ Error getting group info: {}", escape_html(&e.to_string()));
            reply_html(bot, msg, text).await;
        }
    }
}

async fn list_admins(bot: &Bot, msg: &Message) {
    if require_admin(bot, msg).await.is_none() {
        return;
    }

    match bot.get_chat_administrators(msg.chat.id).await {
        Ok(admins) => {
            let entries: Vec<_> = admins
                .iter()
                .filter_map(|m| decode::to_json(m).and_then(|v| decode::admin_entry(&v)))
                .collect();
            reply_html(bot, msg, format_admin_roster(&entries)).await;
        }
        Err(e) => {
            tracing::warn!(chat_id = msg.chat.id.0, error = %e, "getChatAdministrators failed");
            let text = format!(
                "❌ Error getting administrators: {}",
                escape_html(&e.to_string())
            );
            reply_html(bot, msg, text).await;
        }
    }
}

async fn moderate(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    action: ModerationAction,
    args: &str,
) {
    let Some(admin) = require_admin(bot, msg).await else {
        return;
    };
    if let Some(bot_id) = state.bot_id {
        if !is_admin(bot, msg, bot_id).await {
            reply_html(bot, msg, BOT_NOT_ADMIN).await;
            return;
        }
    }

    let replied = replied_user(msg);
    let Some(target_id) = target_user_id(msg, args) else {
        reply_html(bot, msg, action.usage()).await;
        return;
    };

    let member = fetch_member(bot, msg, target_id).await;
    let target_status = member.as_ref().and_then(status_of);
    if action.refuses_target(target_status.as_deref()) {
        reply_html(bot, msg, action.protected_admin_message()).await;
        return;
    }

    let name = match (replied, member) {
        (Some(user), _) => user.first_name.clone(),
        (None, Some(m)) => m.user.first_name,
        (None, None) => format!("User {}", target_id.0),
    };
    let target = Target {
        user_id: target_id.0 as i64,
        name,
    };

    let mute = if action == ModerationAction::Mute {
        let parsed = parse_args(args, replied.is_some());
        let window = MuteWindow::starting_at(
            parsed.duration.as_deref(),
            state.cfg.default_mute,
            Utc::now(),
        );
        let Some(window) = window else {
            reply_html(bot, msg, action.failure_message("duration out of range")).await;
            return;
        };
        Some(window)
    } else {
        None
    };

    match apply(bot, msg, action, target_id, mute).await {
        Ok(()) => {
            tracing::info!(
                chat_id = msg.chat.id.0,
                target = target_id.0,
                admin = admin.id.0,
                action = action.command(),
                "moderation applied"
            );
            reply_html(bot, msg, format_done(action, &target, &admin.first_name, mute)).await;
        }
        Err(e) => {
            tracing::warn!(
                chat_id = msg.chat.id.0,
                action = action.command(),
                error = %e,
                "moderation failed"
            );
            reply_html(bot, msg, action.failure_message(&e.to_string())).await;
        }
    }
}

async fn apply(
    bot: &Bot,
    msg: &Message,
    action: ModerationAction,
    user_id: UserId,
    mute: Option<MuteWindow>,
) -> Result<(), RequestError> {
    let chat_id = msg.chat.id;
    match action {
        ModerationAction::Mute => {
            let mut req = bot.restrict_chat_member(chat_id, user_id, ChatPermissions::empty());
            if let Some(w) = mute {
                req = req.until_date(w.until);
            }
            req.await?;
        }
        ModerationAction::Unmute => {
            bot.restrict_chat_member(chat_id, user_id, unmute_permissions())
                .await?;
        }
        ModerationAction::Kick => {
            // Ban then unban so the user may rejoin.
            bot.ban_chat_member(chat_id, user_id).await?;
            bot.unban_chat_member(chat_id, user_id).await?;
        }
        ModerationAction::Ban => {
            bot.ban_chat_member(chat_id, user_id).await?;
        }
        ModerationAction::Unban => {
            bot.unban_chat_member(chat_id, user_id)
                .only_if_banned(true)
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_usage_names_the_command() {
        let text = lookup_usage("whois");
        assert!(text.contains("<code>/whois 123456789</code>"));
        assert!(text.contains("<code>/whois</code>"));
    }

    #[test]
    fn unmute_restores_sending_only() {
        let perms = unmute_permissions();
        assert!(perms.contains(ChatPermissions::SEND_MESSAGES));
        assert!(perms.contains(ChatPermissions::SEND_MEDIA_MESSAGES));
        assert!(perms.contains(ChatPermissions::ADD_WEB_PAGE_PREVIEWS));

        assert!(!perms.contains(ChatPermissions::CHANGE_INFO));
        assert!(!perms.contains(ChatPermissions::INVITE_USERS));
        assert!(!perms.contains(ChatPermissions::PIN_MESSAGES));
        assert!(!perms.contains(ChatPermissions::MANAGE_TOPICS));
    }
}
