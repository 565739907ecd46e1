//! Bot API JSON → idf-core values.
//!
//! Teloxide types are serialized back to their wire shape and decoded from
//! there. This keeps one decoder for every Bot API version the bot sees
//! (`forward_origin` and the older `forward_from*` fields alike).

use serde::Serialize;
use serde_json::{json, Value};

use idf_core::{
    formatting::{AdminEntry, GroupStats},
    origin::{ChatInfo, ContactInfo, ForwardOrigin},
    ports::LookupError,
};

/// Serialize any teloxide value to its Bot API JSON.
pub fn to_json<T: Serialize>(value: &T) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize telegram payload");
            None
        }
    }
}

const FORWARD_KEYS: [&str; 5] = [
    "story",
    "forward_origin",
    "forward_from",
    "forward_from_chat",
    "forward_sender_name",
];

// Serializers may emit `null` for absent options.
fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| !v.is_null())
}

/// Whether the message carries someone else's content (a forward or a story).
pub fn is_forwarded(message: &Value) -> bool {
    FORWARD_KEYS.iter().any(|k| field(message, k).is_some())
}

/// The origin of a forwarded message or story, if any.
///
/// Precedence: story payload, then `forward_origin`, then the legacy
/// `forward_from` / `forward_from_chat` / `forward_sender_name` fields.
pub fn forward_origin(message: &Value) -> Option<ForwardOrigin> {
    if let Some(story) = field(message, "story") {
        return story_origin(story);
    }
    if let Some(origin) = field(message, "forward_origin") {
        return ForwardOrigin::from_json(origin);
    }
    if let Some(user) = field(message, "forward_from") {
        return ForwardOrigin::from_json(&json!({"type": "user", "sender_user": user}));
    }
    if let Some(chat) = field(message, "forward_from_chat") {
        return ForwardOrigin::from_json(&json!({"type": "chat", "sender_chat": chat}));
    }
    if let Some(name) = field(message, "forward_sender_name") {
        return ForwardOrigin::from_json(&json!({
            "type": "hidden_user",
            "sender_user_name": name
        }));
    }
    None
}

// A story carries its poster as a chat; private chats are people.
fn story_origin(story: &Value) -> Option<ForwardOrigin> {
    let story_id = story.get("id").cloned().unwrap_or(Value::Null);
    let chat = field(story, "chat")?;

    let origin = if chat.get("type").and_then(Value::as_str) == Some("private") {
        json!({
            "type": "story",
            "story_id": story_id,
            "sender_user": {
                "id": chat.get("id"),
                "is_bot": derived_is_bot(chat),
                "first_name": chat.get("first_name"),
                "last_name": chat.get("last_name"),
                "username": chat.get("username"),
            }
        })
    } else {
        json!({"type": "story", "story_id": story_id, "sender_chat": chat})
    };
    ForwardOrigin::from_json(&origin)
}

pub fn contact(message: &Value) -> Option<ContactInfo> {
    let raw = field(message, "contact")?;
    match serde_json::from_value(raw.clone()) {
        Ok(c) => Some(c),
        Err(e) => {
            tracing::debug!(error = %e, "undecodable contact");
            None
        }
    }
}

/// Decode a `getChat` result. Bot accounts are recognised by the `bot`
/// username suffix the platform enforces, since `getChat` does not flag them.
pub fn chat_info(mut value: Value) -> Result<ChatInfo, LookupError> {
    if field(&value, "is_bot").is_none() {
        let is_bot = derived_is_bot(&value);
        if let Some(obj) = value.as_object_mut() {
            obj.insert("is_bot".to_string(), Value::Bool(is_bot));
        }
    }
    serde_json::from_value(value).map_err(|e| LookupError::Decode(e.to_string()))
}

fn derived_is_bot(chat: &Value) -> bool {
    chat.get("type").and_then(Value::as_str) == Some("private")
        && chat
            .get("username")
            .and_then(Value::as_str)
            .is_some_and(|u| u.to_lowercase().ends_with("bot"))
}

/// `status` of a serialized chat member (`creator`, `administrator`, ...).
pub fn member_status(member: &Value) -> Option<String> {
    member
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    field(value, key).and_then(Value::as_str).map(str::to_string)
}

/// One `getChatAdministrators` entry as a roster row.
pub fn admin_entry(member: &Value) -> Option<AdminEntry> {
    let user = field(member, "user")?;
    Some(AdminEntry {
        id: field(user, "id")?.as_i64()?,
        first_name: str_field(user, "first_name").unwrap_or_default(),
        last_name: str_field(user, "last_name"),
        username: str_field(user, "username"),
        is_bot: field(user, "is_bot").and_then(Value::as_bool).unwrap_or(false),
        is_creator: member_status(member).as_deref() == Some("creator"),
    })
}

/// `getChat` result plus the two counts fetched alongside it.
pub fn group_stats(chat: &Value, member_count: u32, admin_count: usize) -> Option<GroupStats> {
    Some(GroupStats {
        id: field(chat, "id")?.as_i64()?,
        title: str_field(chat, "title"),
        username: str_field(chat, "username"),
        description: str_field(chat, "description"),
        supergroup: str_field(chat, "type").as_deref() == Some("supergroup"),
        member_count,
        admin_count,
    })
}
