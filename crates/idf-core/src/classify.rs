//! Classification of forward origins and contacts into entity records.

use crate::{
    entity::{full_name, EntityId, EntityKind, EntityRecord},
    origin::{ContactInfo, ForwardOrigin, OriginChat, OriginUser},
};

/// Classify where a forwarded message came from.
///
/// Returns `None` when the origin is of an unknown type or lacks the payload its
/// type requires.
pub fn classify_forward(origin: &ForwardOrigin) -> Option<EntityRecord> {
    match origin {
        ForwardOrigin::User { sender_user } => sender_user.as_ref().map(classify_user),
        ForwardOrigin::Chat { sender_chat } => {
            let chat = sender_chat.as_ref()?;
            Some(chat_record(chat_kind(chat), chat, None))
        }
        ForwardOrigin::Story {
            sender_user,
            sender_chat,
            story_id,
        } => match (sender_user, sender_chat) {
            (Some(user), _) => Some(user_record(EntityKind::UserStory, user, *story_id)),
            (None, Some(chat)) => Some(chat_record(EntityKind::ChannelStory, chat, *story_id)),
            (None, None) => None,
        },
        ForwardOrigin::HiddenUser { sender_user_name } => {
            let name = sender_user_name.as_ref()?;
            Some(EntityRecord {
                kind: EntityKind::HiddenUser,
                id: EntityId::Hidden,
                display_name: name.clone(),
                username: None,
                verified: None,
                story_id: None,
            })
        }
        ForwardOrigin::Channel { chat } => {
            let chat = chat.as_ref()?;
            Some(chat_record(EntityKind::Channel, chat, None))
        }
        ForwardOrigin::Unknown => None,
    }
}

/// A plain account: bot or person.
pub fn classify_user(user: &OriginUser) -> EntityRecord {
    let kind = if user.is_bot {
        EntityKind::Bot
    } else {
        EntityKind::User
    };
    user_record(kind, user, None)
}

/// Classify a shared contact. Phone-only contacts have no Telegram account.
pub fn classify_contact(contact: &ContactInfo) -> Option<EntityRecord> {
    let user_id = contact.user_id?;
    Some(EntityRecord {
        kind: EntityKind::User,
        id: EntityId::Numeric(user_id),
        display_name: full_name(contact.first_name.as_deref(), contact.last_name.as_deref()),
        username: None,
        verified: None,
        story_id: None,
    })
}

fn chat_kind(chat: &OriginChat) -> EntityKind {
    match chat.chat_type.as_deref() {
        Some("channel") => EntityKind::Channel,
        Some("group") | Some("supergroup") => EntityKind::Group,
        _ => EntityKind::Unknown,
    }
}

fn user_record(kind: EntityKind, user: &OriginUser, story_id: Option<i64>) -> EntityRecord {
    EntityRecord {
        kind,
        id: EntityId::Numeric(user.id),
        display_name: full_name(user.first_name.as_deref(), user.last_name.as_deref()),
        username: user.username.clone(),
        verified: None,
        story_id,
    }
}

fn chat_record(kind: EntityKind, chat: &OriginChat, story_id: Option<i64>) -> EntityRecord {
    EntityRecord {
        kind,
        id: EntityId::Numeric(chat.id),
        display_name: chat.title.clone().unwrap_or_default(),
        username: chat.username.clone(),
        verified: chat.is_verified,
        story_id,
    }
}
