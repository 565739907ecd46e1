//! Bot API objects the resolver consumes, decoded once at the boundary.
//!
//! Field names follow the Bot API JSON so adapters can decode straight from the
//! wire (or from a serialized client-library value). Every sub-payload is
//! optional: a missing one is a classification failure, not a decode failure.

use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OriginUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OriginChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: Option<String>,
    pub title: Option<String>,
    pub username: Option<String>,
    pub is_verified: Option<bool>,
}

/// Where a forwarded message (or story) originally came from.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForwardOrigin {
    User {
        sender_user: Option<OriginUser>,
    },
    Chat {
        sender_chat: Option<OriginChat>,
    },
    Story {
        sender_user: Option<OriginUser>,
        sender_chat: Option<OriginChat>,
        story_id: Option<i64>,
    },
    HiddenUser {
        sender_user_name: Option<String>,
    },
    /// Legacy alias some API versions emit instead of `chat`.
    Channel {
        chat: Option<OriginChat>,
    },
    #[serde(other)]
    Unknown,
}

impl ForwardOrigin {
    /// Fail-soft decode: anything that does not fit the model yields `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value(value.clone()) {
            Ok(origin) => Some(origin),
            Err(e) => {
                tracing::debug!(error = %e, "undecodable forward origin");
                None
            }
        }
    }
}

/// Result of a chat lookup (`getChat`).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatInfo {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<String>,
    pub is_bot: Option<bool>,
    pub is_verified: Option<bool>,
}

/// A shared contact card.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ContactInfo {
    pub user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_user_origin_and_ignores_extra_fields() {
        let origin = ForwardOrigin::from_json(&json!({
            "type": "user",
            "date": 1700000000,
            "sender_user": {"id": 42, "is_bot": false, "first_name": "Ada", "language_code": "en"}
        }))
        .unwrap();

        let ForwardOrigin::User {
            sender_user: Some(user),
        } = origin
        else {
            panic!("expected user origin");
        };
        assert_eq!(user.id, 42);
        assert!(!user.is_bot);
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.last_name, None);
    }

    #[test]
    fn missing_sub_payload_still_decodes() {
        let origin = ForwardOrigin::from_json(&json!({"type": "chat"})).unwrap();
        assert_eq!(origin, ForwardOrigin::Chat { sender_chat: None });
    }

    #[test]
    fn unknown_tag_decodes_to_unknown() {
        let origin = ForwardOrigin::from_json(&json!({"type": "carrier_pigeon"})).unwrap();
        assert_eq!(origin, ForwardOrigin::Unknown);
    }

    #[test]
    fn missing_tag_or_broken_payload_is_none() {
        assert!(ForwardOrigin::from_json(&json!({"sender_user": {"id": 1}})).is_none());
        assert!(ForwardOrigin::from_json(&json!({
            "type": "user",
            "sender_user": {"first_name": "no id"}
        }))
        .is_none());
        assert!(ForwardOrigin::from_json(&json!("user")).is_none());
    }

    #[test]
    fn decodes_chat_info() {
        let info: ChatInfo = serde_json::from_value(json!({
            "id": -1001234567890i64,
            "type": "channel",
            "title": "ID Finder Pro",
            "username": "idfinderpro"
        }))
        .unwrap();
        assert_eq!(info.chat_type, "channel");
        assert_eq!(info.is_bot, None);
        assert_eq!(info.title.as_deref(), Some("ID Finder Pro"));
    }
}
