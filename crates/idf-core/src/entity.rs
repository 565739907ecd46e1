//! Normalized entity records produced by classification and resolution.

use std::fmt;

/// What kind of Telegram entity a record describes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Bot,
    Group,
    Channel,
    UserStory,
    ChannelStory,
    HiddenUser,
    Unknown,
    /// Chat type this bot does not know yet, labelled with the capitalized raw type.
    Other(String),
}

impl EntityKind {
    pub fn label(&self) -> &str {
        match self {
            EntityKind::User => "User",
            EntityKind::Bot => "Bot",
            EntityKind::Group => "Group",
            EntityKind::Channel => "Channel",
            EntityKind::UserStory => "User Story",
            EntityKind::ChannelStory => "Channel Story",
            EntityKind::HiddenUser => "Hidden User",
            EntityKind::Unknown => "Unknown",
            EntityKind::Other(label) => label,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Entity id. Telegram withholds the id of users who hide their account in forwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityId {
    Numeric(i64),
    Hidden,
}

impl EntityId {
    pub fn numeric(self) -> Option<i64> {
        match self {
            EntityId::Numeric(id) => Some(id),
            EntityId::Hidden => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub id: EntityId,
    pub display_name: String,
    pub username: Option<String>,
    pub verified: Option<bool>,
    pub story_id: Option<i64>,
}

/// `first last`, trimmed, tolerating either part being absent.
pub fn full_name(first_name: Option<&str>, last_name: Option<&str>) -> String {
    format!(
        "{} {}",
        first_name.unwrap_or_default(),
        last_name.unwrap_or_default()
    )
    .trim()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels() {
        assert_eq!(EntityKind::UserStory.to_string(), "User Story");
        assert_eq!(EntityKind::HiddenUser.to_string(), "Hidden User");
        assert_eq!(EntityKind::Other("Forum".to_string()).to_string(), "Forum");
    }

    #[test]
    fn full_name_trims_missing_parts() {
        assert_eq!(full_name(Some("Ada"), Some("Lovelace")), "Ada Lovelace");
        assert_eq!(full_name(Some("Ada"), None), "Ada");
        assert_eq!(full_name(None, Some("Lovelace")), "Lovelace");
        assert_eq!(full_name(None, None), "");
    }
}
