//! Username / link resolution with the `@name` → `name` → numeric id fallback chain.

use std::sync::OnceLock;

use regex::Regex;

use crate::{
    entity::{full_name, EntityId, EntityKind, EntityRecord},
    origin::ChatInfo,
    ports::{ChatLookup, LookupError, LookupKey},
};

const RESOLUTION_MESSAGE: &str = "Could not resolve this username or link.";
const RESOLUTION_REASON: &str = "The entity was not found or is not accessible to the bot.";
const RESOLUTION_EXPLANATION: &str = "Telegram only lets bots look up public channels, \
public groups, bots and users who have already interacted with this bot. Accounts the bot \
has no prior relationship with cannot be resolved by username. Forward a message from the \
entity instead, or check the spelling.";

/// Internal classification of an exhausted resolution. Logged, never shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionCause {
    EmptyIdentifier,
    /// Every attempt reported "not found" (includes entities with no prior relationship).
    NotFound,
    /// At least one attempt failed for a reason other than "not found".
    LookupFailed(LookupError),
}

/// User-facing failure of `resolve_identifier`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionError {
    pub message: String,
    pub reason: String,
    pub explanation: String,
    pub cause: ResolutionCause,
}

impl ResolutionError {
    // One generic explanation for every cause; only `cause` tells them apart.
    fn new(cause: ResolutionCause) -> Self {
        Self {
            message: RESOLUTION_MESSAGE.to_string(),
            reason: RESOLUTION_REASON.to_string(),
            explanation: RESOLUTION_EXPLANATION.to_string(),
            cause,
        }
    }
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:https?://)?(?:t\.me|telegram\.me)/(?:joinchat/|s/|c/)?([A-Za-z0-9_-]+)")
            .expect("valid regex")
    })
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?[0-9]+$").expect("valid regex"))
}

/// Reduce `@name`, `name` or a t.me link to the bare identifier.
pub fn normalize_identifier(text: &str) -> String {
    let text = text.trim();
    let text = text.strip_prefix('@').unwrap_or(text);

    match link_re().captures(text).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().to_string(),
        None => text.to_string(),
    }
}

/// Lookup keys to try, in order.
pub fn lookup_plan(identifier: &str) -> Vec<LookupKey> {
    let mut plan = vec![
        LookupKey::Text(format!("@{identifier}")),
        LookupKey::Text(identifier.to_string()),
    ];
    if numeric_re().is_match(identifier) {
        if let Ok(id) = identifier.parse::<i64>() {
            plan.push(LookupKey::Id(id));
        }
    }
    plan
}

/// Resolve free-form user input to an entity record.
///
/// Attempts run sequentially and stop at the first success.
pub async fn resolve_identifier(
    lookup: &dyn ChatLookup,
    text: &str,
) -> Result<EntityRecord, ResolutionError> {
    let identifier = normalize_identifier(text);
    if identifier.is_empty() {
        return Err(ResolutionError::new(ResolutionCause::EmptyIdentifier));
    }

    let mut last_other: Option<LookupError> = None;
    for key in lookup_plan(&identifier) {
        match lookup.get_chat(&key).await {
            Ok(chat) => {
                tracing::debug!(%key, chat_id = chat.id, "resolved identifier");
                return Ok(classify_chat(&chat));
            }
            Err(LookupError::NotFound(detail)) => {
                tracing::debug!(%key, %detail, "lookup attempt: not found");
            }
            Err(e) => {
                tracing::debug!(%key, error = %e, "lookup attempt failed");
                last_other = Some(e);
            }
        }
    }

    let cause = match last_other {
        Some(e) => ResolutionCause::LookupFailed(e),
        None => ResolutionCause::NotFound,
    };
    tracing::info!(%identifier, ?cause, "identifier could not be resolved");
    Err(ResolutionError::new(cause))
}

/// Classify a lookup result.
pub fn classify_chat(chat: &ChatInfo) -> EntityRecord {
    let kind = match chat.chat_type.as_str() {
        "channel" => EntityKind::Channel,
        "group" | "supergroup" => EntityKind::Group,
        "private" if chat.is_bot.unwrap_or(false) => EntityKind::Bot,
        "private" => EntityKind::User,
        other => EntityKind::Other(capitalize(other)),
    };

    let display_name = match kind {
        EntityKind::Channel | EntityKind::Group => chat
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        _ => {
            let name = full_name(chat.first_name.as_deref(), chat.last_name.as_deref());
            if name.is_empty() {
                "Unknown".to_string()
            } else {
                name
            }
        }
    };

    EntityRecord {
        kind,
        id: EntityId::Numeric(chat.id),
        display_name,
        username: chat.username.clone(),
        verified: chat.is_verified,
        story_id: None,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => "Unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use async_trait::async_trait;

    use super::*;

    /// In-memory lookup that records every key it was asked for.
    #[derive(Default)]
    struct FakeLookup {
        known: HashMap<LookupKey, ChatInfo>,
        fail_with: Option<LookupError>,
        calls: Mutex<Vec<LookupKey>>,
    }

    impl FakeLookup {
        fn with(mut self, key: LookupKey, chat: ChatInfo) -> Self {
            self.known.insert(key, chat);
            self
        }

        fn calls(&self) -> Vec<LookupKey> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatLookup for FakeLookup {
        async fn get_chat(&self, key: &LookupKey) -> Result<ChatInfo, LookupError> {
            self.calls.lock().unwrap().push(key.clone());
            if let Some(chat) = self.known.get(key) {
                return Ok(chat.clone());
            }
            Err(self
                .fail_with
                .clone()
                .unwrap_or_else(|| LookupError::NotFound("chat not found".to_string())))
        }
    }

    fn channel() -> ChatInfo {
        ChatInfo {
            id: -1001234567890,
            chat_type: "channel".to_string(),
            username: Some("idfinderpro".to_string()),
            first_name: None,
            last_name: None,
            title: Some("ID Finder Pro".to_string()),
            is_bot: None,
            is_verified: None,
        }
    }

    fn private(first: Option<&str>, last: Option<&str>, is_bot: Option<bool>) -> ChatInfo {
        ChatInfo {
            id: 42,
            chat_type: "private".to_string(),
            username: None,
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            title: None,
            is_bot,
            is_verified: None,
        }
    }

    #[test]
    fn normalizes_usernames_and_links() {
        assert_eq!(normalize_identifier("  @telegram "), "telegram");
        assert_eq!(normalize_identifier("telegram"), "telegram");
        assert_eq!(normalize_identifier("https://t.me/idfinderpro"), "idfinderpro");
        assert_eq!(normalize_identifier("http://telegram.me/durov"), "durov");
        assert_eq!(normalize_identifier("t.me/joinchat/AbC-d_1"), "AbC-d_1");
        assert_eq!(normalize_identifier("t.me/s/news"), "news");
        assert_eq!(normalize_identifier("t.me/c/1234567890/55"), "1234567890");
        assert_eq!(normalize_identifier("t.me/durov?start=1"), "durov");
        assert_eq!(normalize_identifier("-1001234567890"), "-1001234567890");
        assert_eq!(normalize_identifier("example.com/durov"), "example.com/durov");
        assert_eq!(normalize_identifier(" @ "), "");
    }

    #[test]
    fn plan_adds_numeric_attempt_only_for_ids() {
        assert_eq!(
            lookup_plan("durov"),
            vec![
                LookupKey::Text("@durov".to_string()),
                LookupKey::Text("durov".to_string()),
            ]
        );
        assert_eq!(
            lookup_plan("-100123"),
            vec![
                LookupKey::Text("@-100123".to_string()),
                LookupKey::Text("-100123".to_string()),
                LookupKey::Id(-100123),
            ]
        );
        assert_eq!(lookup_plan("12a").len(), 2);
        assert_eq!(lookup_plan("99999999999999999999").len(), 2);
    }

    #[tokio::test]
    async fn first_attempt_wins_and_short_circuits() {
        let lookup = FakeLookup::default().with(LookupKey::Text("@idfinderpro".into()), channel());

        let rec = resolve_identifier(&lookup, "https://t.me/idfinderpro")
            .await
            .unwrap();
        assert_eq!(rec.kind, EntityKind::Channel);
        assert_eq!(rec.display_name, "ID Finder Pro");
        assert_eq!(rec.id, EntityId::Numeric(-1001234567890));
        assert_eq!(lookup.calls().len(), 1);
    }

    #[tokio::test]
    async fn falls_through_to_bare_identifier() {
        let lookup = FakeLookup::default().with(LookupKey::Text("idfinderpro".into()), channel());

        let rec = resolve_identifier(&lookup, "@idfinderpro").await.unwrap();
        assert_eq!(rec.kind, EntityKind::Channel);
        assert_eq!(
            lookup.calls(),
            vec![
                LookupKey::Text("@idfinderpro".into()),
                LookupKey::Text("idfinderpro".into()),
            ]
        );
    }

    #[tokio::test]
    async fn falls_through_to_numeric_id() {
        let lookup = FakeLookup::default().with(LookupKey::Id(-1001234567890), channel());

        let rec = resolve_identifier(&lookup, "-1001234567890").await.unwrap();
        assert_eq!(rec.username.as_deref(), Some("idfinderpro"));
        assert_eq!(lookup.calls().len(), 3);
    }

    #[tokio::test]
    async fn at_prefix_does_not_change_the_outcome() {
        let lookup = FakeLookup::default().with(LookupKey::Text("@telegram".into()), channel());

        let with_at = resolve_identifier(&lookup, "@telegram").await;
        let without_at = resolve_identifier(&lookup, "telegram").await;
        assert_eq!(with_at, without_at);
    }

    #[tokio::test]
    async fn exhausted_chain_is_a_resolution_error() {
        let lookup = FakeLookup::default();
        let err = resolve_identifier(&lookup, "123").await.unwrap_err();
        assert_eq!(err.cause, ResolutionCause::NotFound);
        assert_eq!(err.message, RESOLUTION_MESSAGE);
        assert_eq!(lookup.calls().len(), 3);

        let lookup = FakeLookup {
            fail_with: Some(LookupError::Timeout),
            ..FakeLookup::default()
        };
        let err = resolve_identifier(&lookup, "durov").await.unwrap_err();
        assert_eq!(err.cause, ResolutionCause::LookupFailed(LookupError::Timeout));
        // Same user-facing text regardless of cause.
        assert_eq!(err.explanation, RESOLUTION_EXPLANATION);
        assert_eq!(lookup.calls().len(), 2);
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let lookup = FakeLookup::default();
        let err = resolve_identifier(&lookup, "   ").await.unwrap_err();
        assert_eq!(err.cause, ResolutionCause::EmptyIdentifier);
        assert!(lookup.calls().is_empty());
    }

    #[test]
    fn classifies_chat_types() {
        assert_eq!(classify_chat(&channel()).kind, EntityKind::Channel);

        let mut group = channel();
        group.chat_type = "supergroup".to_string();
        assert_eq!(classify_chat(&group).kind, EntityKind::Group);

        assert_eq!(
            classify_chat(&private(Some("A"), None, Some(true))).kind,
            EntityKind::Bot
        );
        assert_eq!(
            classify_chat(&private(Some("A"), None, None)).kind,
            EntityKind::User
        );

        let mut odd = channel();
        odd.chat_type = "sender".to_string();
        let rec = classify_chat(&odd);
        assert_eq!(rec.kind, EntityKind::Other("Sender".to_string()));
        assert_eq!(rec.kind.label(), "Sender");
    }

    #[test]
    fn display_names_default_to_unknown() {
        let rec = classify_chat(&private(Some(" Ada "), Some("Lovelace"), None));
        assert_eq!(rec.display_name, "Ada  Lovelace");
        assert_eq!(
            classify_chat(&private(None, None, None)).display_name,
            "Unknown"
        );

        let mut untitled = channel();
        untitled.title = None;
        assert_eq!(classify_chat(&untitled).display_name, "Unknown");
    }
}
