use std::fmt;

use async_trait::async_trait;

use crate::origin::ChatInfo;

/// Key passed to the lookup service.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LookupKey {
    /// `@username` or a bare identifier, passed through as text.
    Text(String),
    /// Numeric chat id.
    Id(i64),
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKey::Text(s) => f.write_str(s),
            LookupKey::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Why a single lookup attempt failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("lookup timed out")]
    Timeout,

    #[error("api error: {0}")]
    Api(String),

    #[error("undecodable response: {0}")]
    Decode(String),
}

/// Port for "get chat/user metadata by identifier".
#[async_trait]
pub trait ChatLookup: Send + Sync {
    async fn get_chat(&self, key: &LookupKey) -> Result<ChatInfo, LookupError>;
}
