/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so startup and
/// configuration failures surface consistently. Per-request failures use the
/// domain errors in `ports` and `resolve` instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
