/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so startup and
/// per-update failures are reported consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("signal error: {0}")]
    Signal(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
