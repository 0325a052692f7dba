//! Unified error type for the sataako bot.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Forecast service unreachable: {0}")]
    Network(String),

    #[error("Malformed forecast response: {0}")]
    MalformedResponse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Message delivery failed: {0}")]
    Messenger(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
