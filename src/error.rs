//! Error types shared by the decoder, engine and configuration layers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No audio track found")]
    NoAudioTrack,

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Audio engine error: {0}")]
    Engine(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl From<symphonia::core::errors::Error> for PlayerError {
    fn from(error: symphonia::core::errors::Error) -> Self {
        match error {
            symphonia::core::errors::Error::IoError(e) => PlayerError::Io(e),
            other => PlayerError::Decode(other.to_string()),
        }
    }
}

pub type PlayerResult<T> = Result<T, PlayerError>;
