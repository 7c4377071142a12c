//! Error types for Habla

use std::io;
use thiserror::Error;

/// Main error type for Habla
#[derive(Error, Debug)]
pub enum HablaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("Voice model error: {0}")]
    Model(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Habla operations
pub type Result<T> = std::result::Result<T, HablaError>;

impl From<String> for HablaError {
    fn from(s: String) -> Self {
        HablaError::Other(s)
    }
}

impl From<&str> for HablaError {
    fn from(s: &str) -> Self {
        HablaError::Other(s.to_string())
    }
}
