use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Environment variable error: {0}")]
    EnvVar(String),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Transport not connected")]
    NotConnected,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Flush incomplete: {undelivered} records undelivered")]
    FlushIncomplete { undelivered: usize },

    #[error("Transport closed")]
    Closed,
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to read request body: {0}")]
    BodyRead(String),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind listener: {0}")]
    Bind(String),

    #[error("Failed to accept connection: {0}")]
    Accept(String),
}

pub type Result<T> = std::result::Result<T, RecorderError>;
