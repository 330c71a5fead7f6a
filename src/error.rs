use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// 2xx以外のレスポンス。ページ取得全体を中断する
    #[error("Transport error: {status} - {body}")]
    Transport { status: u16, body: String },

    /// レスポンス形式の不整合、またはページネーションが終了できない状態
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Geocoding failed: {0}")]
    Geocoding(String),
}

pub type Result<T> = std::result::Result<T, Error>;
