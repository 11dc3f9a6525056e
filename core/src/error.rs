use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown action: {action}")]
    UnknownAction { action: String },

    #[error("Format: {expected}")]
    MalformedAction { expected: String },

    #[error("SKU {sku} or channel {channel} not found")]
    UnknownTarget { sku: String, channel: String },

    #[error("Telemetry state not yet initialized")]
    NotInitialized,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
