use thiserror::Error;

/// Configuration-related errors with structured variants.
///
/// These are the only errors allowed to terminate the process, and they
/// surface before any subscription is opened.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("silent mode requires a database path (a silent monitor without storage records nothing)")]
    SilentWithoutStorage,
}

/// Malformed upstream payloads, detected by the normalizer.
///
/// Recoverable: the dispatcher logs the error and drops the event.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("payload does not match the {family} shape: {reason}")]
    Shape { family: &'static str, reason: String },

    #[error("invalid `{field}`: {reason}")]
    Field { field: &'static str, reason: String },

    #[error("order update must carry exactly one of `placed` or `canceled`")]
    MissingOrderAction,

    #[error("timestamp {0} is out of range")]
    Timestamp(i64),
}

/// Persistence failures at the storage sink boundary.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Notification failures at the sink boundary.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notification channel closed")]
    ChannelClosed,

    #[error("callback panicked: {0}")]
    CallbackPanicked(String),

    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Transport-level failures from the upstream connection.
///
/// Recoverable: these drive subscription state transitions, never a
/// pipeline-fatal error.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not connected")]
    NotConnected,
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        TransportError::WebSocket(Box::new(err))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, Error>;
