/// Result alias that carries the custom [`AnimatorError`] type.
pub type Result<T> = std::result::Result<T, AnimatorError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum AnimatorError {
    /// Free-form message for failures that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The timing map or configuration could not be parsed.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// The beat list violates ordering or contains non-finite values.
    #[error("invalid timing map: {0}")]
    InvalidTimingMap(String),
    #[error("unknown preset `{0}` (expected gentle, moderate, intense or frenzy)")]
    UnknownPreset(String),
    /// A start command arrived while a session was already running.
    #[error("a disco session is already running")]
    AlreadyRunning,
}

impl AnimatorError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn timing<T: Into<String>>(msg: T) -> Self {
        Self::InvalidTimingMap(msg.into())
    }
}

impl From<&str> for AnimatorError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for AnimatorError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
