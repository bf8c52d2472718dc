use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("JSON error: {0}")]
    Json(String),
}

pub type Result<T> = std::result::Result<T, StatsError>;

impl From<serde_json::Error> for StatsError {
    fn from(e: serde_json::Error) -> Self {
        StatsError::Json(e.to_string())
    }
}

impl StatsError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        StatsError::InvalidArgument(msg.into())
    }

    /// True for caller mistakes in design-time parameters, as opposed to
    /// malformed serialized input.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StatsError::InvalidArgument(_))
    }
}
