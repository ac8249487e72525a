/// Central error type for the UniCircle collection store.
#[derive(Debug, thiserror::Error)]
pub enum UniCircleError {
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Covers both a missing collection and one owned by someone else, so
    /// callers cannot probe for private collections.
    #[error("collection not found or not owned by caller: {id}")]
    NotFoundOrForbidden { id: String },

    #[error("item not found: {id}")]
    ItemNotFound { id: String },

    #[error("forbidden: {message}")]
    Forbidden { message: String },

    #[error("collection not found or not public: {id}")]
    NotCloneable { id: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("access denied: {message}")]
    AccessDenied { message: String },

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("credential error: {message}")]
    CredentialError { message: String },

    #[error("{0}")]
    Other(String),
}

impl UniCircleError {
    pub fn validation(message: impl Into<String>) -> Self {
        UniCircleError::Validation {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for UniCircleError {
    fn from(e: serde_json::Error) -> Self {
        UniCircleError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, UniCircleError>;
