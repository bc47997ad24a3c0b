use crate::detect::DetectKindError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    DetectKind(#[from] DetectKindError),

    #[error("unknown element type: {element_type}")]
    UnknownElementType { element_type: String },

    #[error("invalid anchor direction: {direction}")]
    InvalidDirection { direction: String },

    #[error("invalid tree index {index:?}: indices must be positive integers")]
    InvalidIndex { index: String },

    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    #[error("document JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}
