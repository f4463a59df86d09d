use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the engine classified a failure. Preserved through the REST layer so
/// that authorization failures stay distinguishable from bad requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineErrorKind {
    BadUserRequest,
    Authorization,
    NotFound,
    Internal,
}

/// A failure raised by the wrapped engine during query or command execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::BadUserRequest, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Authorization, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Internal, message)
    }

    /// Same classification, message prefixed with the failing operation.
    pub fn with_context(self, context: impl std::fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{}: {}", context, self.message),
        }
    }
}

/// Every failure the REST layer can report for a single call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RestError {
    /// Malformed or mutually exclusive request parameters.
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Binary content requested for a variable that holds none.
    #[error("{0}")]
    NotBinary(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl RestError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) | Self::NotBinary(_) => 400,
            Self::NotFound(_) => 404,
            Self::Engine(e) => match e.kind {
                EngineErrorKind::BadUserRequest => 400,
                EngineErrorKind::Authorization => 403,
                EngineErrorKind::NotFound => 404,
                EngineErrorKind::Internal => 500,
            },
        }
    }

    /// Error kind name reported in the `type` field of error bodies.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "InvalidRequestError",
            Self::NotFound(_) => "NotFoundError",
            Self::NotBinary(_) => "NotBinaryError",
            Self::Engine(e) => match e.kind {
                EngineErrorKind::BadUserRequest => "BadUserRequestError",
                EngineErrorKind::Authorization => "AuthorizationError",
                EngineErrorKind::NotFound => "NotFoundError",
                EngineErrorKind::Internal => "EngineError",
            },
        }
    }
}
