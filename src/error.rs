use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    #[error("interval {chromosome}:{start}-{end} is outside chromosome length {length}")]
    OutOfRange {
        chromosome: String,
        start: u64,
        end: u64,
        length: u64,
    },

    #[error("reference mismatch: {0}")]
    ReferenceMismatch(String),

    #[error("source read error: {0}")]
    SourceRead(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("query cancelled")]
    Cancelled,

    #[error("query timed out after {0}s")]
    Timeout(u64),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInterval(_) => "InvalidInterval",
            Error::OutOfRange { .. } => "OutOfRange",
            Error::ReferenceMismatch(_) => "ReferenceMismatch",
            Error::SourceRead(_) => "SourceReadError",
            Error::NotFound(_) => "NotFound",
            Error::InvalidInput(_) => "InvalidInput",
            Error::Cancelled => "Cancelled",
            Error::Timeout(_) => "Timeout",
            Error::Io(_) | Error::Internal(_) => "InternalError",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInterval(_) => StatusCode::BAD_REQUEST,
            Error::OutOfRange { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Error::ReferenceMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Cancelled => StatusCode::REQUEST_TIMEOUT,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::SourceRead(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                kind: self.kind(),
                message: self.to_string(),
            },
        };
        (self.status_code(), axum::Json(body)).into_response()
    }
}
