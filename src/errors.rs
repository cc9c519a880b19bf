use serde::Serialize;
use std::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) enum ConsoleErrorType {
    NotFound,
    DuplicatePath,
    NotOpen,
    InvalidPath,
    InvalidRequest,
    UpstreamFailure,
    InternalError,
}

impl Into<warp::http::StatusCode> for ConsoleErrorType {
    fn into(self) -> warp::http::StatusCode {
        match self {
            ConsoleErrorType::NotFound => warp::http::StatusCode::NOT_FOUND,
            ConsoleErrorType::DuplicatePath => warp::http::StatusCode::CONFLICT,
            ConsoleErrorType::NotOpen => warp::http::StatusCode::CONFLICT,
            ConsoleErrorType::InvalidPath => warp::http::StatusCode::BAD_REQUEST,
            ConsoleErrorType::InvalidRequest => warp::http::StatusCode::BAD_REQUEST,
            ConsoleErrorType::UpstreamFailure => warp::http::StatusCode::BAD_GATEWAY,
            ConsoleErrorType::InternalError => warp::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ConsoleError {
    pub(crate) error_type: ConsoleErrorType,
    pub(crate) message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ConsoleErrorType,
    message: &'a str,
}

impl warp::Reply for ConsoleError {
    fn into_response(self) -> warp::reply::Response {
        let body = ErrorBody {
            error: self.error_type,
            message: &self.message,
        };
        warp::reply::with_status(warp::reply::json(&body), self.error_type.into())
            .into_response()
    }
}

impl ConsoleError {
    pub(crate) fn new(error_type: ConsoleErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
        }
    }

    pub(crate) fn not_found(message: String) -> Self {
        Self::new(ConsoleErrorType::NotFound, message)
    }

    pub(crate) fn invalid_path(message: String) -> Self {
        Self::new(ConsoleErrorType::InvalidPath, message)
    }

    pub(crate) fn upstream(message: String) -> Self {
        Self::new(ConsoleErrorType::UpstreamFailure, message)
    }
}

impl std::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.error_type, self.message)
    }
}

impl From<std::io::Error> for ConsoleError {
    fn from(error: std::io::Error) -> Self {
        Self {
            error_type: ConsoleErrorType::InternalError,
            message: error.to_string(),
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(error: reqwest::Error) -> Self {
        // Strip the URL so the upstream address does not leak into replies
        Self {
            error_type: ConsoleErrorType::UpstreamFailure,
            message: error.without_url().to_string(),
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(error: serde_json::Error) -> Self {
        Self {
            error_type: ConsoleErrorType::UpstreamFailure,
            message: format!("Malformed response from backend: {}", error),
        }
    }
}

impl Error for ConsoleError {}

pub(crate) type Result<T> = std::result::Result<T, ConsoleError>;
