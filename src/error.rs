use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt::Debug;

/// Error returned by every engine, store and handler operation.
///
/// `code` identifies the failure; `kind()` groups codes into the categories
/// callers branch on. Codes `1..=99` are dependency failures whose details are
/// logged rather than sent to clients.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    pub code: i32,
    pub message: String,
    pub field: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    Conflict,
    NotFound,
    Dependency,
}

impl Error {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.code {
            100 => ErrorKind::Conflict,
            101 => ErrorKind::Validation,
            102 => ErrorKind::Authorization,
            103 => ErrorKind::NotFound,
            _ => ErrorKind::Dependency,
        }
    }

    pub fn conflict_error(message: impl Into<String>) -> Self {
        Self::new(100, message)
    }

    pub fn field_error(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::new(101, message)
        }
    }

    pub fn unauthorized_error() -> Self {
        Self::new(102, "unauthorized")
    }

    pub fn not_found_error(entity: &str) -> Self {
        Self::new(103, format!("{} not found", entity))
    }

    pub fn env_var_error(name: &str) -> Self {
        Self::new(1, format!("environment variable error: {}", name))
    }

    pub fn database_error<T: Debug>(err: T) -> Self {
        tracing::error!(error = ?err, "database error");
        Self::new(2, "database error")
    }

    pub fn authorizor_error<T: Debug>(err: T) -> Self {
        tracing::error!(error = ?err, "authorizor error");
        Self::new(3, "authorizor error")
    }

    pub fn notification_error(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn unexpected_error() -> Self {
        Self::new(5, "unexpected error")
    }

    pub fn is_conflict_error(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    pub fn is_validation_error(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_unauthorized_error(&self) -> bool {
        self.kind() == ErrorKind::Authorization
    }

    pub fn is_not_found_error(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        Self::new(1, format!("environment variable error: {}", err))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::database_error(err)
    }
}

impl From<oso::OsoError> for Error {
    fn from(err: oso::OsoError) -> Self {
        Self::authorizor_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Dependency => StatusCode::SERVICE_UNAVAILABLE,
        };

        let message = match self.kind() {
            ErrorKind::Dependency => "Service Unavailable",
            _ => self.message.as_str(),
        };

        let body = Json(json!({
            "code": self.code,
            "error": message,
            "field": self.field,
        }));

        (status, body).into_response()
    }
}
