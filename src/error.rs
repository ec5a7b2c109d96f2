use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::session::AccessError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email {0} is already registered")]
    EmailTaken(String),
    #[error("Module {module_id} is locked")]
    ModuleLocked { module_id: i64 },
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("Fatal error: {0}")]
    Fatal(anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn not_found(kind: &'static str, id: i64) -> Self {
        Error::NotFound { kind, id }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidCredentials | Error::EmailTaken(_) => StatusCode::BAD_REQUEST,
            Error::ModuleLocked { .. } => StatusCode::CONFLICT,
            Error::Access(AccessError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            Error::Access(AccessError::Unauthorized { .. }) => StatusCode::FORBIDDEN,
            Error::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            Error::Database(_) | Error::Migrate(_) | Error::Session(_) | Error::Fatal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        match &self {
            Error::Access(access) => (
                status,
                [(axum::http::header::LOCATION, access.redirect())],
                self.to_string(),
            )
                .into_response(),
            _ => (status, self.to_string()).into_response(),
        }
    }
}
