use std::error::Error;

use poem::error::ResponseError;
use poem::http::StatusCode;
use sea_orm::DbErr;

use crate::AddressError;

#[derive(thiserror::Error, Debug)]
pub enum IpSentinelError {
    #[error("database error: {0}")]
    DatabaseError(DbErr),
    #[error("registry backend unavailable")]
    BackendUnavailable(DbErr),
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),
    #[error("IP address already exists in the database.")]
    DuplicateAddress(String),
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("username {0} is already taken")]
    UsernameTaken(String),
    #[error("username must not be empty")]
    EmptyUsername,
    #[error(transparent)]
    Other(Box<dyn Error + Send + Sync>),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl ResponseError for IpSentinelError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidAddress(_) | Self::UnknownUser(_) | Self::EmptyUsername => {
                StatusCode::BAD_REQUEST
            }
            Self::DuplicateAddress(_) | Self::UsernameTaken(_) => StatusCode::CONFLICT,
            Self::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl poem_openapi::ApiResponse for IpSentinelError {
    fn meta() -> poem_openapi::registry::MetaResponses {
        poem_openapi::registry::MetaResponses {
            responses: Vec::new(),
        }
    }

    fn register(_registry: &mut poem_openapi::registry::Registry) {}
}

impl IpSentinelError {
    pub fn other<E: Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Other(Box::new(err))
    }
}

/// Connection failures are reported to clients as a configuration problem
/// rather than a generic server error.
impl From<DbErr> for IpSentinelError {
    fn from(error: DbErr) -> Self {
        match error {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => Self::BackendUnavailable(error),
            error => Self::DatabaseError(error),
        }
    }
}
