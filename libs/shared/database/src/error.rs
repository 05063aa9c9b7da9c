use thiserror::Error;

/// Storage failures that callers may need to tell apart. Repositories raise these
/// inside `anyhow::Error`; services inspect them with [`DatabaseError::from_anyhow`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Unauthorized(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl DatabaseError {
    pub fn from_anyhow(err: &anyhow::Error) -> Option<&DatabaseError> {
        err.downcast_ref::<DatabaseError>()
    }

    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => DatabaseError::Unauthorized(message),
            404 => DatabaseError::NotFound(message),
            // PostgREST answers 409 for unique and exclusion violations (SQLSTATE 23505 / 23P01)
            409 => DatabaseError::UniqueViolation(message),
            _ => DatabaseError::Api { status, message },
        }
    }
}

pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(DatabaseError::from_anyhow(err), Some(DatabaseError::UniqueViolation(_)))
}
