use mushroom_core::error::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate device: {0}")]
    ConstraintViolation(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::ConstraintViolation(db_err.message().to_owned())
            }
            _ => StoreError::StorageUnavailable(err),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed connecting database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Failed migrating database: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Failed binding server: {0}")]
    Bind(#[from] warp::Error),
}

/// Request input warp cannot reject on its own, rendered as 400 or 415
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Malformed body: {0}")]
    MalformedBody(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Undecodable path parameter: {0}")]
    InvalidParameter(String),
}

impl warp::reject::Reject for RequestError {}
