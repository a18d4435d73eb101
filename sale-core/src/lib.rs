pub mod parameters;

pub use parameters::{ConfigProvider, SALE_CUSTOMIZE_PARAM};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
    #[error("Config parameter {key} unavailable: {reason}")]
    ParameterUnavailable { key: String, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
