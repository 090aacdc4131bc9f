// Domain error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid setting `{field}`: must be greater than zero, got {value}")]
    InvalidSetting { field: &'static str, value: usize },
}

pub type Result<T> = std::result::Result<T, DomainError>;
