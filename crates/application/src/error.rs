use domain::{DomainError, RepositoryError};
use thiserror::Error;

use crate::assets::AssetStoreError;
use crate::password::PasswordHasherError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("password error: {0}")]
    Password(#[from] PasswordHasherError),
    #[error("asset error: {0}")]
    Asset(#[from] AssetStoreError),
    #[error("authentication failed")]
    Authentication,
}
