//! Core domain model for the feed service.
//!
//! Entities, validated value objects and the error taxonomy shared by every
//! other layer. Nothing in here touches I/O.

pub mod errors;
pub mod post;
pub mod user;
pub mod value_objects;

pub use errors::{DomainError, FieldViolation, RepositoryError};
pub use post::{Post, PostAuthor, PostDraft, PostWithAuthor};
pub use user::{User, DEFAULT_USER_STATUS};
pub use value_objects::{
    ImageRef, PasswordHash, PostContent, PostId, PostTitle, Timestamp, UserEmail, UserId, Username,
};
