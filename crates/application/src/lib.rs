//! Use-case layer.
//!
//! Orchestrates the domain model behind port traits for persistence,
//! password hashing, asset storage and event broadcast. Transport adapters
//! call into the services here and never into the domain directly.

pub mod assets;
pub mod broadcaster;
pub mod clock;
pub mod dto;
pub mod error;
pub mod password;
pub mod repository;
pub mod services;

pub use assets::{
    is_supported_image, AssetStore, AssetStoreError, ImageInput, UploadedImage,
    SUPPORTED_IMAGE_TYPES,
};
pub use broadcaster::{BroadcastError, FeedBroadcaster, FeedEvent};
pub use clock::{Clock, SystemClock};
pub use dto::{CreatorDto, FeedPage, PostDto, UserDto};
pub use error::ApplicationError;
pub use password::{PasswordHasher, PasswordHasherError};
pub use repository::{PostRepository, UserRepository};
pub use services::{
    AuthService, AuthServiceDependencies, CreatePostRequest, DeletePostRequest, FeedService,
    FeedServiceDependencies, LoginRequest, SignupRequest, UpdatePostRequest,
};
