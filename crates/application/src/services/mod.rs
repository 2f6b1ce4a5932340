mod auth_service;
mod feed_service;

pub use auth_service::{AuthService, AuthServiceDependencies, LoginRequest, SignupRequest};
pub use feed_service::{
    CreatePostRequest, DeletePostRequest, FeedService, FeedServiceDependencies, UpdatePostRequest,
};

#[cfg(test)]
mod fakes;
