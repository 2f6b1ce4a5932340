//! Adapters behind the application-layer ports: Postgres persistence,
//! bcrypt hashing, local-disk asset storage and in-process broadcast.

pub mod assets;
pub mod broadcast;
pub mod db;
pub mod password;
pub mod repository;

pub use assets::LocalAssetStore;
pub use broadcast::LocalFeedBroadcaster;
pub use db::create_pg_pool;
pub use password::BcryptPasswordHasher;
pub use repository::{PgPostRepository, PgUserRepository};
