//! HTTP layer.
//!
//! Two thin adapters over the application services: a REST-style resource
//! API and a query/mutation RPC API, plus the WebSocket fan-out and static
//! image serving. Neither adapter holds business logic.

mod auth;
mod error;
mod routes;
mod rpc;
mod state;

pub use auth::{AuthState, Claims, JwtService, LoginResponse};
pub use config::JwtConfig;
pub use routes::router;
pub use state::AppState;
