use std::path::PathBuf;
use std::sync::Arc;

use application::{AuthService, FeedService};
use infrastructure::LocalFeedBroadcaster;

use crate::auth::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub feed_service: Arc<FeedService>,
    pub jwt_service: Arc<JwtService>,
    /// Publish handle is injected into the feed service; this handle exists
    /// so WebSocket connections can subscribe.
    pub broadcaster: Arc<LocalFeedBroadcaster>,
    /// Directory served under `/images`.
    pub assets_dir: PathBuf,
}
