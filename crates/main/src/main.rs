//! Process entry point: configuration, database, dependency wiring, serve.

use std::sync::Arc;

use application::{
    AuthService, AuthServiceDependencies, FeedService, FeedServiceDependencies, SystemClock,
};
use infrastructure::{
    create_pg_pool, BcryptPasswordHasher, LocalAssetStore, LocalFeedBroadcaster, PgPostRepository,
    PgUserRepository,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = config::AppConfig::from_env_with_defaults();

    let redacted = config.database.url.split('@').next_back().unwrap_or("unknown");
    tracing::info!(database = %redacted, "connecting to database");
    let pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let user_repository = Arc::new(PgUserRepository::new(pool.clone()));
    let post_repository = Arc::new(PgPostRepository::new(pool));
    let asset_store = Arc::new(LocalAssetStore::new(&config.assets.dir));
    let password_hasher = Arc::new(BcryptPasswordHasher::new(config.auth.bcrypt_cost));
    let clock = Arc::new(SystemClock);
    let broadcaster = Arc::new(LocalFeedBroadcaster::new(config.broadcast.capacity));

    let auth_service = AuthService::new(AuthServiceDependencies {
        user_repository: user_repository.clone(),
        password_hasher,
        clock: clock.clone(),
        min_password_len: config.auth.min_password_len,
    });

    let feed_service = FeedService::new(FeedServiceDependencies {
        post_repository,
        user_repository,
        asset_store,
        clock,
        broadcaster: broadcaster.clone(),
        page_size: config.feed.page_size,
    });

    let jwt_service = Arc::new(JwtService::new(&config.jwt));

    let state = AppState {
        auth_service: Arc::new(auth_service),
        feed_service: Arc::new(feed_service),
        jwt_service,
        broadcaster,
        assets_dir: config.assets.dir.clone().into(),
    };

    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "feedline listening");
    axum::serve(listener, app).await?;

    Ok(())
}
