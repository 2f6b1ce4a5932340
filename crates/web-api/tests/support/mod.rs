//! In-memory wiring for router tests: no database, no disk, no sockets.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use tokio::sync::RwLock;
use uuid::Uuid;

use application::{
    is_supported_image, AssetStore, AssetStoreError, AuthService, AuthServiceDependencies, Clock,
    FeedService, FeedServiceDependencies, PasswordHasher, PasswordHasherError, PostRepository,
    UploadedImage, UserRepository,
};
use domain::{
    ImageRef, PasswordHash, Post, PostAuthor, PostId, PostWithAuthor, RepositoryError, Timestamp,
    User, UserEmail, UserId,
};
use infrastructure::LocalFeedBroadcaster;
use web_api::{router, AppState, JwtConfig, JwtService};

#[derive(Default)]
pub struct InMemoryUserRepository {
    data: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = self.data.write().await;
        if guard.values().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(Uuid::from(user.id), user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = self.data.write().await;
        let id = Uuid::from(user.id);
        if !guard.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.data.read().await.get(&Uuid::from(id)).cloned())
    }

    async fn find_by_email(&self, email: UserEmail) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .data
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }
}

pub struct InMemoryPostRepository {
    data: RwLock<Vec<Post>>,
    users: Arc<InMemoryUserRepository>,
}

impl InMemoryPostRepository {
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            data: RwLock::new(Vec::new()),
            users,
        }
    }

    async fn with_author(&self, post: Post) -> Result<PostWithAuthor, RepositoryError> {
        let author = self
            .users
            .find_by_id(post.creator_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(PostWithAuthor {
            author: PostAuthor {
                id: author.id,
                name: author.name,
            },
            post,
        })
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: Post) -> Result<Post, RepositoryError> {
        self.data.write().await.push(post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepositoryError> {
        let mut guard = self.data.write().await;
        let slot = guard
            .iter_mut()
            .find(|candidate| candidate.id == post.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = post.clone();
        Ok(post)
    }

    async fn delete(&self, id: PostId) -> Result<(), RepositoryError> {
        let mut guard = self.data.write().await;
        let before = guard.len();
        guard.retain(|post| post.id != id);
        if guard.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        Ok(self
            .data
            .read()
            .await
            .iter()
            .find(|post| post.id == id)
            .cloned())
    }

    async fn find_with_author(
        &self,
        id: PostId,
    ) -> Result<Option<PostWithAuthor>, RepositoryError> {
        match self.find_by_id(id).await? {
            Some(post) => Ok(Some(self.with_author(post).await?)),
            None => Ok(None),
        }
    }

    async fn list_recent(
        &self,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostWithAuthor>, RepositoryError> {
        let mut posts = self.data.read().await.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut items = Vec::new();
        for post in posts.into_iter().skip(offset as usize).take(limit as usize) {
            items.push(self.with_author(post).await?);
        }
        Ok(items)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.data.read().await.len() as u64)
    }
}

/// Records stores and deletes without touching a filesystem.
#[derive(Default)]
pub struct MemoryAssetStore {
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn store(&self, upload: UploadedImage) -> Result<Option<ImageRef>, AssetStoreError> {
        if !is_supported_image(&upload.content_type) {
            return Ok(None);
        }
        let reference = ImageRef::parse(format!("images/{}.png", Uuid::new_v4()))
            .map_err(|err| AssetStoreError::io(err.to_string()))?;
        Ok(Some(reference))
    }

    async fn delete(&self, reference: &ImageRef) -> Result<(), AssetStoreError> {
        self.deleted
            .lock()
            .unwrap()
            .push(reference.as_str().to_owned());
        Ok(())
    }
}

/// Advances one second per reading, so consecutive writes always get
/// strictly increasing timestamps.
#[derive(Default)]
pub struct TickingClock {
    seconds: std::sync::atomic::AtomicI64,
}

impl Clock for TickingClock {
    fn now(&self) -> Timestamp {
        let elapsed = self
            .seconds
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        time::OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(elapsed)
    }
}

/// Fast stand-in for bcrypt so router tests stay quick.
pub struct PlainHasher;

#[async_trait]
impl PasswordHasher for PlainHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("hashed::{plaintext}"))
            .map_err(|err| PasswordHasherError::hash_error(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hashed.as_str() == format!("hashed::{plaintext}"))
    }
}

pub struct TestApp {
    pub router: Router,
    pub broadcaster: Arc<LocalFeedBroadcaster>,
}

pub fn build_app() -> TestApp {
    let users = Arc::new(InMemoryUserRepository::default());
    let posts = Arc::new(InMemoryPostRepository::new(Arc::clone(&users)));
    let assets = Arc::new(MemoryAssetStore::default());
    let clock = Arc::new(TickingClock::default());
    let broadcaster = Arc::new(LocalFeedBroadcaster::new(64));

    let auth_service = AuthService::new(AuthServiceDependencies {
        user_repository: users.clone(),
        password_hasher: Arc::new(PlainHasher),
        clock: clock.clone(),
        min_password_len: 5,
    });

    let feed_service = FeedService::new(FeedServiceDependencies {
        post_repository: posts,
        user_repository: users,
        asset_store: assets,
        clock,
        broadcaster: broadcaster.clone(),
        page_size: 2,
    });

    let jwt_service = Arc::new(JwtService::new(&JwtConfig {
        secret: "router-test-secret".to_owned(),
        expiration_secs: 3600,
    }));

    let state = AppState {
        auth_service: Arc::new(auth_service),
        feed_service: Arc::new(feed_service),
        jwt_service,
        broadcaster: broadcaster.clone(),
        assets_dir: std::env::temp_dir().join("feedline-router-tests"),
    };

    TestApp {
        router: router(state),
        broadcaster,
    }
}

pub const BOUNDARY: &str = "----feedline-test-boundary";

/// Hand-rolled multipart encoder; three fields is not worth a crate.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        (
            format!("multipart/form-data; boundary={BOUNDARY}"),
            self.body,
        )
    }
}
