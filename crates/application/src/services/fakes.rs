//! In-memory ports shared by the service tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use domain::{
    ImageRef, PasswordHash, Post, PostAuthor, PostId, PostWithAuthor, RepositoryError, Timestamp,
    User, UserEmail, UserId, Username,
};
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    assets::{is_supported_image, AssetStore, AssetStoreError, UploadedImage},
    broadcaster::{BroadcastError, FeedBroadcaster, FeedEvent},
    clock::Clock,
    password::{PasswordHasher, PasswordHasherError},
    repository::{PostRepository, UserRepository},
    services::{AuthService, AuthServiceDependencies, FeedService, FeedServiceDependencies},
};

#[derive(Default)]
pub struct InMemoryUserRepository {
    data: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub async fn get(&self, id: UserId) -> Option<User> {
        self.data.read().await.get(&Uuid::from(id)).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = self.data.write().await;
        if guard
            .values()
            .any(|existing| existing.email == user.email)
        {
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
            .get(post.creator_id)
            .await
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
        let page: Vec<Post> = posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        let mut items = Vec::with_capacity(page.len());
        for post in page {
            items.push(self.with_author(post).await?);
        }
        Ok(items)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.data.read().await.len() as u64)
    }
}

#[derive(Default)]
pub struct RecordingBroadcaster {
    events: Mutex<Vec<FeedEvent>>,
}

impl RecordingBroadcaster {
    pub fn recorded(&self) -> Vec<FeedEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedBroadcaster for RecordingBroadcaster {
    async fn publish(&self, event: FeedEvent) -> Result<(), BroadcastError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAssetStore {
    stored: Mutex<Vec<ImageRef>>,
    deleted: Mutex<Vec<ImageRef>>,
}

impl FakeAssetStore {
    pub fn deleted(&self) -> Vec<ImageRef> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn stored(&self) -> Vec<ImageRef> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetStore for FakeAssetStore {
    async fn store(&self, upload: UploadedImage) -> Result<Option<ImageRef>, AssetStoreError> {
        if !is_supported_image(&upload.content_type) {
            return Ok(None);
        }
        let reference = ImageRef::parse(format!("images/{}.png", Uuid::new_v4()))
            .map_err(|err| AssetStoreError::io(err.to_string()))?;
        self.stored.lock().unwrap().push(reference.clone());
        Ok(Some(reference))
    }

    async fn delete(&self, reference: &ImageRef) -> Result<(), AssetStoreError> {
        self.deleted.lock().unwrap().push(reference.clone());
        Ok(())
    }
}

pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(OffsetDateTime::UNIX_EPOCH),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap();
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap()
    }
}

/// Reversible stand-in for bcrypt; good enough to prove the plaintext is
/// never what gets stored.
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

pub struct TestBackend {
    pub users: Arc<InMemoryUserRepository>,
    pub posts: Arc<InMemoryPostRepository>,
    pub assets: Arc<FakeAssetStore>,
    pub clock: Arc<ManualClock>,
    pub broadcaster: Arc<RecordingBroadcaster>,
}

impl TestBackend {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::default());
        Self {
            posts: Arc::new(InMemoryPostRepository::new(Arc::clone(&users))),
            users,
            assets: Arc::new(FakeAssetStore::default()),
            clock: Arc::new(ManualClock::default()),
            broadcaster: Arc::new(RecordingBroadcaster::default()),
        }
    }

    pub fn feed_service(&self, page_size: u32) -> FeedService {
        FeedService::new(FeedServiceDependencies {
            post_repository: Arc::clone(&self.posts) as Arc<dyn PostRepository>,
            user_repository: Arc::clone(&self.users) as Arc<dyn UserRepository>,
            asset_store: Arc::clone(&self.assets) as Arc<dyn AssetStore>,
            clock: Arc::clone(&self.clock) as Arc<dyn Clock>,
            broadcaster: Arc::clone(&self.broadcaster) as Arc<dyn FeedBroadcaster>,
            page_size,
        })
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(AuthServiceDependencies {
            user_repository: Arc::clone(&self.users) as Arc<dyn UserRepository>,
            password_hasher: Arc::new(PlainHasher),
            clock: Arc::clone(&self.clock) as Arc<dyn Clock>,
            min_password_len: 5,
        })
    }

    pub async fn seed_user(&self, name: &str, email: &str) -> User {
        let user = User::register(
            UserId::from(Uuid::new_v4()),
            UserEmail::parse(email).unwrap(),
            Username::parse(name).unwrap(),
            PasswordHash::new("hashed::secret").unwrap(),
            self.clock.now(),
        );
        self.users.create(user.clone()).await.unwrap();
        user
    }
}
