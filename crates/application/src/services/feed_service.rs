use std::sync::Arc;

use domain::{
    DomainError, FieldViolation, ImageRef, Post, PostDraft, PostId, UserId,
};
use uuid::Uuid;

use crate::{
    assets::{AssetStore, ImageInput},
    broadcaster::{FeedBroadcaster, FeedEvent},
    clock::Clock,
    dto::{FeedPage, PostDto, UserDto},
    error::ApplicationError,
    repository::{PostRepository, UserRepository},
};

#[derive(Debug, Clone)]
pub struct CreatePostRequest {
    pub creator_id: Uuid,
    pub title: String,
    pub content: String,
    pub image: ImageInput,
}

#[derive(Debug, Clone)]
pub struct UpdatePostRequest {
    pub caller_id: Uuid,
    pub post_id: Uuid,
    pub title: String,
    pub content: String,
    pub image: ImageInput,
}

#[derive(Debug, Clone)]
pub struct DeletePostRequest {
    pub caller_id: Uuid,
    pub post_id: Uuid,
}

pub struct FeedServiceDependencies {
    pub post_repository: Arc<dyn PostRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub asset_store: Arc<dyn AssetStore>,
    pub clock: Arc<dyn Clock>,
    pub broadcaster: Arc<dyn FeedBroadcaster>,
    /// Items per feed page.
    pub page_size: u32,
}

pub struct FeedService {
    deps: FeedServiceDependencies,
}

impl FeedService {
    pub fn new(deps: FeedServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create_post(
        &self,
        request: CreatePostRequest,
    ) -> Result<PostDto, ApplicationError> {
        let creator_id = UserId::from(request.creator_id);
        let draft = PostDraft::parse(request.title, request.content)?;
        let image = self.resolve_image(request.image).await?;

        // The token was valid, but the account behind it must still exist.
        let mut creator = self
            .deps
            .user_repository
            .find_by_id(creator_id)
            .await?
            .ok_or(ApplicationError::Authentication)?;

        let now = self.deps.clock.now();
        let post = Post::new(
            PostId::from(Uuid::new_v4()),
            draft,
            image,
            creator_id,
            now,
        );

        // Post first, then the owner's collection. No rollback if the
        // second write fails; the store has no multi-document transactions.
        let stored = self.deps.post_repository.create(post).await?;
        creator.attach_post(stored.id, now);
        let creator = self.deps.user_repository.update(creator).await?;

        let dto = PostDto::from_parts(&stored, creator.id, creator.name.as_str());
        self.publish(FeedEvent::Create { post: dto.clone() }).await;
        Ok(dto)
    }

    /// Newest-first page. Out-of-range pages yield an empty list with the
    /// same total, so clients can do their pagination math either way.
    pub async fn list_posts(&self, page: Option<u32>) -> Result<FeedPage, ApplicationError> {
        let page = page.unwrap_or(1).max(1);
        let per_page = self.deps.page_size.max(1);
        let offset = u64::from(page - 1) * u64::from(per_page);

        let total_items = self.deps.post_repository.count().await?;
        let items = self
            .deps
            .post_repository
            .list_recent(per_page, offset)
            .await?;

        Ok(FeedPage {
            posts: items.into_iter().map(PostDto::from).collect(),
            total_items,
        })
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<PostDto, ApplicationError> {
        let item = self
            .deps
            .post_repository
            .find_with_author(PostId::from(post_id))
            .await?
            .ok_or(DomainError::PostNotFound)?;
        Ok(PostDto::from(item))
    }

    pub async fn update_post(
        &self,
        request: UpdatePostRequest,
    ) -> Result<PostDto, ApplicationError> {
        let caller = UserId::from(request.caller_id);
        let existing = self
            .deps
            .post_repository
            .find_with_author(PostId::from(request.post_id))
            .await?
            .ok_or(DomainError::PostNotFound)?;

        let mut post = existing.post;
        if !post.is_created_by(caller) {
            return Err(DomainError::NotPostCreator.into());
        }

        let draft = PostDraft::parse(request.title, request.content)?;
        let image = self.resolve_image(request.image).await?;

        if image != post.image {
            self.schedule_asset_cleanup(post.image.clone());
        }

        let now = self.deps.clock.now();
        post.apply_edit(draft, image, now);
        let stored = self.deps.post_repository.update(post).await?;

        let dto = PostDto::from_parts(&stored, existing.author.id, existing.author.name.as_str());
        self.publish(FeedEvent::Update { post: dto.clone() }).await;
        Ok(dto)
    }

    pub async fn delete_post(&self, request: DeletePostRequest) -> Result<PostId, ApplicationError> {
        let caller = UserId::from(request.caller_id);
        let post_id = PostId::from(request.post_id);

        let post = self
            .deps
            .post_repository
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::PostNotFound)?;
        if !post.is_created_by(caller) {
            return Err(DomainError::NotPostCreator.into());
        }

        self.schedule_asset_cleanup(post.image.clone());
        self.deps.post_repository.delete(post_id).await?;

        let now = self.deps.clock.now();
        if let Some(mut owner) = self.deps.user_repository.find_by_id(post.creator_id).await? {
            owner.detach_post(post_id, now);
            self.deps.user_repository.update(owner).await?;
        }

        self.publish(FeedEvent::Delete { post_id }).await;
        Ok(post_id)
    }

    pub async fn current_user(&self, caller_id: Uuid) -> Result<UserDto, ApplicationError> {
        let user = self
            .deps
            .user_repository
            .find_by_id(UserId::from(caller_id))
            .await?
            .ok_or(DomainError::UserNotFound)?;
        Ok(UserDto::from(&user))
    }

    pub async fn update_status(
        &self,
        caller_id: Uuid,
        status: String,
    ) -> Result<UserDto, ApplicationError> {
        let mut user = self
            .deps
            .user_repository
            .find_by_id(UserId::from(caller_id))
            .await?
            .ok_or(DomainError::UserNotFound)?;

        user.set_status(status, self.deps.clock.now());
        let stored = self.deps.user_repository.update(user).await?;
        Ok(UserDto::from(&stored))
    }

    /// Turn whatever the transport handed us into a stored reference. Every
    /// mutation must end up with one; there is no post without an image.
    async fn resolve_image(&self, input: ImageInput) -> Result<ImageRef, ApplicationError> {
        match input {
            ImageInput::Upload(upload) => {
                match self.deps.asset_store.store(upload).await? {
                    Some(reference) => Ok(reference),
                    // Unsupported content type: the upload was dropped.
                    None => Err(DomainError::validation(vec![FieldViolation::new(
                        "image",
                        "unsupported image type",
                    )])
                    .into()),
                }
            }
            ImageInput::Reference(raw) => Ok(ImageRef::parse(raw)?),
            ImageInput::Missing => Err(DomainError::validation(vec![FieldViolation::new(
                "image",
                "no image provided",
            )])
            .into()),
        }
    }

    /// Old assets are unlinked off the request path. A failed unlink leaves
    /// an orphan file, never a failed mutation.
    fn schedule_asset_cleanup(&self, reference: ImageRef) {
        let store = Arc::clone(&self.deps.asset_store);
        tokio::spawn(async move {
            if let Err(err) = store.delete(&reference).await {
                tracing::warn!(%reference, error = %err, "asset cleanup failed");
            }
        });
    }

    async fn publish(&self, event: FeedEvent) {
        if let Err(err) = self.deps.broadcaster.publish(event).await {
            tracing::warn!(error = %err, "feed event broadcast failed");
        }
    }
}
