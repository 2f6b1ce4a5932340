use async_trait::async_trait;
use domain::{Post, PostId, PostWithAuthor, RepositoryError, User, UserEmail, UserId};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn update(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: UserEmail) -> Result<Option<User>, RepositoryError>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: Post) -> Result<Post, RepositoryError>;
    async fn update(&self, post: Post) -> Result<Post, RepositoryError>;
    async fn delete(&self, id: PostId) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepositoryError>;
    /// Fetch one post with the creator's public fields populated.
    async fn find_with_author(&self, id: PostId)
        -> Result<Option<PostWithAuthor>, RepositoryError>;
    /// Newest-first page of the feed, creator populated.
    async fn list_recent(
        &self,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostWithAuthor>, RepositoryError>;
    async fn count(&self) -> Result<u64, RepositoryError>;
}
