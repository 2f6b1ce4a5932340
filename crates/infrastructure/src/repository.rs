use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use application::{PostRepository, UserRepository};
use domain::{
    ImageRef, PasswordHash, Post, PostAuthor, PostContent, PostId, PostTitle, PostWithAuthor,
    RepositoryError, User, UserEmail, UserId, Username,
};

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    status: String,
    post_ids: Vec<Uuid>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let email =
            UserEmail::parse(value.email).map_err(|err| invalid_data(err.to_string()))?;
        let name = Username::parse(value.name).map_err(|err| invalid_data(err.to_string()))?;
        let password = PasswordHash::new(value.password_hash)
            .map_err(|err| invalid_data(err.to_string()))?;

        Ok(User {
            id: UserId::from(value.id),
            email,
            name,
            password,
            status: value.status,
            posts: value.post_ids.into_iter().map(PostId::from).collect(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PostRecord {
    id: Uuid,
    title: String,
    content: String,
    image_url: String,
    creator_id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<PostRecord> for Post {
    type Error = RepositoryError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Post {
            id: PostId::from(value.id),
            title: PostTitle::parse(value.title).map_err(|err| invalid_data(err.to_string()))?,
            content: PostContent::parse(value.content)
                .map_err(|err| invalid_data(err.to_string()))?,
            image: ImageRef::parse(value.image_url)
                .map_err(|err| invalid_data(err.to_string()))?,
            creator_id: UserId::from(value.creator_id),
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// Post row joined with the creator's public fields.
#[derive(Debug, FromRow)]
struct AuthoredPostRecord {
    id: Uuid,
    title: String,
    content: String,
    image_url: String,
    creator_id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    author_name: String,
}

impl TryFrom<AuthoredPostRecord> for PostWithAuthor {
    type Error = RepositoryError;

    fn try_from(value: AuthoredPostRecord) -> Result<Self, Self::Error> {
        let author = PostAuthor {
            id: UserId::from(value.creator_id),
            name: Username::parse(value.author_name)
                .map_err(|err| invalid_data(err.to_string()))?,
        };
        let post = Post::try_from(PostRecord {
            id: value.id,
            title: value.title,
            content: value.content,
            image_url: value.image_url,
            creator_id: value.creator_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })?;
        Ok(PostWithAuthor { post, author })
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, email, name, password_hash, status, post_ids, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, email, name, password_hash, status, post_ids, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(user.email.as_str())
        .bind(user.name.as_str())
        .bind(user.password.as_str())
        .bind(&user.status)
        .bind(user.posts.iter().map(|id| Uuid::from(*id)).collect::<Vec<_>>())
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict
            }
            _ => map_sqlx_err(err),
        })?;

        User::try_from(record)
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET email = $2, name = $3, password_hash = $4, status = $5, post_ids = $6, updated_at = $7
            WHERE id = $1
            RETURNING id, email, name, password_hash, status, post_ids, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(user.email.as_str())
        .bind(user.name.as_str())
        .bind(user.password.as_str())
        .bind(&user.status)
        .bind(user.posts.iter().map(|id| Uuid::from(*id)).collect::<Vec<_>>())
        .bind(user.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(record)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, name, password_hash, status, post_ids, created_at, updated_at
            FROM users WHERE id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: UserEmail) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, name, password_hash, status, post_ids, created_at, updated_at
            FROM users WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }
}

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const AUTHORED_POST_COLUMNS: &str = r#"
    p.id, p.title, p.content, p.image_url, p.creator_id, p.created_at, p.updated_at,
    u.name AS author_name
"#;

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, post: Post) -> Result<Post, RepositoryError> {
        let record = sqlx::query_as::<_, PostRecord>(
            r#"
            INSERT INTO posts (id, title, content, image_url, creator_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, content, image_url, creator_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(post.id))
        .bind(post.title.as_str())
        .bind(post.content.as_str())
        .bind(post.image.as_str())
        .bind(Uuid::from(post.creator_id))
        .bind(post.created_at)
        .bind(post.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Post::try_from(record)
    }

    async fn update(&self, post: Post) -> Result<Post, RepositoryError> {
        let record = sqlx::query_as::<_, PostRecord>(
            r#"
            UPDATE posts
            SET title = $2, content = $3, image_url = $4, updated_at = $5
            WHERE id = $1
            RETURNING id, title, content, image_url, creator_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(post.id))
        .bind(post.title.as_str())
        .bind(post.content.as_str())
        .bind(post.image.as_str())
        .bind(post.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or(RepositoryError::NotFound)?;

        Post::try_from(record)
    }

    async fn delete(&self, id: PostId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let record = sqlx::query_as::<_, PostRecord>(
            r#"
            SELECT id, title, content, image_url, creator_id, created_at, updated_at
            FROM posts WHERE id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Post::try_from).transpose()
    }

    async fn find_with_author(
        &self,
        id: PostId,
    ) -> Result<Option<PostWithAuthor>, RepositoryError> {
        let query = format!(
            "SELECT {AUTHORED_POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.creator_id WHERE p.id = $1"
        );
        let record = sqlx::query_as::<_, AuthoredPostRecord>(&query)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        record.map(PostWithAuthor::try_from).transpose()
    }

    async fn list_recent(
        &self,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostWithAuthor>, RepositoryError> {
        let query = format!(
            "SELECT {AUTHORED_POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.creator_id \
             ORDER BY p.created_at DESC LIMIT $1 OFFSET $2"
        );
        let records = sqlx::query_as::<_, AuthoredPostRecord>(&query)
            .bind(i64::from(limit))
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        records.into_iter().map(PostWithAuthor::try_from).collect()
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(count as u64)
    }
}
