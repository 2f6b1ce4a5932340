use domain::{Post, PostAuthor, PostId, PostWithAuthor, Timestamp, User, UserId};
use serde::{Deserialize, Serialize};

/// Creator fields safe to expose alongside a post. Nothing else of the user
/// ever leaves through a post payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorDto {
    pub id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDto {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub creator: CreatorDto,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: Timestamp,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: Timestamp,
}

impl PostDto {
    pub fn from_parts(post: &Post, author_id: UserId, author_name: &str) -> Self {
        Self {
            id: post.id,
            title: post.title.as_str().to_owned(),
            content: post.content.as_str().to_owned(),
            image_url: post.image.as_str().to_owned(),
            creator: CreatorDto {
                id: author_id,
                name: author_name.to_owned(),
            },
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<&PostWithAuthor> for PostDto {
    fn from(value: &PostWithAuthor) -> Self {
        let PostAuthor { id, name } = &value.author;
        Self::from_parts(&value.post, *id, name.as_str())
    }
}

impl From<PostWithAuthor> for PostDto {
    fn from(value: PostWithAuthor) -> Self {
        Self::from(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub status: String,
    pub posts: Vec<PostId>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: Timestamp,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: Timestamp,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_owned(),
            name: user.name.as_str().to_owned(),
            status: user.status.clone(),
            posts: user.posts.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// One page of the feed plus the total item count for pagination math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPage {
    pub posts: Vec<PostDto>,
    pub total_items: u64,
}
