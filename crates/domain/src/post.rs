use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, FieldViolation};
use crate::value_objects::{ImageRef, PostContent, PostId, PostTitle, Timestamp, UserId, Username};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: PostTitle,
    pub content: PostContent,
    pub image: ImageRef,
    /// Set at creation, immutable afterwards.
    pub creator_id: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Post {
    pub fn new(
        id: PostId,
        draft: PostDraft,
        image: ImageRef,
        creator_id: UserId,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            image,
            creator_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the editable fields. `created_at` and `creator_id` are fixed.
    pub fn apply_edit(&mut self, draft: PostDraft, image: ImageRef, now: Timestamp) {
        self.title = draft.title;
        self.content = draft.content;
        self.image = image;
        self.updated_at = now;
    }

    pub fn is_created_by(&self, user_id: UserId) -> bool {
        self.creator_id == user_id
    }
}

/// Title and content that already passed validation, ready to become a post.
///
/// Parsing collects every violation instead of stopping at the first so the
/// caller gets the full per-field list in one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: PostTitle,
    pub content: PostContent,
}

impl PostDraft {
    pub fn parse(title: impl Into<String>, content: impl Into<String>) -> Result<Self, DomainError> {
        let mut violations: Vec<FieldViolation> = Vec::new();

        let title = PostTitle::parse(title)
            .map_err(|err| violations.extend(err.violations()))
            .ok();
        let content = PostContent::parse(content)
            .map_err(|err| violations.extend(err.violations()))
            .ok();

        match (title, content) {
            (Some(title), Some(content)) => Ok(Self { title, content }),
            _ => Err(DomainError::validation(violations)),
        }
    }
}

/// Public creator fields attached to a post when it leaves the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAuthor {
    pub id: UserId,
    pub name: Username,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: PostAuthor,
}
