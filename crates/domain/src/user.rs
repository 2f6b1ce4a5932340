use serde::{Deserialize, Serialize};

use crate::value_objects::{PasswordHash, PostId, Timestamp, UserEmail, UserId, Username};

/// Status text assigned to freshly registered accounts.
pub const DEFAULT_USER_STATUS: &str = "I am new!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: UserEmail,
    pub name: Username,
    #[serde(skip_serializing)]
    pub password: PasswordHash,
    pub status: String,
    /// Owned-post references, newest appended last. Kept in sync with the
    /// post store by the orchestrator, not by the database.
    pub posts: Vec<PostId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn register(
        id: UserId,
        email: UserEmail,
        name: Username,
        password: PasswordHash,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            email,
            name,
            password,
            status: DEFAULT_USER_STATUS.to_owned(),
            posts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_status(&mut self, status: String, now: Timestamp) {
        self.status = status;
        self.updated_at = now;
    }

    pub fn attach_post(&mut self, post_id: PostId, now: Timestamp) {
        if !self.posts.contains(&post_id) {
            self.posts.push(post_id);
        }
        self.updated_at = now;
    }

    pub fn detach_post(&mut self, post_id: PostId, now: Timestamp) {
        self.posts.retain(|id| *id != post_id);
        self.updated_at = now;
    }
}
