use async_trait::async_trait;
use domain::PostId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dto::PostDto;

/// Mutation event fanned out to every connected client.
///
/// Wire shape: `{"action": "create" | "update", "post": {…}}` and
/// `{"action": "delete", "postId": "…"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum FeedEvent {
    Create {
        post: PostDto,
    },
    Update {
        post: PostDto,
    },
    Delete {
        #[serde(rename = "postId")]
        post_id: PostId,
    },
}

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
}

impl BroadcastError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Fire-and-forget fan-out. Implementations must be safe to call from any
/// number of concurrent operations and must not block on slow subscribers.
#[async_trait]
pub trait FeedBroadcaster: Send + Sync {
    async fn publish(&self, event: FeedEvent) -> Result<(), BroadcastError>;
}
