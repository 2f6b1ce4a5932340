use application::{BroadcastError, FeedBroadcaster, FeedEvent};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// In-process fan-out over a tokio broadcast channel. Shared by injection:
/// the server holds one handle for publishing and hands out receivers to
/// every WebSocket connection.
#[derive(Clone)]
pub struct LocalFeedBroadcaster {
    sender: broadcast::Sender<FeedEvent>,
}

impl LocalFeedBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl FeedBroadcaster for LocalFeedBroadcaster {
    async fn publish(&self, event: FeedEvent) -> Result<(), BroadcastError> {
        // Nobody listening is not a failure; events are best-effort.
        if self.sender.receiver_count() == 0 {
            return Ok(());
        }
        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|err| BroadcastError::failed(err.to_string()))
    }
}
