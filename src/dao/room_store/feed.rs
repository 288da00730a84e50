use tokio::sync::broadcast;
use tokio_stream::{
    Stream, StreamExt,
    wrappers::{BroadcastStream, errors::BroadcastStreamRecvError},
};

use crate::dao::path::StorePath;

/// Change notifications fanned out to every subscriber of a store.
#[derive(Debug)]
pub struct ChangeFeed {
    sender: broadcast::Sender<StorePath>,
}

impl ChangeFeed {
    /// Create a feed buffering up to `capacity` changes per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _rx) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Announce that the node at `path` (and everything below it) changed.
    pub fn publish(&self, path: StorePath) {
        // No receivers is fine: nobody is watching yet.
        let _ = self.sender.send(path);
    }

    /// Watch every change overlapping `path`.
    pub fn subscribe(&self, path: StorePath) -> StoreSubscription {
        StoreSubscription {
            path,
            receiver: self.sender.subscribe(),
        }
    }
}

/// What a subscriber learns about the watched subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionEvent {
    /// The node at this path changed.
    Changed(StorePath),
    /// Notifications were dropped; re-read everything watched.
    Lagged,
}

/// Receiver side of a [`ChangeFeed`] filtered to one subtree.
#[derive(Debug)]
pub struct StoreSubscription {
    path: StorePath,
    receiver: broadcast::Receiver<StorePath>,
}

impl StoreSubscription {
    /// Relevant changes as a stream that ends once the store is gone.
    pub fn into_stream(self) -> impl Stream<Item = SubscriptionEvent> + Send + 'static {
        let path = self.path;
        BroadcastStream::new(self.receiver).filter_map(move |item| match item {
            Ok(changed) if changed.overlaps(&path) => Some(SubscriptionEvent::Changed(changed)),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(_)) => Some(SubscriptionEvent::Lagged),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::pin::pin;

    use super::*;

    #[tokio::test]
    async fn subscription_skips_unrelated_paths() {
        let feed = ChangeFeed::new(8);
        let mut sub = pin!(feed.subscribe(StorePath::chat_list("r1")).into_stream());

        feed.publish(StorePath::user_list("r1"));
        feed.publish(StorePath::chat_list("r2"));
        feed.publish(StorePath::chat_list("r1").index(3));

        assert_eq!(
            sub.next().await,
            Some(SubscriptionEvent::Changed(StorePath::chat_list("r1").index(3)))
        );
    }

    #[tokio::test]
    async fn overflow_reports_lag() {
        let feed = ChangeFeed::new(1);
        let mut sub = pin!(feed.subscribe(StorePath::room("r1")).into_stream());

        feed.publish(StorePath::chat_list("r1"));
        feed.publish(StorePath::user_list("r1"));

        assert_eq!(sub.next().await, Some(SubscriptionEvent::Lagged));
    }
}
