//! Change notifications per collection.

use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

use super::DocPath;

/// What happened to a document in a watched collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionChange {
    Written(String),
    Deleted(String),
}

/// Fans out collection changes to every subscriber of that collection.
pub struct ChangeHub {
    channels: RwLock<HashMap<DocPath, broadcast::Sender<CollectionChange>>>,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribes to changes in `collection`.
    pub async fn subscribe(&self, collection: &DocPath) -> broadcast::Receiver<CollectionChange> {
        let mut channels = self.channels.write().await;

        if let Some(sender) = channels.get(collection) {
            sender.subscribe()
        } else {
            let (sender, receiver) = broadcast::channel(16);
            channels.insert(collection.clone(), sender);
            receiver
        }
    }

    /// Notifies subscribers of the collection that owns `document`.
    pub async fn notify(&self, document: &DocPath, change: CollectionChange) {
        let Some(collection) = document.parent() else {
            return;
        };

        let mut channels = self.channels.write().await;

        let Some(sender) = channels.get(&collection) else {
            return;
        };
        if sender.send(change).is_err() {
            // Every receiver is gone
            channels.remove(&collection);
        }
    }

    #[cfg(test)]
    async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_and_notify() {
        let hub = ChangeHub::new();
        let meals = DocPath::meals("u1").unwrap();

        let mut rx = hub.subscribe(&meals).await;
        hub.notify(
            &DocPath::meal("u1", "m1").unwrap(),
            CollectionChange::Written("m1".to_string()),
        )
        .await;

        assert_eq!(
            rx.try_recv().unwrap(),
            CollectionChange::Written("m1".to_string())
        );
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let hub = ChangeHub::new();
        let mut rx1 = hub.subscribe(&DocPath::meals("u1").unwrap()).await;
        let mut rx2 = hub.subscribe(&DocPath::meals("u2").unwrap()).await;

        hub.notify(
            &DocPath::meal("u1", "m1").unwrap(),
            CollectionChange::Deleted("m1".to_string()),
        )
        .await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notify_drops_channels_without_receivers() {
        let hub = ChangeHub::new();
        let meals = DocPath::meals("u1").unwrap();
        let meal = DocPath::meal("u1", "m1").unwrap();

        let rx = hub.subscribe(&meals).await;
        let _other = hub.subscribe(&DocPath::meals("u2").unwrap()).await;
        drop(rx);
        hub.notify(&meal, CollectionChange::Written("m1".to_string()))
            .await;
        assert_eq!(hub.channel_count().await, 1);

        let mut rx = hub.subscribe(&meals).await;
        hub.notify(&meal, CollectionChange::Deleted("m1".to_string()))
            .await;
        assert_eq!(
            rx.try_recv().unwrap(),
            CollectionChange::Deleted("m1".to_string())
        );
    }
}
