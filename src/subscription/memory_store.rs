//! In-memory subscription store for development and tests.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{retain_valid, StoreError, SubscriptionStore};
use super::Subscription;

/// Insertion-ordered in-memory store. Nothing survives a restart.
#[derive(Default)]
pub struct MemorySubscriptionStore {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriptions(subscriptions: Vec<Subscription>) -> Self {
        let mut deduped: Vec<Subscription> = Vec::with_capacity(subscriptions.len());
        for sub in subscriptions {
            upsert_into(&mut deduped, sub);
        }
        Self {
            subscriptions: RwLock::new(deduped),
        }
    }

    /// Add a subscription, replacing any entry with the same endpoint in place.
    pub async fn upsert(&self, subscription: Subscription) {
        upsert_into(&mut *self.subscriptions.write().await, subscription);
    }

    pub async fn contains(&self, endpoint: &str) -> bool {
        self.subscriptions
            .read()
            .await
            .iter()
            .any(|s| s.endpoint == endpoint)
    }

    pub async fn len(&self) -> usize {
        self.subscriptions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.subscriptions.read().await.is_empty()
    }
}

fn upsert_into(subscriptions: &mut Vec<Subscription>, subscription: Subscription) {
    match subscriptions
        .iter_mut()
        .find(|s| s.endpoint == subscription.endpoint)
    {
        Some(existing) => *existing = subscription,
        None => subscriptions.push(subscription),
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list_all(&self) -> Result<Vec<Subscription>, StoreError> {
        let snapshot = self.subscriptions.read().await.clone();
        Ok(retain_valid(self.backend(), snapshot))
    }

    async fn remove(&self, endpoint: &str) -> Result<(), StoreError> {
        self.subscriptions
            .write()
            .await
            .retain(|s| s.endpoint != endpoint);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(endpoint: &str) -> Subscription {
        Subscription::new(endpoint, "p256dh", "auth")
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let store = MemorySubscriptionStore::new();
        store.upsert(sub("https://push.example/b")).await;
        store.upsert(sub("https://push.example/a")).await;
        store.upsert(sub("https://push.example/c")).await;

        let endpoints: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.endpoint)
            .collect();
        assert_eq!(
            endpoints,
            vec!["https://push.example/b", "https://push.example/a", "https://push.example/c"]
        );
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place() {
        let store = MemorySubscriptionStore::with_subscriptions(vec![
            sub("https://push.example/a"),
            sub("https://push.example/b"),
        ]);
        store
            .upsert(Subscription::new("https://push.example/a", "new-key", "new-auth"))
            .await;

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].keys.p256dh, "new-key");
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = MemorySubscriptionStore::with_subscriptions(vec![sub("https://push.example/a")]);

        assert!(store.remove("https://push.example/a").await.is_ok());
        assert!(store.remove("https://push.example/a").await.is_ok());
        assert!(store.remove("https://push.example/never").await.is_ok());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_rows_are_skipped() {
        let store = MemorySubscriptionStore::with_subscriptions(vec![
            sub("https://push.example/a"),
            Subscription::new("https://push.example/broken", "", "auth"),
        ]);

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(store.len().await, 2);
    }
}
