//! Watchlist loading and self-healing refresh

use crate::{
    entity_store::EntityStore, feed::EntityFeed, normalize::normalize_table, Result,
    ScreeningError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Fills the entity store from an ordered list of feeds
pub struct WatchlistLoader {
    store: Arc<EntityStore>,
    feeds: Vec<Arc<dyn EntityFeed>>,
    refresh_timeout: Duration,
    refresh_lock: Mutex<()>,
}

impl std::fmt::Debug for WatchlistLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let feeds: Vec<&str> = self.feeds.iter().map(|feed| feed.name()).collect();
        f.debug_struct("WatchlistLoader")
            .field("feeds", &feeds)
            .field("refresh_timeout", &self.refresh_timeout)
            .field("entities", &self.store.len())
            .finish()
    }
}

impl WatchlistLoader {
    pub fn new(
        store: Arc<EntityStore>,
        feeds: Vec<Arc<dyn EntityFeed>>,
        refresh_timeout: Duration,
    ) -> Self {
        Self {
            store,
            feeds,
            refresh_timeout,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// Try each feed in order and publish the first non-empty result.
    /// Returns the number of entities stored.
    pub async fn refresh(&self) -> Result<usize> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<usize> {
        for feed in &self.feeds {
            let table = match feed.fetch().await {
                Ok(table) => table,
                Err(e) => {
                    warn!(feed = feed.name(), error = %e, "Watchlist feed failed");
                    continue;
                }
            };

            let entities = normalize_table(&table);
            if entities.iter().all(|e| e.name.is_empty()) {
                warn!(feed = feed.name(), rows = table.rows.len(), "Watchlist feed yielded no entities");
                continue;
            }

            let count = self.store.replace_all(entities);
            info!(feed = feed.name(), entities = count, "Watchlist refreshed");
            return Ok(count);
        }

        Err(ScreeningError::DataUnavailable(format!(
            "all {} watchlist feed(s) failed or were empty",
            self.feeds.len()
        )))
    }

    /// Self-heal: if the store is empty, run one refresh bounded by the
    /// configured timeout. The deadline also covers waiting behind a refresh
    /// already in flight. A timed-out refresh leaves the store untouched.
    pub async fn ensure(&self) -> Result<()> {
        if !self.store.is_empty() {
            return Ok(());
        }

        let heal = async {
            let _guard = self.refresh_lock.lock().await;
            // Another caller may have filled the store while we waited
            if !self.store.is_empty() {
                return Ok(());
            }

            warn!("Watchlist empty, attempting self-heal refresh");
            self.refresh_locked().await.map(|_| ())
        };

        match tokio::time::timeout(self.refresh_timeout, heal).await {
            Ok(result) => result,
            Err(_) => Err(ScreeningError::DataUnavailable(format!(
                "watchlist refresh timed out after {:?}",
                self.refresh_timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::BuiltinSampleFeed;
    use crate::types::RawTable;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingFeed;

    #[async_trait]
    impl EntityFeed for FailingFeed {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch(&self) -> Result<RawTable> {
            Err(ScreeningError::Feed("offline".to_string()))
        }
    }

    struct SlowFeed;

    #[async_trait]
    impl EntityFeed for SlowFeed {
        fn name(&self) -> &str {
            "slow"
        }

        async fn fetch(&self) -> Result<RawTable> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            BuiltinSampleFeed.fetch().await
        }
    }

    struct CountingFeed(AtomicUsize);

    #[async_trait]
    impl EntityFeed for CountingFeed {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch(&self) -> Result<RawTable> {
            self.0.fetch_add(1, Ordering::SeqCst);
            BuiltinSampleFeed.fetch().await
        }
    }

    fn loader(feeds: Vec<Arc<dyn EntityFeed>>, timeout: Duration) -> WatchlistLoader {
        WatchlistLoader::new(Arc::new(EntityStore::new()), feeds, timeout)
    }

    #[tokio::test]
    async fn test_falls_through_to_next_feed() {
        let loader = loader(
            vec![Arc::new(FailingFeed), Arc::new(BuiltinSampleFeed)],
            Duration::from_secs(5),
        );
        assert_eq!(loader.refresh().await.unwrap(), 5);
        assert_eq!(loader.store().len(), 5);
    }

    #[tokio::test]
    async fn test_all_feeds_failing_is_data_unavailable() {
        let loader = loader(vec![Arc::new(FailingFeed)], Duration::from_secs(5));
        assert!(matches!(
            loader.ensure().await,
            Err(ScreeningError::DataUnavailable(_))
        ));
        assert!(loader.store().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_skips_refresh_when_loaded() {
        let counting = Arc::new(CountingFeed(AtomicUsize::new(0)));
        let feeds: Vec<Arc<dyn EntityFeed>> = vec![counting.clone()];
        let loader = loader(feeds, Duration::from_secs(5));

        loader.ensure().await.unwrap();
        loader.ensure().await.unwrap();

        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ensure_times_out() {
        let loader = loader(vec![Arc::new(SlowFeed)], Duration::from_millis(50));
        assert!(matches!(
            loader.ensure().await,
            Err(ScreeningError::DataUnavailable(_))
        ));
        assert!(loader.store().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_bounded_while_refresh_in_flight() {
        let feeds: Vec<Arc<dyn EntityFeed>> = vec![Arc::new(SlowFeed)];
        let loader = Arc::new(loader(feeds, Duration::from_millis(100)));

        let background = loader.clone();
        let refresh = tokio::spawn(async move { background.refresh().await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let started = std::time::Instant::now();
        let result = loader.ensure().await;

        assert!(matches!(result, Err(ScreeningError::DataUnavailable(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(loader.store().is_empty());
        refresh.abort();
    }
}
