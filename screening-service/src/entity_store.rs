//! In-memory watchlist store with atomic generation swap

use crate::types::WatchlistEntity;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info};

/// One published, immutable snapshot of the watchlist
#[derive(Debug, Clone)]
pub struct Generation {
    pub number: u64,
    pub loaded_at: Option<DateTime<Utc>>, // None for the initial empty generation
    pub entities: Vec<WatchlistEntity>,
}

impl Generation {
    fn empty() -> Self {
        Self {
            number: 0,
            loaded_at: None,
            entities: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Readers clone the current `Arc` and never block a replacement in progress
#[derive(Debug)]
pub struct EntityStore {
    current: RwLock<Arc<Generation>>,
    writer: Mutex<()>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Generation::empty())),
            writer: Mutex::new(()),
        }
    }

    /// Publish a new generation. Entities with an empty name are dropped.
    /// Returns the number of entities stored.
    pub fn replace_all(&self, entities: Vec<WatchlistEntity>) -> usize {
        let _writer = self.writer.lock();

        let total = entities.len();
        let entities: Vec<WatchlistEntity> = entities
            .into_iter()
            .filter(|e| !e.name.trim().is_empty())
            .collect();
        let dropped = total - entities.len();
        if dropped > 0 {
            debug!(dropped, "Dropped watchlist rows without a name");
        }

        let number = self.current.read().number + 1;
        let generation = Arc::new(Generation {
            number,
            loaded_at: Some(Utc::now()),
            entities,
        });
        let count = generation.len();

        *self.current.write() = generation;

        info!(generation = number, entities = count, "Watchlist generation published");
        count
    }

    pub fn snapshot(&self) -> Arc<Generation> {
        self.current.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    /// Entities of the current generation accepted by `predicate`
    pub fn search<F>(&self, predicate: F) -> Vec<WatchlistEntity>
    where
        F: Fn(&WatchlistEntity) -> bool,
    {
        self.snapshot()
            .entities
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityType;

    fn entity(name: &str, country: &str) -> WatchlistEntity {
        WatchlistEntity {
            name: name.to_string(),
            program: "SDGT".to_string(),
            entity_type: EntityType::Entity,
            dob: String::new(),
            country: country.to_string(),
            citizenship: String::new(),
            nationality: String::new(),
            remarks: String::new(),
        }
    }

    #[test]
    fn test_starts_empty() {
        let store = EntityStore::new();
        assert!(store.is_empty());
        assert_eq!(store.snapshot().number, 0);
        assert!(store.snapshot().loaded_at.is_none());
    }

    #[test]
    fn test_replace_all_drops_blank_names() {
        let store = EntityStore::new();
        let count = store.replace_all(vec![entity("ACME", "IRAN"), entity("  ", "IRAN")]);
        assert_eq!(count, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_old_snapshot_survives_replacement() {
        let store = EntityStore::new();
        store.replace_all(vec![entity("FIRST", "RUSSIA")]);
        let before = store.snapshot();

        store.replace_all(vec![entity("SECOND", "IRAN"), entity("THIRD", "IRAN")]);

        assert_eq!(before.entities[0].name, "FIRST");
        assert_eq!(before.number, 1);
        assert_eq!(store.snapshot().number, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_search_predicate() {
        let store = EntityStore::new();
        store.replace_all(vec![entity("ACME", "IRAN"), entity("ROSNEFT", "RUSSIA")]);
        let found = store.search(|e| e.country == "RUSSIA");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "ROSNEFT");
    }
}
