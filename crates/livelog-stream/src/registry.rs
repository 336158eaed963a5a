use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::handler::StreamHandler;

/// Concurrent mapping from identity key to its live stream handler.
///
/// The entry API is the only write path for creation, so two racing
/// creators can never both install a handler for one key: the loser's
/// candidate is destroyed and the winner is returned to both.
pub struct HandlerRegistry {
    handlers: DashMap<String, Arc<StreamHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    pub fn get(&self, identity: &str) -> Option<Arc<StreamHandler>> {
        self.handlers.get(identity).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Insert-if-absent. The candidate must already be `Ready`; it is
    /// destroyed on a lost race and the previously installed handler wins.
    pub fn insert_or_existing(&self, candidate: Arc<StreamHandler>) -> Arc<StreamHandler> {
        match self.handlers.entry(candidate.identity().to_string()) {
            Entry::Occupied(existing) => {
                let winner = existing.get().clone();
                drop(existing);
                debug!(
                    identity = candidate.identity(),
                    "lost creation race, discarding candidate handler"
                );
                candidate.destroy();
                winner
            }
            Entry::Vacant(slot) => {
                slot.insert(candidate.clone());
                candidate
            }
        }
    }

    /// Remove one handler from the map and destroy it; an already-gone key
    /// is a no-op
    pub fn evict(&self, identity: &str) {
        if let Some((_, handler)) = self.handlers.remove(identity) {
            handler.destroy();
        }
    }

    /// Destroy every handler and empty the map
    pub fn destroy_all(&self) {
        let keys: Vec<String> = self.handlers.iter().map(|entry| entry.key().clone()).collect();
        for key in keys {
            self.evict(&key);
        }
    }

    /// Snapshot iteration for configuration sweeps; handlers destroyed
    /// concurrently are simply visited in their destroyed state
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Arc<StreamHandler>),
    {
        let snapshot: Vec<Arc<StreamHandler>> = self
            .handlers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for handler in &snapshot {
            f(handler);
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
