//! In-memory storage implementations.
//!
//! Nothing survives the process. Used as the zero-setup desktop default and
//! throughout the test suites.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    http::HttpResponse,
    storage::{CacheStorage, SettingsStore},
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

type Generation = HashMap<String, HttpResponse>;

/// [`CacheStorage`] backed by a map of generations.
///
/// Generations are listed in creation order.
#[derive(Default)]
pub struct InMemoryCacheStorage {
    generations: RwLock<Vec<(String, Generation)>>,
}

impl InMemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held by `generation`, or `None` if it does not exist.
    pub fn entry_count(&self, generation: &str) -> Option<usize> {
        self.generations
            .read()
            .iter()
            .find(|(name, _)| name == generation)
            .map(|(_, entries)| entries.len())
    }
}

#[async_trait]
impl CacheStorage for InMemoryCacheStorage {
    async fn generations(&self) -> Result<Vec<String>> {
        Ok(self
            .generations
            .read()
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn open(&self, generation: &str) -> Result<()> {
        let mut generations = self.generations.write();
        if !generations.iter().any(|(name, _)| name == generation) {
            generations.push((generation.to_string(), HashMap::new()));
        }
        Ok(())
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool> {
        let mut generations = self.generations.write();
        let before = generations.len();
        generations.retain(|(name, _)| name != generation);
        Ok(generations.len() != before)
    }

    async fn lookup(&self, generation: &str, key: &str) -> Result<Option<HttpResponse>> {
        Ok(self
            .generations
            .read()
            .iter()
            .find(|(name, _)| name == generation)
            .and_then(|(_, entries)| entries.get(key).cloned()))
    }

    async fn store(&self, generation: &str, key: &str, response: HttpResponse) -> Result<()> {
        let mut generations = self.generations.write();
        match generations.iter_mut().find(|(name, _)| name == generation) {
            Some((_, entries)) => {
                entries.insert(key.to_string(), response);
            }
            None => {
                let mut entries = HashMap::new();
                entries.insert(key.to_string(), response);
                generations.push((generation.to_string(), entries));
            }
        }
        Ok(())
    }
}

/// [`SettingsStore`] backed by a sorted map.
#[derive(Default)]
pub struct InMemorySettingsStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.write().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.values.read().keys().cloned().collect())
    }

    async fn clear_all(&self) -> Result<()> {
        self.values.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generations_keep_creation_order() {
        let storage = InMemoryCacheStorage::new();
        storage.open("b-v1").await.unwrap();
        storage
            .store("a-v1", "https://x.test/", HttpResponse::new(200, "x"))
            .await
            .unwrap();

        assert_eq!(storage.generations().await.unwrap(), vec!["b-v1", "a-v1"]);
        assert_eq!(storage.entry_count("a-v1"), Some(1));
        assert_eq!(storage.entry_count("b-v1"), Some(0));
        assert_eq!(storage.entry_count("c-v1"), None);
    }

    #[tokio::test]
    async fn test_delete_generation() {
        let storage = InMemoryCacheStorage::new();
        storage.open("a-v1").await.unwrap();

        assert!(storage.delete_generation("a-v1").await.unwrap());
        assert!(!storage.delete_generation("a-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let store = InMemorySettingsStore::new();
        store.set_string("b", "2").await.unwrap();
        store.set_string("a", "1").await.unwrap();

        assert_eq!(store.get_string("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(store.list_keys().await.unwrap(), vec!["a", "b"]);

        store.delete("a").await.unwrap();
        assert!(!store.has_key("a").await.unwrap());
    }
}
