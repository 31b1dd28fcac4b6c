use super::SettingsStore;
use super::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// Settings held in memory only, for hosts without a persistent store and
/// for tests.
///
/// Reads of particular keys can be made to fail with
/// [`fail_reads_of`](Self::fail_reads_of).
#[derive(Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, bool>>,
    failing: RwLock<HashSet<String>>,
}

impl MemorySettings {
    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        Self {
            values: RwLock::new(values.into_iter().map(|(k, v)| (k.to_string(), v)).collect()),
            failing: RwLock::default(),
        }
    }

    pub async fn fail_reads_of(&self, key: impl Into<String>) {
        self.failing.write().await.insert(key.into());
    }

    /// Stored value, without a default.
    pub async fn value(&self, key: &str) -> Option<bool> {
        self.values.read().await.get(key).copied()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        if self.failing.read().await.contains(key) {
            exn::bail!(ErrorKind::Read);
        }
        Ok(self.values.read().await.get(key).copied().unwrap_or(default))
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_and_overrides() {
        let settings = MemorySettings::with_values([("a", true)]);
        assert!(settings.get_bool("a", false).await.unwrap());
        assert!(!settings.get_bool("b", false).await.unwrap());
        settings.set_bool("b", true).await.unwrap();
        assert_eq!(settings.value("b").await, Some(true));
    }

    #[tokio::test]
    async fn test_injected_read_failure() {
        let settings = MemorySettings::default();
        settings.fail_reads_of("a").await;
        assert!(matches!(&*settings.get_bool("a", false).await.unwrap_err(), ErrorKind::Read));
    }
}
