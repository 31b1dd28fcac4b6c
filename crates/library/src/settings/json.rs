use super::SettingsStore;
use super::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use serde_json::{Map, Value};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Settings kept as a single JSON object in a file.
///
/// A missing file reads as "everything at its default". Updates rewrite the
/// whole object to a sibling temporary file and rename it into place, so a
/// crash mid-write leaves the previous contents intact.
pub struct JsonSettings {
    path: PathBuf,
    // Serialises read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e).or_raise(|| ErrorKind::Read),
        };
        match serde_json::from_slice(&raw).or_raise(|| ErrorKind::Format)? {
            Value::Object(map) => Ok(map),
            _ => exn::bail!(ErrorKind::Format),
        }
    }

    async fn store(&self, map: Map<String, Value>) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(&Value::Object(map)).or_raise(|| ErrorKind::Format)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Write)?;
        }
        let mut temporary = self.path.clone().into_os_string();
        temporary.push(".tmp");
        let temporary = PathBuf::from(temporary);
        tokio::fs::write(&temporary, serialized).await.or_raise(|| ErrorKind::Write)?;
        tokio::fs::rename(&temporary, &self.path).await.or_raise(|| ErrorKind::Write)
    }
}

#[async_trait]
impl SettingsStore for JsonSettings {
    async fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        let _guard = self.lock.lock().await;
        Ok(match self.load().await?.get(key) {
            Some(Value::Bool(value)) => *value,
            Some(other) => {
                tracing::warn!(key, value = %other, "Ignoring non-boolean setting");
                default
            },
            None => default,
        })
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        map.insert(key.to_string(), Value::Bool(value));
        self.store(map).await?;
        tracing::debug!(key, value, path = %self.path.display(), "Setting stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ACK_MIGRATE_PICTURES, MEDIA_CONSOLIDATED};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = JsonSettings::new(dir.path().join("settings.json"));
        assert!(!settings.get_bool(ACK_MIGRATE_PICTURES, false).await.unwrap());
        assert!(settings.get_bool(MEDIA_CONSOLIDATED, true).await.unwrap());
    }

    #[tokio::test]
    async fn test_values_persist_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        JsonSettings::new(&path).set_bool(ACK_MIGRATE_PICTURES, true).await.unwrap();
        JsonSettings::new(&path).set_bool(MEDIA_CONSOLIDATED, false).await.unwrap();

        let reopened = JsonSettings::new(&path);
        assert!(reopened.get_bool(ACK_MIGRATE_PICTURES, false).await.unwrap());
        assert!(!reopened.get_bool(MEDIA_CONSOLIDATED, true).await.unwrap());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, b"[1, 2, 3]").unwrap();
        let err = JsonSettings::new(&path).get_bool(MEDIA_CONSOLIDATED, false).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Format));
    }

    #[tokio::test]
    async fn test_non_boolean_value_uses_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, br#"{"media_consolidated": "yes"}"#).unwrap();
        assert!(!JsonSettings::new(&path).get_bool(MEDIA_CONSOLIDATED, false).await.unwrap());
    }
}
