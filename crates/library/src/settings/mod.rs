//! Persisted key-value flags.
//!
//! The migration between storage locations is tracked by two booleans that
//! must survive restarts: [`ACK_MIGRATE_PICTURES`] and [`MEDIA_CONSOLIDATED`].
//! Where they live is up to the host, behind the [`SettingsStore`] trait.

pub mod error;
mod json;
mod memory;

pub use self::json::JsonSettings;
pub use self::memory::MemorySettings;
use self::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// The user agreed to move pictures out of the internal store.
pub const ACK_MIGRATE_PICTURES: &str = "ack_migrate_pictures";
/// Every picture now lives in the external location.
pub const MEDIA_CONSOLIDATED: &str = "media_consolidated";

pub type SettingsHandle = Arc<dyn SettingsStore>;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Value stored under `key`, or `default` when nothing is stored.
    async fn get_bool(&self, key: &str, default: bool) -> Result<bool>;

    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;
}
