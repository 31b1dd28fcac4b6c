//! Picture library: where pictures live and which pictures exist.
//!
//! - [`naming`]: canonical file names and the timestamps encoded in them.
//! - [`settings`]: persisted migration flags.
//! - [`host`]: discovery of the internal store and external volumes.
//! - [`resolve`]: the [`Resolver`], reconciling both storage locations and
//!   migrating pictures between them once.
//! - [`catalog`]: the [`Catalog`], a sorted in-memory index of pictures
//!   with change notifications.

pub mod catalog;
pub mod host;
pub mod naming;
pub mod resolve;
pub mod settings;

pub use crate::catalog::{Catalog, Picture, PictureObserver};
pub use crate::host::{Host, LocalHost, Volume};
pub use crate::naming::TimeZone;
pub use crate::resolve::{Initialization, Location, Resolver, ResolverOptions, StoredFile};
pub use crate::settings::{JsonSettings, MemorySettings, SettingsStore};

/// How many pictures bulk operations (migration, thumbnail regeneration
/// during the catalog load) hold in memory at once.
pub const MAX_TRANSFER_CONCURRENCY: usize = 4;
