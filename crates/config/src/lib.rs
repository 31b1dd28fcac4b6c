//! Configuration loading and validation.
//!
//! Values are layered with [`figment`], later sources overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A TOML file: either the path given explicitly, or `config.toml` in the
//!    platform configuration directory (skipped silently when missing).
//! 3. Environment variables prefixed with `SHUTTER_`, with `__` separating
//!    nested keys (`SHUTTER_INTERNAL__QUOTA=1073741824`).
//!
//! ```toml
//! settings_path = "/home/me/.local/share/shutter/settings.json"
//! timezone = "local"
//!
//! [internal]
//! path = "/home/me/.local/share/shutter/internal"
//! quota = 805306368
//!
//! [[volumes]]
//! id = "downloads:MyFiles"
//! path = "/home/me/MyFiles"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Capacity of the internal store: 768 MiB.
pub const DEFAULT_INTERNAL_QUOTA: u64 = 768 * 1024 * 1024;
/// Width of generated thumbnails, in pixels.
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 480;
const ENV_PREFIX: &str = "SHUTTER_";
const CONFIG_FILE: &str = "config.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "shutter", "shutter")
}

fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("shutter"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub internal: InternalConfig,
    /// Volumes the host exposes. When none matches the external volume
    /// patterns, pictures stay in the internal store.
    pub volumes: Vec<VolumeConfig>,
    /// JSON file persisting the migration flags.
    pub settings_path: PathBuf,
    pub timezone: TimeZone,
    pub thumbnail_width: u32,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            internal: InternalConfig::default(),
            volumes: Vec::new(),
            settings_path: data_dir().join("settings.json"),
            timezone: TimeZone::default(),
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
        }
    }
}

/// The sandboxed store that always exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalConfig {
    pub path: PathBuf,
    /// Maximum bytes the internal store may hold.
    pub quota: u64,
}
impl Default for InternalConfig {
    fn default() -> Self {
        Self {
            path: data_dir().join("internal"),
            quota: DEFAULT_INTERNAL_QUOTA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Host volume identifier, e.g. `downloads:MyFiles`.
    pub id: String,
    pub path: PathBuf,
}

/// Time zone used to render and parse timestamps embedded in file names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZone {
    #[default]
    Local,
    Utc,
}

impl Config {
    /// Location of the configuration file when none is given explicitly.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Build the layered [`Figment`] without extracting it.
    ///
    /// An explicit `path` is used as given. Without one, the default file
    /// is merged if it exists.
    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Config::default()));
        let figment = match path {
            Some(path) => figment.merge(Toml::file_exact(path)),
            None => match Self::default_path() {
                Some(default) => figment.merge(Toml::file_exact(default)),
                None => figment,
            },
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from every layer and validate it.
    ///
    /// Fails with [`Missing`](ErrorKind::Missing) if an explicit `path` does
    /// not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path
            && !path.is_file()
        {
            exn::bail!(ErrorKind::Missing(path.display().to_string()));
        }
        Self::from_figment(Self::figment(path))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "Configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.internal.quota == 0 {
            exn::bail!(ErrorKind::Invalid("internal.quota must be greater than zero".to_string()));
        }
        if self.thumbnail_width == 0 {
            exn::bail!(ErrorKind::Invalid("thumbnail_width must be greater than zero".to_string()));
        }
        if !self.internal.path.is_absolute() {
            exn::bail!(ErrorKind::Invalid(format!("internal.path `{}` must be absolute", self.internal.path.display())));
        }
        if !self.settings_path.is_absolute() {
            exn::bail!(ErrorKind::Invalid(format!("settings_path `{}` must be absolute", self.settings_path.display())));
        }
        for volume in &self.volumes {
            if volume.id.trim().is_empty() {
                exn::bail!(ErrorKind::Invalid("volume id must not be empty".to_string()));
            }
            if !volume.path.is_absolute() {
                exn::bail!(ErrorKind::Invalid(format!(
                    "path `{}` of volume `{}` must be absolute",
                    volume.path.display(),
                    volume.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.internal.quota, 768 * 1024 * 1024);
        assert_eq!(config.thumbnail_width, 480);
        assert_eq!(config.timezone, TimeZone::Local);
        assert!(config.volumes.is_empty());
    }

    #[test]
    fn test_file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "shutter.toml",
                r#"
                    timezone = "utc"
                    settings_path = "/srv/shutter/settings.json"

                    [internal]
                    path = "/srv/shutter/internal"
                    quota = 1024

                    [[volumes]]
                    id = "downloads:MyFiles"
                    path = "/home/user/MyFiles"
                "#,
            )?;
            jail.set_env("SHUTTER_INTERNAL__QUOTA", "2048");
            let config = Config::load(Some(Path::new("shutter.toml"))).unwrap();
            assert_eq!(config.timezone, TimeZone::Utc);
            assert_eq!(config.internal.path, PathBuf::from("/srv/shutter/internal"));
            // Environment wins over the file.
            assert_eq!(config.internal.quota, 2048);
            assert_eq!(config.volumes, vec![VolumeConfig {
                id: "downloads:MyFiles".to_string(),
                path: PathBuf::from("/home/user/MyFiles"),
            }]);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        Jail::expect_with(|_jail| {
            let err = Config::load(Some(Path::new("does-not-exist.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Missing(path) if path == "does-not-exist.toml"));
            Ok(())
        });
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file("empty.toml", "")?;
            let config = Config::load(Some(Path::new("empty.toml"))).unwrap();
            assert_eq!(config.thumbnail_width, DEFAULT_THUMBNAIL_WIDTH);
            Ok(())
        });
    }

    #[test]
    fn test_rejects_zero_quota() {
        Jail::expect_with(|jail| {
            jail.create_file("shutter.toml", "")?;
            jail.set_env("SHUTTER_INTERNAL__QUOTA", "0");
            let err = Config::load(Some(Path::new("shutter.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[test]
    fn test_rejects_relative_volume_path() {
        let mut config = Config::default();
        config.volumes.push(VolumeConfig {
            id: "downloads:Downloads".to_string(),
            path: PathBuf::from("relative/Downloads"),
        });
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", r#"timezone = "mars""#)?;
            let err = Config::load(Some(Path::new("bad.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Load));
            Ok(())
        });
    }
}
