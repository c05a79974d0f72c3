use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the per-directory config file, read from the working directory.
pub const LOCAL_CONFIG: &str = ".blogmap.toml";

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub backend: Option<BackendConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub color: Option<bool>,
}

impl ConfigFile {
    pub fn backend_uri(&self) -> Option<&str> {
        self.backend.as_ref().and_then(|b| b.uri.as_deref())
    }

    pub fn color(&self) -> Option<bool> {
        self.display.as_ref().and_then(|d| d.color)
    }

    pub fn set_backend_uri(&mut self, uri: impl Into<String>) {
        self.backend.get_or_insert_with(BackendConfig::default).uri = Some(uri.into());
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Platform config directory path: `<config_dir>/blogmap/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("blogmap").join("config.toml"))
}

/// Load config by cascading CWD `.blogmap.toml` over platform config.
/// CWD values override platform values. Unreadable files are skipped with a
/// warning.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_or_warn(&p));
    let cwd = load_or_warn(Path::new(LOCAL_CONFIG));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

fn load_or_warn(path: &Path) -> Option<ConfigFile> {
    match load_from_path(path) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring config file");
            None
        }
    }
}

/// Load a config from a specific path. `Ok(None)` if the file doesn't exist.
pub fn load_from_path(path: &Path) -> Result<Option<ConfigFile>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        backend: Some(BackendConfig {
            uri: overlay
                .backend_uri()
                .or_else(|| base.backend_uri())
                .map(str::to_string),
        }),
        display: Some(DisplayConfig {
            color: overlay.color().or_else(|| base.color()),
        }),
    }
}

/// Save the config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to_path(config, &path)?;
    Ok(path)
}

pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "saved config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_uri(uri: &str) -> ConfigFile {
        let mut config = ConfigFile::default();
        config.set_backend_uri(uri);
        config
    }

    #[test]
    fn backend_uri_round_trip_toml() {
        let config = with_uri("http://localhost:4000");
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.backend_uri(), Some("http://localhost:4000"));
    }

    #[test]
    fn partial_file_parses() {
        let parsed: ConfigFile = toml::from_str("[display]\ncolor = false\n").unwrap();
        assert_eq!(parsed.backend_uri(), None);
        assert_eq!(parsed.color(), Some(false));
    }

    #[test]
    fn merge_overlay_wins() {
        let merged = merge(with_uri("http://base"), with_uri("http://overlay"));
        assert_eq!(merged.backend_uri(), Some("http://overlay"));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let overlay = ConfigFile {
            display: Some(DisplayConfig { color: Some(true) }),
            ..Default::default()
        };
        let merged = merge(with_uri("http://base"), overlay);
        assert_eq!(merged.backend_uri(), Some("http://base"));
        assert_eq!(merged.color(), Some(true));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let path = std::env::temp_dir().join("blogmap-test-does-not-exist.toml");
        assert!(load_from_path(&path).unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("blogmap-config-{}", std::process::id()));
        let path = dir.join("config.toml");
        save_to_path(&with_uri("http://saved:4000"), &path).unwrap();

        let loaded = load_from_path(&path).unwrap().unwrap();
        assert_eq!(loaded.backend_uri(), Some("http://saved:4000"));

        std::fs::write(&path, "backend = 3").unwrap();
        assert!(matches!(
            load_from_path(&path),
            Err(ConfigError::Parse { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
