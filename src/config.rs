//! Demo configuration.
//!
//! Read from `./glrender.json`, or `glrender/config.json` in the user's config directory.
//! Every field is optional; missing ones keep the compiled-in defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "My OpenGL".to_string(),
            width: 800,
            height: 512,
            vsync: true,
        }
    }
}

impl WindowConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory holding meshes, textures and shaders.
    pub root: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("res"),
        }
    }
}

impl AssetConfig {
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub assets: AssetConfig,
    pub log_level: log::LevelFilter,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            assets: AssetConfig::default(),
            log_level: log::LevelFilter::Info,
        }
    }
}

impl DemoConfig {
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&source)
    }

    /// Places a config file is looked for, in order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("glrender.json")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("glrender").join("config.json"));
        }
        paths
    }

    /// Loads the first config file that exists, or the defaults if there is none.
    /// Returns the path that was used alongside the config.
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in Self::search_paths() {
            if path.is_file() {
                return Ok((Self::from_file(&path)?, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo() {
        let config = DemoConfig::default();
        assert_eq!(config.window.title, "My OpenGL");
        assert_eq!((config.window.width, config.window.height), (800, 512));
        assert_eq!(config.assets.path("cube.obj"), PathBuf::from("res/cube.obj"));
        assert_eq!(config.log_level, log::LevelFilter::Info);
        assert!((config.window.aspect_ratio() - 1.5625).abs() < 1e-6);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            DemoConfig::from_json(r#"{ "window": { "width": 1024 }, "log_level": "debug" }"#)
                .unwrap();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 512);
        assert_eq!(config.window.title, "My OpenGL");
        assert_eq!(config.log_level, log::LevelFilter::Debug);
        assert_eq!(config.assets, AssetConfig::default());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            DemoConfig::from_json("{ window: }"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            DemoConfig::from_file("no/such/config.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
